use std::{future::Future, net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use axum::{
    body::{to_bytes, Bytes},
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{post, MethodRouter},
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info};
use verdict_contract::{RoutePath, Submission, VerdictBody, VerdictEnvelope, API_PREFIX};

use crate::{
    endpoint::{malformed_submission_envelope, DecisionEndpoint},
    policy::PolicyInput,
    signals::RequestSignals,
};

#[derive(Clone)]
struct AppState {
    endpoint: Arc<DecisionEndpoint>,
    body_limit: usize,
}

/// Router answering `POST /api`, `POST /api/` and `POST /api/{*slug}`.
///
/// The route handed to the policy is the raw request path below `/api`, still
/// percent-encoded, so it matches the `meta.pagePath` the page reports. Every
/// other path or method still answers with an envelope.
pub fn router(endpoint: Arc<DecisionEndpoint>, body_limit: usize) -> Router {
    Router::new()
        .route(API_PREFIX, decide_route())
        .route("/api/", decide_route())
        .route("/api/{*slug}", decide_route())
        .fallback(unknown_endpoint)
        .with_state(AppState {
            endpoint,
            body_limit,
        })
}

/// Serves the router until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().context("reading listener address")?;
    info!(%addr, "decision endpoint listening");
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .context("decision endpoint server failed")?;
    info!(%addr, "decision endpoint stopped");
    Ok(())
}

fn decide_route() -> MethodRouter<AppState> {
    post(decide).fallback(method_not_allowed)
}

async fn decide(State(state): State<AppState>, request: Request) -> Response {
    let route = route_of(request.uri().path());
    handle(&state, route, request).await
}

async fn unknown_endpoint(request: Request) -> Response {
    debug!(path = request.uri().path(), "no decision endpoint at path");
    respond(VerdictEnvelope::new(
        404,
        VerdictBody::new("No decision endpoint at this path").with_field("error", "unknown_endpoint"),
    ))
}

async fn method_not_allowed(request: Request) -> Response {
    debug!(method = %request.method(), "decision endpoint only accepts POST");
    respond(VerdictEnvelope::new(
        405,
        VerdictBody::new("Decision endpoint only accepts POST")
            .with_field("error", "method_not_allowed"),
    ))
}

fn route_of(path: &str) -> RoutePath {
    RoutePath::from_slug(path.strip_prefix(API_PREFIX).unwrap_or(path))
}

async fn handle(state: &AppState, route: RoutePath, request: Request) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let signals = RequestSignals::capture(request.headers(), remote);
    let envelope = match to_bytes(request.into_body(), state.body_limit).await {
        Ok(bytes) => match parse_submission(&bytes) {
            Some(submission) => {
                state
                    .endpoint
                    .decide(PolicyInput::new(submission, route, signals))
                    .await
            }
            None => {
                debug!(%route, "rejecting malformed submission");
                malformed_submission_envelope()
            }
        },
        Err(err) => {
            debug!(%route, error = %err, "submission body unreadable");
            oversized_submission_envelope()
        }
    };
    respond(envelope)
}

fn parse_submission(bytes: &Bytes) -> Option<Submission> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Some(Submission::default());
    }
    match serde_json::from_slice::<Value>(bytes).ok()? {
        fields @ Value::Object(_) => serde_json::from_value(fields).ok(),
        _ => None,
    }
}

fn oversized_submission_envelope() -> VerdictEnvelope {
    VerdictEnvelope::new(
        413,
        VerdictBody::new("Submission body is too large or unreadable")
            .with_field("error", "submission_too_large"),
    )
}

fn respond(envelope: VerdictEnvelope) -> Response {
    let status = StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope.body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{AllowAllPolicy, PolicyError, RiskPolicy, RouteRule, RouteTablePolicy};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::oneshot;

    struct EchoPolicy;

    #[async_trait]
    impl RiskPolicy for EchoPolicy {
        fn name(&self) -> &str {
            "echo"
        }

        async fn evaluate(&self, input: &PolicyInput) -> Result<VerdictEnvelope, PolicyError> {
            let body = VerdictBody::new(input.route.as_str())
                .with_field("page_path", input.submission.meta.page_path.clone())
                .with_field("client_ip", input.signals.client_ip().map(str::to_string));
            Ok(VerdictEnvelope::new(202, body))
        }
    }

    async fn spawn(policy: Arc<dyn RiskPolicy>, body_limit: usize) -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = router(Arc::new(DecisionEndpoint::new(policy)), body_limit);
        let (tx, rx) = oneshot::channel::<()>();
        tokio::spawn(serve(listener, app, async move {
            let _ = rx.await;
        }));
        (base, tx)
    }

    async fn post_json(url: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new().post(url).json(&body).send().await.unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn default_policy_answers_login_succeeded() {
        let (base, _stop) = spawn(Arc::new(AllowAllPolicy), 65_536).await;
        let (status, body) = post_json(
            &format!("{base}/api"),
            json!({ "email": "a@b.c", "password": "x", "meta": { "pagePath": "/" } }),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({ "message": "Login succeeded" }));
    }

    #[tokio::test]
    async fn nested_paths_reach_the_policy_unchanged() {
        let (base, _stop) = spawn(Arc::new(EchoPolicy), 65_536).await;
        let (status, body) = post_json(
            &format!("{base}/api/a/b/c"),
            json!({ "email": "", "password": "", "meta": { "pagePath": "/a/b/c" } }),
        )
        .await;
        assert_eq!(status, 202);
        assert_eq!(body["message"], json!("/a/b/c"));
        assert_eq!(body["page_path"], json!("/a/b/c"));
        assert_eq!(body["client_ip"], json!("127.0.0.1"));
    }

    #[tokio::test]
    async fn route_table_verdicts_pass_through() {
        let policy = RouteTablePolicy::new(vec![RouteRule::new(
            "/checkout/*",
            403,
            "Login blocked: automation detected",
        )
        .with_field("reason", "bot")
        .with_field("visitor", json!({ "confidence": 0.98 }))])
        .unwrap();
        let (base, _stop) = spawn(Arc::new(policy), 65_536).await;
        let (status, body) = post_json(&format!("{base}/api/checkout/step-2"), json!({})).await;
        assert_eq!(status, 403);
        assert_eq!(
            body,
            json!({
                "message": "Login blocked: automation detected",
                "reason": "bot",
                "visitor": { "confidence": 0.98 }
            })
        );
        let (status, _) = post_json(&format!("{base}/api/profile"), json!({})).await;
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn malformed_and_empty_bodies() {
        let (base, _stop) = spawn(Arc::new(AllowAllPolicy), 64).await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/api"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], json!("malformed_submission"));

        let response = client.post(format!("{base}/api")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 200);

        let response = client
            .post(format!("{base}/api"))
            .body("x".repeat(1024))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 413);
    }

    #[tokio::test]
    async fn serve_stops_on_shutdown() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let app = router(Arc::new(DecisionEndpoint::new(Arc::new(AllowAllPolicy))), 1024);
        let (tx, rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve(listener, app, async move {
            let _ = rx.await;
        }));
        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }

    async fn post_raw(url: &str, body: &'static str) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(url)
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[test]
    fn routes_come_from_the_raw_path() {
        assert_eq!(route_of("/api"), RoutePath::root());
        assert_eq!(route_of("/api/"), RoutePath::root());
        assert_eq!(route_of("/api/a%2Fb").as_str(), "/a%2Fb");
        assert_eq!(route_of("/api/%FF").as_str(), "/%FF");
    }

    #[tokio::test]
    async fn encoded_paths_match_the_reported_page_path() {
        let (base, _stop) = spawn(Arc::new(EchoPolicy), 65_536).await;
        let (status, body) = post_json(
            &format!("{base}/api/caf%C3%A9/x%2Fy"),
            json!({ "meta": { "pagePath": "/caf%C3%A9/x%2Fy" } }),
        )
        .await;
        assert_eq!(status, 202);
        assert_eq!(body["message"], body["page_path"]);
        assert_eq!(body["message"], json!("/caf%C3%A9/x%2Fy"));

        let (_, split) = post_json(&format!("{base}/api/x/y"), json!({})).await;
        assert_ne!(split["message"], body["message"]);
    }

    #[tokio::test]
    async fn hostile_paths_still_get_an_envelope() {
        let (base, _stop) = spawn(Arc::new(EchoPolicy), 65_536).await;

        let (status, body) = post_json(&format!("{base}/api/%FF"), json!({})).await;
        assert_eq!(status, 202);
        assert_eq!(body["message"], json!("/%FF"));

        let (status, body) = post_json(&format!("{base}/api/"), json!({})).await;
        assert_eq!(status, 202);
        assert_eq!(body["message"], json!("/"));

        let (status, body) = post_json(&format!("{base}/elsewhere"), json!({})).await;
        assert_eq!(status, 404);
        assert_eq!(body["error"], json!("unknown_endpoint"));
        assert!(body["message"].is_string());

        let response = reqwest::Client::new()
            .get(format!("{base}/api/checkout"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 405);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], json!("method_not_allowed"));
    }

    #[tokio::test]
    async fn non_object_submissions_are_malformed() {
        let (base, _stop) = spawn(Arc::new(EchoPolicy), 65_536).await;
        for raw in ["[]", "null", "42", "\"login\""] {
            let (status, body) = post_raw(&format!("{base}/api/checkout"), raw).await;
            assert_eq!(status, 400, "{raw}");
            assert_eq!(body["error"], json!("malformed_submission"), "{raw}");
            assert!(body["message"].is_string(), "{raw}");
        }
    }
}
