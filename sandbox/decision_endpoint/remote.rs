use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use verdict_contract::{VerdictBody, VerdictEnvelope};

use crate::policy::{PolicyError, PolicyInput, RiskPolicy};

/// Connection settings for an external evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePolicyConfig {
    /// Evaluator URL receiving the policy input as a JSON POST.
    pub url: String,
    /// Per-call timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Optional bearer token.
    #[serde(default)]
    pub auth_token: Option<String>,
}

const fn default_timeout_ms() -> u64 {
    2_000
}

impl RemotePolicyConfig {
    /// Settings for an evaluator at `url` with the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_ms: default_timeout_ms(),
            auth_token: None,
        }
    }

    /// Checks the URL is an absolute http(s) address.
    pub fn validate(&self) -> Result<Url> {
        let url = Url::parse(&self.url).with_context(|| format!("invalid evaluator url {}", self.url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("evaluator url {} must use http or https", self.url);
        }
        if self.timeout_ms == 0 {
            bail!("evaluator timeout must be positive");
        }
        Ok(url)
    }
}

/// Policy forwarding every attempt to an HTTP evaluator.
///
/// The evaluator's status becomes the verdict status and its JSON object body
/// becomes the verdict body verbatim.
#[derive(Debug, Clone)]
pub struct RemotePolicy {
    client: Client,
    url: Url,
    config: RemotePolicyConfig,
}

impl RemotePolicy {
    /// Creates the policy after validating the settings.
    pub fn new(config: RemotePolicyConfig) -> Result<Self> {
        let url = config.validate()?;
        let client = Client::builder()
            .user_agent("verdict-sandbox/decision-endpoint")
            .build()
            .context("building evaluator client")?;
        Ok(Self {
            client,
            url,
            config,
        })
    }

    /// Evaluator settings.
    #[must_use]
    pub const fn config(&self) -> &RemotePolicyConfig {
        &self.config
    }
}

#[async_trait]
impl RiskPolicy for RemotePolicy {
    fn name(&self) -> &str {
        "remote"
    }

    async fn evaluate(&self, input: &PolicyInput) -> Result<VerdictEnvelope, PolicyError> {
        let mut request = self.client.post(self.url.clone()).json(input);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }
        let response = request
            .timeout(Duration::from_millis(self.config.timeout_ms))
            .send()
            .await
            .map_err(|err| PolicyError::Unavailable(format!("evaluator request failed: {err}")))?;
        let status = response.status().as_u16();
        let payload = response.json::<Value>().await.map_err(|err| {
            if err.is_timeout() {
                PolicyError::Unavailable(format!("evaluator timed out: {err}"))
            } else {
                PolicyError::InvalidDecision(format!("evaluator body is not JSON: {err}"))
            }
        })?;
        let body = VerdictBody::from_value(payload).ok_or_else(|| {
            PolicyError::InvalidDecision("evaluator body is not a JSON object".into())
        })?;
        if !body.has_message() {
            return Err(PolicyError::InvalidDecision(
                "evaluator body has no string message".into(),
            ));
        }
        Ok(VerdictEnvelope::new(status, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::RequestSignals;
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;
    use verdict_contract::{RoutePath, Submission};

    async fn evaluator() -> String {
        let app = Router::new()
            .route(
                "/verdict",
                post(|headers: HeaderMap, Json(input): Json<Value>| async move {
                    let authorized = headers
                        .get("authorization")
                        .and_then(|value| value.to_str().ok())
                        == Some("Bearer s3cret");
                    (
                        StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
                        Json(json!({
                            "message": "Held for review",
                            "route": input["route"],
                            "authorized": authorized,
                        })),
                    )
                }),
            )
            .route("/text", post(|| async { "not json" }))
            .route("/bare", post(|| async { Json(json!({ "score": 0.9 })) }));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn input() -> PolicyInput {
        let route = RoutePath::from_slug("checkout");
        PolicyInput::new(
            Submission::new("proxy.chain@tamperlab.app", "letmein!-404", &route),
            route,
            RequestSignals::empty(),
        )
    }

    #[tokio::test]
    async fn evaluator_status_and_body_pass_through() {
        let base = evaluator().await;
        let mut config = RemotePolicyConfig::new(format!("{base}/verdict"));
        config.auth_token = Some("s3cret".into());
        let verdict = RemotePolicy::new(config).unwrap().evaluate(&input()).await.unwrap();
        assert_eq!(verdict.status, 451);
        assert_eq!(verdict.body.message_text(), "Held for review");
        assert_eq!(verdict.body.get("route"), Some(&json!("/checkout")));
        assert_eq!(verdict.body.get("authorized"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn malformed_answers_are_invalid_decisions() {
        let base = evaluator().await;
        for path in ["text", "bare"] {
            let policy = RemotePolicy::new(RemotePolicyConfig::new(format!("{base}/{path}"))).unwrap();
            let err = policy.evaluate(&input()).await.unwrap_err();
            assert!(matches!(err, PolicyError::InvalidDecision(_)), "{path}: {err}");
        }
    }

    #[tokio::test]
    async fn unreachable_evaluator_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let policy = RemotePolicy::new(RemotePolicyConfig::new(format!("http://{addr}/verdict"))).unwrap();
        let err = policy.evaluate(&input()).await.unwrap_err();
        assert_eq!(err.status(), 502);
    }

    #[test]
    fn config_validation() {
        assert!(RemotePolicyConfig::new("ftp://example.com").validate().is_err());
        assert!(RemotePolicyConfig::new("not a url").validate().is_err());
        assert!(RemotePolicyConfig::new("https://risk.example.com/v1").validate().is_ok());
    }
}
