use std::{any::Any, panic::AssertUnwindSafe, sync::Arc, time::Instant};

use futures::FutureExt;
use serde_json::json;
use shared_telemetry::{LogLevel, Telemetry};
use tracing::{debug, warn};
use verdict_contract::{VerdictBody, VerdictEnvelope};

use crate::policy::{PolicyInput, RiskPolicy};

const MALFORMED_SUBMISSION_MESSAGE: &str = "Submission body is not valid JSON";

/// Envelope for a policy that could not produce a verdict.
#[must_use]
pub fn failure_envelope(policy: &str, code: &str, status: u16, reason: &str) -> VerdictEnvelope {
    let body = VerdictBody::new(format!("Risk policy failure: {reason}"))
        .with_field("error", code)
        .with_field("policy", policy);
    VerdictEnvelope::new(status, body)
}

/// Envelope for a request body that is not JSON. The policy is not consulted.
#[must_use]
pub fn malformed_submission_envelope() -> VerdictEnvelope {
    VerdictEnvelope::new(
        400,
        VerdictBody::new(MALFORMED_SUBMISSION_MESSAGE).with_field("error", "malformed_submission"),
    )
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .map_or_else(|| "policy panicked".to_string(), |text| format!("policy panicked: {text}"))
}

/// Wraps a [`RiskPolicy`] so every attempt yields a well-formed envelope.
///
/// Policy errors, panics, out-of-range statuses and bodies without a message
/// all become non-2xx envelopes with a `Risk policy failure` message.
#[derive(Clone)]
pub struct DecisionEndpoint {
    policy: Arc<dyn RiskPolicy>,
    telemetry: Option<Telemetry>,
}

impl DecisionEndpoint {
    /// Creates an endpoint around a policy.
    #[must_use]
    pub fn new(policy: Arc<dyn RiskPolicy>) -> Self {
        Self {
            policy,
            telemetry: None,
        }
    }

    /// Records a log line and a `decision.evaluated` event per attempt.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Name of the wrapped policy.
    #[must_use]
    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Evaluates one attempt. Never fails.
    pub async fn decide(&self, input: PolicyInput) -> VerdictEnvelope {
        let started = Instant::now();
        let name = self.policy.name();
        let outcome = AssertUnwindSafe(self.policy.evaluate(&input))
            .catch_unwind()
            .await;
        let envelope = match outcome {
            Ok(Ok(envelope)) => self.vet(envelope),
            Ok(Err(err)) => {
                warn!(policy = name, error = %err, route = %input.route, "risk policy failed");
                failure_envelope(name, err.code(), err.status(), &err.to_string())
            }
            Err(payload) => {
                let reason = panic_reason(payload.as_ref());
                warn!(policy = name, %reason, route = %input.route, "risk policy panicked");
                failure_envelope(name, "policy_panicked", 500, &reason)
            }
        };
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        debug!(status = envelope.status, elapsed_ms, route = %input.route, "decision evaluated");
        self.record(&input, &envelope, elapsed_ms).await;
        envelope
    }

    fn vet(&self, envelope: VerdictEnvelope) -> VerdictEnvelope {
        let name = self.policy.name();
        if !(100..=999).contains(&envelope.status) {
            warn!(policy = name, status = envelope.status, "risk policy returned an impossible status");
            return failure_envelope(
                name,
                "policy_invalid_status",
                500,
                &format!("status {} outside 100..=999", envelope.status),
            );
        }
        if !envelope.body.has_message() {
            warn!(policy = name, status = envelope.status, "risk policy verdict has no message");
            return failure_envelope(
                name,
                "policy_invalid_decision",
                500,
                "verdict body has no string message",
            );
        }
        envelope
    }

    async fn record(&self, input: &PolicyInput, envelope: &VerdictEnvelope, elapsed_ms: u64) {
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        let payload = json!({
            "request_id": input.signals.request_id,
            "route": input.route,
            "policy": self.policy.name(),
            "status": envelope.status,
            "error": envelope.body.get("error"),
            "elapsed_ms": elapsed_ms,
        });
        let level = if envelope.body.get("error").is_some() {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        if let Err(err) = telemetry.log(level, "decision.evaluated", payload.clone()) {
            warn!(error = %err, "decision log write failed");
        }
        if let Err(err) = telemetry.emit("decision.evaluated", payload).await {
            warn!(error = %err, "decision event publish failed");
        }
    }
}
