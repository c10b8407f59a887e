use std::fmt;

use serde::Serialize;
use serde_json::Value;
use verdict_contract::{VerdictBody, MISSING_BODY_MESSAGE};

use crate::transport::{RawExchange, TransportError};

/// Sequence token of one submission. Later attempts compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AttemptId(u64);

impl AttemptId {
    /// Raw sequence number, starting at 1.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the renderer currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RendererState {
    /// Nothing submitted yet.
    #[default]
    Idle,
    /// Waiting on the exchange for `attempt`.
    Pending {
        /// Attempt in flight.
        attempt: AttemptId,
    },
    /// The server answered.
    Resolved {
        /// Attempt answered.
        attempt: AttemptId,
        /// Status as received.
        status: u16,
        /// Decoded body, or the placeholder when the body was not an object.
        body: VerdictBody,
    },
    /// No HTTP exchange completed.
    Failed {
        /// Attempt that failed.
        attempt: AttemptId,
        /// Why.
        error: TransportError,
    },
}

impl RendererState {
    /// Attempt the state belongs to.
    #[must_use]
    pub const fn attempt(&self) -> Option<AttemptId> {
        match self {
            Self::Idle => None,
            Self::Pending { attempt }
            | Self::Resolved { attempt, .. }
            | Self::Failed { attempt, .. } => Some(*attempt),
        }
    }

    /// True while an exchange is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }

    /// True once a verdict or failure is shown.
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::Failed { .. })
    }

    /// Status of a resolved attempt.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Resolved { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of a resolved attempt.
    #[must_use]
    pub const fn body(&self) -> Option<&VerdictBody> {
        match self {
            Self::Resolved { body, .. } => Some(body),
            _ => None,
        }
    }

    /// Error of a failed attempt.
    #[must_use]
    pub const fn error(&self) -> Option<&TransportError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Whether an outcome was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    /// The outcome replaced the pending state.
    Applied,
    /// A newer attempt superseded this one; state untouched.
    Stale,
}

/// Decodes a response body: a JSON object is kept verbatim, anything else
/// becomes the placeholder message.
#[must_use]
pub fn decode_body(bytes: &[u8]) -> VerdictBody {
    serde_json::from_slice::<Value>(bytes)
        .ok()
        .and_then(VerdictBody::from_value)
        .unwrap_or_else(|| VerdictBody::new(MISSING_BODY_MESSAGE))
}

/// Attempt lifecycle with stale-response discard.
///
/// Only the latest attempt may settle the state, and only while it is still
/// pending. Outcomes of older attempts return [`Transition::Stale`].
#[derive(Debug, Default)]
pub struct StateMachine {
    issued: u64,
    state: RendererState,
}

impl StateMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new attempt, discarding whatever was shown.
    pub fn begin(&mut self) -> AttemptId {
        self.issued += 1;
        let attempt = AttemptId(self.issued);
        self.state = RendererState::Pending { attempt };
        attempt
    }

    /// Applies a completed exchange.
    pub fn resolve(&mut self, attempt: AttemptId, exchange: RawExchange) -> Transition {
        if !self.awaits(attempt) {
            return Transition::Stale;
        }
        self.state = RendererState::Resolved {
            attempt,
            status: exchange.status,
            body: decode_body(&exchange.body),
        };
        Transition::Applied
    }

    /// Applies a transport failure.
    pub fn fail(&mut self, attempt: AttemptId, error: TransportError) -> Transition {
        if !self.awaits(attempt) {
            return Transition::Stale;
        }
        self.state = RendererState::Failed { attempt, error };
        Transition::Applied
    }

    /// Most recently issued attempt.
    #[must_use]
    pub const fn latest(&self) -> Option<AttemptId> {
        if self.issued == 0 {
            None
        } else {
            Some(AttemptId(self.issued))
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &RendererState {
        &self.state
    }

    fn awaits(&self, attempt: AttemptId) -> bool {
        matches!(self.state, RendererState::Pending { attempt: pending } if pending == attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resolve_applies_latest_attempt() {
        let mut machine = StateMachine::new();
        assert_eq!(machine.state(), &RendererState::Idle);
        let attempt = machine.begin();
        assert!(machine.state().is_pending());
        let transition = machine.resolve(attempt, RawExchange::new(403, r#"{"message":"Blocked"}"#));
        assert_eq!(transition, Transition::Applied);
        assert_eq!(machine.state().status(), Some(403));
        assert_eq!(machine.state().body().unwrap().message_text(), "Blocked");
    }

    #[test]
    fn older_attempts_are_stale() {
        let mut machine = StateMachine::new();
        let first = machine.begin();
        let second = machine.begin();
        assert!(second > first);
        assert_eq!(
            machine.resolve(second, RawExchange::new(200, r#"{"message":"B"}"#)),
            Transition::Applied
        );
        assert_eq!(
            machine.resolve(first, RawExchange::new(403, r#"{"message":"A"}"#)),
            Transition::Stale
        );
        assert_eq!(
            machine.fail(first, TransportError::Network("reset".into())),
            Transition::Stale
        );
        assert_eq!(machine.state().body().unwrap().message_text(), "B");
        assert_eq!(machine.latest(), Some(second));
    }

    #[test]
    fn settled_attempt_cannot_settle_twice() {
        let mut machine = StateMachine::new();
        let attempt = machine.begin();
        machine.fail(attempt, TransportError::Network("refused".into()));
        assert_eq!(
            machine.resolve(attempt, RawExchange::new(200, "{}")),
            Transition::Stale
        );
        assert!(machine.state().error().is_some());
    }

    #[test]
    fn new_attempt_clears_previous_verdict() {
        let mut machine = StateMachine::new();
        let attempt = machine.begin();
        machine.resolve(attempt, RawExchange::new(200, r#"{"message":"ok"}"#));
        let next = machine.begin();
        assert_eq!(machine.state(), &RendererState::Pending { attempt: next });
        assert!(machine.state().body().is_none());
    }

    #[test]
    fn non_object_bodies_become_placeholder() {
        for raw in ["", "<html>oops</html>", "[1,2]", "\"text\"", "null"] {
            assert_eq!(
                decode_body(raw.as_bytes()).message_text(),
                MISSING_BODY_MESSAGE,
                "{raw:?}"
            );
        }
        let kept = decode_body(br#"{"reason":"vpn"}"#);
        assert_eq!(kept.get("reason"), Some(&json!("vpn")));
        assert!(kept.message().is_none());
    }

    #[test]
    fn numbers_pass_through_as_written() {
        let raw = r#"{"message":"m","id":12345678901234567890123,"score":1e400,"p":0.10000000000000000001}"#;
        let body = decode_body(raw.as_bytes());
        assert_eq!(body.message_text(), "m");
        assert_eq!(serde_json::to_string(&body).unwrap(), raw);
        let pretty = body.to_pretty_json();
        assert!(pretty.contains("\"id\": 12345678901234567890123"));
        assert!(pretty.contains("\"score\": 1e400"));
        assert!(pretty.contains("\"p\": 0.10000000000000000001"));
    }
}
