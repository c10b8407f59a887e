use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The one key every verdict body carries.
pub const MESSAGE_KEY: &str = "message";

/// Message of the default allow verdict.
pub const DEFAULT_ALLOW_MESSAGE: &str = "Login succeeded";

/// Message substituted when a response body is not a JSON object.
pub const MISSING_BODY_MESSAGE: &str = "No JSON body returned from server";

/// Text shown for a body that has no `message` at all.
pub const ABSENT_MESSAGE: &str = "—";

/// JSON object returned by a risk policy.
///
/// Only `message` has a defined meaning. Every other key belongs to the policy
/// and is passed through untouched, in the order it was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerdictBody(Map<String, Value>);

impl VerdictBody {
    /// Creates a body holding only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert(MESSAGE_KEY.into(), Value::String(message.into()));
        Self(fields)
    }

    /// Wraps an existing JSON object as-is.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Wraps a JSON value if it is an object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self(fields)),
            _ => None,
        }
    }

    /// Adds or replaces a field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Adds or replaces a field in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Raw `message` value, whatever its JSON type.
    #[must_use]
    pub fn message(&self) -> Option<&Value> {
        self.0.get(MESSAGE_KEY)
    }

    /// True when `message` is present and a string.
    #[must_use]
    pub fn has_message(&self) -> bool {
        matches!(self.message(), Some(Value::String(_)))
    }

    /// Message as display text: strings verbatim, other JSON values in their
    /// compact encoding, [`ABSENT_MESSAGE`] when missing.
    #[must_use]
    pub fn message_text(&self) -> String {
        match self.message() {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => ABSENT_MESSAGE.to_string(),
        }
    }

    /// Looks up any field.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Policy-defined fields, i.e. everything except `message`.
    pub fn extra_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter().filter(|(key, _)| key.as_str() != MESSAGE_KEY)
    }

    /// Underlying JSON object.
    #[must_use]
    pub const fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the body into its JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Two-space indented JSON, as shown in the raw response panel.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0)
            .unwrap_or_else(|_| Value::Object(self.0.clone()).to_string())
    }
}

/// Status code plus body: the complete answer of the decision endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerdictEnvelope {
    /// HTTP-style outcome code.
    pub status: u16,
    /// JSON body.
    pub body: VerdictBody,
}

impl VerdictEnvelope {
    /// Creates an envelope.
    #[must_use]
    pub const fn new(status: u16, body: VerdictBody) -> Self {
        Self { status, body }
    }

    /// The default verdict: `200 {"message":"Login succeeded"}`.
    #[must_use]
    pub fn allowed() -> Self {
        Self::new(200, VerdictBody::new(DEFAULT_ALLOW_MESSAGE))
    }

    /// True for 2xx statuses.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_verdict_matches_wire_shape() {
        let envelope = VerdictEnvelope::allowed();
        assert_eq!(envelope.status, 200);
        assert!(envelope.is_allowed());
        assert_eq!(
            serde_json::to_value(&envelope.body).unwrap(),
            json!({ "message": "Login succeeded" })
        );
    }

    #[test]
    fn unknown_fields_survive_a_round_trip_in_order() {
        let raw = r#"{"zeta":1,"message":"Blocked","alpha":{"score":0.97,"tags":["vpn"]}}"#;
        let body: VerdictBody = serde_json::from_str(raw).unwrap();
        assert_eq!(serde_json::to_string(&body).unwrap(), raw);
        let extras: Vec<_> = body.extra_fields().map(|(key, _)| key.as_str()).collect();
        assert_eq!(extras, vec!["zeta", "alpha"]);
    }

    #[test]
    fn message_text_handles_odd_shapes() {
        assert_eq!(VerdictBody::new("ok").message_text(), "ok");
        let numeric = VerdictBody::from_value(json!({ "message": 42 })).unwrap();
        assert_eq!(numeric.message_text(), "42");
        assert!(!numeric.has_message());
        let missing = VerdictBody::from_value(json!({ "reason": "vpn" })).unwrap();
        assert_eq!(missing.message_text(), ABSENT_MESSAGE);
        assert!(VerdictBody::from_value(json!(["message"])).is_none());
    }

    #[test]
    fn large_and_precise_numbers_are_not_reshaped() {
        let raw = r#"{"message":"Review","id":12345678901234567890123,"score":1e400,"p":0.10000000000000000001}"#;
        let body: VerdictBody = serde_json::from_str(raw).unwrap();
        assert_eq!(body.message_text(), "Review");
        assert_eq!(serde_json::to_string(&body).unwrap(), raw);
        let value: Value = serde_json::from_str(raw).unwrap();
        let from_value = VerdictBody::from_value(value).unwrap();
        assert_eq!(serde_json::to_string(&from_value).unwrap(), raw);
    }
}
