use std::{fmt, sync::Arc};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use verdict_contract::{RoutePath, Submission, VerdictBody, VerdictEnvelope, MESSAGE_KEY};

use crate::signals::RequestSignals;

/// Everything a policy gets to look at for one attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyInput {
    /// Parsed submission.
    pub submission: Submission,
    /// Route the endpoint was called under.
    pub route: RoutePath,
    /// Request context.
    pub signals: RequestSignals,
}

impl PolicyInput {
    /// Bundles the parts of a policy call.
    #[must_use]
    pub const fn new(submission: Submission, route: RoutePath, signals: RequestSignals) -> Self {
        Self {
            submission,
            route,
            signals,
        }
    }
}

/// Ways a policy can fail to produce a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A collaborator the policy depends on could not be reached.
    #[error("policy unavailable: {0}")]
    Unavailable(String),
    /// A collaborator answered with something that is not a verdict.
    #[error("invalid decision: {0}")]
    InvalidDecision(String),
    /// Any other fault inside the policy.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PolicyError {
    /// Stable machine-readable code placed in failure envelopes.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "policy_unavailable",
            Self::InvalidDecision(_) => "policy_invalid_decision",
            Self::Internal(_) => "policy_internal",
        }
    }

    /// Status the endpoint answers with for this failure.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Unavailable(_) => 502,
            Self::InvalidDecision(_) | Self::Internal(_) => 500,
        }
    }
}

/// Decision capability the endpoint delegates every attempt to.
///
/// Implementations own the entire verdict: status code, message, and any
/// extra fields. The endpoint never inspects them beyond basic sanity checks.
#[async_trait]
pub trait RiskPolicy: Send + Sync {
    /// Short name used in logs and failure envelopes.
    fn name(&self) -> &str;

    /// Produces a verdict for one attempt.
    async fn evaluate(&self, input: &PolicyInput) -> Result<VerdictEnvelope, PolicyError>;
}

/// Lets every attempt through with `200 {"message":"Login succeeded"}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

#[async_trait]
impl RiskPolicy for AllowAllPolicy {
    fn name(&self) -> &str {
        "allow_all"
    }

    async fn evaluate(&self, _input: &PolicyInput) -> Result<VerdictEnvelope, PolicyError> {
        Ok(VerdictEnvelope::allowed())
    }
}

/// Route pattern of a rule: `*`, `/prefix/*`, or an exact path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RouteMatcher {
    /// Matches every route.
    #[default]
    Any,
    /// Matches the base path and everything below it.
    Prefix(String),
    /// Matches one path exactly.
    Exact(String),
}

impl RouteMatcher {
    /// Whether the route satisfies this pattern.
    #[must_use]
    pub fn matches(&self, route: &RoutePath) -> bool {
        let path = route.as_str();
        match self {
            Self::Any => true,
            Self::Prefix(base) => {
                path == base
                    || path
                        .strip_prefix(base.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::Exact(exact) => path == exact,
        }
    }
}

impl From<String> for RouteMatcher {
    fn from(pattern: String) -> Self {
        let pattern = pattern.trim();
        if pattern.is_empty() || pattern == "*" {
            return Self::Any;
        }
        let normalized = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{pattern}")
        };
        match normalized.strip_suffix("/*") {
            Some(base) => Self::Prefix(base.to_string()),
            None => Self::Exact(normalized),
        }
    }
}

impl From<RouteMatcher> for String {
    fn from(matcher: RouteMatcher) -> Self {
        matcher.to_string()
    }
}

impl fmt::Display for RouteMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Prefix(base) => write!(f, "{base}/*"),
            Self::Exact(path) => f.write_str(path),
        }
    }
}

/// One entry of a [`RouteTablePolicy`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    /// Route pattern; defaults to every route.
    #[serde(default)]
    pub route: RouteMatcher,
    /// Case-insensitive substring the submitted email must contain.
    #[serde(default)]
    pub email_contains: Option<String>,
    /// Case-insensitive substring the user agent must contain.
    #[serde(default)]
    pub user_agent_contains: Option<String>,
    /// Verdict status.
    pub status: u16,
    /// Verdict message.
    pub message: String,
    /// Extra body fields passed through to the renderer.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl RouteRule {
    /// Rule answering `status` and `message` on routes matching `route`.
    #[must_use]
    pub fn new(route: &str, status: u16, message: impl Into<String>) -> Self {
        Self {
            route: RouteMatcher::from(route.to_string()),
            email_contains: None,
            user_agent_contains: None,
            status,
            message: message.into(),
            fields: Map::new(),
        }
    }

    /// Requires the email to contain a substring.
    #[must_use]
    pub fn with_email_contains(mut self, needle: impl Into<String>) -> Self {
        self.email_contains = Some(needle.into());
        self
    }

    /// Requires the user agent to contain a substring.
    #[must_use]
    pub fn with_user_agent_contains(mut self, needle: impl Into<String>) -> Self {
        self.user_agent_contains = Some(needle.into());
        self
    }

    /// Adds an extra body field.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Whether every condition of the rule holds for the input.
    #[must_use]
    pub fn matches(&self, input: &PolicyInput) -> bool {
        if !self.route.matches(&input.route) {
            return false;
        }
        if let Some(needle) = &self.email_contains {
            if !contains_folded(&input.submission.email, needle) {
                return false;
            }
        }
        if let Some(needle) = &self.user_agent_contains {
            let agent = input.signals.user_agent.as_deref().unwrap_or_default();
            if !contains_folded(agent, needle) {
                return false;
            }
        }
        true
    }

    /// Verdict this rule produces. The rule's message wins over a `message`
    /// entry in `fields`.
    #[must_use]
    pub fn envelope(&self) -> VerdictEnvelope {
        let mut body = VerdictBody::new(self.message.clone());
        for (key, value) in &self.fields {
            if key != MESSAGE_KEY {
                body.insert(key.clone(), value.clone());
            }
        }
        VerdictEnvelope::new(self.status, body)
    }

    /// Checks the rule can yield a well-formed verdict.
    pub fn validate(&self) -> Result<()> {
        if !(100..=999).contains(&self.status) {
            bail!("status {} outside 100..=999", self.status);
        }
        if self.message.trim().is_empty() {
            bail!("message must not be empty");
        }
        Ok(())
    }
}

/// First-match rule table with a fallback policy for unmatched attempts.
pub struct RouteTablePolicy {
    rules: Vec<RouteRule>,
    fallback: Arc<dyn RiskPolicy>,
}

impl RouteTablePolicy {
    /// Validates the rules and falls back to [`AllowAllPolicy`].
    pub fn new(rules: Vec<RouteRule>) -> Result<Self> {
        for (index, rule) in rules.iter().enumerate() {
            rule.validate()
                .with_context(|| format!("route rule #{index} ({})", rule.route))?;
        }
        Ok(Self {
            rules,
            fallback: Arc::new(AllowAllPolicy),
        })
    }

    /// Replaces the fallback policy.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Arc<dyn RiskPolicy>) -> Self {
        self.fallback = fallback;
        self
    }

    /// Configured rules in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

#[async_trait]
impl RiskPolicy for RouteTablePolicy {
    fn name(&self) -> &str {
        "route_table"
    }

    async fn evaluate(&self, input: &PolicyInput) -> Result<VerdictEnvelope, PolicyError> {
        match self.rules.iter().find(|rule| rule.matches(input)) {
            Some(rule) => Ok(rule.envelope()),
            None => self.fallback.evaluate(input).await,
        }
    }
}
