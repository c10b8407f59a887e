use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    policy::{AllowAllPolicy, RiskPolicy, RouteRule, RouteTablePolicy},
    remote::{RemotePolicy, RemotePolicyConfig},
};

/// `[endpoint]` section of the sandbox configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Largest submission body accepted, in bytes.
    #[serde(default = "default_body_limit_bytes")]
    pub body_limit_bytes: usize,
    /// Risk policy answering every attempt.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            body_limit_bytes: default_body_limit_bytes(),
            policy: PolicyConfig::default(),
        }
    }
}

impl EndpointConfig {
    /// Checks limits and the policy definition.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.body_limit_bytes > 0, "body_limit_bytes must be positive");
        self.policy.validate()
    }
}

/// Which risk policy the endpoint delegates to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Every attempt succeeds.
    #[default]
    AllowAll,
    /// First-match rule table; unmatched attempts succeed.
    RouteTable {
        /// Rules in evaluation order.
        #[serde(default)]
        rules: Vec<RouteRule>,
    },
    /// External HTTP evaluator.
    Remote(RemotePolicyConfig),
}

impl PolicyConfig {
    /// Instantiates the configured policy.
    pub fn build(&self) -> Result<Arc<dyn RiskPolicy>> {
        let policy: Arc<dyn RiskPolicy> = match self {
            Self::AllowAll => Arc::new(AllowAllPolicy),
            Self::RouteTable { rules } => Arc::new(
                RouteTablePolicy::new(rules.clone()).context("building route table policy")?,
            ),
            Self::Remote(config) => Arc::new(
                RemotePolicy::new(config.clone()).context("building remote policy")?,
            ),
        };
        Ok(policy)
    }

    /// Checks the definition without building clients.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AllowAll => Ok(()),
            Self::RouteTable { rules } => {
                for (index, rule) in rules.iter().enumerate() {
                    rule.validate()
                        .with_context(|| format!("route rule #{index} ({})", rule.route))?;
                }
                Ok(())
            }
            Self::Remote(config) => config.validate().map(|_| ()),
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

const fn default_body_limit_bytes() -> usize {
    64 * 1024
}
