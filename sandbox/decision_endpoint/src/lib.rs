#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Decision endpoint: accepts login submissions and answers with whatever
//! verdict the configured risk policy produces.

/// Ambient request signals handed to policies.
#[path = "../signals.rs"]
pub mod signals;

/// Risk policy capability and the in-process policies.
#[path = "../policy.rs"]
pub mod policy;

/// Policy delegating to an external HTTP evaluator.
#[path = "../remote.rs"]
pub mod remote;

/// Fail-safe evaluator wrapping a policy.
#[path = "../endpoint.rs"]
pub mod endpoint;

/// axum router and server loop.
#[path = "../server.rs"]
pub mod server;

/// Endpoint configuration.
#[path = "../config.rs"]
pub mod config;

pub use config::{EndpointConfig, PolicyConfig};
pub use endpoint::DecisionEndpoint;
pub use policy::{
    AllowAllPolicy, PolicyError, PolicyInput, RiskPolicy, RouteMatcher, RouteRule,
    RouteTablePolicy,
};
pub use remote::{RemotePolicy, RemotePolicyConfig};
pub use server::{router, serve};
pub use signals::RequestSignals;
