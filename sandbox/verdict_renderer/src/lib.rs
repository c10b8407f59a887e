#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Verdict renderer: posts login attempts and turns whatever comes back into
//! display state.
//!
//! The renderer does not know which policy produced a verdict. It classifies
//! the status into a severity tier, shows the body verbatim, and builds
//! follow-up dashboard links from the session parameters in the page address.

/// Status code to severity tier.
#[path = "../severity.rs"]
pub mod severity;

/// Page address and session parameters.
#[path = "../session.rs"]
pub mod session;

/// Dashboard follow-up links.
#[path = "../links.rs"]
pub mod links;

/// HTTP exchange with the decision endpoint.
#[path = "../transport.rs"]
pub mod transport;

/// Attempt state machine.
#[path = "../state.rs"]
pub mod state;

/// Copy tables for page skins.
#[path = "../theme.rs"]
pub mod theme;

/// Display state derived from the renderer state.
#[path = "../view.rs"]
pub mod view;

/// Placeholder identity generator.
#[path = "../identity.rs"]
pub mod identity;

/// Renderer configuration.
#[path = "../config.rs"]
pub mod config;

/// The renderer itself.
#[path = "../renderer.rs"]
pub mod renderer;

pub use config::RendererConfig;
pub use identity::{Identity, IdentityGenerator};
pub use links::{DashboardTemplates, FollowUpLink, FollowUpLinks, INERT_HREF};
pub use renderer::{VerdictRenderer, VerdictRendererBuilder};
pub use session::{PageAddress, SessionParams, RULE_SET_PARAM, WORKSPACE_PARAM};
pub use severity::SeverityTier;
pub use state::{AttemptId, RendererState, StateMachine, Transition};
pub use theme::Theme;
pub use transport::{HttpTransport, RawExchange, TransportError, VerdictTransport};
pub use view::{Badge, Notice, VerdictView};
