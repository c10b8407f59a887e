#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

//! Verdict contract: the submission a login page posts and the status-coded
//! envelope a risk policy answers with.

/// Logical page routes and their endpoint paths.
#[path = "../route.rs"]
pub mod route;

/// Login attempt payload.
#[path = "../submission.rs"]
pub mod submission;

/// Verdict envelope and its opaque body.
#[path = "../envelope.rs"]
pub mod envelope;

pub use envelope::{
    VerdictBody, VerdictEnvelope, ABSENT_MESSAGE, DEFAULT_ALLOW_MESSAGE, MESSAGE_KEY,
    MISSING_BODY_MESSAGE,
};
pub use route::{RoutePath, API_PREFIX};
pub use submission::{Submission, SubmissionMeta};
