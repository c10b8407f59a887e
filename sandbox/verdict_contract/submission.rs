use serde::{Deserialize, Serialize};

use crate::route::RoutePath;

/// Login attempt posted by a page.
///
/// The identity strings are bait: they are never validated, stored, or
/// compared against anything. Missing fields deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Submission {
    /// Email-like identity string.
    pub email: String,
    /// Secret-like identity string.
    pub password: String,
    /// Where the attempt came from.
    pub meta: SubmissionMeta,
}

/// Request metadata describing the originating page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SubmissionMeta {
    /// Page path the attempt was made from.
    pub page_path: String,
}

impl Submission {
    /// Creates a submission for a page route.
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>, route: &RoutePath) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            meta: SubmissionMeta {
                page_path: route.as_str().to_string(),
            },
        }
    }
}
