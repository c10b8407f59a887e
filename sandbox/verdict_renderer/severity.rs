use std::fmt;

use serde::{Deserialize, Serialize};

/// Presentation class of a verdict, derived from its status alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    /// 2xx.
    Success,
    /// 4xx.
    Warning,
    /// Everything else, including 1xx, 3xx, 5xx and nonsense codes.
    Danger,
}

impl SeverityTier {
    /// Classifies a status code.
    #[must_use]
    pub const fn classify(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            400..=499 => Self::Warning,
            _ => Self::Danger,
        }
    }

    /// Lower-case label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }

    /// True only for [`SeverityTier::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
