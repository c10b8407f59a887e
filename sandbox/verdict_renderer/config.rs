use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{links::DashboardTemplates, theme::Theme, transport::HttpTransport};

/// `[renderer]` section of the sandbox configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Skin name.
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Exchange timeout in milliseconds; `0` waits indefinitely.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Dashboard link templates.
    #[serde(default)]
    pub dashboard: DashboardTemplates,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            timeout_ms: default_timeout_ms(),
            dashboard: DashboardTemplates::default(),
        }
    }
}

fn default_theme() -> String {
    Theme::SCAMAZ0N.name.to_string()
}

const fn default_timeout_ms() -> u64 {
    4_000
}

impl RendererConfig {
    /// Checks the theme exists and the templates carry their placeholders.
    pub fn validate(&self) -> Result<()> {
        self.resolve_theme()?;
        self.dashboard
            .validate()
            .context("invalid renderer.dashboard templates")
    }

    /// Configured skin.
    pub fn resolve_theme(&self) -> Result<Theme> {
        Theme::by_name(&self.theme).context("invalid renderer.theme")
    }

    /// Exchange timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        if self.timeout_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.timeout_ms))
        }
    }

    /// HTTP transport honouring the timeout.
    pub fn transport(&self) -> Result<HttpTransport> {
        HttpTransport::new(self.timeout())
    }
}
