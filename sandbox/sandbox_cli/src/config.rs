use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use decision_endpoint::EndpointConfig;
use serde::{Deserialize, Serialize};
use shared_telemetry::{FileEventPublisher, LogLevel, Telemetry};
use verdict_renderer::RendererConfig;

/// Whole sandbox document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SandboxConfig {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SandboxConfig {
    /// Loads and validates a TOML file. Relative telemetry paths resolve
    /// against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading sandbox config {}", path.display()))?;
        let mut config: Self =
            toml::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
        let source_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.telemetry.resolve_relative_to(&source_dir);
        config
            .validate()
            .with_context(|| format!("validating {}", path.display()))?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint.validate().context("invalid [endpoint]")?;
        self.renderer.validate().context("invalid [renderer]")?;
        self.telemetry.level().context("invalid [telemetry]")?;
        Ok(())
    }
}

/// `[telemetry]` section. Sinks are disabled unless a path is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub log_path: Option<PathBuf>,
    #[serde(default)]
    pub event_log: Option<PathBuf>,
    #[serde(default = "default_min_level")]
    pub min_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            event_log: None,
            min_level: default_min_level(),
        }
    }
}

fn default_min_level() -> String {
    "info".into()
}

impl TelemetryConfig {
    pub fn level(&self) -> Result<LogLevel> {
        self.min_level.parse()
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.log_path, &mut self.event_log].into_iter().flatten() {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Telemetry handle for one component.
    pub fn build(&self, module: &str) -> Result<Telemetry> {
        let mut builder = Telemetry::builder(module).min_level(self.level()?);
        if let Some(path) = &self.log_path {
            builder = builder.log_path(path);
        }
        if let Some(path) = &self.event_log {
            let publisher = FileEventPublisher::new(path)
                .with_context(|| format!("opening event log {}", path.display()))?;
            builder = builder.event_publisher(Arc::new(publisher));
        }
        builder
            .build()
            .with_context(|| format!("building telemetry for {module}"))
    }
}
