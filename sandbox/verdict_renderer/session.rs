use anyhow::{bail, Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use verdict_contract::RoutePath;

/// Query parameter naming the dashboard workspace.
pub const WORKSPACE_PARAM: &str = "workspaceId";

/// Query parameter naming the dashboard rule set.
pub const RULE_SET_PARAM: &str = "ruleSetId";

/// Ids carried in the page address, used only to build dashboard links.
///
/// Read once per page and never sent to the decision endpoint. Empty values
/// count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionParams {
    workspace_id: Option<String>,
    rule_set_id: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|value| !value.is_empty()).map(str::to_string)
}

impl SessionParams {
    /// Creates parameters, dropping empty values.
    #[must_use]
    pub fn new(workspace_id: Option<&str>, rule_set_id: Option<&str>) -> Self {
        Self {
            workspace_id: non_empty(workspace_id),
            rule_set_id: non_empty(rule_set_id),
        }
    }

    /// Reads the first occurrence of each parameter from a URL query.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        let first = |name: &str| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        };
        Self::new(
            first(WORKSPACE_PARAM).as_deref(),
            first(RULE_SET_PARAM).as_deref(),
        )
    }

    /// Workspace id, if present.
    #[must_use]
    pub fn workspace_id(&self) -> Option<&str> {
        self.workspace_id.as_deref()
    }

    /// Rule-set id, if present.
    #[must_use]
    pub fn rule_set_id(&self) -> Option<&str> {
        self.rule_set_id.as_deref()
    }
}

/// Address of a login page: where it lives, which route it shows, and the
/// session parameters it was opened with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAddress {
    url: Url,
    route: RoutePath,
    session: SessionParams,
}

impl PageAddress {
    /// Parses an absolute http(s) page URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw).with_context(|| format!("invalid page url {raw}"))?;
        Self::from_url(url)
    }

    /// Wraps an already parsed URL.
    pub fn from_url(url: Url) -> Result<Self> {
        if !matches!(url.scheme(), "http" | "https") {
            bail!("page url {url} must use http or https");
        }
        if url.host_str().is_none() {
            bail!("page url {url} has no host");
        }
        let route = RoutePath::from_slug(url.path());
        let session = SessionParams::from_url(&url);
        Ok(Self {
            url,
            route,
            session,
        })
    }

    /// Full page URL as given.
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Page route.
    #[must_use]
    pub const fn route(&self) -> &RoutePath {
        &self.route
    }

    /// Session parameters.
    #[must_use]
    pub const fn session(&self) -> &SessionParams {
        &self.session
    }

    /// Scheme, host and port.
    #[must_use]
    pub fn origin(&self) -> String {
        self.url.origin().ascii_serialization()
    }

    /// Decision endpoint for this page. Carries no query string.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("{}{}", self.origin(), self.route.api_path())
    }
}
