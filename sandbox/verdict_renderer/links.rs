use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::session::SessionParams;

/// Template placeholder for the workspace id.
pub const WORKSPACE_PLACEHOLDER: &str = "{workspace_id}";

/// Template placeholder for the rule-set id.
pub const RULE_SET_PLACEHOLDER: &str = "{rule_set_id}";

/// Target of a link that must not navigate anywhere.
pub const INERT_HREF: &str = "#";

/// URL templates for the external dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTemplates {
    /// Event investigation page; needs `{workspace_id}`.
    #[serde(default = "default_investigate")]
    pub investigate: String,
    /// Rule configuration page; needs both placeholders.
    #[serde(default = "default_configure_rules")]
    pub configure_rules: String,
}

fn default_investigate() -> String {
    "https://dashboard.fingerprint.com/workspaces/{workspace_id}/events".into()
}

fn default_configure_rules() -> String {
    "https://dashboard.fingerprint.com/workspaces/{workspace_id}/rulesets/{rule_set_id}".into()
}

impl Default for DashboardTemplates {
    fn default() -> Self {
        Self {
            investigate: default_investigate(),
            configure_rules: default_configure_rules(),
        }
    }
}

impl DashboardTemplates {
    /// Checks each template carries the placeholders its link needs.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.investigate.contains(WORKSPACE_PLACEHOLDER),
            "investigate template must contain {WORKSPACE_PLACEHOLDER}"
        );
        ensure!(
            self.configure_rules.contains(WORKSPACE_PLACEHOLDER)
                && self.configure_rules.contains(RULE_SET_PLACEHOLDER),
            "configure_rules template must contain {WORKSPACE_PLACEHOLDER} and {RULE_SET_PLACEHOLDER}"
        );
        Ok(())
    }
}

fn fill(template: &str, workspace_id: &str, rule_set_id: Option<&str>) -> String {
    let filled = template.replace(WORKSPACE_PLACEHOLDER, &urlencoding::encode(workspace_id));
    match rule_set_id {
        Some(rule_set_id) => filled.replace(RULE_SET_PLACEHOLDER, &urlencoding::encode(rule_set_id)),
        None => filled,
    }
}

/// A follow-up action that is either wired to the dashboard or inert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "href", rename_all = "lowercase")]
pub enum FollowUpLink {
    /// Shown but leads nowhere.
    Inert,
    /// Leads to the given dashboard URL.
    Active(String),
}

impl FollowUpLink {
    /// Link target; [`INERT_HREF`] when inert.
    #[must_use]
    pub fn href(&self) -> &str {
        match self {
            Self::Inert => INERT_HREF,
            Self::Active(href) => href,
        }
    }

    /// True when the link leads somewhere.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active(_))
    }
}

/// The two follow-up actions shown next to a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpLinks {
    /// Open the identification event.
    pub investigate: FollowUpLink,
    /// Configure blocking rules.
    pub configure_rules: FollowUpLink,
}

impl FollowUpLinks {
    /// Builds the links. Investigation needs a workspace id; rule
    /// configuration needs a workspace id and a rule-set id.
    #[must_use]
    pub fn build(params: &SessionParams, templates: &DashboardTemplates) -> Self {
        let Some(workspace_id) = params.workspace_id() else {
            return Self::inert();
        };
        let investigate = FollowUpLink::Active(fill(&templates.investigate, workspace_id, None));
        let configure_rules = params.rule_set_id().map_or(FollowUpLink::Inert, |rule_set_id| {
            FollowUpLink::Active(fill(&templates.configure_rules, workspace_id, Some(rule_set_id)))
        });
        Self {
            investigate,
            configure_rules,
        }
    }

    /// Both links inert.
    #[must_use]
    pub const fn inert() -> Self {
        Self {
            investigate: FollowUpLink::Inert,
            configure_rules: FollowUpLink::Inert,
        }
    }
}
