use std::fmt;

use serde::Serialize;

use crate::{
    links::{DashboardTemplates, FollowUpLinks},
    session::PageAddress,
    severity::SeverityTier,
    state::RendererState,
    theme::Theme,
};

const NO_REQUEST_LABEL: &str = "NO REQUEST YET";
const WELCOME_ROUTE: &str = "login";

/// Status badge. No tier until a status has been received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    /// `NO REQUEST YET` or `HTTP <status>`.
    pub label: String,
    /// Tier of the received status.
    pub tier: Option<SeverityTier>,
}

/// Notice under the form repeating the verdict message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Notice heading.
    pub title: String,
    /// Styling tier.
    pub tier: SeverityTier,
    /// Verdict message, verbatim.
    pub message: String,
}

/// Banner shown on the `login` route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WelcomeBanner {
    /// Banner heading.
    pub title: String,
    /// Banner text.
    pub body: String,
}

/// Everything a page shows for the current renderer state.
///
/// The tier only picks styling. Message and body fields are copied from the
/// server unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerdictView {
    /// Skin name.
    pub theme: String,
    /// Brand line.
    pub brand: String,
    /// Header tagline.
    pub tagline: String,
    /// Route pill label.
    pub route_label: String,
    /// Route pill value, `/` plus the pretty route.
    pub route: String,
    /// Present on the `login` route only.
    pub welcome: Option<WelcomeBanner>,
    /// Sign-in card heading.
    pub sign_in_heading: String,
    /// True while an exchange is in flight.
    pub busy: bool,
    /// Submit button label.
    pub button_label: String,
    /// Status badge.
    pub badge: Badge,
    /// Verdict notice, once resolved.
    pub notice: Option<Notice>,
    /// Transport error text, once failed.
    pub client_error: Option<String>,
    /// Hint shown while nothing is settled.
    pub idle_hint: Option<String>,
    /// Verdict message, once resolved.
    pub message: Option<String>,
    /// Title of the response panel.
    pub inspector_title: String,
    /// Endpoint path the attempt was posted to.
    pub api_path: String,
    /// Body as two-space indented JSON, once resolved.
    pub raw_json: Option<String>,
    /// Allowed or suspicious caption, once resolved.
    pub caption: Option<String>,
    /// Dashboard actions, once resolved.
    pub links: Option<FollowUpLinks>,
    #[serde(skip)]
    client_error_label: String,
    #[serde(skip)]
    investigate_label: String,
    #[serde(skip)]
    configure_label: String,
}

impl VerdictView {
    /// Derives the view for a page.
    #[must_use]
    pub fn derive(
        state: &RendererState,
        page: &PageAddress,
        theme: &Theme,
        templates: &DashboardTemplates,
    ) -> Self {
        let route = page.route();
        let welcome = (route.pretty() == WELCOME_ROUTE).then(|| WelcomeBanner {
            title: theme.welcome_title.to_string(),
            body: theme.welcome_body.to_string(),
        });
        let busy = state.is_pending();
        let mut view = Self {
            theme: theme.name.to_string(),
            brand: theme.brand.to_string(),
            tagline: theme.tagline.to_string(),
            route_label: theme.route_label.to_string(),
            route: format!("/{}", route.pretty()),
            welcome,
            sign_in_heading: theme.sign_in_heading.to_string(),
            busy,
            button_label: if busy { theme.busy_label } else { theme.submit_label }.to_string(),
            badge: Badge {
                label: NO_REQUEST_LABEL.to_string(),
                tier: None,
            },
            notice: None,
            client_error: None,
            idle_hint: None,
            message: None,
            inspector_title: theme.inspector_title.to_string(),
            api_path: route.api_path(),
            raw_json: None,
            caption: None,
            links: None,
            client_error_label: theme.client_error_label.to_string(),
            investigate_label: theme.investigate_label.to_string(),
            configure_label: theme.configure_label.to_string(),
        };
        match state {
            RendererState::Resolved { status, body, .. } => {
                let tier = SeverityTier::classify(*status);
                let message = body.message_text();
                view.badge = Badge {
                    label: format!("HTTP {status}"),
                    tier: Some(tier),
                };
                view.notice = Some(Notice {
                    title: theme.notice_title.to_string(),
                    tier,
                    message: message.clone(),
                });
                view.message = Some(message);
                view.raw_json = Some(body.to_pretty_json());
                view.caption = Some(theme.caption(*status, tier.is_success()));
                view.links = Some(FollowUpLinks::build(page.session(), templates));
            }
            RendererState::Failed { error, .. } => {
                view.client_error = Some(error.to_string());
            }
            RendererState::Idle | RendererState::Pending { .. } => {
                view.idle_hint = Some(theme.idle_hint.to_string());
            }
        }
        view
    }

    /// Plain-text rendering for terminals.
    #[must_use]
    pub fn render_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VerdictView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}  ·  {}", self.brand, self.tagline)?;
        writeln!(f, "{}: {}", self.route_label, self.route)?;
        if let Some(welcome) = &self.welcome {
            writeln!(f, "\n== {} ==\n{}", welcome.title, welcome.body)?;
        }
        writeln!(f, "\n{}", self.sign_in_heading)?;
        writeln!(f, "\n-- {} --", self.inspector_title)?;
        match self.badge.tier {
            Some(tier) => writeln!(f, "[{}] ({tier})", self.badge.label)?,
            None => writeln!(f, "[{}]", self.badge.label)?,
        }
        if self.busy {
            writeln!(f, "{}", self.button_label)?;
        }
        if let Some(error) = &self.client_error {
            writeln!(f, "{}: {error}", self.client_error_label)?;
        }
        if let Some(hint) = &self.idle_hint {
            writeln!(f, "{hint}")?;
        }
        if let Some(notice) = &self.notice {
            writeln!(f, "{} ({}): {}", notice.title, notice.tier, notice.message)?;
        }
        if let Some(raw) = &self.raw_json {
            writeln!(f, "\nRaw JSON  {}\n{raw}", self.api_path)?;
        }
        if let Some(caption) = &self.caption {
            writeln!(f, "\n{caption}")?;
        }
        if let Some(links) = &self.links {
            writeln!(f, "  -> {}: {}", self.investigate_label, links.investigate.href())?;
            writeln!(f, "  -> {}: {}", self.configure_label, links.configure_rules.href())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        state::StateMachine,
        transport::{RawExchange, TransportError},
    };

    fn page(url: &str) -> PageAddress {
        PageAddress::parse(url).unwrap()
    }

    fn resolved(status: u16, body: &str) -> RendererState {
        let mut machine = StateMachine::new();
        let attempt = machine.begin();
        machine.resolve(attempt, RawExchange::new(status, body));
        machine.state().clone()
    }

    #[test]
    fn idle_view_on_login_route() {
        let view = VerdictView::derive(
            &RendererState::Idle,
            &page("http://localhost:3000/"),
            &Theme::default(),
            &DashboardTemplates::default(),
        );
        assert_eq!(view.route, "/login");
        assert!(view.welcome.is_some());
        assert_eq!(view.sign_in_heading, "Sign in to your Scamaz0n account");
        let text = view.render_text();
        assert!(text.starts_with("scamaz0n  ·  fake login • real Fingerprint signals\n"));
        assert!(text.contains("Sign in to your Scamaz0n account"));
        assert!(text.contains("-- Fingerprint Session Inspector --\n[NO REQUEST YET]"));
        assert_eq!(view.badge.label, "NO REQUEST YET");
        assert_eq!(view.badge.tier, None);
        assert_eq!(view.button_label, "Sign in");
        assert!(view.idle_hint.is_some());
        assert!(view.links.is_none());
    }

    #[test]
    fn pending_view_is_busy() {
        let mut machine = StateMachine::new();
        machine.begin();
        let view = VerdictView::derive(
            machine.state(),
            &page("http://localhost:3000/checkout"),
            &Theme::default(),
            &DashboardTemplates::default(),
        );
        assert!(view.busy);
        assert_eq!(view.button_label, "Contacting Fingerprint…");
        assert!(view.welcome.is_none());
    }

    #[test]
    fn warning_verdict_passes_fields_through() {
        let state = resolved(403, r#"{"message":"Login blocked","reason":"bot","score":0.97}"#);
        let view = VerdictView::derive(
            &state,
            &page("http://localhost:3000/checkout?workspaceId=ws_1"),
            &Theme::default(),
            &DashboardTemplates::default(),
        );
        assert_eq!(view.badge.label, "HTTP 403");
        assert_eq!(view.badge.tier, Some(SeverityTier::Warning));
        let notice = view.notice.as_ref().unwrap();
        assert_eq!(notice.message, "Login blocked");
        assert_eq!(notice.tier, SeverityTier::Warning);
        assert_eq!(view.api_path, "/api/checkout");
        let raw = view.raw_json.as_deref().unwrap();
        assert!(raw.contains("\"reason\": \"bot\""));
        assert!(raw.contains("\"score\": 0.97"));
        assert!(view.caption.as_deref().unwrap().contains("suspicious or blocked"));
        let links = view.links.as_ref().unwrap();
        assert!(links.investigate.href().contains("ws_1"));
        assert_eq!(links.configure_rules.href(), "#");
    }

    #[test]
    fn message_less_body_shows_dash() {
        let state = resolved(200, r#"{"reason":"ok"}"#);
        let view = VerdictView::derive(
            &state,
            &page("http://localhost/"),
            &Theme::PLAIN,
            &DashboardTemplates::default(),
        );
        assert_eq!(view.message.as_deref(), Some("—"));
        assert_eq!(view.badge.tier, Some(SeverityTier::Success));
    }

    #[test]
    fn failed_view_shows_client_error_only() {
        let mut machine = StateMachine::new();
        let attempt = machine.begin();
        machine.fail(attempt, TransportError::Network("connection refused".into()));
        let view = VerdictView::derive(
            machine.state(),
            &page("http://localhost/"),
            &Theme::default(),
            &DashboardTemplates::default(),
        );
        assert_eq!(view.badge.label, "NO REQUEST YET");
        assert!(view.client_error.as_deref().unwrap().contains("connection refused"));
        assert!(view.notice.is_none());
        assert!(view.idle_hint.is_none());
        assert!(view.render_text().contains("CLIENT ERROR: network error"));
    }

    #[test]
    fn text_rendering_lists_links() {
        let state = resolved(500, r#"{"message":"Risk policy failure: down"}"#);
        let view = VerdictView::derive(
            &state,
            &page("http://localhost/?workspaceId=ws_1&ruleSetId=rs_7"),
            &Theme::default(),
            &DashboardTemplates::default(),
        );
        let text = view.render_text();
        assert!(text.contains("[HTTP 500] (danger)"));
        assert!(text.contains("Explore identification event: https://dashboard.fingerprint.com/workspaces/ws_1/events"));
        assert!(text.contains("rulesets/rs_7"));
    }
}
