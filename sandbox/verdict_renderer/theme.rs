use anyhow::{bail, Result};

const STATUS_SLOT: &str = "{status}";

/// Copy table for one page skin. Skins differ only in wording; every skin
/// renders the same verdict the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    /// Lookup name.
    pub name: &'static str,
    /// Brand shown in the header.
    pub brand: &'static str,
    /// Header tagline.
    pub tagline: &'static str,
    /// Label of the route pill.
    pub route_label: &'static str,
    /// Banner title on the `login` route.
    pub welcome_title: &'static str,
    /// Banner text on the `login` route.
    pub welcome_body: &'static str,
    /// Heading of the sign-in card.
    pub sign_in_heading: &'static str,
    /// Submit button label when idle.
    pub submit_label: &'static str,
    /// Submit button label while a request is in flight.
    pub busy_label: &'static str,
    /// Title of the notice under the form.
    pub notice_title: &'static str,
    /// Title of the response panel.
    pub inspector_title: &'static str,
    /// Hint shown before the first submission.
    pub idle_hint: &'static str,
    /// Label of the transport error panel.
    pub client_error_label: &'static str,
    /// Caption for 2xx verdicts; `{status}` is replaced.
    pub allowed_caption: &'static str,
    /// Caption for all other verdicts; `{status}` is replaced.
    pub suspicious_caption: &'static str,
    /// Label of the investigation link.
    pub investigate_label: &'static str,
    /// Label of the rule configuration link.
    pub configure_label: &'static str,
}

impl Theme {
    /// The default skin.
    pub const SCAMAZ0N: Self = Self {
        name: "scamaz0n",
        brand: "scamaz0n",
        tagline: "fake login • real Fingerprint signals",
        route_label: "User Sandbox Route",
        welcome_title: "You Found the Scamaz0n Sandbox",
        welcome_body: "We didn't really expect anyone to just wander onto this URL. \
This Scamaz0n login is normally auto-provisioned for new Fingerprint users so they can \
see identification and smart signals in action without touching production code.",
        sign_in_heading: "Sign in to your Scamaz0n account",
        submit_label: "Sign in",
        busy_label: "Contacting Fingerprint…",
        notice_title: "Scamaz0n notice",
        inspector_title: "Fingerprint Session Inspector",
        idle_hint: "Submit the login form to see how Fingerprint-backed logic shapes the \
response. This panel always expects a JSON payload like: { \"message\": \"Login succeeded\", ... }",
        client_error_label: "CLIENT ERROR",
        allowed_caption: "This {status} response is currently allowed — but should this \
session really be welcome?",
        suspicious_caption: "This {status} response suggests a suspicious or blocked attempt. \
Open your Fingerprint dashboard to investigate this session, review identification events, \
and tune your rules.",
        investigate_label: "Explore identification event",
        configure_label: "Configure rules that stop malicious users",
    };

    /// Banking-flavoured skin.
    pub const PHISHBANK: Self = Self {
        name: "phishbank",
        brand: "phishbank",
        tagline: "fake vault • real Fingerprint signals",
        route_label: "Branch",
        welcome_title: "Welcome to the PhishBank Sandbox",
        welcome_body: "Nothing here holds real money. Every sign-in is scored by a risk policy \
so you can watch how Fingerprint signals shape the verdict.",
        sign_in_heading: "Sign in to online banking",
        submit_label: "Log in",
        busy_label: "Checking with Fingerprint…",
        notice_title: "PhishBank security notice",
        inspector_title: "Risk Verdict Inspector",
        idle_hint: "Log in to see the verdict returned for this session. The panel expects a \
JSON payload with at least a \"message\" field.",
        client_error_label: "CLIENT ERROR",
        allowed_caption: "This {status} response let the session in. Would your fraud team agree?",
        suspicious_caption: "This {status} response flags the session as risky. Investigate it \
in your Fingerprint dashboard and adjust the rules that produced it.",
        investigate_label: "Investigate this session",
        configure_label: "Adjust risk rules",
    };

    /// Neutral skin for terminals and tests.
    pub const PLAIN: Self = Self {
        name: "plain",
        brand: "verdict sandbox",
        tagline: "login verdict demo",
        route_label: "Route",
        welcome_title: "Verdict sandbox",
        welcome_body: "Submit a login attempt to see the verdict the configured policy returns.",
        sign_in_heading: "Sign in",
        submit_label: "Submit",
        busy_label: "Waiting for verdict…",
        notice_title: "Notice",
        inspector_title: "Verdict",
        idle_hint: "No attempt yet.",
        client_error_label: "CLIENT ERROR",
        allowed_caption: "Status {status}: allowed.",
        suspicious_caption: "Status {status}: not allowed.",
        investigate_label: "Investigate event",
        configure_label: "Configure rules",
    };

    /// All built-in skins.
    pub const BUILTIN: [Self; 3] = [Self::SCAMAZ0N, Self::PHISHBANK, Self::PLAIN];

    /// Looks a skin up by name, case-insensitively.
    pub fn by_name(name: &str) -> Result<Self> {
        let wanted = name.trim();
        match Self::BUILTIN
            .into_iter()
            .find(|theme| theme.name.eq_ignore_ascii_case(wanted))
        {
            Some(theme) => Ok(theme),
            None => bail!(
                "unknown theme {wanted}; expected one of {}",
                Self::BUILTIN.map(|theme| theme.name).join(", ")
            ),
        }
    }

    /// Caption under the raw response for a settled status.
    #[must_use]
    pub fn caption(&self, status: u16, allowed: bool) -> String {
        let template = if allowed {
            self.allowed_caption
        } else {
            self.suspicious_caption
        };
        template.replace(STATUS_SLOT, &status.to_string())
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::SCAMAZ0N
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(Theme::by_name("PhishBank").unwrap(), Theme::PHISHBANK);
        assert_eq!(Theme::by_name(" plain ").unwrap().name, "plain");
        let err = Theme::by_name("amazon").unwrap_err().to_string();
        assert!(err.contains("scamaz0n, phishbank, plain"), "{err}");
    }

    #[test]
    fn captions_embed_status() {
        let theme = Theme::default();
        assert!(theme.caption(200, true).starts_with("This 200 response is currently allowed"));
        assert!(theme
            .caption(403, false)
            .starts_with("This 403 response suggests a suspicious or blocked attempt."));
    }

    #[test]
    fn every_skin_has_status_slots() {
        for theme in Theme::BUILTIN {
            assert!(theme.allowed_caption.contains(STATUS_SLOT), "{}", theme.name);
            assert!(theme.suspicious_caption.contains(STATUS_SLOT), "{}", theme.name);
        }
    }
}
