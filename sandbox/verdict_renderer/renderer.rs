use std::sync::Arc;

use anyhow::Result;
use parking_lot::Mutex;
use serde_json::{json, Value};
use shared_telemetry::{LogLevel, Telemetry};
use tokio::sync::watch;
use tracing::{debug, warn};
use verdict_contract::Submission;

use crate::{
    identity::{Identity, IdentityGenerator},
    links::{DashboardTemplates, FollowUpLinks},
    session::PageAddress,
    state::{AttemptId, RendererState, StateMachine, Transition},
    theme::Theme,
    transport::{HttpTransport, VerdictTransport},
    view::VerdictView,
};

struct Inner {
    machine: StateMachine,
    identity: Identity,
    generator: IdentityGenerator,
}

/// Builder for [`VerdictRenderer`].
pub struct VerdictRendererBuilder {
    page: PageAddress,
    transport: Option<Arc<dyn VerdictTransport>>,
    theme: Theme,
    templates: DashboardTemplates,
    identity: Option<Identity>,
    generator: Option<IdentityGenerator>,
    telemetry: Option<Telemetry>,
}

impl VerdictRendererBuilder {
    /// Starts a builder for a page.
    #[must_use]
    pub fn new(page: PageAddress) -> Self {
        Self {
            page,
            transport: None,
            theme: Theme::default(),
            templates: DashboardTemplates::default(),
            identity: None,
            generator: None,
            telemetry: None,
        }
    }

    /// Sets the transport. Defaults to [`HttpTransport`] without a timeout.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn VerdictTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the skin.
    #[must_use]
    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Sets the dashboard link templates.
    #[must_use]
    pub fn dashboard(mut self, templates: DashboardTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// Sets the initial identity instead of generating one.
    #[must_use]
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Sets the identity generator.
    #[must_use]
    pub fn generator(mut self, generator: IdentityGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Records a log line and an event per settled attempt.
    #[must_use]
    pub fn telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Builds the renderer in the idle state.
    pub fn build(self) -> Result<VerdictRenderer> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(None)?),
        };
        let mut generator = self.generator.unwrap_or_default();
        let identity = self.identity.unwrap_or_else(|| generator.generate());
        let (updates, _) = watch::channel(RendererState::Idle);
        Ok(VerdictRenderer {
            page: self.page,
            transport,
            theme: self.theme,
            templates: self.templates,
            telemetry: self.telemetry,
            inner: Mutex::new(Inner {
                machine: StateMachine::new(),
                identity,
                generator,
            }),
            updates,
        })
    }
}

/// Client surface for one login page.
///
/// `submit` may be called concurrently; the most recent submission always
/// determines the shown state and older responses are discarded on arrival.
/// The state lock is never held across the exchange.
pub struct VerdictRenderer {
    page: PageAddress,
    transport: Arc<dyn VerdictTransport>,
    theme: Theme,
    templates: DashboardTemplates,
    telemetry: Option<Telemetry>,
    inner: Mutex<Inner>,
    updates: watch::Sender<RendererState>,
}

impl VerdictRenderer {
    /// Returns a builder.
    #[must_use]
    pub fn builder(page: PageAddress) -> VerdictRendererBuilder {
        VerdictRendererBuilder::new(page)
    }

    /// Page this renderer serves.
    #[must_use]
    pub const fn page(&self) -> &PageAddress {
        &self.page
    }

    /// Active skin.
    #[must_use]
    pub const fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Posts the current identity and applies the outcome.
    pub async fn submit(&self) -> Transition {
        let (attempt, submission) = {
            let mut inner = self.inner.lock();
            let attempt = inner.machine.begin();
            let submission = Submission::new(
                inner.identity.email.clone(),
                inner.identity.password.clone(),
                self.page.route(),
            );
            self.updates.send_replace(inner.machine.state().clone());
            (attempt, submission)
        };
        let url = self.page.api_url();
        debug!(%attempt, %url, "submitting login attempt");
        let outcome = self.transport.exchange(&url, &submission).await;
        let summary = match &outcome {
            Ok(exchange) => json!({ "status": exchange.status }),
            Err(err) => json!({ "error": err.to_string() }),
        };
        let transition = {
            let mut inner = self.inner.lock();
            let transition = match outcome {
                Ok(exchange) => inner.machine.resolve(attempt, exchange),
                Err(err) => inner.machine.fail(attempt, err),
            };
            if transition == Transition::Applied {
                self.updates.send_replace(inner.machine.state().clone());
            }
            transition
        };
        self.record(attempt, transition, summary).await;
        transition
    }

    /// Snapshot of the current state.
    #[must_use]
    pub fn state(&self) -> RendererState {
        self.inner.lock().machine.state().clone()
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RendererState> {
        self.updates.subscribe()
    }

    /// Identity the next submission will carry.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.inner.lock().identity.clone()
    }

    /// Replaces the identity, as a user typing into the form would.
    pub fn set_identity(&self, identity: Identity) {
        self.inner.lock().identity = identity;
    }

    /// Draws a fresh placeholder identity and uses it.
    pub fn regenerate_identity(&self) -> Identity {
        let mut inner = self.inner.lock();
        let identity = inner.generator.generate();
        inner.identity = identity.clone();
        identity
    }

    /// Follow-up links for this page's session parameters.
    #[must_use]
    pub fn links(&self) -> FollowUpLinks {
        FollowUpLinks::build(self.page.session(), &self.templates)
    }

    /// Display state for the current state.
    #[must_use]
    pub fn view(&self) -> VerdictView {
        VerdictView::derive(&self.state(), &self.page, &self.theme, &self.templates)
    }

    async fn record(&self, attempt: AttemptId, transition: Transition, mut summary: Value) {
        let (event_type, level) = match transition {
            Transition::Stale => ("renderer.attempt.stale", LogLevel::Debug),
            Transition::Applied if summary.get("error").is_some() => {
                ("renderer.attempt.failed", LogLevel::Warn)
            }
            Transition::Applied => ("renderer.attempt.resolved", LogLevel::Info),
        };
        debug!(%attempt, event_type, "attempt settled");
        let Some(telemetry) = &self.telemetry else {
            return;
        };
        if let Value::Object(fields) = &mut summary {
            fields.insert("attempt".into(), json!(attempt.value()));
            fields.insert("route".into(), json!(self.page.route()));
        }
        if let Err(err) = telemetry.log(level, event_type, summary.clone()) {
            warn!(error = %err, "renderer log write failed");
        }
        if let Err(err) = telemetry.emit(event_type, summary).await {
            warn!(error = %err, "renderer event publish failed");
        }
    }
}
