//! The acquisition coordinator.
//!
//! [`Coordinator`] owns the readiness state, drives the backend through
//! permission, settings and subscription, filters incoming fixes and reports
//! everything the application has to act on to the registered [`Host`].
//!
//! # Driving the coordinator
//!
//! All methods take `&mut self` and return without waiting. Backend and host
//! operations complete later by posting an [`Event`] onto the receiver
//! returned from [`Coordinator::new`]; the owner feeds those back through
//! [`Coordinator::handle`]. [`CoordinatorService`](super::CoordinatorService)
//! does this inside a tokio task. Timed re-checks need a tokio runtime to be
//! current when they are armed.
//!
//! # Evaluation
//!
//! Every state change ends in one readiness evaluation, which takes exactly
//! one [`Action`] (see [`readiness`](super::readiness)). Host-facing prompts
//! are remembered so evaluating again without an intervening result does not
//! repeat them.

use tracing::{debug, error, info, trace, warn};

use super::backend::{LocationBackend, Platform};
use super::completion::{
    ConnectCompletion, Event, EventReceiver, EventSender, FixSink, PermissionCompletion,
    RequestToken, ResolutionCompletion, SettingsCompletion, SettingsOutcome, TokenSource,
};
use super::error::{DispatchError, ErrorKind};
use super::host::{Host, Notification, SettingsSurface};
use super::plausibility::{PlausibilityFilter, TrustWindow, Verdict};
use super::readiness::{AcquisitionState, Action, Readiness, SettingsStatus};
use super::recheck::{calculate_backoff, RecheckReason, RecheckTimer};
use super::state::{Fix, ProviderKind, UpdateRequest};
use crate::config::{ConfigError, CoordinatorConfig};

/// Location acquisition coordinator.
pub struct Coordinator<B: LocationBackend, P: Platform> {
    config: CoordinatorConfig,
    request: UpdateRequest,
    backend: B,
    platform: P,
    host: Option<Box<dyn Host>>,
    state: AcquisitionState,
    filter: PlausibilityFilter,
    best_fix: Option<Fix>,

    tokens: TokenSource,
    events: EventSender,
    pending_connect: Option<RequestToken>,
    pending_permission: Option<RequestToken>,
    pending_resolution: Option<RequestToken>,
    subscription: Option<RequestToken>,

    recheck: RecheckTimer,
    transient_failures: u32,
    /// Last host-facing action taken; suppresses repeats until state changes.
    last_prompt: Option<Action>,
    /// The developer mock flag has reached a host this session.
    mock_flag_reported: bool,
}

impl<B: LocationBackend, P: Platform> Coordinator<B, P> {
    /// Create a coordinator and the event receiver its completions post to.
    ///
    /// The availability poll and the settings retry are spawned onto the
    /// current tokio runtime. Without one they are skipped with a warning and
    /// only host calls and backend completions drive evaluation.
    pub fn new(
        config: CoordinatorConfig,
        backend: B,
        platform: P,
    ) -> Result<(Self, EventReceiver), ConfigError> {
        config.validate()?;

        let (events, events_rx) = tokio::sync::mpsc::unbounded_channel();
        let request = config.update_request();

        info!(
            accuracy = %config.accuracy,
            interval_ms = config.update_interval.as_millis() as u64,
            allow_mock_fixes = config.allow_mock_fixes,
            "Location coordinator created"
        );

        let coordinator = Self {
            config,
            request,
            backend,
            platform,
            host: None,
            state: AcquisitionState::default(),
            filter: PlausibilityFilter::new(),
            best_fix: None,
            tokens: TokenSource::default(),
            recheck: RecheckTimer::new(events.clone()),
            events,
            pending_connect: None,
            pending_permission: None,
            pending_resolution: None,
            subscription: None,
            transient_failures: 0,
            last_prompt: None,
            mock_flag_reported: false,
        };

        Ok((coordinator, events_rx))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Sample the mock developer flag and connect to the backend.
    ///
    /// No-op while a connection attempt is outstanding. If the backend is
    /// already connected the readiness is evaluated instead.
    pub fn start(&mut self) {
        if self.pending_connect.is_some() {
            debug!("Location backend connection already in progress");
            return;
        }

        self.state.mock_providers_enabled = self.platform.mock_locations_enabled();
        self.report_mock_flag();

        if self.backend.is_connected() {
            debug!("Location backend already connected");
            self.evaluate();
            return;
        }

        let token = self.tokens.next_token();
        self.pending_connect = Some(token);
        info!("Connecting to location backend");
        self.backend
            .connect(ConnectCompletion::new(token, self.events.clone()));
    }

    /// Attach a host, replacing any registered one.
    pub fn register(&mut self, host: Box<dyn Host>) {
        debug!("Host registered");
        self.host = Some(host);
        self.recheck.cancel();
        self.transient_failures = 0;
        self.last_prompt = None;

        self.report_mock_flag();
        self.deliver_last_known_fix();
        self.evaluate();
    }

    /// Detach the host. Later notifications are logged and dropped.
    pub fn unregister(&mut self) {
        if self.host.take().is_some() {
            debug!("Host unregistered");
        }
    }

    /// Unsubscribe, disconnect and clear the readiness gates. Idempotent.
    ///
    /// An outstanding connection attempt is abandoned and the backend told to
    /// disconnect. The denial count and the trust window survive; the
    /// developer mock flag is reported again on the next `start()`.
    pub fn stop(&mut self) {
        self.recheck.cancel();

        if self.subscription.take().is_some() {
            self.backend.unsubscribe_updates();
        }
        if self.pending_connect.take().is_some() || self.backend.is_connected() {
            self.backend.disconnect();
            info!("Disconnected from location backend");
        }

        self.mock_flag_reported = false;
        self.pending_permission = None;
        self.pending_resolution = None;
        self.state.reset_gates();
        self.transient_failures = 0;
        self.last_prompt = None;
    }

    /// Clear the readiness gates and evaluate again without disconnecting.
    ///
    /// Hosts call this when returning from a settings screen.
    pub fn reset(&mut self) {
        debug!("Resetting acquisition state");
        self.recheck.cancel();

        if self.subscription.take().is_some() {
            self.backend.unsubscribe_updates();
        }

        self.pending_resolution = None;
        self.state.reset_gates();
        self.transient_failures = 0;
        self.last_prompt = None;
        self.evaluate();
    }

    // =========================================================================
    // Host requests
    // =========================================================================

    /// Ask the host to show the permission prompt.
    pub fn request_permission(&mut self) {
        if self.state.permission_permanently_denied() {
            self.emit(Notification::PermanentlyDeclinedPermission {
                surface: SettingsSurface::AppDetails,
            });
            return;
        }

        let token = self.tokens.next_token();
        let completion = PermissionCompletion::new(token, self.events.clone());
        match self.host.as_mut() {
            Some(host) => {
                self.pending_permission = Some(token);
                host.show_permission_prompt(completion);
            }
            None => error!("Permission requested with no host registered"),
        }
    }

    /// Like [`request_permission`](Self::request_permission), but emit
    /// `ExplainPermission` first when the platform asks for a rationale.
    pub fn request_permission_explained(&mut self) {
        if self.state.permission_granted {
            return;
        }
        if self.host.is_none() {
            error!("Permission requested with no host registered");
            return;
        }

        if self.platform.should_show_permission_rationale() {
            self.emit(Notification::ExplainPermission);
        } else {
            self.request_permission();
        }
    }

    /// Ask the host to run the resolution flow for the last settings failure.
    ///
    /// If the flow cannot be launched, an `Error(Settings)` is emitted and the
    /// settings are treated as unresolvable.
    pub fn request_settings_resolution(&mut self) {
        let SettingsStatus::Resolvable(resolution) = self.state.settings.clone() else {
            debug!(settings = ?self.state.settings, "No settings resolution pending");
            return;
        };

        let token = self.tokens.next_token();
        let completion = ResolutionCompletion::new(token, self.events.clone());
        let result = match self.host.as_mut() {
            Some(host) => host.start_settings_resolution(&resolution, completion),
            None => Err(DispatchError::HostUnavailable),
        };

        match result {
            Ok(()) => {
                self.pending_resolution = Some(token);
                debug!(resolution = resolution.id, "Settings resolution started");
            }
            Err(e) => {
                warn!(error = %e, "Settings resolution could not be launched");
                self.emit(Notification::Error {
                    kind: ErrorKind::Settings,
                    message: format!("Could not resolve location settings issue: {}", e),
                });
                self.state.settings = SettingsStatus::Unresolvable;
                self.state_changed();
            }
        }
    }

    // =========================================================================
    // Results
    // =========================================================================

    /// Apply the result of a permission prompt. Returns whether the
    /// permission is now granted.
    pub fn on_permission_result(&mut self, token: RequestToken, granted: bool) -> bool {
        if self.pending_permission != Some(token) {
            debug!(token = token.id(), "Ignoring stale permission result");
            return self.state.permission_granted;
        }
        self.pending_permission = None;

        if granted {
            info!("Location permission granted");
            self.state.permission_granted = true;
            self.state_changed();
            return true;
        }

        let denials = self.state.record_denial();
        info!(denials, "Location permission denied");
        if self.state.permission_permanently_denied() {
            self.last_prompt = None;
            self.emit(Notification::PermanentlyDeclinedPermission {
                surface: SettingsSurface::AppDetails,
            });
        } else {
            self.state_changed();
        }
        false
    }

    /// Apply the result of a settings resolution flow.
    pub fn on_settings_resolution_result(&mut self, token: RequestToken, accepted: bool) {
        if self.pending_resolution != Some(token) {
            debug!(token = token.id(), "Ignoring stale settings resolution result");
            return;
        }
        self.pending_resolution = None;

        info!(accepted, "Settings resolution finished");
        if accepted {
            self.settings_satisfied();
        }
        self.state_changed();
    }

    /// Route one event from the coordinator's event channel.
    pub fn handle(&mut self, event: Event) {
        match event {
            Event::Connected { token } => self.on_connected(token),
            Event::ConnectionFailed { token, description } => {
                self.on_connection_failed(token, description)
            }
            Event::SettingsChecked { token, outcome } => self.on_settings_checked(token, outcome),
            Event::PermissionResult { token, granted } => {
                self.on_permission_result(token, granted);
            }
            Event::ResolutionResult { token, accepted } => {
                self.on_settings_resolution_result(token, accepted)
            }
            Event::Fix { subscription, fix } => {
                if self.subscription == Some(subscription) {
                    self.on_fix(fix);
                } else {
                    trace!(subscription = subscription.id(), "Dropping fix from old subscription");
                }
            }
            Event::Recheck { token } => match self.recheck.fire(token) {
                Some(RecheckReason::SettingsRetry) => {
                    if self.state.settings == SettingsStatus::Unresolvable {
                        debug!("Retrying settings check");
                        self.state.settings = SettingsStatus::Unchecked;
                    }
                    self.evaluate();
                }
                Some(RecheckReason::Poll) => self.evaluate(),
                None => trace!(token = token.id(), "Ignoring stale re-check"),
            },
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Last accepted fix.
    pub fn best_fix(&self) -> Option<&Fix> {
        self.best_fix.as_ref()
    }

    pub fn state(&self) -> &AcquisitionState {
        &self.state
    }

    pub fn readiness(&self) -> Readiness {
        self.state.readiness(self.is_connected())
    }

    pub fn trust_window(&self) -> &TrustWindow {
        self.filter.window()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn has_host(&self) -> bool {
        self.host.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    // =========================================================================
    // Backend completions
    // =========================================================================

    fn on_connected(&mut self, token: RequestToken) {
        if self.pending_connect != Some(token) {
            debug!(token = token.id(), "Ignoring stale connection result");
            return;
        }
        self.pending_connect = None;
        info!("Connected to location backend");
        self.evaluate();
    }

    fn on_connection_failed(&mut self, token: RequestToken, description: String) {
        if self.pending_connect != Some(token) {
            debug!(token = token.id(), "Ignoring stale connection failure");
            return;
        }
        self.pending_connect = None;
        warn!(%description, "Location backend connection failed");
        self.emit(Notification::Error {
            kind: ErrorKind::Retrieval,
            message: format!("Could not connect to location backend: {}", description),
        });
    }

    fn on_settings_checked(&mut self, token: RequestToken, outcome: SettingsOutcome) {
        if self.state.settings != SettingsStatus::Checking(token) {
            debug!(token = token.id(), "Ignoring stale settings result");
            return;
        }

        debug!(?outcome, "Settings check finished");
        match outcome {
            SettingsOutcome::Satisfied => self.settings_satisfied(),
            SettingsOutcome::ResolutionRequired(resolution) => {
                self.state.settings = SettingsStatus::Resolvable(resolution);
            }
            SettingsOutcome::ChangeUnavailable => {
                self.state.settings = SettingsStatus::Unresolvable;
            }
        }
        self.state_changed();
    }

    fn on_fix(&mut self, fix: Option<Fix>) {
        let Some(fix) = fix else {
            return;
        };

        let verdict = self
            .filter
            .classify(&fix, self.state.mock_providers_enabled);
        if self.config.verbose {
            info!(lat = fix.latitude, lon = fix.longitude, source = %fix.source, ?verdict, "Fix classified");
        } else {
            trace!(lat = fix.latitude, lon = fix.longitude, source = %fix.source, ?verdict, "Fix classified");
        }

        if verdict == Verdict::Implausible && !self.config.allow_mock_fixes {
            self.emit(Notification::MockDetected {
                surface: SettingsSurface::DeveloperOptions,
            });
            return;
        }

        self.best_fix = Some(fix.clone());
        self.emit(Notification::NewFix(fix));
    }

    fn settings_satisfied(&mut self) {
        self.state.settings = SettingsStatus::Ok;
        self.transient_failures = 0;
        self.deliver_last_known_fix();
    }

    fn deliver_last_known_fix(&mut self) {
        if !self.is_connected() || !self.state.permission_granted || !self.state.settings_ok() {
            return;
        }

        match self.backend.last_known_fix() {
            Ok(Some(fix)) => self.on_fix(Some(fix)),
            Ok(None) => trace!("No last known fix"),
            Err(e) => {
                warn!(error = %e, "Last known fix unavailable");
                self.emit(Notification::Error {
                    kind: ErrorKind::Retrieval,
                    message: format!("Could not retrieve initial location: {}", e),
                });
            }
        }
    }

    // =========================================================================
    // Evaluation
    // =========================================================================

    fn is_connected(&self) -> bool {
        self.pending_connect.is_none() && self.backend.is_connected()
    }

    /// A result arrived; prompts may be shown again.
    fn state_changed(&mut self) {
        self.last_prompt = None;
        self.evaluate();
    }

    fn evaluate(&mut self) {
        if !self.state.permission_granted && self.platform.has_location_permission() {
            debug!("Location permission present on platform");
            self.state.permission_granted = true;
        }

        let readiness = self.readiness();
        let action = readiness.action();
        trace!(?readiness, ?action, "Evaluated readiness");

        match action {
            Action::RequestPermission => self.prompt(action, Notification::NeedPermission),
            Action::CheckSettings => self.check_settings(),
            Action::RequestSettingsChange => self.prompt(action, Notification::NeedSettingsChange),
            Action::FallBackToSystemSettings => self.fall_back_to_system_settings(),
            Action::Subscribe => self.subscribe(),
            Action::VerifyAvailability => self.verify_availability(),
            Action::None => {}
        }
    }

    fn check_settings(&mut self) {
        let token = self.tokens.next_token();
        self.state.settings = SettingsStatus::Checking(token);
        debug!(priority = ?self.request.priority, "Checking location settings");
        self.backend.check_settings(
            &self.request,
            SettingsCompletion::new(token, self.events.clone()),
        );
    }

    fn fall_back_to_system_settings(&mut self) {
        if self.any_provider_enabled() {
            if self.recheck.armed_reason() == Some(RecheckReason::SettingsRetry) {
                return;
            }
            self.transient_failures = self.transient_failures.saturating_add(1);
            let delay = calculate_backoff(self.transient_failures, self.config.max_backoff);
            info!(
                attempt = self.transient_failures,
                delay_secs = delay.as_secs(),
                "Settings unsatisfied with a provider enabled, retrying"
            );
            let token = self.tokens.next_token();
            self.recheck.arm(token, delay, RecheckReason::SettingsRetry);
            return;
        }

        self.prompt(
            Action::FallBackToSystemSettings,
            Notification::FallBackToSystemSettings {
                surface: SettingsSurface::LocationSources,
            },
        );
    }

    fn subscribe(&mut self) {
        if self.last_prompt == Some(Action::Subscribe) {
            return;
        }

        let token = self.tokens.next_token();
        let sink = FixSink::new(token, self.events.clone());
        match self.backend.subscribe_updates(&self.request, sink) {
            Ok(()) => {
                info!(
                    interval_ms = self.request.interval.as_millis() as u64,
                    "Subscribed to location updates"
                );
                self.subscription = Some(token);
                self.state.updates_subscribed = true;
                self.arm_poll();
            }
            Err(e) => {
                warn!(error = %e, "Location update subscription failed");
                self.last_prompt = Some(Action::Subscribe);
                self.emit(Notification::Error {
                    kind: ErrorKind::Retrieval,
                    message: format!("Could not request location updates: {}", e),
                });
            }
        }
    }

    fn verify_availability(&mut self) {
        match self.backend.is_positioning_available() {
            Ok(true) => {
                if self.last_prompt == Some(Action::FallBackToSystemSettings) {
                    self.last_prompt = None;
                }
            }
            Ok(false) => {
                if self.any_provider_enabled() {
                    debug!("Positioning unavailable with a provider enabled");
                } else {
                    self.prompt(
                        Action::FallBackToSystemSettings,
                        Notification::FallBackToSystemSettings {
                            surface: SettingsSurface::LocationSources,
                        },
                    );
                }
            }
            Err(e) => {
                warn!(error = %e, "Location availability check failed");
                self.recheck.cancel();
                if self.last_prompt != Some(Action::VerifyAvailability) {
                    self.last_prompt = Some(Action::VerifyAvailability);
                    self.emit(Notification::Error {
                        kind: ErrorKind::Retrieval,
                        message: format!("Could not check location availability: {}", e),
                    });
                }
                return;
            }
        }
        self.arm_poll();
    }

    fn arm_poll(&mut self) {
        let token = self.tokens.next_token();
        self.recheck
            .arm(token, self.config.recheck_interval, RecheckReason::Poll);
    }

    fn any_provider_enabled(&self) -> bool {
        ProviderKind::ALL
            .iter()
            .any(|&provider| self.platform.is_provider_enabled(provider))
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn prompt(&mut self, action: Action, notification: Notification) {
        if self.last_prompt == Some(action) {
            trace!(?action, "Prompt already shown");
            return;
        }
        self.last_prompt = Some(action);
        self.emit(notification);
    }

    fn report_mock_flag(&mut self) {
        if self.state.mock_providers_enabled && !self.mock_flag_reported {
            self.mock_flag_reported = self.emit(Notification::MockDetected {
                surface: SettingsSurface::DeveloperOptions,
            });
        }
    }

    /// Send a notification to the host. Returns false if none is registered.
    fn emit(&mut self, notification: Notification) -> bool {
        match self.host.as_mut() {
            Some(host) => {
                debug!(notification = notification.name(), "Notifying host");
                host.notify(notification);
                true
            }
            None => {
                if matches!(notification, Notification::NewFix(_)) {
                    debug!("No host registered, dropping fix");
                } else {
                    warn!(notification = notification.name(), "No host registered, dropping notification");
                }
                false
            }
        }
    }
}
