//! Scripted collaborators shared by the integration tests.
//!
//! The coordinator owns its backend and platform, so both keep their state
//! behind an `Arc<Mutex<_>>` the test can still reach once the coordinator
//! has moved into a `CoordinatorService`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedReceiver;

use fixgate::acquisition::{
    BackendError, ConnectCompletion, Fix, FixSink, HostEvent, LocationBackend, Notification,
    Platform, ProviderKind, SettingsCompletion, SettingsOutcome, UpdateRequest,
};

#[derive(Debug)]
pub struct BackendScript {
    pub connected: bool,
    pub settings_outcome: SettingsOutcome,
    pub settings_checks: usize,
    pub last_request: Option<UpdateRequest>,
    pub sink: Option<FixSink>,
    pub last_known: Option<Fix>,
    pub available: bool,
}

impl Default for BackendScript {
    fn default() -> Self {
        Self {
            connected: false,
            settings_outcome: SettingsOutcome::Satisfied,
            settings_checks: 0,
            last_request: None,
            sink: None,
            last_known: None,
            available: true,
        }
    }
}

/// Backend that completes every request immediately from its script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    pub script: Arc<Mutex<BackendScript>>,
}

impl ScriptedBackend {
    pub fn with_settings(outcome: SettingsOutcome) -> Self {
        let backend = Self::default();
        backend.script.lock().unwrap().settings_outcome = outcome;
        backend
    }

    /// Sink of the live subscription, if any.
    pub fn sink(&self) -> Option<FixSink> {
        self.script.lock().unwrap().sink.clone()
    }

    pub fn settings_checks(&self) -> usize {
        self.script.lock().unwrap().settings_checks
    }

    pub fn last_request(&self) -> Option<UpdateRequest> {
        self.script.lock().unwrap().last_request.clone()
    }
}

impl LocationBackend for ScriptedBackend {
    fn connect(&mut self, completion: ConnectCompletion) {
        self.script.lock().unwrap().connected = true;
        completion.succeeded();
    }

    fn disconnect(&mut self) {
        self.script.lock().unwrap().connected = false;
    }

    fn is_connected(&self) -> bool {
        self.script.lock().unwrap().connected
    }

    fn check_settings(&mut self, request: &UpdateRequest, completion: SettingsCompletion) {
        let outcome = {
            let mut script = self.script.lock().unwrap();
            script.settings_checks += 1;
            script.last_request = Some(request.clone());
            script.settings_outcome.clone()
        };
        completion.complete(outcome);
    }

    fn subscribe_updates(
        &mut self,
        request: &UpdateRequest,
        sink: FixSink,
    ) -> Result<(), BackendError> {
        let mut script = self.script.lock().unwrap();
        script.last_request = Some(request.clone());
        script.sink = Some(sink);
        Ok(())
    }

    fn unsubscribe_updates(&mut self) {
        self.script.lock().unwrap().sink = None;
    }

    fn last_known_fix(&self) -> Result<Option<Fix>, BackendError> {
        Ok(self.script.lock().unwrap().last_known.clone())
    }

    fn is_positioning_available(&self) -> Result<bool, BackendError> {
        Ok(self.script.lock().unwrap().available)
    }
}

#[derive(Debug, Default)]
pub struct PlatformScript {
    pub permission: bool,
    pub rationale: bool,
    pub satellite: bool,
    pub network: bool,
    pub mock_locations: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedPlatform {
    pub script: Arc<Mutex<PlatformScript>>,
}

impl ScriptedPlatform {
    pub fn granted() -> Self {
        let platform = Self::default();
        platform.set_permission(true);
        platform
    }

    pub fn set_permission(&self, granted: bool) {
        self.script.lock().unwrap().permission = granted;
    }
}

impl Platform for ScriptedPlatform {
    fn has_location_permission(&self) -> bool {
        self.script.lock().unwrap().permission
    }

    fn should_show_permission_rationale(&self) -> bool {
        self.script.lock().unwrap().rationale
    }

    fn is_provider_enabled(&self, provider: ProviderKind) -> bool {
        let script = self.script.lock().unwrap();
        match provider {
            ProviderKind::Satellite => script.satellite,
            ProviderKind::Network => script.network,
        }
    }

    fn mock_locations_enabled(&self) -> bool {
        self.script.lock().unwrap().mock_locations
    }
}

/// Next event forwarded by a `ChannelHost`, failing the test after a second.
pub async fn next_host_event(rx: &mut UnboundedReceiver<HostEvent>) -> HostEvent {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for host event")
        .expect("host channel closed")
}

/// Next notification, failing on any other host event.
pub async fn next_notification(rx: &mut UnboundedReceiver<HostEvent>) -> Notification {
    match next_host_event(rx).await {
        HostEvent::Notification(n) => n,
        other => panic!("expected a notification, got {:?}", other),
    }
}

/// Wait until the backend holds a live subscription.
pub async fn wait_for_subscription(backend: &ScriptedBackend) -> FixSink {
    for _ in 0..100 {
        if let Some(sink) = backend.sink() {
            return sink;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("backend was never subscribed");
}
