//! Delivery target for coordinator notifications.
//!
//! The host is the application layer: it renders prompts and navigates to
//! settings screens. The coordinator never does either itself; it only tells
//! the host which action is needed and, for settings screens, which
//! [`SettingsSurface`] to open.

use tokio::sync::mpsc;

use super::completion::{PermissionCompletion, ResolutionCompletion, SettingsResolution};
use super::error::{DispatchError, ErrorKind};
use super::state::Fix;

/// Settings screen the host should navigate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSurface {
    /// Per-application details (grant a permanently declined permission).
    AppDetails,
    /// Developer options (disable mock locations).
    DeveloperOptions,
    /// System location sources (switch providers on).
    LocationSources,
}

/// Notification emitted to the registered host.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Location permission is required; the host should call
    /// `request_permission()` or `request_permission_explained()`.
    NeedPermission,
    /// The user declined before; explain why the permission is needed.
    ExplainPermission,
    /// Declined too often to prompt again; only the settings surface helps.
    PermanentlyDeclinedPermission { surface: SettingsSurface },
    /// Settings are fixable in-app; the host should call
    /// `request_settings_resolution()`.
    NeedSettingsChange,
    /// No provider is enabled and nothing can fix that in-app.
    FallBackToSystemSettings { surface: SettingsSurface },
    /// A plausible fix was accepted.
    NewFix(Fix),
    /// Mock locations are enabled or a mock fix was rejected.
    MockDetected { surface: SettingsSurface },
    Error { kind: ErrorKind, message: String },
}

impl Notification {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NeedPermission => "need_permission",
            Self::ExplainPermission => "explain_permission",
            Self::PermanentlyDeclinedPermission { .. } => "permanently_declined_permission",
            Self::NeedSettingsChange => "need_settings_change",
            Self::FallBackToSystemSettings { .. } => "fall_back_to_system_settings",
            Self::NewFix(_) => "new_fix",
            Self::MockDetected { .. } => "mock_detected",
            Self::Error { .. } => "error",
        }
    }
}

/// Application-side collaborator. One host is registered at a time.
pub trait Host: Send {
    fn notify(&mut self, notification: Notification);

    /// Show the platform permission prompt; finish with `completion.complete(granted)`.
    fn show_permission_prompt(&mut self, completion: PermissionCompletion);

    /// Launch the platform's settings resolution flow for `resolution`.
    fn start_settings_resolution(
        &mut self,
        resolution: &SettingsResolution,
        completion: ResolutionCompletion,
    ) -> Result<(), DispatchError>;
}

/// Everything a [`ChannelHost`] forwards.
#[derive(Debug)]
pub enum HostEvent {
    Notification(Notification),
    PermissionPrompt(PermissionCompletion),
    SettingsResolution {
        resolution: SettingsResolution,
        completion: ResolutionCompletion,
    },
}

/// Host that forwards everything onto an mpsc channel.
///
/// Lets an async application consume coordinator output as a stream.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl ChannelHost {
    /// Create a host and the receiver it forwards to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<HostEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Host for ChannelHost {
    fn notify(&mut self, notification: Notification) {
        if self.tx.send(HostEvent::Notification(notification)).is_err() {
            tracing::debug!("Host receiver dropped, discarding notification");
        }
    }

    fn show_permission_prompt(&mut self, completion: PermissionCompletion) {
        if self.tx.send(HostEvent::PermissionPrompt(completion)).is_err() {
            tracing::debug!("Host receiver dropped, permission prompt not shown");
        }
    }

    fn start_settings_resolution(
        &mut self,
        resolution: &SettingsResolution,
        completion: ResolutionCompletion,
    ) -> Result<(), DispatchError> {
        self.tx
            .send(HostEvent::SettingsResolution {
                resolution: resolution.clone(),
                completion,
            })
            .map_err(|_| DispatchError::HostUnavailable)
    }
}
