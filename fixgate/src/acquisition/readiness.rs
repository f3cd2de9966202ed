//! Acquisition state and the readiness precedence chain.
//!
//! [`AcquisitionState`] tracks permission, settings and subscription status.
//! [`AcquisitionState::readiness`] derives a single [`Readiness`] from it, and
//! [`Readiness::action`] maps that to the one [`Action`] the coordinator takes
//! next:
//!
//! ```text
//! permission ──▶ connection ──▶ settings ──▶ subscription ──▶ availability
//! ```
//!
//! Each stage is only meaningful once the previous one holds: settings
//! cannot be checked without permission, and a live subscription must not
//! mask a revoked permission.

use super::completion::{RequestToken, SettingsResolution};

/// Denials after which the user is no longer prompted.
pub const PERMANENT_DENIAL_THRESHOLD: u8 = 2;

/// Result of the most recent settings check for this session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SettingsStatus {
    /// No check issued yet.
    #[default]
    Unchecked,
    /// Check in flight under the given token.
    Checking(RequestToken),
    /// Provider configuration satisfies the request.
    Ok,
    /// Unsatisfied, fixable in-app.
    Resolvable(SettingsResolution),
    /// Unsatisfied, only fixable from system settings.
    Unresolvable,
}

/// Readiness state owned by the coordinator.
///
/// The three gates (permission, settings, subscription) are cleared by
/// `stop()` and `reset()`. The denial counter and mock flag are session
/// history and survive them.
#[derive(Debug, Clone, Default)]
pub struct AcquisitionState {
    pub(crate) permission_granted: bool,
    pub(crate) settings: SettingsStatus,
    pub(crate) updates_subscribed: bool,
    pub(crate) permission_denied_count: u8,
    pub(crate) mock_providers_enabled: bool,
}

impl AcquisitionState {
    pub fn permission_granted(&self) -> bool {
        self.permission_granted
    }

    pub fn settings(&self) -> &SettingsStatus {
        &self.settings
    }

    /// A settings check has returned at least once this session.
    pub fn settings_checked(&self) -> bool {
        matches!(
            self.settings,
            SettingsStatus::Ok | SettingsStatus::Resolvable(_) | SettingsStatus::Unresolvable
        )
    }

    pub fn settings_ok(&self) -> bool {
        self.settings == SettingsStatus::Ok
    }

    pub fn needs_settings_resolution(&self) -> bool {
        matches!(self.settings, SettingsStatus::Resolvable(_))
    }

    pub fn updates_subscribed(&self) -> bool {
        self.updates_subscribed
    }

    pub fn permission_denied_count(&self) -> u8 {
        self.permission_denied_count
    }

    /// The user declined often enough that prompting again is pointless.
    pub fn permission_permanently_denied(&self) -> bool {
        self.permission_denied_count >= PERMANENT_DENIAL_THRESHOLD
    }

    /// Developer mock-location flag sampled at session start.
    pub fn mock_providers_enabled(&self) -> bool {
        self.mock_providers_enabled
    }

    /// Record a denial. Saturates at the threshold.
    pub(crate) fn record_denial(&mut self) -> u8 {
        self.permission_denied_count = self
            .permission_denied_count
            .saturating_add(1)
            .min(PERMANENT_DENIAL_THRESHOLD);
        self.permission_denied_count
    }

    pub(crate) fn reset_gates(&mut self) {
        self.permission_granted = false;
        self.settings = SettingsStatus::Unchecked;
        self.updates_subscribed = false;
    }

    /// Derive readiness. `backend_connected` gates every stage after permission.
    pub fn readiness(&self, backend_connected: bool) -> Readiness {
        if !self.permission_granted {
            return if self.permission_permanently_denied() {
                Readiness::PermissionBlocked
            } else {
                Readiness::NeedPermission
            };
        }
        if !backend_connected {
            return Readiness::AwaitingConnection;
        }
        match self.settings {
            SettingsStatus::Unchecked => Readiness::NeedSettingsCheck,
            SettingsStatus::Checking(_) => Readiness::AwaitingSettings,
            SettingsStatus::Resolvable(_) => Readiness::NeedSettingsResolution,
            SettingsStatus::Unresolvable => Readiness::NeedProviderFallback,
            SettingsStatus::Ok if !self.updates_subscribed => Readiness::NeedSubscription,
            SettingsStatus::Ok => Readiness::Ready,
        }
    }
}

/// Where the acquisition pipeline currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    NeedPermission,
    /// Permission missing and the user declined too often to ask again.
    PermissionBlocked,
    AwaitingConnection,
    NeedSettingsCheck,
    AwaitingSettings,
    NeedSettingsResolution,
    NeedProviderFallback,
    NeedSubscription,
    Ready,
}

/// The single step chosen by one readiness evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Emit `NeedPermission`.
    RequestPermission,
    /// Submit the update request to the backend settings check.
    CheckSettings,
    /// Emit `NeedSettingsChange`.
    RequestSettingsChange,
    /// Check OS providers; emit `FallBackToSystemSettings` if none is enabled.
    FallBackToSystemSettings,
    /// Subscribe to updates and arm the re-check.
    Subscribe,
    /// Confirm the backend still reports positioning as available.
    VerifyAvailability,
    None,
}

impl Readiness {
    pub fn action(self) -> Action {
        match self {
            Self::NeedPermission => Action::RequestPermission,
            Self::PermissionBlocked | Self::AwaitingConnection | Self::AwaitingSettings => {
                Action::None
            }
            Self::NeedSettingsCheck => Action::CheckSettings,
            Self::NeedSettingsResolution => Action::RequestSettingsChange,
            Self::NeedProviderFallback => Action::FallBackToSystemSettings,
            Self::NeedSubscription => Action::Subscribe,
            Self::Ready => Action::VerifyAvailability,
        }
    }

    /// True once fixes are flowing.
    pub fn is_ready(self) -> bool {
        self == Self::Ready
    }
}
