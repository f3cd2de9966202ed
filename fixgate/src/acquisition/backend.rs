//! Collaborator traits consumed by the coordinator.
//!
//! - [`LocationBackend`] - The positioning service (connection, settings
//!   check, update subscription)
//! - [`Platform`] - Synchronous OS queries (permission, providers, developer flag)
//!
//! Implementations must not block. Anything that takes time completes later
//! through the handle passed in (see [`completion`](super::completion)).

use super::completion::{ConnectCompletion, FixSink, SettingsCompletion};
use super::error::BackendError;
use super::state::{Fix, ProviderKind, UpdateRequest};

/// The underlying location-provider service.
pub trait LocationBackend: Send {
    /// Begin connecting. Finish with `completion.succeeded()` or `failed()`.
    fn connect(&mut self, completion: ConnectCompletion);

    /// Disconnect. Outstanding completions may still arrive and are ignored.
    fn disconnect(&mut self);

    fn is_connected(&self) -> bool;

    /// Check whether provider settings satisfy `request`.
    fn check_settings(&mut self, request: &UpdateRequest, completion: SettingsCompletion);

    /// Start delivering fixes for `request` into `sink`.
    fn subscribe_updates(&mut self, request: &UpdateRequest, sink: FixSink)
        -> Result<(), BackendError>;

    fn unsubscribe_updates(&mut self);

    /// Most recent fix cached by the backend, if any.
    fn last_known_fix(&self) -> Result<Option<Fix>, BackendError>;

    /// Whether the backend currently reports positioning as available.
    fn is_positioning_available(&self) -> Result<bool, BackendError>;
}

/// Synchronous platform queries.
pub trait Platform: Send {
    /// Whether the application currently holds location permission.
    fn has_location_permission(&self) -> bool;

    /// Whether the user declined before and a rationale should be shown
    /// before prompting again.
    fn should_show_permission_rationale(&self) -> bool;

    /// Whether a positioning provider is switched on at the OS level.
    fn is_provider_enabled(&self, provider: ProviderKind) -> bool;

    /// Device-wide "allow mock locations" developer setting.
    ///
    /// Platforms that flag each fix individually should return false here.
    fn mock_locations_enabled(&self) -> bool;
}
