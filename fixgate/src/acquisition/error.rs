//! Error types for location acquisition.

use std::fmt;

use thiserror::Error;

/// Errors reported by a [`LocationBackend`](super::LocationBackend) call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend refused the operation because location permission was
    /// missing at call time (typically a race with revocation).
    #[error("Location permission missing: {0}")]
    SecurityDenied(String),

    /// The backend is not connected or cannot serve the request.
    #[error("Location backend unavailable: {0}")]
    Unavailable(String),
}

/// The host could not launch the settings resolution flow.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// Nothing is attached that could display the flow.
    #[error("No host available to display the settings resolution flow")]
    HostUnavailable,

    /// The platform rejected the launch.
    #[error("Failed to launch settings resolution: {0}")]
    LaunchFailed(String),
}

/// Errors returned by a [`CoordinatorHandle`](super::CoordinatorHandle).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// The coordinator service has shut down.
    #[error("Location coordinator service has shut down")]
    Closed,
}

/// Category of an error notification sent to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Location settings could not be checked or resolved.
    Settings,
    /// Fixes could not be retrieved from the backend.
    Retrieval,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Settings => write!(f, "Settings"),
            Self::Retrieval => write!(f, "Retrieval"),
        }
    }
}
