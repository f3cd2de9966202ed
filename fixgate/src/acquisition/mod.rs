//! Location Acquisition Module
//!
//! This module turns a device's raw location backend into a stream of
//! **trusted fixes**. It walks the application through everything that has to
//! hold before fixes can flow (permission, backend connection, provider
//! settings, an update subscription) and then filters every fix for signs of
//! spoofing.
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────────────────────────────────┐
//!   Platform ────► │              Coordinator               │ ────► Host
//!   (permission,   │                                        │  (Notification,
//!    providers)    │  AcquisitionState ─► Readiness ─► Action│   prompts)
//!                  │                                        │
//!   Backend  ◄───► │  PlausibilityFilter ─► best fix        │
//!   (connect,      └────────────────────────────────────────┘
//!    settings,             ▲
//!    updates)              │ Event (completions, fixes, re-checks)
//!                          │
//!                  CoordinatorService (tokio task)
//! ```
//!
//! The coordinator never blocks and never renders anything. When the user
//! has to act it sends the host a [`Notification`] naming what is needed and,
//! where relevant, which [`SettingsSurface`] to open.
//!
//! # Mock fixes
//!
//! A fix is rejected when the device-wide mock-location developer option was
//! on at session start, when the platform flags it as mock, or when it lies
//! within 1 km of the last flagged fix (see [`plausibility`]). Rejections are
//! reported as `MockDetected` unless the configuration allows mock fixes.
//!
//! # Usage
//!
//! ```ignore
//! use fixgate::acquisition::{ChannelHost, Coordinator, CoordinatorService};
//! use fixgate::config::CoordinatorConfig;
//!
//! let (coordinator, events) = Coordinator::new(CoordinatorConfig::default(), backend, platform)?;
//! let service = CoordinatorService::start(coordinator, events);
//! let handle = service.handle();
//!
//! let (host, mut host_rx) = ChannelHost::new();
//! handle.register(Box::new(host)).await?;
//! handle.start().await?;
//!
//! while let Some(event) = host_rx.recv().await {
//!     // Render prompts, complete permission requests, show fixes
//! }
//! ```
//!
//! # Components
//!
//! - [`state`] - Value types: `Fix`, `AccuracyTier`, `UpdateRequest`, `ProviderKind`
//! - [`readiness`] - `AcquisitionState`, `Readiness` and the `Action` precedence chain
//! - [`plausibility`] - `PlausibilityFilter` and its decaying `TrustWindow`
//! - [`completion`] - Request tokens, completion handles and the `Event` channel
//! - [`backend`] - `LocationBackend` and `Platform` traits
//! - [`host`] - `Host` trait, `Notification` and the channel-backed `ChannelHost`
//! - [`coordinator`] - The `Coordinator` state machine
//! - [`service`] - `CoordinatorService` running a coordinator in a tokio task

pub mod backend;
pub mod completion;
pub mod coordinator;
mod error;
mod geo;
pub mod host;
pub mod plausibility;
pub mod readiness;
mod recheck;
pub mod service;
pub mod state;

pub use backend::{LocationBackend, Platform};
pub use completion::{
    ConnectCompletion, Event, EventReceiver, EventSender, FixSink, PermissionCompletion,
    RequestToken, ResolutionCompletion, SettingsCompletion, SettingsOutcome, SettingsResolution,
};
pub use coordinator::Coordinator;
pub use error::{BackendError, DispatchError, ErrorKind, ServiceError};
pub use geo::distance_m;
pub use host::{ChannelHost, Host, HostEvent, Notification, SettingsSurface};
pub use plausibility::{
    PlausibilityFilter, TrustWindow, Verdict, SUSPECT_RADIUS_M, TRUST_RESTORE_COUNT,
};
pub use readiness::{
    AcquisitionState, Action, Readiness, SettingsStatus, PERMANENT_DENIAL_THRESHOLD,
};
pub use service::{Command, CoordinatorHandle, CoordinatorService, COMMAND_CHANNEL_CAPACITY};
pub use state::{AccuracyTier, Fix, FixSource, Priority, ProviderKind, UpdateRequest};
