//! Completion handles for asynchronous collaborator operations.
//!
//! Backend and host operations return immediately and finish later by
//! consuming one of these handles. Each handle carries the [`RequestToken`]
//! it was issued under and posts an [`Event`] onto the coordinator's event
//! channel. The coordinator compares the token against the request it is
//! still waiting for and ignores anything stale (issued before a `stop()` or
//! `reset()`).
//!
//! ```text
//! Coordinator ──check_settings(request, SettingsCompletion)──▶ Backend
//!      ▲                                                         │
//!      └──────── Event::SettingsChecked { token, outcome } ◀─────┘
//! ```

use tokio::sync::mpsc;

use super::state::Fix;

/// Identifies one outstanding asynchronous request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Monotonic token generator, one per coordinator.
#[derive(Debug, Default)]
pub(crate) struct TokenSource {
    next: u64,
}

impl TokenSource {
    pub(crate) fn next_token(&mut self) -> RequestToken {
        self.next = self.next.wrapping_add(1);
        RequestToken(self.next)
    }
}

/// Backend-specific handle for an in-app settings resolution flow.
///
/// Opaque to the coordinator; it is handed back to the host unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsResolution {
    /// Backend-defined identifier of the resolution flow.
    pub id: u64,

    /// Human-readable reason the settings are unsatisfied.
    pub reason: String,
}

/// Result of a backend settings check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// Provider configuration satisfies the request.
    Satisfied,
    /// Unsatisfied, but fixable in-app through the given resolution flow.
    ResolutionRequired(SettingsResolution),
    /// Unsatisfied and not fixable in-app.
    ChangeUnavailable,
}

/// Input delivered to the coordinator through its event channel.
#[derive(Debug, Clone)]
pub enum Event {
    Connected {
        token: RequestToken,
    },
    ConnectionFailed {
        token: RequestToken,
        description: String,
    },
    SettingsChecked {
        token: RequestToken,
        outcome: SettingsOutcome,
    },
    PermissionResult {
        token: RequestToken,
        granted: bool,
    },
    ResolutionResult {
        token: RequestToken,
        accepted: bool,
    },
    /// Raw fix from an update subscription. `None` fixes are ignored.
    Fix {
        subscription: RequestToken,
        fix: Option<Fix>,
    },
    /// Scheduled re-evaluation fired.
    Recheck {
        token: RequestToken,
    },
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

fn post(tx: &EventSender, event: Event) -> bool {
    match tx.send(event) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(event = ?e.0, "Coordinator gone, dropping completion");
            false
        }
    }
}

/// Completes a backend `connect()` call.
#[derive(Debug)]
pub struct ConnectCompletion {
    token: RequestToken,
    tx: EventSender,
}

impl ConnectCompletion {
    pub(crate) fn new(token: RequestToken, tx: EventSender) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    /// The backend connected.
    pub fn succeeded(self) {
        post(&self.tx, Event::Connected { token: self.token });
    }

    /// The backend could not connect; `description` is reported to the host.
    pub fn failed(self, description: impl Into<String>) {
        post(
            &self.tx,
            Event::ConnectionFailed {
                token: self.token,
                description: description.into(),
            },
        );
    }
}

/// Completes a backend settings check.
#[derive(Debug)]
pub struct SettingsCompletion {
    token: RequestToken,
    tx: EventSender,
}

impl SettingsCompletion {
    pub(crate) fn new(token: RequestToken, tx: EventSender) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn complete(self, outcome: SettingsOutcome) {
        post(
            &self.tx,
            Event::SettingsChecked {
                token: self.token,
                outcome,
            },
        );
    }
}

/// Completes a permission prompt shown by the host.
#[derive(Debug)]
pub struct PermissionCompletion {
    token: RequestToken,
    tx: EventSender,
}

impl PermissionCompletion {
    pub(crate) fn new(token: RequestToken, tx: EventSender) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn complete(self, granted: bool) {
        post(
            &self.tx,
            Event::PermissionResult {
                token: self.token,
                granted,
            },
        );
    }
}

/// Completes a settings resolution flow run by the host.
#[derive(Debug)]
pub struct ResolutionCompletion {
    token: RequestToken,
    tx: EventSender,
}

impl ResolutionCompletion {
    pub(crate) fn new(token: RequestToken, tx: EventSender) -> Self {
        Self { token, tx }
    }

    pub fn token(&self) -> RequestToken {
        self.token
    }

    pub fn complete(self, accepted: bool) {
        post(
            &self.tx,
            Event::ResolutionResult {
                token: self.token,
                accepted,
            },
        );
    }
}

/// Delivery end of an update subscription.
///
/// Cloneable so the backend can hand it to whichever thread produces fixes.
/// Fixes delivered after the subscription was dropped are discarded by the
/// coordinator.
#[derive(Debug, Clone)]
pub struct FixSink {
    subscription: RequestToken,
    tx: EventSender,
}

impl FixSink {
    pub(crate) fn new(subscription: RequestToken, tx: EventSender) -> Self {
        Self { subscription, tx }
    }

    pub fn subscription(&self) -> RequestToken {
        self.subscription
    }

    /// Deliver a raw fix. Returns false once the coordinator is gone.
    pub fn deliver(&self, fix: Option<Fix>) -> bool {
        post(
            &self.tx,
            Event::Fix {
                subscription: self.subscription,
                fix,
            },
        )
    }
}
