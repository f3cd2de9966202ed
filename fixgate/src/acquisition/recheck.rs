//! Cancellable delayed re-evaluation.
//!
//! The coordinator schedules at most one re-check at a time. Arming a new one
//! cancels the previous. When the delay elapses the timer task posts
//! [`Event::Recheck`] onto the coordinator's event channel; the coordinator
//! only acts on it if the token still matches the armed re-check, so a tick
//! that raced a `cancel()` is inert.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::completion::{Event, EventSender, RequestToken};

/// Why a re-check was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecheckReason {
    /// Periodic availability poll after subscribing.
    Poll,
    /// Backoff retry after a settings check failed while a provider was on.
    SettingsRetry,
}

struct ArmedRecheck {
    token: RequestToken,
    reason: RecheckReason,
    cancel: CancellationToken,
}

pub(crate) struct RecheckTimer {
    events: EventSender,
    armed: Option<ArmedRecheck>,
}

impl RecheckTimer {
    pub(crate) fn new(events: EventSender) -> Self {
        Self {
            events,
            armed: None,
        }
    }

    /// Schedule a re-check after `delay`, replacing any armed one.
    pub(crate) fn arm(&mut self, token: RequestToken, delay: Duration, reason: RecheckReason) {
        self.cancel();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(?reason, "No tokio runtime, re-check not scheduled");
            return;
        };

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let events = self.events.clone();
        runtime.spawn(async move {
            tokio::select! {
                _ = task_cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = events.send(Event::Recheck { token });
                }
            }
        });

        tracing::trace!(?reason, delay_ms = delay.as_millis() as u64, "Re-check armed");
        self.armed = Some(ArmedRecheck {
            token,
            reason,
            cancel,
        });
    }

    pub(crate) fn cancel(&mut self) {
        if let Some(armed) = self.armed.take() {
            armed.cancel.cancel();
        }
    }

    pub(crate) fn armed_reason(&self) -> Option<RecheckReason> {
        self.armed.as_ref().map(|a| a.reason)
    }

    /// Consume a fired tick. Returns the reason if `token` is the armed re-check.
    pub(crate) fn fire(&mut self, token: RequestToken) -> Option<RecheckReason> {
        match &self.armed {
            Some(armed) if armed.token == token => self.armed.take().map(|a| a.reason),
            _ => None,
        }
    }
}

impl Drop for RecheckTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Calculate exponential backoff: 2^n seconds, capped at `max`.
pub(crate) fn calculate_backoff(consecutive_failures: u32, max: Duration) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_failures.min(20));
    Duration::from_secs(secs).min(max)
}
