//! Coordinator construction parameters.

use std::time::Duration;

use crate::acquisition::{AccuracyTier, UpdateRequest};

use super::file::ConfigError;

/// Default interval between location updates.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(5000);

/// Default delay of the re-check after subscribing, and of the availability poll.
pub const DEFAULT_RECHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Default cap on the settings retry backoff (5 minutes).
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Configuration accepted by the [`Coordinator`](crate::acquisition::Coordinator).
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorConfig {
    /// Requested accuracy / power budget.
    pub accuracy: AccuracyTier,

    /// Desired interval between fixes. Must be positive.
    pub update_interval: Duration,

    /// Deliver fixes the plausibility filter rejects instead of dropping them.
    pub allow_mock_fixes: bool,

    /// Re-check delay after subscribing; also the availability poll period.
    pub recheck_interval: Duration,

    /// Upper bound for the settings retry backoff.
    pub max_backoff: Duration,

    /// Log every fix verdict at INFO instead of TRACE.
    pub verbose: bool,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::default(),
            update_interval: DEFAULT_UPDATE_INTERVAL,
            allow_mock_fixes: false,
            recheck_interval: DEFAULT_RECHECK_INTERVAL,
            max_backoff: DEFAULT_MAX_BACKOFF,
            verbose: false,
        }
    }
}

impl CoordinatorConfig {
    pub fn new(accuracy: AccuracyTier, update_interval: Duration, allow_mock_fixes: bool) -> Self {
        Self {
            accuracy,
            update_interval,
            allow_mock_fixes,
            ..Default::default()
        }
    }

    pub fn with_recheck_interval(mut self, interval: Duration) -> Self {
        self.recheck_interval = interval;
        self
    }

    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Check the invariants the coordinator relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "update_interval_ms".to_string(),
                value: "0".to_string(),
                reason: "must be a positive duration".to_string(),
            });
        }
        if self.recheck_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "recheck_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "must be a positive duration".to_string(),
            });
        }
        Ok(())
    }

    /// Update request submitted to the backend.
    pub fn update_request(&self) -> UpdateRequest {
        UpdateRequest::new(self.accuracy, self.update_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::Priority;

    #[test]
    fn test_default_config() {
        let config = CoordinatorConfig::default();
        assert_eq!(config.accuracy, AccuracyTier::High);
        assert_eq!(config.update_interval, Duration::from_millis(5000));
        assert!(!config.allow_mock_fixes);
        assert_eq!(config.recheck_interval, Duration::from_secs(10));
        assert_eq!(config.max_backoff, Duration::from_secs(300));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_update_interval_rejected() {
        let config = CoordinatorConfig::new(AccuracyTier::Low, Duration::ZERO, false);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { key, .. }) if key == "update_interval_ms"
        ));
    }

    #[test]
    fn test_zero_recheck_interval_rejected() {
        let config = CoordinatorConfig::default().with_recheck_interval(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_request_from_config() {
        let request =
            CoordinatorConfig::new(AccuracyTier::Passive, Duration::from_secs(30), true)
                .update_request();
        assert_eq!(request.priority, Priority::NoPower);
        assert_eq!(request.interval, Duration::from_secs(30));
    }
}
