//! Core value types for location acquisition.
//!
//! This module defines the fundamental types used throughout the coordinator:
//!
//! - [`AccuracyTier`] - Requested accuracy / power budget
//! - [`Priority`] - Provider priority derived from the tier
//! - [`UpdateRequest`] - Request submitted to the backend
//! - [`ProviderKind`] - OS-level positioning providers
//! - [`FixSource`] - Where a fix came from
//! - [`Fix`] - A single reported device position

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::geo::distance_m;

/// Requested location accuracy.
///
/// Fixed at construction. Each tier maps to a provider [`Priority`], which
/// trades accuracy for power consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AccuracyTier {
    /// Satellite-grade accuracy, highest power draw.
    #[default]
    High,
    /// Block-level accuracy (~100m), balanced power.
    Medium,
    /// City-level accuracy (~10km), low power.
    Low,
    /// Only piggy-back on fixes requested by other applications.
    Passive,
}

impl AccuracyTier {
    /// Provider priority used when building the update request.
    pub fn priority(&self) -> Priority {
        match self {
            Self::High => Priority::HighAccuracy,
            Self::Medium => Priority::BalancedPower,
            Self::Low => Priority::LowPower,
            Self::Passive => Priority::NoPower,
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
            Self::Passive => write!(f, "passive"),
        }
    }
}

impl FromStr for AccuracyTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "passive" => Ok(Self::Passive),
            other => Err(format!("unknown accuracy tier '{}'", other)),
        }
    }
}

/// Provider priority (power budget) for an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    HighAccuracy,
    BalancedPower,
    LowPower,
    NoPower,
}

/// Update request submitted to the backend's settings check and subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    /// Provider priority.
    pub priority: Priority,

    /// Desired interval between fixes.
    pub interval: Duration,

    /// Fastest interval the coordinator accepts fixes at.
    pub fastest_interval: Duration,

    /// Always offer the in-app resolution flow when settings are unsatisfied.
    pub always_show: bool,
}

impl UpdateRequest {
    /// Build a request for the given tier and update interval.
    pub fn new(tier: AccuracyTier, interval: Duration) -> Self {
        Self {
            priority: tier.priority(),
            interval,
            fastest_interval: interval,
            always_show: true,
        }
    }
}

/// OS-level positioning provider that can be switched on or off by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Satellite positioning (GPS, Galileo, ...).
    Satellite,
    /// Cell tower / Wi-Fi positioning.
    Network,
}

impl ProviderKind {
    /// Every provider checked by the fallback path.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Satellite, ProviderKind::Network];
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satellite => write!(f, "satellite"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Source tag reported with a fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixSource {
    Satellite,
    Network,
    /// Fused from several providers by the backend.
    Fused,
    Passive,
    /// Any other provider name reported by the platform.
    Other(String),
}

impl fmt::Display for FixSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satellite => write!(f, "satellite"),
            Self::Network => write!(f, "network"),
            Self::Fused => write!(f, "fused"),
            Self::Passive => write!(f, "passive"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// A single device position reported by the backend.
///
/// # Mock flag
///
/// `mock` is the platform's own verdict on whether this specific fix came
/// from a mock provider. Older platforms cannot tell, in which case it is
/// `None` and treated as "not flagged".
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,

    /// When the fix was measured.
    pub timestamp: DateTime<Utc>,

    /// Horizontal accuracy radius in meters.
    pub accuracy: f32,

    /// Provider that produced the fix.
    pub source: FixSource,

    /// Platform-reported mock flag, if available.
    pub mock: Option<bool>,
}

impl Fix {
    /// Create a fix measured now with unknown accuracy and no mock flag.
    pub fn new(latitude: f64, longitude: f64, source: FixSource) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Utc::now(),
            accuracy: 0.0,
            source,
            mock: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f32) -> Self {
        self.accuracy = meters;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach the platform's mock verdict.
    pub fn with_mock_flag(mut self, mock: bool) -> Self {
        self.mock = Some(mock);
        self
    }

    /// Position as (latitude, longitude).
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// True only if the platform positively flagged this fix as mock.
    #[inline]
    pub fn is_flagged_mock(&self) -> bool {
        self.mock.unwrap_or(false)
    }

    /// Great-circle distance to another fix in meters.
    pub fn distance_to(&self, other: &Fix) -> f64 {
        distance_m(self.position(), other.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_priority_mapping() {
        assert_eq!(AccuracyTier::High.priority(), Priority::HighAccuracy);
        assert_eq!(AccuracyTier::Medium.priority(), Priority::BalancedPower);
        assert_eq!(AccuracyTier::Low.priority(), Priority::LowPower);
        assert_eq!(AccuracyTier::Passive.priority(), Priority::NoPower);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("HIGH".parse::<AccuracyTier>(), Ok(AccuracyTier::High));
        assert_eq!(" passive ".parse::<AccuracyTier>(), Ok(AccuracyTier::Passive));
        assert!("ultra".parse::<AccuracyTier>().is_err());
    }

    #[test]
    fn test_tier_display_roundtrips_through_parse() {
        for tier in [
            AccuracyTier::High,
            AccuracyTier::Medium,
            AccuracyTier::Low,
            AccuracyTier::Passive,
        ] {
            assert_eq!(tier.to_string().parse::<AccuracyTier>(), Ok(tier));
        }
    }

    #[test]
    fn test_update_request_uses_interval_for_both_bounds() {
        let request = UpdateRequest::new(AccuracyTier::Medium, Duration::from_millis(5000));

        assert_eq!(request.priority, Priority::BalancedPower);
        assert_eq!(request.interval, Duration::from_millis(5000));
        assert_eq!(request.fastest_interval, Duration::from_millis(5000));
        assert!(request.always_show);
    }

    #[test]
    fn test_fix_mock_flag_defaults_to_not_flagged() {
        let fix = Fix::new(52.52, 13.405, FixSource::Satellite);
        assert_eq!(fix.mock, None);
        assert!(!fix.is_flagged_mock());

        assert!(fix.clone().with_mock_flag(true).is_flagged_mock());
        assert!(!fix.with_mock_flag(false).is_flagged_mock());
    }

    #[test]
    fn test_fix_distance_to_self_is_zero() {
        let fix = Fix::new(48.8566, 2.3522, FixSource::Fused).with_accuracy(12.0);
        assert_eq!(fix.distance_to(&fix), 0.0);
        assert_eq!(fix.accuracy, 12.0);
    }

    #[test]
    fn test_fix_with_timestamp_compares_equal() {
        use chrono::TimeZone;

        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let a = Fix::new(59.3293, 18.0686, FixSource::Network).with_timestamp(at);
        let b = Fix::new(59.3293, 18.0686, FixSource::Network).with_timestamp(at);

        assert_eq!(a.timestamp, at);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fix_source_display() {
        assert_eq!(FixSource::Satellite.to_string(), "satellite");
        assert_eq!(FixSource::Other("beacon".to_string()).to_string(), "beacon");
    }
}
