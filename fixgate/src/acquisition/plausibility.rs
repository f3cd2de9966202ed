//! Plausibility filter - rejects mock and near-mock fixes.
//!
//! Every raw fix passes through [`PlausibilityFilter::classify`] before it can
//! be delivered. A fix is *suspect* when the device-wide mock developer flag
//! was set at session start, or when the platform flags the fix itself.
//!
//! # Trust window
//!
//! The most recent suspect fix is remembered. Subsequent fixes within
//! [`SUSPECT_RADIUS_M`] of it are not trusted even if they are not flagged,
//! since a spoofing app that briefly loses its flag still reports the spoofed
//! position. After [`TRUST_RESTORE_COUNT`] consecutive non-suspect fixes the
//! incident is considered resolved and the record is cleared.

use super::state::Fix;

/// Consecutive non-suspect fixes required to clear a suspect record.
pub const TRUST_RESTORE_COUNT: u32 = 20;

/// Fixes within this distance (meters) of the last suspect fix are rejected.
pub const SUSPECT_RADIUS_M: f64 = 1000.0;

/// Saturation ceiling for the good-fix counter.
const GOOD_COUNT_CEILING: u32 = 1_000_000;

/// Filter verdict for a single fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Plausible,
    Implausible,
}

/// Decaying record of the last suspect fix.
#[derive(Debug, Clone, Default)]
pub struct TrustWindow {
    last_suspect: Option<Fix>,
    consecutive_good: u32,
}

impl TrustWindow {
    /// The most recent fix classified as suspect, if the incident is unresolved.
    pub fn last_suspect(&self) -> Option<&Fix> {
        self.last_suspect.as_ref()
    }

    /// Non-suspect fixes seen since the last suspect one.
    pub fn consecutive_good(&self) -> u32 {
        self.consecutive_good
    }

    fn record_suspect(&mut self, fix: &Fix) {
        self.last_suspect = Some(fix.clone());
        self.consecutive_good = 0;
    }

    fn record_good(&mut self) {
        self.consecutive_good = self
            .consecutive_good
            .saturating_add(1)
            .min(GOOD_COUNT_CEILING);
        if self.consecutive_good >= TRUST_RESTORE_COUNT {
            self.last_suspect = None;
        }
    }
}

/// Stateful mock-fix classifier. One instance per coordinator.
#[derive(Debug, Default)]
pub struct PlausibilityFilter {
    window: TrustWindow,
}

impl PlausibilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify a fix and update the trust window.
    ///
    /// `mock_providers_enabled` is the developer flag sampled at session start.
    pub fn classify(&mut self, fix: &Fix, mock_providers_enabled: bool) -> Verdict {
        if mock_providers_enabled || fix.is_flagged_mock() {
            self.window.record_suspect(fix);
        } else {
            self.window.record_good();
        }

        match &self.window.last_suspect {
            None => Verdict::Plausible,
            Some(suspect) if fix.distance_to(suspect) > SUSPECT_RADIUS_M => Verdict::Plausible,
            Some(_) => Verdict::Implausible,
        }
    }

    pub fn window(&self) -> &TrustWindow {
        &self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::state::FixSource;

    // ~556m and ~1.1km north of BASE respectively
    const BASE: (f64, f64) = (50.0, 8.0);
    const NEAR: (f64, f64) = (50.005, 8.0);
    const FAR: (f64, f64) = (50.01, 8.0);

    fn fix_at((lat, lon): (f64, f64)) -> Fix {
        Fix::new(lat, lon, FixSource::Satellite).with_mock_flag(false)
    }

    fn mock_at((lat, lon): (f64, f64)) -> Fix {
        Fix::new(lat, lon, FixSource::Satellite).with_mock_flag(true)
    }

    #[test]
    fn test_clean_fix_is_plausible() {
        let mut filter = PlausibilityFilter::new();
        assert_eq!(filter.classify(&fix_at(BASE), false), Verdict::Plausible);
        assert!(filter.window().last_suspect().is_none());
        assert_eq!(filter.window().consecutive_good(), 1);
    }

    #[test]
    fn test_flagged_fix_is_implausible_and_recorded() {
        let mut filter = PlausibilityFilter::new();
        assert_eq!(filter.classify(&mock_at(BASE), false), Verdict::Implausible);
        assert_eq!(filter.window().last_suspect().map(Fix::position), Some(BASE));
        assert_eq!(filter.window().consecutive_good(), 0);
    }

    #[test]
    fn test_developer_flag_makes_every_fix_suspect() {
        let mut filter = PlausibilityFilter::new();
        assert_eq!(filter.classify(&fix_at(BASE), true), Verdict::Implausible);
        assert_eq!(filter.classify(&fix_at(FAR), true), Verdict::Implausible);
    }

    #[test]
    fn test_unflagged_fix_near_suspect_is_rejected() {
        let mut filter = PlausibilityFilter::new();
        filter.classify(&mock_at(BASE), false);

        assert_eq!(filter.classify(&fix_at(NEAR), false), Verdict::Implausible);
    }

    #[test]
    fn test_unflagged_fix_far_from_suspect_is_accepted() {
        let mut filter = PlausibilityFilter::new();
        filter.classify(&mock_at(BASE), false);

        assert_eq!(filter.classify(&fix_at(FAR), false), Verdict::Plausible);
        // Suspect record survives until the window decays
        assert!(filter.window().last_suspect().is_some());
    }

    #[test]
    fn test_suspect_clears_after_twenty_good_fixes() {
        let mut filter = PlausibilityFilter::new();
        filter.classify(&mock_at(BASE), false);

        for i in 1..TRUST_RESTORE_COUNT {
            assert_eq!(
                filter.classify(&fix_at(BASE), false),
                Verdict::Implausible,
                "fix {} should still be distrusted",
                i
            );
        }

        // The 20th good fix resolves the incident
        assert_eq!(filter.classify(&fix_at(BASE), false), Verdict::Plausible);
        assert!(filter.window().last_suspect().is_none());
        assert_eq!(filter.classify(&fix_at(BASE), false), Verdict::Plausible);
    }

    #[test]
    fn test_new_suspect_restarts_window() {
        let mut filter = PlausibilityFilter::new();
        filter.classify(&mock_at(BASE), false);
        for _ in 0..10 {
            filter.classify(&fix_at(BASE), false);
        }
        filter.classify(&mock_at(BASE), false);

        assert_eq!(filter.window().consecutive_good(), 0);
        for _ in 1..TRUST_RESTORE_COUNT {
            assert_eq!(filter.classify(&fix_at(BASE), false), Verdict::Implausible);
        }
    }

    #[test]
    fn test_good_counter_saturates() {
        let mut window = TrustWindow {
            last_suspect: None,
            consecutive_good: GOOD_COUNT_CEILING,
        };
        window.record_good();
        assert_eq!(window.consecutive_good(), GOOD_COUNT_CEILING);
    }
}
