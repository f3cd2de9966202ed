//! Configuration for the location coordinator.
//!
//! - [`CoordinatorConfig`] - Construction parameters (accuracy, interval,
//!   mock policy, re-check timing)
//! - [`FileConfig`] - INI file with `[location]` and `[logging]` sections
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fixgate::acquisition::AccuracyTier;
//! use fixgate::config::CoordinatorConfig;
//!
//! let config = CoordinatorConfig::new(AccuracyTier::High, Duration::from_secs(5), false)
//!     .with_recheck_interval(Duration::from_secs(15));
//! assert!(config.validate().is_ok());
//! ```

mod coordinator;
mod file;
mod parser;

pub use coordinator::{
    CoordinatorConfig, DEFAULT_MAX_BACKOFF, DEFAULT_RECHECK_INTERVAL, DEFAULT_UPDATE_INTERVAL,
};
pub use file::{ConfigError, FileConfig};
