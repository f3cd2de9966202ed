//! Configuration file handling.
//!
//! Settings can be read from an INI file with a `[location]` and a
//! `[logging]` section. Missing files and missing keys fall back to defaults;
//! parsing lives in [`super::parser`].

use std::path::Path;

use ini::Ini;
use thiserror::Error;

use super::coordinator::CoordinatorConfig;
use crate::logging::LoggingConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },
}

/// Everything a configuration file can set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    pub location: CoordinatorConfig,
    pub logging: LoggingConfig,
}

impl FileConfig {
    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        Self::from_ini(&ini)
    }

    /// Parse and validate an already-loaded INI document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let config = super::parser::parse_ini(ini)?;
        config.location.validate()?;
        Ok(config)
    }
}
