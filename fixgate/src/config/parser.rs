//! INI parsing logic for converting `Ini` → `FileConfig`.
//!
//! This is the single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::time::Duration;

use ini::Ini;

use super::file::{ConfigError, FileConfig};

/// Parse an `Ini` object into a `FileConfig`.
///
/// Starts from `FileConfig::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<FileConfig, ConfigError> {
    let mut config = FileConfig::default();

    // [location] section
    if let Some(section) = ini.section(Some("location")) {
        if let Some(v) = section.get("accuracy") {
            config.location.accuracy = v.parse().map_err(|_| ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "accuracy".to_string(),
                value: v.to_string(),
                reason: "must be one of: high, medium, low, passive".to_string(),
            })?;
        }
        if let Some(v) = section.get("update_interval_ms") {
            let ms: u64 = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "update_interval_ms".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer (milliseconds)".to_string(),
            })?;
            config.location.update_interval = Duration::from_millis(ms);
        }
        if let Some(v) = section.get("allow_mock_fixes") {
            config.location.allow_mock_fixes = parse_bool("location", "allow_mock_fixes", v)?;
        }
        if let Some(v) = section.get("recheck_interval_secs") {
            let secs: u64 = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "recheck_interval_secs".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer (seconds)".to_string(),
            })?;
            config.location.recheck_interval = Duration::from_secs(secs);
        }
        if let Some(v) = section.get("max_backoff_secs") {
            let secs: u64 = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
                section: "location".to_string(),
                key: "max_backoff_secs".to_string(),
                value: v.to_string(),
                reason: "must be a positive integer (seconds)".to_string(),
            })?;
            config.location.max_backoff = Duration::from_secs(secs);
        }
        if let Some(v) = section.get("verbose") {
            config.location.verbose = parse_bool("location", "verbose", v)?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("level") {
            let v = v.trim().to_lowercase();
            let valid_levels = ["trace", "debug", "info", "warn", "error"];
            if !valid_levels.contains(&v.as_str()) {
                return Err(ConfigError::InvalidValue {
                    section: "logging".to_string(),
                    key: "level".to_string(),
                    value: v,
                    reason: "must be one of: trace, debug, info, warn, error".to_string(),
                });
            }
            config.logging.level = v;
        }
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.directory = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = v.to_string();
            }
        }
    }

    Ok(config)
}

fn parse_bool(section: &str, key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be true or false".to_string(),
        }),
    }
}
