//! TOML-based configuration for the application.
//!
//! Example file:
//!
//! ```toml
//! [session]
//! connect_timeout_secs = 15
//! log_level = "info"
//!
//! [device]
//! name_prefix = "JDY"
//! scan_window_secs = 5
//! ```
//!
//! Every field carries a serde default so the application works with a
//! missing file, an empty file, or a file written by an older version that
//! lacks newer fields.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub device: DeviceSettings,
}

/// Session lifecycle tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSettings {
    /// Bound on the transport connect call, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

/// Discovery-scan tunables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceSettings {
    /// Local-name prefix the scan matches on; empty matches any peripheral.
    #[serde(default)]
    pub name_prefix: String,
    /// How long the scan listens for advertisements, in seconds.
    #[serde(default = "default_scan_window_secs")]
    pub scan_window_secs: u64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            name_prefix: String::new(),
            scan_window_secs: default_scan_window_secs(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    15
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_scan_window_secs() -> u64 {
    5
}

impl AppConfig {
    /// Parses a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the configuration from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Parse`] if its content is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads the configuration, falling back to defaults if the file is
    /// missing or unreadable.  A present-but-broken file is reported,
    /// because silently ignoring it would mask a user mistake.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(ConfigError::Io { .. }) => Self::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring broken config file");
                Self::default()
            }
        }
    }

    /// Serializes the configuration to TOML text.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_all_defaults() {
        // Arrange / Act
        let config = AppConfig::from_toml_str("").unwrap();

        // Assert
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.session.connect_timeout_secs, 15);
        assert_eq!(config.session.log_level, "info");
        assert_eq!(config.device.scan_window_secs, 5);
        assert!(config.device.name_prefix.is_empty());
    }

    #[test]
    fn test_partial_toml_fills_missing_fields_with_defaults() {
        // Arrange
        let text = "[device]\nname_prefix = \"JDY\"\n";

        // Act
        let config = AppConfig::from_toml_str(text).unwrap();

        // Assert
        assert_eq!(config.device.name_prefix, "JDY");
        assert_eq!(config.device.scan_window_secs, 5);
        assert_eq!(config.session.connect_timeout_secs, 15);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result = AppConfig::from_toml_str("session = [nonsense");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_round_trip_through_toml_preserves_values() {
        // Arrange
        let mut config = AppConfig::default();
        config.session.connect_timeout_secs = 30;
        config.device.name_prefix = "HM-10".to_string();

        // Act
        let text = config.to_toml_string().unwrap();
        let reparsed = AppConfig::from_toml_str(&text).unwrap();

        // Assert
        assert_eq!(reparsed, config);
    }

    #[test]
    fn test_load_or_default_on_missing_file_returns_defaults() {
        let path = std::env::temp_dir().join("bletail-config-that-does-not-exist.toml");
        let config = AppConfig::load_or_default(&path);
        assert_eq!(config, AppConfig::default());
    }
}
