//! Configuration file structures for the wasm-bridge.
//!
//! This module defines [`ConfigFile`], the TOML file shape accepted by the
//! CLI at startup.
//!
//! # Example
//!
//! ```toml
//! [bridge]
//! watchdog_ms = 3000
//! tick_ms = 50
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BridgeConfig;

/// Top-level configuration file structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    /// Bridge timing configuration.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

impl ConfigFile {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigFileError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed.
    pub fn from_toml(content: &str) -> Result<Self, ConfigFileError> {
        toml::from_str(content).map_err(ConfigFileError::from)
    }
}

/// Errors from loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path to the file that failed to load.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file contents were not valid TOML.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_defaults() {
        let config = ConfigFile::from_toml("").unwrap();
        assert_eq!(config.bridge.watchdog_ms, 3_000);
        assert_eq!(config.bridge.tick_ms, 50);
    }

    #[test]
    fn test_bridge_section() {
        let config = ConfigFile::from_toml(
            r#"
            [bridge]
            watchdog_ms = 10000
            tick_ms = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.bridge.watchdog_ms, 10_000);
        assert_eq!(config.bridge.tick_ms, 25);
    }

    #[test]
    fn test_malformed_toml() {
        let result = ConfigFile::from_toml("[bridge\nwatchdog_ms = 1");
        assert!(matches!(result, Err(ConfigFileError::Parse(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigFile::from_file("/definitely/not/a/real/path.toml");
        assert!(matches!(result, Err(ConfigFileError::Io { .. })));
    }
}
