//! Configuration structures for the wasm-bridge.
//!
//! This module defines [`BridgeConfig`], the per-attachment timing settings:
//! the advisory readiness watchdog and the fallback tick used while waiting
//! for the embedded module to become ready.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing configuration for one bridge attachment.
///
/// Both values can be loaded from files (TOML) or set programmatically.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Advisory readiness watchdog in milliseconds.
    ///
    /// If the embedded module has not signalled readiness after this long,
    /// a warning is logged. The bridge stays usable; this is an
    /// observability signal, not an error.
    #[serde(default = "defaults::watchdog_ms")]
    pub watchdog_ms: u64,

    /// Fallback tick in milliseconds for the readiness wait loop.
    ///
    /// Each wait iteration resumes after the earlier of a readiness
    /// notification or this delay, so per-iteration latency stays bounded
    /// even if a notification is missed.
    #[serde(default = "defaults::tick_ms")]
    pub tick_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            watchdog_ms: defaults::watchdog_ms(),
            tick_ms: defaults::tick_ms(),
        }
    }
}

impl BridgeConfig {
    /// The watchdog deadline as a [`Duration`].
    pub fn watchdog(&self) -> Duration {
        Duration::from_millis(self.watchdog_ms)
    }

    /// The fallback tick as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Default values for configuration fields.
mod defaults {
    /// Most modules register their exports well within three seconds;
    /// anything longer usually means the module never will.
    pub(super) fn watchdog_ms() -> u64 {
        3_000
    }

    pub(super) fn tick_ms() -> u64 {
        50
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(config.watchdog_ms, 3_000);
        assert_eq!(config.tick_ms, 50);
        assert_eq!(config.watchdog(), Duration::from_secs(3));
        assert_eq!(config.tick(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_deserialization_uses_defaults() {
        let config: BridgeConfig = toml::from_str("watchdog_ms = 500").unwrap();
        assert_eq!(config.watchdog_ms, 500);
        assert_eq!(config.tick_ms, 50);
    }

    #[test]
    fn test_roundtrip() {
        let config = BridgeConfig {
            watchdog_ms: 1_000,
            tick_ms: 10,
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: BridgeConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.watchdog_ms, 1_000);
        assert_eq!(parsed.tick_ms, 10);
    }
}
