//! Guest logging support.
//!
//! Guests emit log lines through the `bridge::log` host function; this
//! module maps their numeric levels onto `tracing` events so guest logs
//! land in the same sink as host diagnostics.

use tracing::{debug, error, info, warn};

/// Log level for guest logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestLogLevel {
    /// Debug-level messages.
    Debug,
    /// Informational messages.
    Info,
    /// Warning messages.
    Warn,
    /// Error messages.
    Error,
}

impl std::fmt::Display for GuestLogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuestLogLevel::Debug => write!(f, "DEBUG"),
            GuestLogLevel::Info => write!(f, "INFO"),
            GuestLogLevel::Warn => write!(f, "WARN"),
            GuestLogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// Convert a numeric log level to [`GuestLogLevel`].
///
/// Used when receiving log levels from the guest as integers
/// (0=debug, 1=info, 2=warn, 3=error). Unknown values map to info.
pub fn level_from_i32(level: i32) -> GuestLogLevel {
    match level {
        0 => GuestLogLevel::Debug,
        2 => GuestLogLevel::Warn,
        3 => GuestLogLevel::Error,
        _ => GuestLogLevel::Info,
    }
}

/// Emit a guest log line through `tracing`.
pub fn emit_guest_log(level: GuestLogLevel, message: &str) {
    match level {
        GuestLogLevel::Debug => debug!(guest_log = true, "{}", message),
        GuestLogLevel::Info => info!(guest_log = true, "{}", message),
        GuestLogLevel::Warn => warn!(guest_log = true, "{}", message),
        GuestLogLevel::Error => error!(guest_log = true, "{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_i32() {
        assert_eq!(level_from_i32(0), GuestLogLevel::Debug);
        assert_eq!(level_from_i32(1), GuestLogLevel::Info);
        assert_eq!(level_from_i32(2), GuestLogLevel::Warn);
        assert_eq!(level_from_i32(3), GuestLogLevel::Error);
        assert_eq!(level_from_i32(99), GuestLogLevel::Info);
    }

    #[test]
    fn test_level_display() {
        assert_eq!(GuestLogLevel::Warn.to_string(), "WARN");
    }
}
