//! Error types for the wasm-bridge.
//!
//! This module defines the bridge error taxonomy using `thiserror`:
//! - [`BridgeError`]: every failure a bridge attachment or call can surface
//!
//! Per-call failures (`Inactive`, `Invocation`) are always local to the call
//! that produced them; only `Acquisition` and `Instantiation` abort an
//! `attach` sequence.

use thiserror::Error;

/// Failures surfaced by the bridge core.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Module bytes could not be acquired from their source.
    #[error("Module bytes unavailable: {reason}")]
    Acquisition {
        /// Description of why acquisition failed.
        reason: String,
    },

    /// The module image could not be instantiated (malformed or rejected).
    #[error("Instantiation failed: {reason}")]
    Instantiation {
        /// Description of the instantiation failure.
        reason: String,
    },

    /// A call was attempted against a bridge whose execution unit has
    /// halted, or that never came up.
    #[error("The embedded module instance is not active")]
    Inactive,

    /// An export invocation failed, either through a normalized failure
    /// record or by raising unexpectedly.
    #[error("Export invocation failed: {message}")]
    Invocation {
        /// The error carried across the bridge boundary.
        message: String,
    },

    /// Invalid engine or bridge configuration.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the configuration error.
        reason: String,
    },
}

impl BridgeError {
    /// Create a new `Acquisition` error.
    pub fn acquisition(reason: impl Into<String>) -> Self {
        Self::Acquisition {
            reason: reason.into(),
        }
    }

    /// Create a new `Instantiation` error.
    pub fn instantiation(reason: impl Into<String>) -> Self {
        Self::Instantiation {
            reason: reason.into(),
        }
    }

    /// Create a new `Invocation` error.
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }

    /// Create a new `InvalidConfig` error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Returns `true` if this error aborts the whole attach sequence.
    ///
    /// Everything else is reported per call and leaves the bridge usable.
    pub fn is_fatal_to_attach(&self) -> bool {
        matches!(
            self,
            Self::Acquisition { .. } | Self::Instantiation { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Returns `true` if this error is local to a single call.
    pub fn is_per_call(&self) -> bool {
        matches!(self, Self::Inactive | Self::Invocation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::acquisition("fetch aborted");
        assert_eq!(err.to_string(), "Module bytes unavailable: fetch aborted");

        let err = BridgeError::Inactive;
        assert_eq!(err.to_string(), "The embedded module instance is not active");
    }

    #[test]
    fn test_is_fatal_to_attach() {
        assert!(BridgeError::acquisition("x").is_fatal_to_attach());
        assert!(BridgeError::instantiation("x").is_fatal_to_attach());
        assert!(!BridgeError::Inactive.is_fatal_to_attach());
        assert!(!BridgeError::invocation("x").is_fatal_to_attach());
    }

    #[test]
    fn test_is_per_call() {
        assert!(BridgeError::Inactive.is_per_call());
        assert!(BridgeError::invocation("boom").is_per_call());
        assert!(!BridgeError::instantiation("bad magic").is_per_call());
    }
}
