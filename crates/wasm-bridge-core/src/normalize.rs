//! Normalized call results.
//!
//! Every export invocation that crosses the bridge boundary produces a
//! [`CallRecord`]: a record with a `result` field (absent on failure) and an
//! `error` field (present only on failure). The host never receives a raw
//! raised failure from the module side; it receives this record and maps it
//! onto [`BridgeError`] on its own side.
//!
//! The record is serde (de)serializable because it is also the wire shape
//! guest callables hand back through guest memory.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use wasm_bridge_common::BridgeError;

/// The uniform success/failure record produced by every export invocation.
///
/// Exactly one of two states: success (possibly with an empty value) or
/// failure carrying a descriptive message. When both fields are somehow
/// present on the wire, the error wins, matching how the host side checks
/// the record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// The produced value. Absent on failure, and also absent when the
    /// export succeeded without producing anything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// The failure message. Present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallRecord {
    /// A successful record carrying `value`.
    pub fn success(value: Value) -> Self {
        Self {
            result: Some(value),
            error: None,
        }
    }

    /// A successful record with no value.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A failed record carrying `message`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: None,
            error: Some(message.into()),
        }
    }

    /// Returns `true` if this record carries a failure.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Map this record onto the host-native result type.
    ///
    /// An absent `result` on success becomes JSON null, so a void export
    /// still resolves.
    pub fn into_result(self) -> Result<Value, BridgeError> {
        match self.error {
            Some(message) => Err(BridgeError::Invocation { message }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// Coerce a raw invocation outcome into the normalized record shape.
///
/// This is the wrapper every module-side function registration goes through
/// (see `RegistryWriter::register_fn`), so the registry only ever holds
/// pre-normalized callables.
pub fn normalize<E: std::fmt::Display>(outcome: Result<Value, E>) -> CallRecord {
    match outcome {
        Ok(value) => CallRecord::success(value),
        Err(e) => CallRecord::failure(e.to_string()),
    }
}
