//! Per-attachment guest execution context.
//!
//! [`GuestContext`] is the data each Wasmtime [`Store`](wasmtime::Store)
//! carries. Host functions reach the module-side registry half and the
//! call dispatcher through it.

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use wasm_bridge_core::{CallRecord, RegistryWriter};

/// A dispatched invocation of one guest export.
///
/// Sent by a registered callable into the execution unit, which owns the
/// store and therefore serializes guest invocations.
pub struct CallRequest {
    /// Name of the guest export to invoke.
    pub name: String,
    /// Untyped arguments, forwarded as a JSON array.
    pub args: Vec<Value>,
    /// Where the normalized result goes.
    pub reply: oneshot::Sender<CallRecord>,
}

/// State carried by the guest's store for the lifetime of one attachment.
pub struct GuestContext {
    /// Module-side half of the export registry.
    pub registry: RegistryWriter,
    /// Sender half of the call dispatcher channel; cloned into every
    /// callable the guest registers.
    pub call_tx: mpsc::Sender<CallRequest>,
}

impl GuestContext {
    /// Create a context for a fresh attachment.
    pub fn new(registry: RegistryWriter, call_tx: mpsc::Sender<CallRequest>) -> Self {
        Self { registry, call_tx }
    }
}

impl std::fmt::Debug for GuestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestContext")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
