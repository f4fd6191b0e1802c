//! Wasmtime-backed embedded runtime.
//!
//! [`WasmRuntime`] implements the core's [`EmbeddedRuntime`] seam. Each
//! attachment compiles and instantiates the guest, runs its optional
//! `_start` initializer, and then serves dispatched calls from a channel.
//! The dispatch loop is the sole owner of the guest's store, so guest
//! invocations are serialized: one call executes at a time, in arrival
//! order.
//!
//! # Guest call ABI
//!
//! A callable registered via `bridge::export_func("name")` is backed by a
//! guest export `name(args_ptr: i32, args_len: i32) -> i64`. Arguments
//! arrive as a JSON array written into guest memory at a location obtained
//! from the guest's `bridge_alloc(len: i32) -> i32` export. The return
//! value packs `ptr << 32 | len` of a normalized call-record JSON object
//! (`{"result": ...}` or `{"error": "..."}`) in guest memory.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use wasmtime::{Instance, Linker, Store};

use wasm_bridge_common::BridgeError;
use wasm_bridge_core::{CallRecord, EmbeddedRuntime, ExecutionUnit, RegistryWriter};

use crate::linker::register_all;
use crate::module::GuestModule;
use crate::store::{CallRequest, GuestContext};
use crate::BridgeEngine;

/// How many dispatched calls may queue before callers are backpressured.
const CALL_QUEUE_DEPTH: usize = 32;

/// Wasmtime implementation of the embedded-runtime seam.
pub struct WasmRuntime {
    engine: BridgeEngine,
}

impl WasmRuntime {
    /// Create a runtime with a freshly configured engine.
    ///
    /// # Errors
    ///
    /// Returns an error if engine configuration fails.
    pub fn new() -> Result<Self, BridgeError> {
        Ok(Self {
            engine: BridgeEngine::new()?,
        })
    }

    /// Create a runtime sharing an existing engine.
    pub fn with_engine(engine: BridgeEngine) -> Self {
        Self { engine }
    }

    /// Get the underlying engine.
    pub fn engine(&self) -> &BridgeEngine {
        &self.engine
    }
}

#[async_trait]
impl EmbeddedRuntime for WasmRuntime {
    async fn instantiate(
        &self,
        bytes: &[u8],
        registry: RegistryWriter,
    ) -> Result<ExecutionUnit, BridgeError> {
        let module = GuestModule::from_bytes(self.engine.inner(), bytes)?;

        let (call_tx, call_rx) = mpsc::channel(CALL_QUEUE_DEPTH);
        let mut store = Store::new(self.engine.inner(), GuestContext::new(registry, call_tx));

        let mut linker = Linker::new(self.engine.inner());
        register_all(&mut linker)?;

        let instance = linker
            .instantiate_async(&mut store, module.as_module())
            .await
            .map_err(|e| BridgeError::instantiation(format!("Instantiation failed: {e}")))?;

        debug!(content_hash = %module.content_hash(), "Guest module instantiated");

        Ok(Box::pin(run_unit(store, instance, call_rx)))
    }
}

impl std::fmt::Debug for WasmRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WasmRuntime").finish_non_exhaustive()
    }
}

/// The guest's execution unit: run `_start`, then serve dispatched calls
/// until the attachment is torn down.
async fn run_unit(
    mut store: Store<GuestContext>,
    instance: Instance,
    mut calls: mpsc::Receiver<CallRequest>,
) {
    if let Ok(start) = instance.get_typed_func::<(), ()>(&mut store, "_start") {
        if let Err(trap) = start.call_async(&mut store, ()).await {
            error!(error = %trap, "Guest _start trapped; execution unit halting");
            return;
        }
        debug!("Guest _start completed");
    }

    while let Some(request) = calls.recv().await {
        let record = dispatch(&mut store, &instance, &request.name, &request.args).await;
        // The caller may have gone away; that is its business.
        let _ = request.reply.send(record);
    }
}

/// Perform one guest call per the call ABI, mapping every failure onto a
/// normalized failure record. A trapping call poisons only itself; the
/// loop keeps serving.
#[allow(clippy::cast_sign_loss)]
async fn dispatch(
    store: &mut Store<GuestContext>,
    instance: &Instance,
    name: &str,
    args: &[serde_json::Value],
) -> CallRecord {
    let Some(memory) = instance.get_memory(&mut *store, "memory") else {
        return CallRecord::failure("guest does not export `memory`");
    };

    let Ok(alloc) = instance.get_typed_func::<i32, i32>(&mut *store, "bridge_alloc") else {
        return CallRecord::failure("guest does not export `bridge_alloc`");
    };

    let Ok(func) = instance.get_typed_func::<(i32, i32), i64>(&mut *store, name) else {
        return CallRecord::failure(format!(
            "guest export `{name}` not found or has the wrong signature"
        ));
    };

    let payload = match serde_json::to_vec(args) {
        Ok(payload) => payload,
        Err(e) => return CallRecord::failure(format!("arguments are not serializable: {e}")),
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let payload_len = payload.len() as i32;

    let args_ptr = match alloc.call_async(&mut *store, payload_len).await {
        Ok(ptr) => ptr,
        Err(trap) => {
            warn!(export = name, error = %trap, "Guest allocator trapped");
            return CallRecord::failure(format!("guest allocator trapped: {trap}"));
        }
    };

    if args_ptr < 0 || memory.write(&mut *store, args_ptr as usize, &payload).is_err() {
        return CallRecord::failure("guest allocator returned an out-of-bounds pointer");
    }

    let packed = match func.call_async(&mut *store, (args_ptr, payload_len)).await {
        Ok(packed) => packed as u64,
        Err(trap) => {
            warn!(export = name, error = %trap, "Guest export trapped");
            return CallRecord::failure(format!("guest export `{name}` trapped: {trap}"));
        }
    };

    let result_ptr = (packed >> 32) as usize;
    let result_len = (packed & 0xffff_ffff) as usize;

    let data = memory.data(&*store);
    let Some(end) = result_ptr.checked_add(result_len) else {
        return CallRecord::failure("guest returned an out-of-bounds result");
    };
    let Some(slice) = data.get(result_ptr..end) else {
        return CallRecord::failure("guest returned an out-of-bounds result");
    };

    match serde_json::from_slice::<CallRecord>(slice) {
        Ok(record) => record,
        Err(e) => CallRecord::failure(format!("guest returned a malformed call record: {e}")),
    }
}
