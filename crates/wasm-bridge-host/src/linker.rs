//! Host function registration for the guest linker.
//!
//! The guest reaches the bridge through four imports in the `"bridge"`
//! module:
//!
//! - `export_value(name_ptr, name_len, json_ptr, json_len)`: publish a
//!   plain value, JSON-encoded in guest memory
//! - `export_func(name_ptr, name_len)`: publish a callable backed by the
//!   guest export of the same name (see [`crate::runtime`] for the call ABI)
//! - `ready()`: signal that every export has been registered
//! - `log(level, ptr, len)`: emit a log line through the host sink
//!
//! All guest memory reads are bounds-checked; a bad pointer is logged and
//! the registration is skipped, never trapped.

use std::sync::Arc;

use tracing::warn;
use wasmtime::{Caller, Extern, Linker};

use wasm_bridge_common::BridgeError;
use wasm_bridge_core::{CallRecord, ExportFn};

use crate::logging::{emit_guest_log, level_from_i32};
use crate::store::{CallRequest, GuestContext};

/// Register all bridge host functions on a linker.
///
/// # Errors
///
/// Returns an error if function registration fails.
pub fn register_all(linker: &mut Linker<GuestContext>) -> Result<(), BridgeError> {
    register_exports(linker)?;
    register_ready(linker)?;
    register_logging(linker)?;
    Ok(())
}

/// Register `bridge::export_value` and `bridge::export_func`.
pub fn register_exports(linker: &mut Linker<GuestContext>) -> Result<(), BridgeError> {
    linker
        .func_wrap(
            "bridge",
            "export_value",
            |mut caller: Caller<'_, GuestContext>,
             name_ptr: i32,
             name_len: i32,
             json_ptr: i32,
             json_len: i32| {
                let Some(name) = read_guest_string(&mut caller, name_ptr, name_len) else {
                    return;
                };
                let Some(payload) = read_guest_bytes(&mut caller, json_ptr, json_len) else {
                    return;
                };
                match serde_json::from_slice(&payload) {
                    Ok(value) => caller.data().registry.register_value(&name, value),
                    Err(e) => warn!(
                        export = %name,
                        error = %e,
                        "Guest registered a value that is not valid JSON; skipping"
                    ),
                }
            },
        )
        .map_err(|e| {
            BridgeError::invalid_config(format!("Failed to register export_value: {e}"))
        })?;

    linker
        .func_wrap(
            "bridge",
            "export_func",
            |mut caller: Caller<'_, GuestContext>, name_ptr: i32, name_len: i32| {
                let Some(name) = read_guest_string(&mut caller, name_ptr, name_len) else {
                    return;
                };
                let ctx = caller.data();
                let tx = ctx.call_tx.clone();
                let dispatch_name = name.clone();
                // Calls are funneled through the dispatcher channel into
                // the execution unit, which owns the store; the reply comes
                // back pre-normalized.
                let callable: ExportFn = Arc::new(move |args| {
                    let tx = tx.clone();
                    let name = dispatch_name.clone();
                    Box::pin(async move {
                        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
                        let request = CallRequest {
                            name,
                            args,
                            reply: reply_tx,
                        };
                        if tx.send(request).await.is_err() {
                            return CallRecord::failure(
                                "embedded module dispatcher has shut down",
                            );
                        }
                        reply_rx.await.unwrap_or_else(|_| {
                            CallRecord::failure("embedded module dropped the call")
                        })
                    })
                });
                ctx.registry.register_callable(&name, callable);
            },
        )
        .map_err(|e| {
            BridgeError::invalid_config(format!("Failed to register export_func: {e}"))
        })?;

    Ok(())
}

/// Register `bridge::ready`.
pub fn register_ready(linker: &mut Linker<GuestContext>) -> Result<(), BridgeError> {
    linker
        .func_wrap("bridge", "ready", |caller: Caller<'_, GuestContext>| {
            caller.data().registry.set_ready();
        })
        .map_err(|e| BridgeError::invalid_config(format!("Failed to register ready: {e}")))?;

    Ok(())
}

/// Register `bridge::log`.
pub fn register_logging(linker: &mut Linker<GuestContext>) -> Result<(), BridgeError> {
    linker
        .func_wrap(
            "bridge",
            "log",
            |mut caller: Caller<'_, GuestContext>, level: i32, ptr: i32, len: i32| {
                let Some(message) = read_guest_string(&mut caller, ptr, len) else {
                    return;
                };
                emit_guest_log(level_from_i32(level), &message);
            },
        )
        .map_err(|e| BridgeError::invalid_config(format!("Failed to register log: {e}")))?;

    Ok(())
}

/// Read a bounds-checked byte range out of the guest's exported memory.
#[allow(clippy::cast_sign_loss)]
fn read_guest_bytes(
    caller: &mut Caller<'_, GuestContext>,
    ptr: i32,
    len: i32,
) -> Option<Vec<u8>> {
    if ptr < 0 || len < 0 {
        warn!(ptr, len, "Invalid pointer or length (negative value)");
        return None;
    }

    let Some(memory) = caller.get_export("memory").and_then(Extern::into_memory) else {
        warn!("Memory export not found in guest module");
        return None;
    };

    let data = memory.data(&*caller);
    let start = ptr as usize;
    let Some(end) = start.checked_add(len as usize) else {
        warn!(ptr, len, "Pointer + length overflow");
        return None;
    };

    if end > data.len() {
        warn!(
            start,
            end,
            memory_size = data.len(),
            "Memory access out of bounds"
        );
        return None;
    }

    Some(data[start..end].to_vec())
}

/// Read a UTF-8 string out of the guest's exported memory.
fn read_guest_string(
    caller: &mut Caller<'_, GuestContext>,
    ptr: i32,
    len: i32,
) -> Option<String> {
    let bytes = read_guest_bytes(caller, ptr, len)?;
    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(_) => {
            warn!(ptr, len, "Guest string is not valid UTF-8");
            None
        }
    }
}
