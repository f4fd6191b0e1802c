//! Bridge attachment: the initialization sequencer.
//!
//! [`attach`] is the entry point of the core. It resolves the module byte
//! source, asks the embedded runtime to instantiate the image, spawns the
//! module's execution unit, arms the advisory readiness watchdog, and hands
//! back the capability surface. Acquisition and instantiation failures
//! abort the sequence; no partial bridge instance is ever exposed.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info, warn};
use uuid::Uuid;

use wasm_bridge_common::{BridgeConfig, BridgeError};

use crate::registry::{Registry, RegistryWriter};
use crate::runtime::{BytesSource, EmbeddedRuntime};
use crate::surface::CapabilitySurface;

/// Attach a new embedded module and return its capability surface.
///
/// Each call creates a fresh bridge instance with its own registry and
/// readiness flag; instances never share state unless the caller shares
/// the surface.
///
/// # Errors
///
/// - [`BridgeError::Acquisition`] if the byte source fails.
/// - [`BridgeError::Instantiation`] if the module image is malformed or
///   cannot be instantiated.
pub async fn attach<R: EmbeddedRuntime>(
    runtime: &R,
    source: BytesSource,
    config: &BridgeConfig,
) -> Result<CapabilitySurface, BridgeError> {
    let bridge_id = Uuid::new_v4().to_string();

    let bytes = source.resolve().await?;
    debug!(bridge_id = %bridge_id, bytes_len = bytes.len(), "Module bytes acquired");

    let registry = Registry::new();
    let writer = RegistryWriter::new(Arc::clone(&registry));
    let unit = runtime.instantiate(&bytes, writer).await?;

    // The execution unit runs detached; the wrapper sets the exited flag
    // exactly once, when the module halts or traps. It is never reset.
    let exited = Arc::new(AtomicBool::new(false));
    let unit_exited = Arc::clone(&exited);
    let unit_id = bridge_id.clone();
    let handle = tokio::spawn(async move {
        unit.await;
        unit_exited.store(true, Ordering::Release);
        debug!(bridge_id = %unit_id, "Execution unit halted");
    });

    arm_watchdog(&bridge_id, &registry, config);

    info!(bridge_id = %bridge_id, "Bridge attached");
    Ok(CapabilitySurface::new(
        registry,
        exited,
        handle,
        bridge_id,
        config.tick(),
    ))
}

/// One-shot advisory watchdog: warn if the module still has not signalled
/// readiness when the deadline fires. Purely an observability signal; the
/// bridge keeps waiting.
fn arm_watchdog(bridge_id: &str, registry: &Arc<Registry>, config: &BridgeConfig) {
    let registry = Arc::clone(registry);
    let deadline = config.watchdog();
    let bridge_id = bridge_id.to_string();
    tokio::spawn(async move {
        tokio::time::sleep(deadline).await;
        if !registry.is_ready() {
            warn!(
                bridge_id = %bridge_id,
                deadline_ms = deadline.as_millis() as u64,
                "Embedded module still not ready after watchdog deadline"
            );
        }
    });
}
