//! Wasmtime engine configuration and creation.
//!
//! The [`BridgeEngine`] wraps a Wasmtime [`Engine`] configured for
//! asynchronous guest execution. It is thread-safe, contains no
//! per-attachment state, and can be shared across attachments.

use tracing::info;
use wasmtime::{Config, Engine, OptLevel};

use wasm_bridge_common::BridgeError;

/// Thread-safe WebAssembly engine wrapper.
///
/// Configured with:
/// - **Async Support**: guest calls suspend on the host's cooperative
///   scheduler instead of blocking a thread
/// - **Cranelift optimizations**: compiled guest code runs at full speed
#[derive(Clone)]
pub struct BridgeEngine {
    engine: Engine,
}

impl BridgeEngine {
    /// Create a new engine with the bridge's standard configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the Wasmtime configuration is invalid.
    pub fn new() -> Result<Self, BridgeError> {
        let mut config = Config::new();
        config.async_support(true);
        config.cranelift_opt_level(OptLevel::Speed);

        let engine = Engine::new(&config).map_err(|e| {
            BridgeError::invalid_config(format!("Failed to create Wasmtime engine: {e}"))
        })?;

        info!("Wasmtime engine initialized");

        Ok(Self { engine })
    }

    /// Get a reference to the inner Wasmtime engine.
    pub fn inner(&self) -> &Engine {
        &self.engine
    }
}

impl std::fmt::Debug for BridgeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeEngine").finish_non_exhaustive()
    }
}
