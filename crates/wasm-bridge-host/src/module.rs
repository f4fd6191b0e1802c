//! Guest module compilation.
//!
//! [`GuestModule`] wraps a compiled Wasmtime [`Module`] with the metadata
//! the bridge needs. Byte validation happens here: malformed images are
//! rejected before instantiation is ever attempted.

use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::debug;
use wasmtime::{Engine, Module};

use wasm_bridge_common::BridgeError;

/// A compiled guest module.
///
/// Thread-safe; the underlying Wasmtime module can be instantiated many
/// times, though the bridge instantiates each attachment exactly once.
#[derive(Clone)]
pub struct GuestModule {
    module: Module,
    content_hash: String,
}

impl GuestModule {
    /// Compile a guest module from raw WebAssembly bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Instantiation`] if the header is invalid or
    /// compilation fails.
    pub fn from_bytes(engine: &Engine, bytes: &[u8]) -> Result<Self, BridgeError> {
        Self::validate_wasm_header(bytes)?;

        let module = Module::new(engine, bytes).map_err(|e| {
            BridgeError::instantiation(format!("Module compilation failed: {e}"))
        })?;

        let content_hash = compute_hash(bytes);
        debug!(content_hash = %content_hash, bytes_len = bytes.len(), "Guest module compiled");

        Ok(Self {
            module,
            content_hash,
        })
    }

    /// Compile a guest module from WAT (WebAssembly Text Format).
    ///
    /// This is primarily for testing purposes.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Instantiation`] if compilation fails.
    pub fn from_wat(engine: &Engine, wat: &str) -> Result<Self, BridgeError> {
        let module = Module::new(engine, wat)
            .map_err(|e| BridgeError::instantiation(format!("WAT compilation failed: {e}")))?;

        Ok(Self {
            content_hash: compute_hash(wat.as_bytes()),
            module,
        })
    }

    /// Get the content hash of the original bytes.
    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Get the inner Wasmtime module.
    pub fn as_module(&self) -> &Module {
        &self.module
    }

    /// Validate the WebAssembly header (magic number).
    fn validate_wasm_header(bytes: &[u8]) -> Result<(), BridgeError> {
        if bytes.len() < 8 {
            return Err(BridgeError::instantiation("Invalid Wasm: file too small"));
        }

        // Magic number: \0asm
        if &bytes[0..4] != b"\0asm" {
            return Err(BridgeError::instantiation("Invalid Wasm: bad magic number"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for GuestModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuestModule")
            .field("content_hash", &self.content_hash)
            .finish_non_exhaustive()
    }
}

/// Compute a hash of the given bytes.
fn compute_hash(bytes: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BridgeEngine;

    // Minimal valid Wasm module (empty module)
    const MINIMAL_WASM: &[u8] = &[
        0x00, 0x61, 0x73, 0x6d, // magic: \0asm
        0x01, 0x00, 0x00, 0x00, // version: 1
    ];

    #[test]
    fn test_validate_wasm_header_valid() {
        assert!(GuestModule::validate_wasm_header(MINIMAL_WASM).is_ok());
    }

    #[test]
    fn test_validate_wasm_header_too_small() {
        let result = GuestModule::validate_wasm_header(&[0x00, 0x61]);
        assert!(matches!(result, Err(BridgeError::Instantiation { .. })));
    }

    #[test]
    fn test_validate_wasm_header_bad_magic() {
        let bad = &[0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00];
        let result = GuestModule::validate_wasm_header(bad);
        assert!(matches!(result, Err(BridgeError::Instantiation { .. })));
    }

    #[test]
    fn test_module_compilation() {
        let engine = BridgeEngine::new().unwrap();
        let module = GuestModule::from_bytes(engine.inner(), MINIMAL_WASM).unwrap();
        assert!(!module.content_hash().is_empty());
    }

    #[test]
    fn test_wat_compilation() {
        let engine = BridgeEngine::new().unwrap();
        let module = GuestModule::from_wat(engine.inner(), "(module)").unwrap();
        assert_eq!(module.content_hash().len(), 16);
    }

    #[test]
    fn test_compute_hash() {
        assert_eq!(compute_hash(b"hello"), compute_hash(b"hello"));
        assert_ne!(compute_hash(b"hello"), compute_hash(b"world"));
    }
}
