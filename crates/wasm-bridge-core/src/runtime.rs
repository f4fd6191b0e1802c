//! The embedded-runtime seam.
//!
//! The core never touches a concrete module engine. It drives an
//! [`EmbeddedRuntime`], which validates and instantiates a module image
//! from raw bytes and hands back the module's execution unit as a future.
//! `wasm-bridge-host` implements this seam with wasmtime; tests implement
//! it with scripted mocks.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;

use wasm_bridge_common::BridgeError;

use crate::registry::RegistryWriter;

/// The embedded module's execution unit, driven to completion by the
/// bridge. When this future finishes the module has halted and the bridge
/// instance is marked exited.
pub type ExecutionUnit = Pin<Box<dyn Future<Output = ()> + Send>>;

/// An engine capable of instantiating embedded modules.
#[async_trait]
pub trait EmbeddedRuntime: Send + Sync + 'static {
    /// Validate and instantiate a module image from raw bytes.
    ///
    /// The returned future is the module's execution unit; the module-side
    /// code reached from it registers exports and signals readiness through
    /// `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Instantiation`] if the image is malformed or
    /// cannot be instantiated. On error no partial instance may escape.
    async fn instantiate(
        &self,
        bytes: &[u8],
        registry: RegistryWriter,
    ) -> Result<ExecutionUnit, BridgeError>;
}

/// Raw module bytes, either available now or still being produced.
pub enum BytesSource {
    /// Bytes already in hand.
    Ready(Vec<u8>),
    /// A pending source of bytes (e.g. a download still in flight).
    Pending(Pin<Box<dyn Future<Output = Result<Vec<u8>, BridgeError>> + Send>>),
}

impl BytesSource {
    /// Wrap a pending byte producer.
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<Vec<u8>, BridgeError>> + Send + 'static,
    {
        Self::Pending(Box::pin(future))
    }

    /// Await availability of the bytes.
    pub(crate) async fn resolve(self) -> Result<Vec<u8>, BridgeError> {
        match self {
            Self::Ready(bytes) => Ok(bytes),
            Self::Pending(future) => future.await,
        }
    }
}

impl From<Vec<u8>> for BytesSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Ready(bytes)
    }
}

impl From<&[u8]> for BytesSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Ready(bytes.to_vec())
    }
}

impl std::fmt::Debug for BytesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(bytes) => f.debug_tuple("Ready").field(&bytes.len()).finish(),
            Self::Pending(_) => f.debug_tuple("Pending").finish(),
        }
    }
}
