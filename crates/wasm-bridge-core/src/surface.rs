//! Dynamic capability surface.
//!
//! [`CapabilitySurface`] is the only host-facing API of the core. Any name,
//! registered or not, yields a deferred invocable [`ExportHandle`];
//! invoking it resolves through the call protocol:
//!
//! 1. If the execution unit has exited, fail immediately with
//!    [`BridgeError::Inactive`], without waiting.
//! 2. Wait for the readiness flag.
//! 3. Look the name up: a plain value resolves as-is (with a warning if
//!    arguments were supplied, reported but not fatal); a callable is
//!    invoked and its normalized record mapped onto the result.
//!
//! Concurrent calls are independent and carry no completion-ordering
//! guarantee.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use wasm_bridge_common::BridgeError;

use crate::readiness::wait_ready;
use crate::registry::{Export, Registry};

/// The external-facing object of one bridge attachment.
///
/// Cheap to clone; all clones share the attachment. Dropping the last
/// clone aborts the embedded execution unit.
#[derive(Clone)]
pub struct CapabilitySurface {
    inner: Arc<SurfaceInner>,
}

struct SurfaceInner {
    registry: Arc<Registry>,
    exited: Arc<AtomicBool>,
    unit: JoinHandle<()>,
    bridge_id: String,
    tick: Duration,
}

impl Drop for SurfaceInner {
    fn drop(&mut self) {
        // Nobody can call anymore; release the execution unit.
        self.unit.abort();
    }
}

impl CapabilitySurface {
    pub(crate) fn new(
        registry: Arc<Registry>,
        exited: Arc<AtomicBool>,
        unit: JoinHandle<()>,
        bridge_id: String,
        tick: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(SurfaceInner {
                registry,
                exited,
                unit,
                bridge_id,
                tick,
            }),
        }
    }

    /// Unique identifier of this attachment, for tracing.
    pub fn bridge_id(&self) -> &str {
        &self.inner.bridge_id
    }

    /// Whether the embedded execution unit is still running.
    pub fn is_active(&self) -> bool {
        !self.inner.exited.load(Ordering::Acquire)
    }

    /// A deferred invocable handle for `name`.
    ///
    /// The handle is produced whether or not the name exists yet; existence
    /// is decided at call time, after readiness.
    pub fn export(&self, name: impl Into<String>) -> ExportHandle {
        ExportHandle {
            surface: self.clone(),
            name: name.into(),
        }
    }

    /// Names of every export registered so far, after waiting for
    /// readiness.
    pub async fn exports(&self) -> Result<Vec<String>, BridgeError> {
        if !self.is_active() {
            return Err(BridgeError::Inactive);
        }
        wait_ready(&self.inner.registry, self.inner.tick).await;
        Ok(self.inner.registry.export_names())
    }

    /// Invoke the export named `name` with `args`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Inactive`] if the execution unit has exited
    ///   (checked before any waiting).
    /// - [`BridgeError::Invocation`] if the export signals failure through
    ///   its normalized record, or raises unexpectedly.
    pub async fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value, BridgeError> {
        if !self.is_active() {
            return Err(BridgeError::Inactive);
        }

        wait_ready(&self.inner.registry, self.inner.tick).await;

        match self.inner.registry.get(name) {
            None => {
                debug!(bridge_id = %self.inner.bridge_id, export = name, "Export not registered; resolving null");
                self.warn_on_arguments(name, &args);
                Ok(Value::Null)
            }
            Some(Export::Value(value)) => {
                self.warn_on_arguments(name, &args);
                Ok(value)
            }
            Some(Export::Callable(func)) => {
                // The callable runs on its own task so a raise inside it is
                // caught at the join and never escapes past this call.
                let call = tokio::spawn(async move { func(args).await });
                match call.await {
                    Ok(record) => record.into_result(),
                    Err(join_err) => Err(BridgeError::invocation(join_err.to_string())),
                }
            }
        }
    }

    /// Leniency policy: invoking a non-callable export with arguments is
    /// reported but not fatal, since the dynamic surface cannot know
    /// intended arity ahead of time.
    fn warn_on_arguments(&self, name: &str, args: &[Value]) {
        if !args.is_empty() {
            warn!(
                bridge_id = %self.inner.bridge_id,
                export = name,
                arg_count = args.len(),
                "Export is not callable but was invoked with arguments"
            );
        }
    }
}

impl std::fmt::Debug for CapabilitySurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilitySurface")
            .field("bridge_id", &self.inner.bridge_id)
            .field("active", &self.is_active())
            .field("ready", &self.inner.registry.is_ready())
            .finish_non_exhaustive()
    }
}

/// A deferred, invocable handle to one named export.
#[derive(Debug, Clone)]
pub struct ExportHandle {
    surface: CapabilitySurface,
    name: String,
}

impl ExportHandle {
    /// The export name this handle resolves.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the export with `args`; see [`CapabilitySurface::invoke`].
    pub async fn call(&self, args: Vec<Value>) -> Result<Value, BridgeError> {
        self.surface.invoke(&self.name, args).await
    }
}
