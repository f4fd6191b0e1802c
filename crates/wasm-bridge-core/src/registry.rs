//! Export registry shared between the host and the embedded module.
//!
//! The registry is the only mutable state the two sides share. It is scoped
//! to one bridge attachment and split by type into two halves:
//!
//! - [`RegistryWriter`]: the module-side half (register exports, signal
//!   readiness), handed to the embedded runtime at instantiation.
//! - [`Registry`]: the host-side read half (look up exports, observe the
//!   readiness flag).
//!
//! Entries are write-once per name (a second registration under the same
//! name is refused and logged) and the readiness flag is monotonic: once
//! true it never reverts, and a second readiness signal has no effect.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::normalize::{self, CallRecord};

/// Future produced by invoking a registered callable.
pub type ExportFuture = Pin<Box<dyn Future<Output = CallRecord> + Send>>;

/// A pre-normalized callable export.
///
/// Invoked with untyped variadic arguments; always yields a [`CallRecord`],
/// never a raw raised failure.
pub type ExportFn = Arc<dyn Fn(Vec<Value>) -> ExportFuture + Send + Sync>;

/// A value published by the embedded module for host consumption.
#[derive(Clone)]
pub enum Export {
    /// A plain scalar or object value.
    Value(Value),
    /// A host-invokable callable.
    Callable(ExportFn),
}

impl Export {
    /// Returns `true` if this export is callable.
    pub fn is_callable(&self) -> bool {
        matches!(self, Export::Callable(_))
    }
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Export::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Export::Callable(_) => f.debug_tuple("Callable").finish(),
        }
    }
}

/// Host-side view of one attachment's exported symbols plus its readiness
/// flag.
///
/// No mutual exclusion beyond the map's own sharding is needed: writes
/// originate from the single embedded execution context and the host only
/// polls.
pub struct Registry {
    exports: DashMap<String, Export>,
    ready: watch::Sender<bool>,
}

impl Registry {
    /// Create a fresh, empty, not-ready registry.
    pub fn new() -> Arc<Self> {
        let (ready, _) = watch::channel(false);
        Arc::new(Self {
            exports: DashMap::new(),
            ready,
        })
    }

    /// Look up an export by name.
    pub fn get(&self, name: &str) -> Option<Export> {
        self.exports.get(name).map(|entry| entry.clone())
    }

    /// Whether the embedded module has finished registering its exports.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Names of every registered export, in no particular order.
    pub fn export_names(&self) -> Vec<String> {
        self.exports.iter().map(|e| e.key().clone()).collect()
    }

    pub(crate) fn ready_rx(&self) -> watch::Receiver<bool> {
        self.ready.subscribe()
    }

    fn insert(&self, name: &str, export: Export) {
        match self.exports.entry(name.to_string()) {
            Entry::Occupied(_) => {
                warn!(name, "Export already registered; keeping the first registration");
            }
            Entry::Vacant(slot) => {
                debug!(name, callable = export.is_callable(), "Export registered");
                slot.insert(export);
            }
        }
    }

    fn mark_ready(&self) {
        let first = self.ready.send_if_modified(|flag| {
            if *flag {
                false
            } else {
                *flag = true;
                true
            }
        });
        if first {
            debug!("Embedded module signalled readiness");
        } else {
            debug!("Readiness already signalled; ignoring repeat signal");
        }
    }
}

/// Module-side half of the registry.
///
/// This is the registration contract the embedded runtime consumes: publish
/// each export under a stable name, then signal readiness exactly once.
#[derive(Clone)]
pub struct RegistryWriter {
    inner: Arc<Registry>,
}

impl RegistryWriter {
    pub(crate) fn new(inner: Arc<Registry>) -> Self {
        Self { inner }
    }

    /// Register a plain value export.
    pub fn register_value(&self, name: &str, value: Value) {
        self.inner.insert(name, Export::Value(value));
    }

    /// Register a synchronous fallible function export.
    ///
    /// The function is wrapped through [`normalize`](crate::normalize::normalize)
    /// so the registry only ever holds callables that produce the uniform
    /// record shape.
    pub fn register_fn<F, E>(&self, name: &str, func: F)
    where
        F: Fn(Vec<Value>) -> Result<Value, E> + Send + Sync + 'static,
        E: std::fmt::Display,
    {
        let callable: ExportFn = Arc::new(move |args| {
            let record = normalize::normalize(func(args));
            Box::pin(async move { record })
        });
        self.inner.insert(name, Export::Callable(callable));
    }

    /// Register a pre-normalized asynchronous callable.
    ///
    /// The callable must already honor the normalized record contract; this
    /// is the entry point embedded runtimes use for dispatched guest calls.
    pub fn register_callable(&self, name: &str, callable: ExportFn) {
        self.inner.insert(name, Export::Callable(callable));
    }

    /// Signal that every export has been registered.
    ///
    /// Monotonic and idempotent: the first call flips the flag, repeats are
    /// ignored.
    pub fn set_ready(&self) {
        self.inner.mark_ready();
    }
}

impl fmt::Debug for RegistryWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryWriter")
            .field("ready", &self.inner.is_ready())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_get_value() {
        let registry = Registry::new();
        let writer = RegistryWriter::new(Arc::clone(&registry));

        writer.register_value("version", json!("1.0"));

        match registry.get("version") {
            Some(Export::Value(v)) => assert_eq!(v, json!("1.0")),
            other => panic!("expected value export, got {other:?}"),
        }
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_write_once_per_name() {
        let registry = Registry::new();
        let writer = RegistryWriter::new(Arc::clone(&registry));

        writer.register_value("version", json!("1.0"));
        writer.register_value("version", json!("2.0"));

        match registry.get("version") {
            Some(Export::Value(v)) => assert_eq!(v, json!("1.0")),
            other => panic!("expected value export, got {other:?}"),
        }
        assert_eq!(registry.export_names().len(), 1);
    }

    #[tokio::test]
    async fn test_register_fn_is_normalized() {
        let registry = Registry::new();
        let writer = RegistryWriter::new(Arc::clone(&registry));

        writer.register_fn("add", |args: Vec<Value>| {
            let a = args.first().and_then(Value::as_i64).ok_or("missing a")?;
            let b = args.get(1).and_then(Value::as_i64).ok_or("missing b")?;
            Ok::<_, &str>(json!(a + b))
        });

        let Some(Export::Callable(func)) = registry.get("add") else {
            panic!("expected callable export");
        };

        let record = func(vec![json!(2), json!(3)]).await;
        assert_eq!(record, CallRecord::success(json!(5)));

        let record = func(vec![]).await;
        assert!(record.is_failure());
        assert_eq!(record.error.as_deref(), Some("missing a"));
    }

    #[test]
    fn test_readiness_is_monotonic() {
        let registry = Registry::new();
        let writer = RegistryWriter::new(Arc::clone(&registry));
        let mut rx = registry.ready_rx();

        assert!(!registry.is_ready());

        writer.set_ready();
        assert!(registry.is_ready());
        assert!(rx.has_changed().unwrap());
        rx.mark_unchanged();

        // A second signal is indistinguishable from silence.
        writer.set_ready();
        assert!(registry.is_ready());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_export_debug() {
        let value = Export::Value(json!(1));
        assert!(format!("{value:?}").contains("Value"));

        let callable = Export::Callable(Arc::new(|_| Box::pin(async { CallRecord::empty() })));
        assert_eq!(format!("{callable:?}"), "Callable");
    }
}
