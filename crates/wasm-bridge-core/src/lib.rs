//! Cross-runtime call bridge core.
//!
//! This crate lets a host invoke functions and read values exported by an
//! embedded module instantiated in-process, without knowing ahead of time
//! which names exist or whether a name is a function or a plain value:
//! - [`attach`]: instantiate a module and obtain its capability surface
//! - [`CapabilitySurface`]: name-driven, uniformly asynchronous access to
//!   the module's exports
//! - [`RegistryWriter`]: the module-side registration contract
//! - [`EmbeddedRuntime`]: the seam a concrete module engine implements
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    attach(runtime, bytes)                │
//! │  resolve bytes → instantiate → spawn execution unit      │
//! │  → arm readiness watchdog                                │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                       Registry                           │
//! │  module side writes (write-once names, monotonic ready)  │
//! │  host side polls                                         │
//! └─────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                  CapabilitySurface                       │
//! │  exited? → wait ready → look up → value | normalized     │
//! │  callable result                                         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod bridge;
pub mod normalize;
mod readiness;
pub mod registry;
pub mod runtime;
pub mod surface;

pub use bridge::attach;
pub use normalize::{CallRecord, normalize};
pub use registry::{Export, ExportFn, ExportFuture, Registry, RegistryWriter};
pub use runtime::{BytesSource, EmbeddedRuntime, ExecutionUnit};
pub use surface::{CapabilitySurface, ExportHandle};

pub use wasm_bridge_common::{BridgeConfig, BridgeError};
