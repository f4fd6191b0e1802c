//! Wasmtime-backed embedded runtime for wasm-bridge.
//!
//! This crate implements the core's
//! [`EmbeddedRuntime`](wasm_bridge_core::EmbeddedRuntime) seam with
//! Wasmtime:
//! - [`BridgeEngine`]: configured async Wasmtime engine
//! - [`GuestModule`]: compiled guest module with header validation
//! - [`WasmRuntime`]: attachment lifecycle (instantiate, run `_start`,
//!   serve dispatched calls)
//! - [`linker`]: the `"bridge"` host-function imports guests register
//!   exports and readiness through

pub mod engine;
pub mod linker;
pub mod logging;
pub mod module;
pub mod runtime;
pub mod store;

pub use engine::BridgeEngine;
pub use logging::{GuestLogLevel, emit_guest_log, level_from_i32};
pub use module::GuestModule;
pub use runtime::WasmRuntime;
pub use store::{CallRequest, GuestContext};
