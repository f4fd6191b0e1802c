//! Integration tests for wasm-bridge-host.
//!
//! These tests attach real WebAssembly guests (written in WAT) through the
//! full bridge stack and verify:
//! - value registration and readiness signalling from guest code
//! - the guest call ABI (alloc, packed result pointer, normalized records)
//! - malformed-image rejection and attachment isolation

use std::time::Duration;

use serde_json::{Value, json};
use tokio::time::timeout;

use wasm_bridge_core::{BridgeConfig, BridgeError, attach};
use wasm_bridge_host::WasmRuntime;

fn config() -> BridgeConfig {
    BridgeConfig {
        watchdog_ms: 3_000,
        tick_ms: 10,
    }
}

/// Guest publishing one plain value and one log line, then readiness.
const VALUE_GUEST: &str = r#"
    (module
        (import "bridge" "export_value" (func $export_value (param i32 i32 i32 i32)))
        (import "bridge" "ready" (func $ready))
        (import "bridge" "log" (func $log (param i32 i32 i32)))
        (memory (export "memory") 1)
        (data (i32.const 0) "version")
        (data (i32.const 16) "\"1.0\"")
        (data (i32.const 32) "registering exports")
        (func (export "_start")
            (call $log (i32.const 1) (i32.const 32) (i32.const 19))
            (call $export_value (i32.const 0) (i32.const 7) (i32.const 16) (i32.const 5))
            (call $ready)))
"#;

/// Guest publishing two callables: `add` always answers `{"result":5}`,
/// `fail` always answers `{"error":"boom"}`. Both follow the packed
/// ptr<<32|len return convention.
const CALLABLE_GUEST: &str = r#"
    (module
        (import "bridge" "export_func" (func $export_func (param i32 i32)))
        (import "bridge" "ready" (func $ready))
        (memory (export "memory") 1)
        (data (i32.const 0) "add")
        (data (i32.const 16) "{\"result\":5}")
        (data (i32.const 64) "fail")
        (data (i32.const 80) "{\"error\":\"boom\"}")
        (func (export "bridge_alloc") (param i32) (result i32)
            (i32.const 4096))
        (func (export "add") (param i32 i32) (result i64)
            (i64.or (i64.shl (i64.const 16) (i64.const 32)) (i64.const 12)))
        (func (export "fail") (param i32 i32) (result i64)
            (i64.or (i64.shl (i64.const 80) (i64.const 32)) (i64.const 16)))
        (func (export "_start")
            (call $export_func (i32.const 0) (i32.const 3))
            (call $export_func (i32.const 64) (i32.const 4))
            (call $ready)))
"#;

/// Guest that registers nothing and never signals readiness.
const SILENT_GUEST: &str = r#"
    (module
        (memory (export "memory") 1)
        (func (export "_start")))
"#;

#[tokio::test]
async fn test_value_export_from_guest() {
    let runtime = WasmRuntime::new().unwrap();
    let bytes = wat::parse_str(VALUE_GUEST).unwrap();

    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let value = surface.invoke("version", vec![]).await.unwrap();
    assert_eq!(value, json!("1.0"));

    // With arguments the value still resolves (leniency policy).
    let value = surface.invoke("version", vec![json!(1)]).await.unwrap();
    assert_eq!(value, json!("1.0"));
}

#[tokio::test]
async fn test_callable_export_from_guest() {
    let runtime = WasmRuntime::new().unwrap();
    let bytes = wat::parse_str(CALLABLE_GUEST).unwrap();

    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let value = surface.invoke("add", vec![json!(2), json!(3)]).await.unwrap();
    assert_eq!(value, json!(5));

    let err = surface.invoke("fail", vec![]).await.unwrap_err();
    assert!(
        matches!(err, BridgeError::Invocation { ref message } if message == "boom"),
        "unexpected error: {err}"
    );

    // Per-call failures leave the bridge serving.
    let value = surface.invoke("add", vec![]).await.unwrap();
    assert_eq!(value, json!(5));
}

#[tokio::test]
async fn test_unknown_export_resolves_null() {
    let runtime = WasmRuntime::new().unwrap();
    let bytes = wat::parse_str(VALUE_GUEST).unwrap();

    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let value = surface.invoke("missing", vec![]).await.unwrap();
    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn test_guest_without_readiness_keeps_calls_pending() {
    let runtime = WasmRuntime::new().unwrap();
    let bytes = wat::parse_str(SILENT_GUEST).unwrap();

    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let result = timeout(Duration::from_millis(60), surface.invoke("anything", vec![])).await;
    assert!(result.is_err(), "call must stay pending while not ready");
}

#[tokio::test]
async fn test_malformed_bytes_fail_attach_without_touching_others() {
    let runtime = WasmRuntime::new().unwrap();

    let bytes = wat::parse_str(VALUE_GUEST).unwrap();
    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let err = attach(&runtime, b"not wasm at all".as_slice().into(), &config())
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Instantiation { .. }));

    // The earlier attachment keeps working.
    let value = surface.invoke("version", vec![]).await.unwrap();
    assert_eq!(value, json!("1.0"));
}

#[tokio::test]
async fn test_export_listing_from_guest() {
    let runtime = WasmRuntime::new().unwrap();
    let bytes = wat::parse_str(CALLABLE_GUEST).unwrap();

    let surface = attach(&runtime, bytes.into(), &config()).await.unwrap();

    let mut names = surface.exports().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["add", "fail"]);
}
