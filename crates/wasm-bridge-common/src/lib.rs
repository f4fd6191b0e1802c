//! Common types, errors, and utilities for wasm-bridge.
//!
//! This crate provides shared functionality used across the wasm-bridge
//! workspace:
//! - Error types using `thiserror` for type-safe error handling
//! - Bridge timing configuration and TOML config-file loading

pub mod config;
pub mod config_file;
pub mod error;

pub use config::BridgeConfig;
pub use config_file::{ConfigFile, ConfigFileError};
pub use error::BridgeError;
