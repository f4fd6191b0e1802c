//! wasm-bridge CLI entry point.
//!
//! Attaches a WebAssembly module and either lists its exports or invokes
//! one of them with JSON arguments.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wasm_bridge_common::ConfigFile;
use wasm_bridge_core::{BridgeConfig, BytesSource, attach};
use wasm_bridge_host::WasmRuntime;

#[derive(Parser, Debug)]
#[command(
    name = "wasm-bridge",
    about = "Invoke exports of an embedded WebAssembly module"
)]
struct Cli {
    /// Path to the WebAssembly module.
    module: PathBuf,

    /// Name of the export to invoke. When omitted, lists exports instead.
    export: Option<String>,

    /// Arguments for the export, each parsed as JSON (bare words become
    /// strings).
    args: Vec<String>,

    /// Optional TOML configuration file.
    #[arg(long, env = "WASM_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the readiness watchdog deadline, in milliseconds.
    #[arg(long)]
    watchdog_ms: Option<u64>,

    /// Override the readiness fallback tick, in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wasm_bridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            ConfigFile::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?
                .bridge
        }
        None => BridgeConfig::default(),
    };
    if let Some(ms) = cli.watchdog_ms {
        config.watchdog_ms = ms;
    }
    if let Some(ms) = cli.tick_ms {
        config.tick_ms = ms;
    }

    let bytes = tokio::fs::read(&cli.module)
        .await
        .with_context(|| format!("Failed to read module {}", cli.module.display()))?;
    info!(module = %cli.module.display(), bytes_len = bytes.len(), "Attaching module");

    let runtime = WasmRuntime::new()?;
    let surface = attach(&runtime, BytesSource::Ready(bytes), &config).await?;

    match cli.export {
        None => {
            let mut names = surface.exports().await?;
            names.sort();
            for name in names {
                println!("{name}");
            }
        }
        Some(export) => {
            let args = cli.args.iter().map(|raw| parse_arg(raw)).collect();
            let value = surface.invoke(&export, args).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

/// Parse a CLI argument as JSON, falling back to a plain string so callers
/// can write `wasm-bridge mod.wasm greet world` without quoting.
fn parse_arg(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_arg() {
        assert_eq!(parse_arg("5"), json!(5));
        assert_eq!(parse_arg("[1,2]"), json!([1, 2]));
        assert_eq!(parse_arg("\"quoted\""), json!("quoted"));
        assert_eq!(parse_arg("bare-word"), json!("bare-word"));
    }
}
