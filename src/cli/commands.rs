//! CLI command implementations
//!
//! Boot sequence for `start`:
//! 1. Build the store from the environment
//! 2. Verify every required collection exists
//! 3. Bind the listener and serve
//!
//! A failure in any step ends the process before traffic is accepted.

use std::sync::Arc;

use crate::http_server::{HttpServer, HttpServerConfig};
use crate::store::{
    verify_collections, CloudantClient, CloudantConfig, Collection, MemoryStore, SharedStore,
};

use super::args::Command;
use super::errors::{CliError, CliResult};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    init_logging();
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Start {
            host,
            port,
            in_memory,
        } => start(host, port, in_memory),
        Command::Check { in_memory } => check(in_memory),
    }
}

/// Install the global tracing subscriber; `RUST_LOG` overrides the `info` default.
///
/// Returns `false` when a subscriber was already installed.
fn init_logging() -> bool {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}

fn runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::boot_failed(format!("Failed to create tokio runtime: {}", e)))
}

/// Build the store named by the flags and environment
pub fn build_store(in_memory: bool) -> CliResult<SharedStore> {
    if in_memory {
        tracing::warn!("using in-memory store; documents are lost on exit");
        return Ok(Arc::new(MemoryStore::with_collections(&Collection::ALL)));
    }

    let config = CloudantConfig::from_env();
    let client = CloudantClient::new(&config)
        .map_err(|e| CliError::config_error(format!("Invalid database configuration: {}", e)))?;
    tracing::info!(account = %config.account, url = %client.base_url(), "using Cloudant store");
    Ok(Arc::new(client))
}

/// Verify the database, then serve until the process is terminated
pub fn start(host: Option<String>, port: Option<u16>, in_memory: bool) -> CliResult<()> {
    let mut http_config = HttpServerConfig::from_env();
    if let Some(host) = host {
        http_config.host = host;
    }
    if let Some(port) = port {
        http_config.port = port;
    }

    let store = build_store(in_memory)?;

    runtime()?.block_on(async move {
        verify_collections(store.as_ref(), &Collection::ALL).await?;

        let server = HttpServer::new(http_config, store);
        server
            .start()
            .await
            .map_err(|e| CliError::boot_failed(format!("HTTP server failed: {}", e)))
    })
}

/// Verify the database and report
pub fn check(in_memory: bool) -> CliResult<()> {
    let store = build_store(in_memory)?;

    runtime()?.block_on(async move {
        verify_collections(store.as_ref(), &Collection::ALL).await?;
        println!("All {} collections present", Collection::ALL.len());
        Ok::<(), CliError>(())
    })
}
