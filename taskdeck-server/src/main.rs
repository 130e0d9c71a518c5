//! Taskdeck server binary.
//!
//! Serves the task graph, group assignment, and resource reaction engine
//! over a JSON API. Caller identity arrives pre-resolved from an upstream
//! gateway as headers; the server itself never authenticates.
//!
//! # Usage
//!
//! ```bash
//! # Run on default address 0.0.0.0:9400
//! cargo run --bin taskdeck-server
//!
//! # Run on custom address
//! cargo run --bin taskdeck-server -- --bind 127.0.0.1:8080
//!
//! # Or via environment variable
//! TASKDECK_ADDR=127.0.0.1:8080 cargo run --bin taskdeck-server
//! ```

use std::sync::Arc;

use clap::Parser;
use taskdeck_server::api;
use taskdeck_server::config::{CliArgs, ServerConfig};
use taskdeck_server::engine::Engine;

#[tokio::main]
async fn main() {
    let cli = CliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match ServerConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(addr = %config.bind_addr, "starting taskdeck server");

    let engine = Arc::new(Engine::new());

    match api::start_server_with_state(&config.bind_addr, engine).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "taskdeck server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    }
}
