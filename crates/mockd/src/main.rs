//! mockd — mock data server daemon.
//!
//! Loads a bootstrap JSON document (plain or zstd-compressed) into memory
//! and serves it over the REST API in `mockdata-api`. Writes live only in
//! memory and are discarded when the process exits.
//!
//! # Usage
//!
//! ```text
//! mockd serve --http-addr :8000 --datafile data.json.zst
//! ```

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mockdata_store::DataStore;

use crate::config::{ServeArgs, Settings};

const DEFAULT_LOG_FILTER: &str = "info,mockd=debug,mockdata_store=debug,mockdata_api=debug";

#[derive(Parser)]
#[command(name = "mockd", about = "Mock JSON data server", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load the bootstrap document and serve it over HTTP.
    Serve(ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => {
            let settings = Settings::resolve(&args)?;
            init_tracing(settings.log_json);
            run_serve(settings).await
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run_serve(settings: Settings) -> anyhow::Result<()> {
    info!(datafile = ?settings.datafile, compression = %settings.load.compression, "mockd starting");

    // A malformed document is fatal: serving it would be meaningless.
    let doc = mockdata_store::load(&settings.datafile, settings.load)
        .with_context(|| format!("loading {}", settings.datafile.display()))?;
    let store = DataStore::new(doc);
    info!(records = store.record_count(), "data store ready");

    let router = mockdata_api::build_router(store);
    let listener = tokio::net::TcpListener::bind(settings.http_addr).await?;
    info!(addr = %settings.http_addr, "API server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("mockd stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => {
            error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
