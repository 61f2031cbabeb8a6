//! emport-svc - Configuration Export/Import Service
//!
//! Exports selected configuration categories as one JSON document and imports
//! such documents back as background tasks, one per owner.

use anyhow::{Context, Result};
use clap::Parser;
use emport_common::config::{resolve_config_path, TomlConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use emport_svc::AppState;

/// Command-line arguments for emport-svc
#[derive(Parser, Debug)]
#[command(name = "emport-svc")]
#[command(about = "Configuration export/import service")]
#[command(version)]
struct Args {
    /// TOML config file
    #[arg(short, long, env = "EMPORT_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "EMPORT_PORT")]
    port: Option<u16>,

    /// Interface to bind (overrides config file)
    #[arg(long, env = "EMPORT_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// Export document to load at startup (overrides config file)
    #[arg(long, env = "EMPORT_SEED_FILE")]
    seed_file: Option<PathBuf>,

    /// Largest accepted import request body in bytes (overrides config file)
    #[arg(long, env = "EMPORT_MAX_IMPORT_BYTES")]
    max_import_bytes: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), "emport-svc");
    let mut config = TomlConfig::load(&config_path)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(bind_address) = args.bind_address {
        config.bind_address = bind_address;
    }
    if args.seed_file.is_some() {
        config.seed_file = args.seed_file;
    }
    if let Some(max_import_bytes) = args.max_import_bytes {
        config.max_import_bytes = max_import_bytes;
    }

    emport_common::logging::init_tracing(&config.logging)?;

    // Build identification first, before any slow startup work
    info!(
        "Starting emport-svc v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if config_path.exists() {
        info!("Config file: {}", config_path.display());
    } else {
        warn!(
            "Config file {} not found, using compiled defaults",
            config_path.display()
        );
    }

    let store = emport_svc::load_seed_store(config.seed_file.as_deref())
        .context("Failed to initialize category store")?;

    let state = AppState::new(Arc::new(store), config.export_indent)
        .with_max_import_bytes(config.max_import_bytes);
    let app = emport_svc::build_router(state);

    let address = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("emport-svc stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
