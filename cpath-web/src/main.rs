//! cpath-web - career path collection service
//!
//! Serves the submission form, the chart page and a small JSON API on top of
//! a SQLite aggregate store.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cpath_common::config::{
    default_config_path, load_toml_config, resolve_root_folder, RootFolderInitializer,
    ROOT_FOLDER_ENV,
};
use cpath_common::db::init_database;
use cpath_web::{build_router, AppState, WebConfig};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cpath-web")]
#[command(about = "Career path collection and charts", long_about = None)]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the port of `bind_addr`)
    #[arg(short, long, env = "CPATH_PORT")]
    port: Option<u16>,

    /// Root folder holding the database and submissions log
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(short, long, env = "CPATH_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => Default::default(),
    };

    // RUST_LOG wins over the config file level
    let default_filter = format!(
        "cpath_web={level},cpath_common={level},tower_http={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting cpath-web v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &config_path {
        Some(path) if path.exists() => info!("Loaded config from {}", path.display()),
        Some(path) => warn!("Config file not found at {}, using defaults", path.display()),
        None => warn!("No config directory on this platform, using defaults"),
    }

    let root_folder = resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml_config);
    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let db_path = initializer.database_path();
    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    info!("Database ready: {}", db_path.display());

    if toml_config.allow_delete {
        warn!("POST /delete is enabled");
    }

    let state = AppState::new(pool, WebConfig::new(&initializer, &toml_config));
    let app = build_router(state);

    let mut addr: SocketAddr = toml_config
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind_addr {:?}", toml_config.bind_addr))?;
    if let Some(port) = args.port {
        addr.set_port(port);
    }

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("cpath-web listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
