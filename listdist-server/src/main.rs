//! listdist-server - contact-list upload and distribution service
//!
//! Accepts CSV/XLSX/XLS lists over HTTP, splits them across the agent
//! roster and persists the assignments to SQLite.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use listdist_common::api::load_api_token;
use listdist_common::config::{RootFolderInitializer, RootFolderResolver, TomlConfig};
use listdist_common::db::init_database;
use listdist_server::ingest::staging::purge_stale_uploads;
use listdist_server::{build_router, AppState};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "listdist-server")]
#[command(about = "Contact-list upload and distribution service")]
#[command(version)]
struct Args {
    /// HTTP server port
    #[arg(short, long, default_value = "5780", env = "LISTDIST_PORT")]
    port: u16,

    /// Address to bind
    #[arg(short, long, default_value = "127.0.0.1", env = "LISTDIST_BIND")]
    bind: IpAddr,

    /// Root folder holding the database and the uploads directory
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// TOML config file (defaults to the user config directory)
    #[arg(short, long, env = "LISTDIST_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config first: it carries the default log level
    let config_path = args
        .config
        .clone()
        .or_else(listdist_common::config::default_config_path);
    let toml_config = TomlConfig::load_or_default(config_path.as_deref());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification before any database work
    info!(
        "Starting listdist-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        _ => info!("No config file, using defaults"),
    }

    let root_folder = RootFolderResolver::new()
        .with_cli_arg(args.root_folder.clone())
        .with_toml(&toml_config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer
        .ensure_directory_exists()
        .context("Failed to create root folder")?;
    info!("Root folder: {}", initializer.root_folder().display());

    let uploads_dir = initializer.uploads_path();
    match purge_stale_uploads(&uploads_dir) {
        Ok(0) => {}
        Ok(n) => info!("Removed {} stale staged upload(s)", n),
        Err(e) => warn!("Could not purge {}: {}", uploads_dir.display(), e),
    }

    let db_path = initializer.database_path();
    let pool = match init_database(&db_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database {}: {}", db_path.display(), e);
            return Err(e.into());
        }
    };

    // Config file token wins over the settings table
    let api_token = match toml_config.api_token() {
        Some(token) => Some(token.to_string()),
        None => load_api_token(&pool).await.unwrap_or_else(|e| {
            warn!("Could not load API token from database: {}", e);
            None
        }),
    };
    if api_token.is_some() {
        info!("✓ API authentication enabled");
    } else {
        info!("API authentication disabled (no api_token configured)");
    }

    let max_upload_bytes = toml_config.max_upload_bytes();
    info!("Upload size limit: {} bytes", max_upload_bytes);

    let state = AppState::new(pool.clone(), uploads_dir, max_upload_bytes, api_token);
    let app = build_router(state);

    let addr = SocketAddr::new(args.bind, args.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("listdist-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    info!("listdist-server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
