//! mealbox-sf - Storefront core service
//!
//! Owns the cart and favorites cache on local disk, talks to the remote
//! catalog and favorites services, and serves the browser UI a JSON + SSE API
//! on 127.0.0.1.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use mealbox_common::config::{load_config, RootFolderInitializer, RootFolderResolver, API_URL_ENV};
use mealbox_common::db::init_database;
use mealbox_common::{EventBus, SqliteStore};
use mealbox_sf::catalog::HttpCatalogClient;
use mealbox_sf::favorites::HttpFavoritesClient;
use mealbox_sf::{build_router, AppState, EVENT_BUS_CAPACITY};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for mealbox-sf
#[derive(Parser, Debug)]
#[command(name = "mealbox-sf")]
#[command(about = "Meal subscription storefront core")]
#[command(version)]
struct Args {
    /// Root folder holding the durable store
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Base URL of the remote storefront API (overrides config file)
    #[arg(long, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Path to the TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    init_tracing(&config.logging.level, config.logging.file.as_deref())?;

    // Log build identification immediately after tracing init
    info!(
        "Starting Mealbox Storefront (mealbox-sf) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("storefront")
        .with_cli_arg(args.root_folder)
        .with_toml_config(&config)
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Durable store ready");
            pool
        }
        Err(e) => {
            error!("Failed to open durable store: {}", e);
            return Err(e.into());
        }
    };

    let api_url = args.api_url.unwrap_or_else(|| config.api_base_url.clone());
    let timeout = Duration::from_secs(config.storefront.request_timeout_secs);
    info!("Remote storefront API: {}", api_url);

    let catalog_client = HttpCatalogClient::new(&api_url, timeout).context("Failed to build catalog client")?;
    let favorites_client =
        HttpFavoritesClient::new(&api_url, timeout).context("Failed to build favorites client")?;

    let state = AppState::new(
        Arc::new(SqliteStore::new(pool)),
        Arc::new(catalog_client),
        Arc::new(favorites_client),
        config.storefront.clone(),
        EventBus::new(EVENT_BUS_CAPACITY),
    )
    .await;

    let cached = state.favorites.restore_cached().await;
    info!(
        "Cart restored ({} items), {} cached favorites",
        state.cart.cart_count().await,
        cached
    );

    // Catalog loads in the background; browsing and the configurator gate on it
    let catalog = Arc::clone(&state.catalog);
    tokio::spawn(async move {
        catalog.load().await;
    });

    let app = build_router(state);

    let port = args.port.unwrap_or(config.port);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("mealbox-sf listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// `RUST_LOG` directives take precedence over the configured level.
fn init_tracing(level: &str, log_file: Option<&std::path::Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("mealbox_sf={level},mealbox_common={level},tower_http={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
