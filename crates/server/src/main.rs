use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use torrhub_core::{
    load_config, validate_config, Engine, LibrqbitSessionManager, SessionManager,
    SettingsStore, SqliteCatalog, SqliteSettingsStore, SystemClock, TorrentCatalog,
};
use torrhub_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("TORRHUB_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Database path: {:?}", config.database.path);
    if config.read_only {
        info!("Running in read-only mode, settings changes will be refused");
    }

    // Create SQLite catalog (saved torrents)
    let catalog: Arc<dyn TorrentCatalog> = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to create torrent catalog")?,
    );
    info!("Torrent catalog initialized");

    // Create SQLite settings store (runtime swarm settings)
    let settings: Arc<dyn SettingsStore> = Arc::new(
        SqliteSettingsStore::new(&config.database.path, config.read_only)
            .context("Failed to create settings store")?,
    );
    info!("Settings store initialized");

    // Start the embedded BitTorrent session
    let sessions: Arc<dyn SessionManager> = Arc::new(
        LibrqbitSessionManager::new(&settings.current(), config.engine.metadata_timeout())
            .await
            .context("Failed to start BitTorrent session")?,
    );
    info!("Using session manager: {}", sessions.name());

    let engine = Engine::new(
        sessions,
        catalog,
        settings,
        Arc::new(SystemClock),
        &config.engine,
    );
    let sweeper_handle = engine.spawn_idle_sweeper();
    info!("Idle session sweeper started");

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), engine.clone()));

    // Create router
    let app = create_router(Arc::clone(&state));

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    let shutdown_state = Arc::clone(&state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown_signal() => {},
                _ = shutdown_state.shutdown_requested() => {},
            }
        })
        .await
        .context("Server error")?;

    // Stop the engine; a no-op if the shutdown endpoint already did
    info!("Server shutting down...");
    engine.shutdown().await;
    let _ = sweeper_handle.await;
    info!("Engine stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
