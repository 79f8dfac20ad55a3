//! waypoint-engine - Content identity & resolution service
//!
//! Resolves career and soft-skill names to one persisted roadmap each, caches
//! quiz suggestions by answer fingerprint, and serves the merged category
//! listing over a small JSON API.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use waypoint_common::config::{prepare_root_folder, resolve_root_folder, TomlConfig};

use waypoint_engine::db::{self, SqliteStore};
use waypoint_engine::services::{HttpGenerator, RoadmapEngine};
use waypoint_engine::AppState;

/// Command-line arguments for waypoint-engine
#[derive(Parser, Debug)]
#[command(name = "waypoint-engine")]
#[command(about = "Content identity and resolution service for Waypoint")]
#[command(version)]
struct Args {
    /// Configuration file (waypoint.toml)
    #[arg(short, long, env = "WAYPOINT_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Address to bind (overrides [server] host)
    #[arg(long, env = "WAYPOINT_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides [server] port)
    #[arg(short, long, env = "WAYPOINT_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is loaded before tracing starts so the level can come from it;
    // the loader's own diagnostics are therefore not printed.
    let toml_config = TomlConfig::load_or_default(args.config.as_deref());

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&toml_config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting waypoint-engine");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Root folder and database
    let root_folder = resolve_root_folder(args.root_folder.as_deref(), &toml_config);
    let db_path = prepare_root_folder(&root_folder)
        .with_context(|| format!("Failed to initialize root folder {}", root_folder.display()))?;
    info!("Database: {}", db_path.display());

    let pool = db::init_database_pool(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Database connection established");

    // Generation service
    let api_key = waypoint_engine::config::resolve_generator_api_key(&pool, &toml_config).await?;
    let generator = HttpGenerator::new(&toml_config.generator, api_key)
        .context("Failed to build generation client")?;
    info!("Generation service: {}", toml_config.generator.base_url);

    let taxonomy = waypoint_engine::config::load_taxonomy(&toml_config)
        .context("Failed to load category taxonomy")?;

    let engine = RoadmapEngine::new(
        Arc::new(SqliteStore::new(pool)),
        Arc::new(generator),
        Arc::new(taxonomy),
        Duration::from_millis(toml_config.leases.max_wait_ms),
    );

    let app = waypoint_engine::build_router(AppState::new(Arc::new(engine)));

    let host = args.host.unwrap_or(toml_config.server.host);
    let port = args.port.unwrap_or(toml_config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
