//! recipe-api - Recipe management REST service
//!
//! `serve` (the default) runs the HTTP API; `create-superuser` adds an admin
//! account and exits.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recipe_common::config::{ConfigOverrides, ServiceConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recipe_api::db::{init_database, users, wait_for_database};
use recipe_api::media::MediaStore;
use recipe_api::{build_router, AppState};

/// Delay between database connection attempts at startup
const DB_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Command-line arguments for recipe-api
#[derive(Parser, Debug)]
#[command(name = "recipe-api")]
#[command(about = "Recipe management REST service")]
#[command(version)]
struct Args {
    /// TOML bootstrap config file
    #[arg(short, long, env = "RECIPE_API_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind
    #[arg(long, env = "RECIPE_API_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "RECIPE_API_PORT")]
    port: Option<u16>,

    /// SQLite database file
    #[arg(long, env = "RECIPE_DATABASE")]
    database: Option<PathBuf>,

    /// Directory uploaded images are stored in
    #[arg(long, env = "RECIPE_MEDIA_ROOT")]
    media_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,

    /// Create a staff superuser account
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long, env = "RECIPE_SUPERUSER_PASSWORD")]
        password: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let overrides = ConfigOverrides {
        config_file: args.config,
        host: args.host,
        port: args.port,
        database_path: args.database,
        media_root: args.media_root,
    };
    let config = ServiceConfig::resolve(overrides).context("Failed to load configuration")?;

    init_tracing(&config.log_level);

    // Build identification first, before any database delay
    info!(
        "Starting recipe-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateSuperuser { email, password } => {
            create_superuser(&config, &email, &password).await
        }
    }
}

/// `RUST_LOG` wins; otherwise the configured level applies to this service
fn init_tracing(level: &str) {
    let default_filter = if level.contains('=') {
        level.to_string()
    } else {
        format!(
            "recipe_api={level},recipe_common={level},tower_http={level}",
            level = level
        )
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: ServiceConfig) -> Result<()> {
    info!("Database path: {}", config.database_path.display());
    info!("Media root: {}", config.media_root.display());

    let media = MediaStore::new(config.media_root.clone(), config.media_url.clone());
    media
        .ensure_root()
        .await
        .with_context(|| format!("Failed to create {}", config.media_root.display()))?;

    let pool = match wait_for_database(
        &config.database_path,
        config.db_connect_attempts,
        DB_RETRY_DELAY,
    )
    .await
    {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let state = AppState::new(pool, media);
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("recipe-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn create_superuser(config: &ServiceConfig, email: &str, password: &str) -> Result<()> {
    let pool = init_database(&config.database_path)
        .await
        .context("Failed to open database")?;

    let user = users::create_superuser(&pool, email, password)
        .await
        .context("Failed to create superuser")?;
    info!("Superuser {} created (id {})", user.email, user.id);

    pool.close().await;
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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
