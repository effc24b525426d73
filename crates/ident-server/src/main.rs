//! Ident - CPF identity backend

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use ident_api::{AppState, CredentialService, MetricsHandle, create_router};
use ident_auth::{PasswordHasher, TokenManager};
use ident_db::Database;

/// Ident - user registration and bearer-token issuance keyed by CPF
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", env = "IDENT_CONFIG")]
    config: String,

    /// Bind address
    #[arg(long, env = "IDENT_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "IDENT_PORT")]
    port: Option<u16>,

    /// JWT signing secret (overrides the config file)
    #[arg(long, env = "IDENT_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    if let Some(secret) = args.jwt_secret {
        config.auth.jwt_secret = secret;
    }

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Ident v{}", env!("CARGO_PKG_VERSION"));
    config.warn_insecure_defaults();

    // Create data directory
    if let Some(parent) = Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    let hasher = PasswordHasher::new(config.password.clone())
        .context("Invalid [password] hashing parameters")?;
    let tokens = Arc::new(TokenManager::new(
        &config.auth.jwt_secret,
        &config.auth.issuer,
        config.auth.lifetimes()?,
    ));
    let service = CredentialService::new(db, hasher, tokens)
        .context("Failed to initialize credential service")?;

    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(MetricsHandle::new(handle)))
    } else {
        None
    };

    let state = AppState::new(Arc::new(service));
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
