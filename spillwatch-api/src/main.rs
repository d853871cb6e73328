//! spillwatch-api - Main entry point
//!
//! HTTP/WebSocket front-end for the marine oil spill monitoring system:
//! relays bounded AIS collection windows and proxies the predictor and
//! alert collaborators.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spillwatch_api::{build_router, AppState};
use spillwatch_common::config::Settings;

/// Command-line arguments for spillwatch-api
#[derive(Parser, Debug)]
#[command(name = "spillwatch-api")]
#[command(about = "HTTP/WebSocket API for the Spillwatch monitoring system")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides config file)
    #[arg(short, long, env = "SPILLWATCH_PORT")]
    port: Option<u16>,

    /// Path to TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spillwatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting Spillwatch API v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    // Fail fast on a missing AIS credential rather than at the first relay
    settings
        .ais_config()
        .context("AIS feed not configured (set SPILLWATCH_AIS_API_KEY or [ais].api_key)")?;
    info!("Upstream AIS feed: {}", settings.ais.upstream_url);
    if settings.collaborators.predictor_url.is_none() {
        info!("Predictor collaborator not configured; /api/predict disabled");
    }
    if settings.collaborators.alert_url.is_none() {
        info!("Alert collaborator not configured; /api/send-alert disabled");
    }

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server host/port")?;

    let state = AppState::new(settings);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("spillwatch-api listening on http://{}", addr);
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
