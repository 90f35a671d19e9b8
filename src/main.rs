//! NetScaler Exporter Binary Entry Point
//!
//! Loads the YAML configuration, builds one NITRO client per target and
//! serves the scrape endpoint. Core functionality is provided by the
//! `netscaler_exporter` library crate.

use clap::Parser;
use netscaler_exporter::{
    collector::Exporter,
    config::AppConfig,
    server::{AppState, create_router},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// NetScaler Exporter - Prometheus metrics from the NITRO stats API
#[derive(Parser, Debug)]
#[command(name = "netscaler-exporter", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "configs/config.yaml",
        env = "NETSCALER_EXPORTER_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, env = "NETSCALER_EXPORTER_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, env = "NETSCALER_EXPORTER_SERVER_PORT")]
    server_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,netscaler_exporter=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("NetScaler Exporter {}", env!("CARGO_PKG_VERSION"));

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    let overridden = cli.server_bind.is_some() || cli.server_port.is_some();
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    if overridden {
        config.validate()?;
    }

    let targets = &config.netscaler.static_targets;
    if targets.is_empty() {
        tracing::warn!("No targets configured; scrapes will return no series");
    }
    for target in targets {
        tracing::info!(
            ns_host = %target.host,
            url = %target.base_url(),
            timeout = %humantime::format_duration(target.timeout),
            insecure_skip_verify = target.insecure_skip_verify,
            "Registered target"
        );
    }

    // A target whose client cannot be built is fatal
    let exporter = Exporter::from_targets(targets).inspect_err(|e| {
        tracing::error!(error = %e, "Failed to initialize exporter");
    })?;

    let app_state = AppState {
        exporter: Arc::new(exporter),
        metrics_path: config.server.metrics_path.clone(),
    };

    // Build Axum router
    let app = create_router(app_state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;

    tracing::info!(
        "Serving metrics on: http://{}{}",
        addr,
        config.server.metrics_path
    );
    tracing::info!("Press Ctrl+C to shutdown");

    // Start server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Setup graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
