//! voxgate server binary.
//!
//! Starts the axum HTTP server with structured logging, database
//! initialization, and graceful shutdown on SIGTERM/SIGINT.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use voxgate_server::{app, config, AppState};
use voxgate_voice::VoiceService;

/// LiveKit token, room and admin API.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(env = "VOXGATE_CONFIG_PATH", default_value = "config.toml")]
    config: String,
}

#[tokio::main]
async fn main() {
    // Before clap, so the env file can supply VOXGATE_CONFIG_PATH.
    let env_file = config::load_env_file();
    let cli = Cli::parse();

    let config = config::load_config(Some(&cli.config))
        .expect("failed to load configuration");

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        path = %cli.config,
        env_file = ?env_file,
        "resolved startup configuration"
    );

    let pool = voxgate_db::create_pool(&config.database.path, config.database.runtime_settings())
        .expect("failed to create database pool; check database.path");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            voxgate_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    if !config.livekit.has_credentials() {
        tracing::warn!("LIVEKIT_API_KEY / LIVEKIT_API_SECRET not set; token and room endpoints will fail");
    }

    let state = AppState {
        pool,
        voice_service: Arc::new(VoiceService::new(config.livekit.clone())),
        allowed_origins: config.cors.allowed_origins.clone(),
    };
    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, livekit_url = %config.livekit.effective_url(), "starting voxgate server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("voxgate server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
