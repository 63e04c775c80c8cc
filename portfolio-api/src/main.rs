//! Portfolio API server.
//!
//! This binary serves the two JSON endpoints behind the portfolio site:
//! - `POST /api/contact`: validates a contact form and emails it
//! - `POST /api/chat`: forwards a chat turn to the language model
//!
//! Each endpoint has its own in-memory fixed-window rate limiter, swept in
//! the background.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use portfolio::limiter::spawn_sweeper;
use portfolio::{router, AppState, Config, FixedWindowLimiter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("portfolio_api_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        mail_configured = config.mail.is_some(),
        chat_configured = config.chat.is_some(),
        contact_rate_limit = config.contact_rate_limit.max_requests,
        contact_rate_window_secs = config.contact_rate_limit.window.as_secs(),
        chat_rate_limit = config.chat_rate_limit.max_requests,
        chat_rate_window_secs = config.chat_rate_limit.window.as_secs(),
        max_clients = config.rate_limit_max_clients,
        "config_loaded"
    );

    // One limiter per endpoint, each with its own sweeper
    let contact_limiter = Arc::new(FixedWindowLimiter::new(
        "contact",
        config.contact_rate_limit,
        config.rate_limit_max_clients,
    ));
    let chat_limiter = Arc::new(FixedWindowLimiter::new(
        "chat",
        config.chat_rate_limit,
        config.rate_limit_max_clients,
    ));

    let sweepers = [
        spawn_sweeper(Arc::clone(&contact_limiter), config.rate_limit_sweep_interval),
        spawn_sweeper(Arc::clone(&chat_limiter), config.rate_limit_sweep_interval),
    ];

    let http = reqwest::Client::builder()
        .build()
        .context("Failed to build HTTP client")?;

    let port = config.port;
    let state = AppState::new(config, contact_limiter, chat_limiter).connect(http)?;

    let app = router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "portfolio_api_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    for sweeper in sweepers {
        sweeper.abort();
    }

    info!("portfolio_api_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
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
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("portfolio_api_shutting_down");
}
