//! FormSG Web Server - reference webhook receiver.
//!
//! This binary provides a thin web server that:
//! - Receives FormSG webhooks
//! - Authenticates the `X-FormSG-Signature` header
//! - Decrypts submissions (and attachments, if enabled)
//!
//! Decrypted content is summarised in logs by count only.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use formsg::web::{formsg_webhook, health, AppState};
use formsg::{Config, FormSdk, HttpAttachmentFetcher};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    info!(
        port = config.port,
        mode = ?config.mode,
        webhook_uri = ?config.webhook_uri,
        form_secret_key_configured = config.form_secret_key.is_some(),
        fetch_attachments = config.fetch_attachments,
        "config_loaded"
    );

    let webhook_uri = config
        .webhook_uri
        .clone()
        .context("FORMSG_WEBHOOK_URI must be set to the registered webhook endpoint")?;
    let form_secret_key = config
        .form_secret_key
        .clone()
        .context("FORM_SECRET_KEY must be set")?;

    let sdk = FormSdk::from_config(&config).context("Invalid signing key configuration")?;
    let fetcher = HttpAttachmentFetcher::new(Duration::from_millis(config.request_timeout_ms))?;

    // Create application state
    let state = AppState::new(
        sdk,
        Arc::new(fetcher),
        &webhook_uri,
        &form_secret_key,
        config.fetch_attachments,
    );

    // Build the router
    let app = Router::new()
        .route("/health", get(health))
        .route("/webhook", post(formsg_webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("web_server_shutdown_complete");

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

    info!("web_server_shutting_down");
}
