//! Paygate Web Server.
//!
//! Serves the Stripe webhook endpoint and payment intent creation. Verified
//! webhook deliveries are acknowledged immediately; when `CLOUDAMQP_URL` is
//! set their outcomes are forwarded to the payment_events queue.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use paygate::web::{router, AppState};
use paygate::{Config, Dispatcher, Publisher, StripeClient, WebhookGateway, WebhookVerifier};

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

    let config = Config::from_env();
    info!(
        port = config.port,
        stripe_key_configured = config.stripe_secret_key.is_some(),
        webhook_secret_configured = config.stripe_webhook_secret.is_some(),
        webhook_tolerance_secs = config.webhook_tolerance_secs,
        forwarding_configured = config.cloudamqp_url.is_some(),
        cors_origins = ?config.cors_allowed_origins,
        "config_loaded"
    );

    let stripe_key = config
        .stripe_secret_key
        .clone()
        .context("STRIPE_SECRET_KEY must be set")?;

    let stripe = StripeClient::new(
        &config.stripe_api_base,
        &stripe_key,
        Duration::from_millis(config.stripe_request_timeout_ms),
    )?;

    let verifier = WebhookVerifier::from_secret(
        config.stripe_webhook_secret.as_deref(),
        config.webhook_tolerance_secs,
    );
    if verifier.is_none() {
        warn!("stripe_webhook_secret_missing");
    }

    let publisher = config.cloudamqp_url.clone().map(Publisher::new);
    let dispatcher = match &publisher {
        Some(p) => Dispatcher::with_forwarder(
            p.clone(),
            Duration::from_millis(config.forward_timeout_ms),
        ),
        None => Dispatcher::logging_only(),
    };

    let gateway = WebhookGateway::new(verifier, dispatcher);
    let state = AppState::new(config.clone(), gateway, stripe);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    if let Some(publisher) = publisher {
        publisher.close().await;
    }

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
