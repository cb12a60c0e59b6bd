//! HTTP endpoint handlers.
//!
//! The webhook handler does no work of its own: it hands the raw body and the
//! signature header to [`WebhookGateway::handle`] and returns its reply.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PaymentError;
use crate::payments::{CreatePaymentIntent, PaymentIntentResponse, StripeClient};
use crate::stats::{GatewayStats, StatsSnapshot};
use crate::webhook::{WebhookGateway, SIGNATURE_HEADER};
use crate::Config;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gateway: Arc<WebhookGateway>,
    pub stripe: StripeClient,
    pub stats: Arc<GatewayStats>,
}

impl AppState {
    pub fn new(config: Config, gateway: WebhookGateway, stripe: StripeClient) -> Self {
        Self {
            config: Arc::new(config),
            gateway: Arc::new(gateway),
            stripe,
            stats: Arc::new(GatewayStats::new()),
        }
    }
}

// =============================================================================
// Health and Stats
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

/// Request counters since process start.
pub async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot())
}

// =============================================================================
// Stripe Webhook
// =============================================================================

/// Stripe webhook endpoint.
///
/// The body is taken as raw bytes: the signature covers the exact bytes sent,
/// so it must not be parsed or re-serialized before verification.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    let reply = state.gateway.handle(&body, signature).await;
    state.stats.record_webhook(reply.is_accepted());

    (reply.status, Json(reply.body))
}

// =============================================================================
// Payment Intents
// =============================================================================

/// Create a payment intent and return its client secret.
///
/// Undecodable bodies (missing fields, wrong types, wrong content type) are
/// reported as `422 {detail}`, the same as failed field validation.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    payload: Result<Json<CreatePaymentIntent>, JsonRejection>,
) -> Result<Json<PaymentIntentResponse>, PaymentError> {
    let Json(request) = payload.inspect_err(|rejection| {
        warn!(error = %rejection.body_text(), "payment_intent_request_rejected");
    })?;
    request.validate()?;

    info!(
        order_id = %request.order_id,
        amount = request.amount,
        currency = %request.currency.to_uppercase(),
        "payment_intent_requested"
    );

    let intent = state.stripe.create_payment_intent(&request).await?;

    Ok(Json(PaymentIntentResponse {
        client_secret: intent.client_secret,
    }))
}
