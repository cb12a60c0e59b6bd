//! Web server module: routes, CORS policy, request counting and tracing.

pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::stats::GatewayStats;

pub use handlers::{
    create_payment_intent, health, stats, stripe_webhook, AppState, HealthResponse,
};

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origins);

    Router::new()
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/webhook", post(stripe_webhook))
        .route("/create-payment-intent", post(create_payment_intent))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.stats.clone(),
            count_requests,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Counts every request the router sees, including ones turned away by an
/// extractor, the CORS layer or the 404 fallback.
async fn count_requests(
    State(stats): State<Arc<GatewayStats>>,
    request: Request,
    next: Next,
) -> Response {
    stats.record_request();
    next.run(request).await
}

/// CORS for the browser frontend.
///
/// Credentials are allowed, so origins are an explicit list and methods and
/// headers mirror the preflight request. A wildcard is never used.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) if origin != "*" => Some(v),
            _ => {
                warn!(origin = %origin, "cors_origin_ignored");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
