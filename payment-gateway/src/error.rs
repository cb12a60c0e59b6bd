//! Error types shared by the webhook gateway and the payment endpoints.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Rejection of an inbound webhook delivery.
///
/// These are the only failures that produce a non-200 response on the webhook
/// path. Messages never include secret material.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("missing signature")]
    MissingSignature,

    #[error("invalid signature: {0}")]
    InvalidSignature(&'static str),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("webhook secret not configured")]
    SecretNotConfigured,
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::SecretNotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Short reason returned to the caller.
    pub fn reason(&self) -> &'static str {
        match self {
            WebhookError::MissingSignature => "missing signature",
            WebhookError::InvalidSignature(_) => "invalid signature",
            WebhookError::InvalidPayload(_) => "invalid payload",
            WebhookError::SecretNotConfigured => "webhook secret not configured",
        }
    }
}

/// Failure while acting on an already-verified event.
///
/// Recovered inside the gateway and only ever logged.
#[derive(Debug, Error)]
pub enum HandlerFault {
    #[error("{kind} object could not be decoded: {source}")]
    MalformedObject {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} object is missing {field}")]
    MissingField { kind: String, field: &'static str },

    #[error("forwarding failed: {0}")]
    Forward(String),
}

/// Failure while creating a payment intent.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("{0}")]
    Validation(String),

    /// Card declined; the provider's message is safe to show the customer.
    #[error("card error: {0}")]
    Card(String),

    #[error("rate limited by payment provider")]
    RateLimited,

    #[error("invalid request to payment provider: {0}")]
    InvalidRequest(String),

    #[error("payment provider rejected the API key")]
    Authentication,

    #[error("payment provider error: {0}")]
    Provider(String),
}

impl PaymentError {
    pub fn status(&self) -> StatusCode {
        match self {
            PaymentError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            PaymentError::Card(_) | PaymentError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PaymentError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            PaymentError::Authentication | PaymentError::Provider(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message returned to the client. Provider internals are not exposed.
    pub fn detail(&self) -> String {
        match self {
            PaymentError::Validation(msg) | PaymentError::Card(msg) => msg.clone(),
            PaymentError::RateLimited => {
                "Too many requests. Please try again shortly.".to_string()
            }
            PaymentError::InvalidRequest(_) => "Invalid payment parameters".to_string(),
            PaymentError::Authentication => "Payment system configuration error".to_string(),
            PaymentError::Provider(_) => "Payment processing error".to_string(),
        }
    }
}

/// A body that cannot be decoded into the request type is a validation
/// failure like any other, answered with `422 {detail}`.
impl From<JsonRejection> for PaymentError {
    fn from(rejection: JsonRejection) -> Self {
        PaymentError::Validation(rejection.body_text())
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
