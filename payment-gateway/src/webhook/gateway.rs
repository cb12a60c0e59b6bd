//! Authenticate → classify → route → acknowledge.
//!
//! Only authentication and envelope decoding can fail a delivery. Once the
//! signature checks out the reply is always 200 and handler faults are only
//! logged; Stripe treats anything else as undelivered and retries it.

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{error, info, warn};

use super::dispatch::Dispatcher;
use super::signature::WebhookVerifier;
use crate::error::WebhookError;

/// JSON body returned to the webhook sender.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl WebhookResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            reason: None,
        }
    }

    pub fn error(reason: &'static str) -> Self {
        Self {
            status: "error",
            reason: Some(reason),
        }
    }
}

/// Status and body for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookReply {
    pub status: StatusCode,
    pub body: WebhookResponse,
}

impl WebhookReply {
    fn accepted() -> Self {
        Self {
            status: StatusCode::OK,
            body: WebhookResponse::success(),
        }
    }

    fn rejected(err: &WebhookError) -> Self {
        Self {
            status: err.status(),
            body: WebhookResponse::error(err.reason()),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// The webhook gateway. Holds no per-call state.
#[derive(Clone)]
pub struct WebhookGateway {
    verifier: Option<WebhookVerifier>,
    dispatcher: Dispatcher,
}

impl WebhookGateway {
    /// `verifier` is `None` when no signing secret is configured, in which
    /// case every signed delivery is refused with a 500.
    pub fn new(verifier: Option<WebhookVerifier>, dispatcher: Dispatcher) -> Self {
        Self {
            verifier,
            dispatcher,
        }
    }

    pub async fn handle(&self, payload: &[u8], signature: Option<&str>) -> WebhookReply {
        let signature = match signature.map(str::trim) {
            Some(s) if !s.is_empty() => s,
            _ => {
                warn!(body_length = payload.len(), "stripe_webhook_missing_signature");
                return WebhookReply::rejected(&WebhookError::MissingSignature);
            }
        };

        let Some(verifier) = &self.verifier else {
            error!("stripe_webhook_secret_not_configured");
            return WebhookReply::rejected(&WebhookError::SecretNotConfigured);
        };

        let event = match verifier.verify(payload, signature) {
            Ok(event) => event,
            Err(e) => {
                warn!(error = %e, body_length = payload.len(), "stripe_webhook_rejected");
                return WebhookReply::rejected(&e);
            }
        };

        info!(
            event_id = %event.id(),
            event_type = %event.kind(),
            livemode = event.livemode(),
            "stripe_webhook_received"
        );

        match self.dispatcher.dispatch(&event).await {
            Ok(outcome) => {
                info!(
                    event_id = %event.id(),
                    event_type = %event.kind(),
                    outcome = ?outcome,
                    "stripe_webhook_dispatched"
                );
            }
            Err(fault) => {
                // Faults never change the reply.
                error!(
                    event_id = %event.id(),
                    event_type = %event.kind(),
                    error = %fault,
                    "webhook_handler_fault"
                );
            }
        }

        WebhookReply::accepted()
    }
}
