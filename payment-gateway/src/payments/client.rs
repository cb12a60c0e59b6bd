//! Minimal Stripe REST client for payment intent creation.
//!
//! Stripe takes form-encoded bodies and answers errors with
//! `{"error": {"type": ..., "message": ..., "code": ...}}`.
//! Reference: https://docs.stripe.com/api/errors

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::types::{CreatePaymentIntent, CreatedPaymentIntent};
use crate::error::PaymentError;

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct StripeErrorDetail {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Shared Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    api_base: String,
    secret_key: String,
}

impl StripeClient {
    pub fn new(api_base: &str, secret_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
        })
    }

    /// Create a PaymentIntent with automatic payment methods enabled.
    pub async fn create_payment_intent(
        &self,
        req: &CreatePaymentIntent,
    ) -> Result<CreatedPaymentIntent, PaymentError> {
        info!(
            order_id = %req.order_id,
            amount = req.amount,
            currency = %req.currency,
            "stripe_payment_intent_create_start"
        );

        let params = [
            ("amount", req.amount.to_string()),
            ("currency", req.currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
            ("metadata[order_id]", req.order_id.clone()),
            ("metadata[customer_email]", req.customer_email.clone()),
            ("description", format!("Order {}", req.order_id)),
        ];

        let response = self
            .http
            .post(format!("{}/v1/payment_intents", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, order_id = %req.order_id, "stripe_request_failed");
                PaymentError::Provider(e.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            let intent = response.json::<CreatedPaymentIntent>().await.map_err(|e| {
                error!(error = %e, "stripe_response_decode_failed");
                PaymentError::Provider(e.to_string())
            })?;
            info!(
                order_id = %req.order_id,
                payment_intent_id = %intent.id,
                "stripe_payment_intent_created"
            );
            return Ok(intent);
        }

        let detail = response
            .json::<StripeErrorBody>()
            .await
            .map(|b| b.error)
            .unwrap_or_default();
        Err(classify_error(status, detail))
    }
}

fn classify_error(status: StatusCode, detail: StripeErrorDetail) -> PaymentError {
    let message = detail.message.unwrap_or_default();

    let err = match (status.as_u16(), detail.kind.as_deref()) {
        (429, _) => PaymentError::RateLimited,
        (401, _) | (_, Some("authentication_error")) => PaymentError::Authentication,
        (402, _) | (_, Some("card_error")) => {
            if message.is_empty() {
                PaymentError::Card("Your card was declined.".to_string())
            } else {
                PaymentError::Card(message)
            }
        }
        (400 | 404, _) | (_, Some("invalid_request_error")) => PaymentError::InvalidRequest(message),
        (code, _) => PaymentError::Provider(format!("HTTP {}: {}", code, message)),
    };

    match &err {
        PaymentError::Authentication => {
            error!(http_status = status.as_u16(), "stripe_authentication_failed")
        }
        PaymentError::RateLimited => warn!("stripe_rate_limited"),
        other => warn!(
            http_status = status.as_u16(),
            error_code = ?detail.code,
            error = %other,
            "stripe_request_rejected"
        ),
    }

    err
}
