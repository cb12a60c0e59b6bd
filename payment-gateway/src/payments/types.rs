//! Request and response bodies for payment intent creation.

use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

fn default_currency() -> String {
    "usd".to_string()
}

/// Body of `POST /create-payment-intent`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePaymentIntent {
    /// Amount in the currency's minor unit (2999 = $29.99)
    pub amount: i64,
    /// Three-letter ISO currency code
    #[serde(default = "default_currency")]
    pub currency: String,
    pub customer_email: String,
    /// Order identifier, stored in the intent's metadata
    pub order_id: String,
}

impl CreatePaymentIntent {
    /// Reject requests Stripe would refuse or that we could not reconcile.
    pub fn validate(&self) -> Result<(), PaymentError> {
        if self.amount <= 0 {
            return Err(PaymentError::Validation(
                "amount must be greater than 0".to_string(),
            ));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PaymentError::Validation(
                "currency must be a three-letter ISO code".to_string(),
            ));
        }
        if self.customer_email.trim().is_empty() {
            return Err(PaymentError::Validation(
                "customer_email must not be empty".to_string(),
            ));
        }
        if self.order_id.trim().is_empty() {
            return Err(PaymentError::Validation(
                "order_id must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Only the client secret leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Fields read from Stripe's PaymentIntent create response.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedPaymentIntent {
    pub id: String,
    pub client_secret: String,
}
