//! Message types forwarded to the `payment_events` queue.
//!
//! Downstream consumers (order fulfilment, email confirmation, subscription
//! activation) read these instead of re-verifying Stripe deliveries.

use serde::{Deserialize, Serialize};

use crate::webhook::SubscriptionTransition;

/// Queue name for forwarded payment notifications.
pub const PAYMENT_EVENTS_QUEUE: &str = "payment_events";

/// Outcome of a dispatched webhook event, ready for downstream processing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentNotification {
    PaymentSucceeded {
        event_id: String,
        payment_intent_id: String,
        order_id: String,
        /// Amount in the currency's minor unit
        amount: i64,
        #[serde(default)]
        currency: Option<String>,
    },
    PaymentFailed {
        event_id: String,
        payment_intent_id: String,
        #[serde(default)]
        order_id: Option<String>,
        error_message: String,
    },
    SubscriptionChanged {
        event_id: String,
        subscription_id: String,
        transition: SubscriptionTransition,
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        customer: Option<String>,
    },
}

impl PaymentNotification {
    /// Stripe event id the notification was derived from.
    pub fn event_id(&self) -> &str {
        match self {
            PaymentNotification::PaymentSucceeded { event_id, .. }
            | PaymentNotification::PaymentFailed { event_id, .. }
            | PaymentNotification::SubscriptionChanged { event_id, .. } => event_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PaymentNotification::PaymentSucceeded { .. } => "payment_succeeded",
            PaymentNotification::PaymentFailed { .. } => "payment_failed",
            PaymentNotification::SubscriptionChanged { .. } => "subscription_changed",
        }
    }
}
