//! Verified events and their typed, kind-directed view.
//!
//! A [`VerifiedEvent`] can only be built by [`super::signature::WebhookVerifier`]
//! after the HMAC check passed. [`Event::classify`] then decodes its payload
//! into one variant per known kind.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{HandlerFault, WebhookError};

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const PAYMENT_INTENT_FAILED: &str = "payment_intent.payment_failed";
pub const PAYMENT_INTENT_CREATED: &str = "payment_intent.created";
pub const CHARGE_SUCCEEDED: &str = "charge.succeeded";
pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Wire shape of a Stripe event envelope. Only the fields we route on.
#[derive(Debug, Deserialize)]
struct Envelope {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    data: EnvelopeData,
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    livemode: bool,
}

#[derive(Debug, Deserialize)]
struct EnvelopeData {
    object: Map<String, Value>,
}

/// An event whose bytes were authenticated against the shared secret.
#[derive(Debug, Clone)]
pub struct VerifiedEvent {
    id: String,
    kind: String,
    payload: Map<String, Value>,
    created: Option<i64>,
    livemode: bool,
}

impl VerifiedEvent {
    /// Decode an authenticated body. Must only be called after verification.
    pub(super) fn from_verified_body(body: &str) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_str(body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;

        Ok(Self {
            id: envelope.id,
            kind: envelope.kind,
            payload: envelope.data.object,
            created: envelope.created,
            livemode: envelope.livemode,
        })
    }

    /// Provider event id, used for log correlation only.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The envelope's `data.object`.
    pub fn payload(&self) -> &Map<String, Value> {
        &self.payload
    }

    pub fn created(&self) -> Option<i64> {
        self.created
    }

    pub fn livemode(&self) -> bool {
        self.livemode
    }
}

/// Stripe PaymentIntent, as much of it as the handlers read.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub last_payment_error: Option<LastPaymentError>,
}

impl PaymentIntent {
    pub fn order_id(&self) -> Option<&str> {
        self.metadata.get("order_id").map(String::as_str)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LastPaymentError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default)]
    pub payment_intent: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer: Option<String>,
}

/// Lifecycle step carried by a subscription event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionTransition {
    Created,
    Updated,
    Deleted,
}

impl SubscriptionTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTransition::Created => "created",
            SubscriptionTransition::Updated => "updated",
            SubscriptionTransition::Deleted => "deleted",
        }
    }
}

/// Typed view of a verified event, one variant per handled kind.
#[derive(Debug, Clone)]
pub enum Event {
    PaymentSucceeded(PaymentIntent),
    PaymentFailed(PaymentIntent),
    PaymentCreated(PaymentIntent),
    ChargeSucceeded(Charge),
    Subscription(SubscriptionTransition, Subscription),
    /// Any kind we do not act on. Not an error.
    Unhandled,
}

impl Event {
    /// Decode the payload according to the event's kind.
    pub fn classify(event: &VerifiedEvent) -> Result<Self, HandlerFault> {
        let kind = event.kind();
        let parsed = match kind {
            PAYMENT_INTENT_SUCCEEDED => Event::PaymentSucceeded(decode(event)?),
            PAYMENT_INTENT_FAILED => Event::PaymentFailed(decode(event)?),
            PAYMENT_INTENT_CREATED => Event::PaymentCreated(decode(event)?),
            CHARGE_SUCCEEDED => Event::ChargeSucceeded(decode(event)?),
            SUBSCRIPTION_CREATED => {
                Event::Subscription(SubscriptionTransition::Created, decode(event)?)
            }
            SUBSCRIPTION_UPDATED => {
                Event::Subscription(SubscriptionTransition::Updated, decode(event)?)
            }
            SUBSCRIPTION_DELETED => {
                Event::Subscription(SubscriptionTransition::Deleted, decode(event)?)
            }
            _ => Event::Unhandled,
        };
        Ok(parsed)
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &VerifiedEvent) -> Result<T, HandlerFault> {
    serde_json::from_value(Value::Object(event.payload().clone())).map_err(|source| {
        HandlerFault::MalformedObject {
            kind: event.kind().to_string(),
            source,
        }
    })
}
