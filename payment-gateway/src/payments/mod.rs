//! Server-side payment intent creation.
//!
//! Amounts are always set by the server; the browser only ever receives the
//! intent's client secret.

pub mod client;
pub mod types;

pub use client::StripeClient;
pub use types::{CreatePaymentIntent, CreatedPaymentIntent, PaymentIntentResponse};
