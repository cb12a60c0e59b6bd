//! Paygate - Stripe payment backend.
//!
//! Modules:
//! - `webhook`: signature verification, typed events and dispatch for
//!   Stripe webhook deliveries
//! - `payments`: server-side payment intent creation
//! - `queue`: forwarding of dispatch outcomes to RabbitMQ
//! - `web`: axum router and handlers
//!
//! ## Architecture
//!
//! ```text
//! Stripe → POST /webhook → verify → dispatch → 200 ──→ payment_events queue
//! Browser → POST /create-payment-intent → Stripe API → client_secret
//! ```

pub mod config;
pub mod error;
pub mod payments;
pub mod queue;
pub mod stats;
pub mod web;
pub mod webhook;

// Re-export commonly used types
pub use config::Config;
pub use error::{HandlerFault, PaymentError, WebhookError};
pub use payments::StripeClient;
pub use queue::{PaymentNotification, Publisher, PAYMENT_EVENTS_QUEUE};
pub use web::AppState;
pub use webhook::{Dispatcher, WebhookGateway, WebhookVerifier};
