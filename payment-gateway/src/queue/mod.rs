//! Queue module for handing dispatch outcomes to downstream consumers.
//!
//! ```text
//! Stripe → /webhook → Dispatcher → payment_events queue → fulfilment workers
//! ```

pub mod publisher;
pub mod types;

pub use publisher::Publisher;
pub use types::{PaymentNotification, PAYMENT_EVENTS_QUEUE};
