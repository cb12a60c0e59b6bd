//! Stripe webhook ingestion.
//!
//! ```text
//! raw body + Stripe-Signature → WebhookVerifier → VerifiedEvent
//!     → Event::classify → Dispatcher → (payment_events queue)
//! ```
//!
//! [`WebhookGateway::handle`] ties the steps together and produces the reply.

pub mod dispatch;
pub mod event;
pub mod gateway;
pub mod signature;

pub use dispatch::{DispatchOutcome, Dispatcher};
pub use event::{Event, SubscriptionTransition, VerifiedEvent};
pub use gateway::{WebhookGateway, WebhookReply, WebhookResponse};
pub use signature::{compute_signature, signature_header, WebhookVerifier, SIGNATURE_HEADER};
