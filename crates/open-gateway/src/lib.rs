//! Open Platform payment gateway.
//!
//! Lets a commerce host accept cryptocurrency through the Open Platform:
//! signed wallet-creation requests, webhook verification over
//! whitespace-collapsed bodies, and idempotent order reconciliation shared
//! by the webhook path and the scheduled sweep.
//!
//! # Payment flow
//!
//! - **Checkout** ([`process_payment`]) — creates a payment wallet for the
//!   order and builds the hosted payment page URL
//! - **Webhook** ([`WebhookVerifier`]) — verifies platform deliveries and
//!   feeds their statuses into [`apply_status`]
//! - **Sweep** ([`sweep_orders`]) — polls payment addresses for orders the
//!   webhook may have missed
//!
//! # Quick example (webhook)
//!
//! ```no_run
//! use open_gateway::{apply_status, WebhookEnvelope, WebhookVerifier};
//! # use open_gateway::PaymentOrder;
//! # fn load_order(key: &str) -> Box<dyn PaymentOrder> { unimplemented!() }
//!
//! # fn main() -> Result<(), open_gateway::GatewayError> {
//! # let (body_bytes, signature_header, timestamp_header) = (vec![], None, None);
//! let verifier = WebhookVerifier::new(b"merchant-secret");
//! let envelope = WebhookEnvelope::new(body_bytes, signature_header, timestamp_header);
//!
//! let event = verifier.verify_and_parse(&envelope)?;
//! let mut order = load_order(&event.order_key);
//! apply_status(order.as_mut(), &event.status);
//! # Ok(())
//! # }
//! ```

// Core types
pub mod config;
pub mod constants;
pub mod error;
pub mod order;
pub mod wallet;

// Signing and verification
pub mod keycrypt;
pub mod security;
pub mod signing;
pub mod webhook;

// Platform API and reconciliation
pub mod client;
pub mod reconcile;

// Re-exports
pub use client::{ApiClient, PlatformApi};
pub use config::{GatewayConfig, GatewayCredentials};
pub use constants::*;
pub use error::GatewayError;
pub use order::{OrderStatus, PaymentOrder};
pub use reconcile::{
    apply_status, payment_redirect_url, process_payment, sweep_orders, PaymentAttempt,
    StatusOutcome, SweepReport,
};
pub use wallet::{CreatedWallet, PublicWallet, WalletAddress, WalletRequest};
pub use webhook::{WebhookEnvelope, WebhookEvent, WebhookVerifier};
