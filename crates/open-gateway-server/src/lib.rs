//! Open Platform gateway server — checkout, webhooks and reconciliation.
//!
//! The server owns an order store and drives the payment lifecycle against
//! the Open Platform API. Gateway logic (signing, verification, status
//! reconciliation) lives in the core [`open_gateway`] crate; this crate
//! provides the HTTP surface, persistence and scheduling around it.
//!
//! # Modules
//!
//! - [`routes`] — HTTP endpoints (checkout, webhook, wallets, health, metrics)
//! - [`state`] — Shared [`AppState`](state::AppState)
//! - [`store`] — SQLite order store backing the [`open_gateway::PaymentOrder`] trait
//! - [`sweep`] — Scheduled reconciliation of orders the webhook missed
//! - [`metrics`] — Prometheus metrics for payment operations

pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod store;
pub mod sweep;
