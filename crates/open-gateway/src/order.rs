//! Order model shared by the webhook and sweep reconciliation paths.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Lifecycle states a gateway order moves through.
///
/// `Pending` is the checkout state, re-entered when the buyer is redirected
/// to the hosted payment page. `BlockchainPending` means a payment wallet
/// exists and the gateway is waiting for funds to appear on chain.
/// `Processing` and `Completed` mirror the platform's PROCESSING and
/// COMPLETED payment statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    Pending,
    BlockchainPending,
    Processing,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::BlockchainPending => "blockchain-pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "blockchain-pending" => Ok(OrderStatus::BlockchainPending),
            "processing" => Ok(OrderStatus::Processing),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(GatewayError::Config(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// The slice of a host commerce platform's order the gateway needs.
///
/// Implementations adapt whatever order object the host exposes. The gateway
/// reads payment-relevant fields and writes status transitions plus its own
/// meta entries; it never touches line items, customers or anything else.
pub trait PaymentOrder {
    /// Host-side numeric order id, used in logs and the payment page URL.
    fn order_id(&self) -> u64;

    /// Stable public key identifying the order to the platform.
    fn order_key(&self) -> &str;

    /// Order total as a decimal string, e.g. `"10.00"`.
    fn total(&self) -> &str;

    /// ISO currency code the order is priced in.
    fn currency(&self) -> &str;

    fn status(&self) -> OrderStatus;

    /// Read a gateway meta entry previously stored on the order.
    fn meta(&self, key: &str) -> Option<String>;

    /// Store a gateway meta entry on the order.
    fn set_meta(&mut self, key: &str, value: &str);

    /// Transition the order, recording a customer-visible note.
    fn set_status(&mut self, status: OrderStatus, note: &str);

    /// Signal that payment was received in full. The reconciliation layer
    /// calls this at most once per order; see [`crate::reconcile::apply_status`].
    fn mark_payment_complete(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::BlockchainPending,
            OrderStatus::Processing,
            OrderStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
    }

    #[test]
    fn status_serializes_kebab_case() {
        let json = serde_json::to_string(&OrderStatus::BlockchainPending).unwrap();
        assert_eq!(json, "\"blockchain-pending\"");
    }

    #[test]
    fn unknown_status_string_is_rejected() {
        assert!("on-hold".parse::<OrderStatus>().is_err());
    }
}
