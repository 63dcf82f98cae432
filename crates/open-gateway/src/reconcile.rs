//! Order status reconciliation.
//!
//! Webhook deliveries and the scheduled sweep both funnel through
//! [`apply_status`], so an order reaches a given state exactly once no
//! matter which path reports it first or how often the report is repeated.

use std::time::Duration;

use url::Url;

use crate::client::PlatformApi;
use crate::config::GatewayConfig;
use crate::constants::{
    META_ADDRESS, META_CURRENCY, META_EXTERNAL_STATUS, REQUEST_SOURCE, STATUS_COMPLETED,
    STATUS_PROCESSING, WIDGET_PAYMENT_PATH,
};
use crate::error::GatewayError;
use crate::order::{OrderStatus, PaymentOrder};
use crate::wallet::{CreatedWallet, WalletAddress, WalletRequest};

/// What [`apply_status`] did with a reported status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusOutcome {
    /// The status was already the last one applied; nothing changed.
    Unchanged,
    /// The order moved to a new lifecycle state.
    Transitioned(OrderStatus),
    /// The status is not one the gateway acts on; it was recorded only.
    Recorded,
}

/// Apply a platform-reported payment status to an order.
///
/// The last applied status is remembered on the order, which makes repeats
/// no-ops: a COMPLETED delivered twice completes the order once and fires
/// payment completion once. Statuses the gateway does not act on are still
/// recorded, so repeating one of those is a no-op too.
///
/// There is no ordering guard. A status arriving after COMPLETED is applied
/// and logged at warn so operators can spot misbehaving deliveries.
pub fn apply_status(order: &mut dyn PaymentOrder, status: &str) -> StatusOutcome {
    let previous = order.meta(META_EXTERNAL_STATUS);
    if previous.as_deref() == Some(status) {
        tracing::debug!(order_id = order.order_id(), status, "status already applied");
        return StatusOutcome::Unchanged;
    }

    if previous.as_deref() == Some(STATUS_COMPLETED) {
        tracing::warn!(
            order_id = order.order_id(),
            status,
            "status reported after COMPLETED, applying out of order"
        );
    }

    order.set_meta(META_EXTERNAL_STATUS, status);

    match status {
        STATUS_PROCESSING => {
            order.set_status(
                OrderStatus::Processing,
                "Open payment was successfully processed.",
            );
            StatusOutcome::Transitioned(OrderStatus::Processing)
        }
        STATUS_COMPLETED => {
            order.set_status(
                OrderStatus::Completed,
                "Open payment was successfully completed.",
            );
            order.mark_payment_complete();
            StatusOutcome::Transitioned(OrderStatus::Completed)
        }
        other => {
            tracing::info!(
                order_id = order.order_id(),
                status = other,
                "unhandled platform status recorded"
            );
            StatusOutcome::Recorded
        }
    }
}

/// Result of initiating a payment.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    /// The wallet created for the order, one address per blockchain.
    pub wallet: CreatedWallet,
    /// Where to send the buyer to pay.
    pub redirect_url: String,
}

/// Initiate payment for an order.
///
/// Creates a payment wallet on the platform, records the returned addresses
/// and the offered blockchains on the order, moves it to
/// `blockchain-pending` and builds the hosted payment page URL. When wallet
/// creation fails the error propagates and the order is left untouched.
pub async fn process_payment<A: PlatformApi>(
    api: &A,
    config: &GatewayConfig,
    order: &mut impl PaymentOrder,
) -> Result<PaymentAttempt, GatewayError> {
    let request = WalletRequest {
        amount: order.total().to_string(),
        order_key: order.order_key().to_string(),
        payment_currency: config.accepted_blockchains.clone(),
        product_currency: order.currency().to_string(),
        source: REQUEST_SOURCE.to_string(),
        test: config.test_mode,
        client_managed: config.client_managed,
    };

    let wallet = api.create_wallet(&request).await?;

    order.set_status(
        OrderStatus::BlockchainPending,
        "Open Platform payment detected, but awaiting blockchain confirmation.",
    );
    order.set_meta(META_ADDRESS, &serde_json::to_string(&wallet.blockchains)?);
    order.set_meta(
        META_CURRENCY,
        &serde_json::to_string(&config.accepted_blockchains)?,
    );

    let redirect_url = payment_redirect_url(config, order)?;

    Ok(PaymentAttempt {
        wallet,
        redirect_url,
    })
}

/// URL of the hosted payment page for an order.
///
/// Any order that is not already completed goes back to `pending` while the
/// buyer is away on the payment page.
pub fn payment_redirect_url(
    config: &GatewayConfig,
    order: &mut impl PaymentOrder,
) -> Result<String, GatewayError> {
    if order.status() != OrderStatus::Completed {
        order.set_status(
            OrderStatus::Pending,
            "Customer is being redirected to OpenPlatform...",
        );
    }

    let base = config.credentials.widget_base_url();
    let mut url = Url::parse(&base)
        .and_then(|b| b.join(&format!("{WIDGET_PAYMENT_PATH}{}", order.order_key())))
        .map_err(|e| GatewayError::Config(format!("invalid widget base URL {base:?}: {e}")))?;

    url.query_pairs_mut()
        .append_pair("amount", order.total())
        .append_pair("orderId", &order.order_id().to_string())
        .append_pair("currency", order.currency());

    Ok(url.to_string())
}

/// Counts from one reconciliation sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub checked: usize,
    pub updated: usize,
    pub failed: usize,
}

/// Poll the platform for every order still awaiting payment.
///
/// Orders are checked strictly one at a time with `delay` before each
/// lookup, keeping sweeps under the platform's rate limits. A successful
/// lookup means the payment address has activity, so the order is
/// reconciled as PROCESSING. Failures are logged and skipped; one bad
/// order never stops the sweep.
pub async fn sweep_orders<A, O>(api: &A, orders: &mut [O], delay: Duration) -> SweepReport
where
    A: PlatformApi,
    O: PaymentOrder,
{
    let mut report = SweepReport::default();

    for order in orders.iter_mut() {
        report.checked += 1;

        let Some(address) = primary_sweep_address(order) else {
            tracing::warn!(
                order_id = order.order_id(),
                "order has no payment address, skipping"
            );
            report.failed += 1;
            continue;
        };

        tokio::time::sleep(delay).await;

        match api.transactions_for_address(&address).await {
            Ok(_) => {
                let outcome = apply_status(order, STATUS_PROCESSING);
                if !matches!(outcome, StatusOutcome::Unchanged) {
                    report.updated += 1;
                }
            }
            Err(e) => {
                tracing::error!(
                    order_id = order.order_id(),
                    error = %e,
                    "failed to fetch order updates"
                );
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        checked = report.checked,
        updated = report.updated,
        failed = report.failed,
        "order sweep finished"
    );
    report
}

/// The address polled for an order: the first entry of the address list
/// stored at wallet creation.
fn primary_sweep_address(order: &impl PaymentOrder) -> Option<String> {
    let raw = order.meta(META_ADDRESS)?;
    let addresses: Vec<WalletAddress> = serde_json::from_str(&raw).ok()?;
    addresses.first().map(|a| a.address.clone())
}
