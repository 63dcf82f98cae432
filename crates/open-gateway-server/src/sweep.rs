//! Scheduled order reconciliation.

use std::time::Duration;

use actix_web::web;
use open_gateway::{sweep_orders, SweepReport};

use crate::metrics;
use crate::state::AppState;

/// Run one reconciliation sweep over every pending order.
pub async fn run_sweep(state: &AppState) -> SweepReport {
    let mut orders = match state.store.list_pending() {
        Ok(orders) => orders,
        Err(e) => {
            tracing::error!(error = %e, "failed to load pending orders for sweep");
            return SweepReport::default();
        }
    };

    if orders.is_empty() {
        tracing::debug!("no pending orders to sweep");
        return SweepReport::default();
    }

    tracing::info!(count = orders.len(), "starting order sweep");
    let report = sweep_orders(&state.api, &mut orders, state.config.sweep_delay).await;

    for order in &orders {
        if let Err(e) = state.store.save(order) {
            tracing::error!(
                order = %order.order_key,
                error = %e,
                "failed to persist sweep result"
            );
        }
    }

    let unchanged = report.checked - report.updated - report.failed;
    metrics::SWEEP_ORDERS
        .with_label_values(&["updated"])
        .inc_by(report.updated as u64);
    metrics::SWEEP_ORDERS
        .with_label_values(&["failed"])
        .inc_by(report.failed as u64);
    metrics::SWEEP_ORDERS
        .with_label_values(&["unchanged"])
        .inc_by(unchanged as u64);

    report
}

/// Spawn the background sweep scheduler.
///
/// The first sweep runs one full interval after startup, then the sweep
/// repeats at that interval for the life of the process.
pub fn spawn_scheduler(state: web::Data<AppState>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        // An interval's first tick is immediate; consume it so the first
        // sweep waits a full period.
        interval.tick().await;
        loop {
            interval.tick().await;
            run_sweep(&state).await;
        }
    });
}
