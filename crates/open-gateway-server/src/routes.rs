use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::time::Instant;

use open_gateway::{
    apply_status, process_payment, GatewayError, OrderStatus, WebhookEnvelope,
    WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER,
};

use crate::error::ServerError;
use crate::metrics;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub order_key: String,
    pub total: String,
    pub currency: String,
}

/// Start a payment: create (or reuse) the order, create a payment wallet on
/// the platform and hand back the hosted payment page URL.
#[post("/checkout")]
pub async fn checkout(
    state: web::Data<AppState>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ServerError> {
    let request = body.into_inner();
    if request.order_key.trim().is_empty()
        || request.total.trim().is_empty()
        || request.currency.trim().is_empty()
    {
        return Err(ServerError::Invalid(
            "orderKey, total and currency are required".to_string(),
        ));
    }

    let mut order =
        state
            .store
            .create_or_fetch(&request.order_key, &request.total, &request.currency)?;

    // Retried checkouts land on the same row; anything past pending is
    // already being paid or is paid.
    if order.status != OrderStatus::Pending {
        return Err(ServerError::Invalid(format!(
            "order {} is not awaiting payment (status {})",
            order.order_key, order.status
        )));
    }

    let started = Instant::now();
    match process_payment(&state.api, &state.config, &mut order).await {
        Ok(attempt) => {
            metrics::WALLET_CREATE_LATENCY
                .with_label_values(&["success"])
                .observe(started.elapsed().as_secs_f64());
            state.store.save(&order)?;
            tracing::info!(order = %order.order_key, "payment initiated");
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "result": "success",
                "redirect": attempt.redirect_url,
                "addresses": attempt.wallet.blockchains,
            })))
        }
        Err(e) => {
            metrics::WALLET_CREATE_LATENCY
                .with_label_values(&["error"])
                .observe(started.elapsed().as_secs_f64());
            tracing::error!(order = %order.order_key, error = %e, "payment initiation failed");
            Err(e.into())
        }
    }
}

/// Receive a platform status delivery.
///
/// Any failure answers 500 so the platform retries the delivery. A repeat
/// of an already applied status acknowledges with 200 without changing
/// anything.
#[post("/webhook")]
pub async fn webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ServerError> {
    if body.is_empty() {
        metrics::WEBHOOK_EVENTS.with_label_values(&["rejected"]).inc();
        return Err(GatewayError::Verification("empty request body".to_string()).into());
    }

    let envelope = envelope_from_request(&req, body.to_vec());
    let event = match state.verifier.verify_and_parse(&envelope) {
        Ok(event) => event,
        Err(e) => {
            metrics::WEBHOOK_EVENTS.with_label_values(&["rejected"]).inc();
            tracing::warn!(error = %e, "webhook rejected");
            return Err(e.into());
        }
    };

    let Some(mut order) = state.store.fetch_by_key(&event.order_key)? else {
        metrics::WEBHOOK_EVENTS
            .with_label_values(&["unknown_order"])
            .inc();
        tracing::warn!(order = %event.order_key, "webhook for unknown order");
        return Err(GatewayError::OrderNotFound(event.order_key).into());
    };

    let outcome = apply_status(&mut order, &event.status);
    state.store.save(&order)?;

    metrics::WEBHOOK_EVENTS.with_label_values(&["applied"]).inc();
    tracing::info!(
        order = %order.order_key,
        status = %event.status,
        ?outcome,
        "webhook applied"
    );

    Ok(HttpResponse::Ok().finish())
}

fn envelope_from_request(req: &HttpRequest, raw_body: Vec<u8>) -> WebhookEnvelope {
    let header = |name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    WebhookEnvelope::new(
        raw_body,
        header(WEBHOOK_SIGNATURE_HEADER),
        header(WEBHOOK_TIMESTAMP_HEADER),
    )
}

/// Wallets owned by the configured API key, proxied from the platform.
#[get("/wallets")]
pub async fn wallets(state: web::Data<AppState>) -> Result<HttpResponse, ServerError> {
    let wallets = state.api.public_wallets().await?;
    Ok(HttpResponse::Ok().json(wallets))
}

/// Exclude an order from future sweeps.
#[post("/orders/{order_key}/archive")]
pub async fn archive_order(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ServerError> {
    let order_key = path.into_inner();
    if state.store.archive(&order_key)? {
        tracing::info!(order = %order_key, "order archived");
        Ok(HttpResponse::Ok().json(serde_json::json!({ "archived": true })))
    } else {
        Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "order_not_found",
            "message": "Order does not exist"
        })))
    }
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.count_pending() {
        Ok(pending) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "open-gateway",
            "pendingOrders": pending,
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "degraded",
            "service": "open-gateway",
            "error": "order store unreachable",
        })),
    }
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    // Separate METRICS_TOKEN guards metrics; it is not the webhook secret.
    match &state.metrics_token {
        Some(token) => {
            let authorized = req
                .headers()
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| open_gateway::security::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None => {
            // No token configured — metrics stay closed unless
            // OPEN_PUBLIC_METRICS=true explicitly opts into public access.
            let public_metrics = std::env::var("OPEN_PUBLIC_METRICS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false);
            if !public_metrics {
                return HttpResponse::Forbidden().json(serde_json::json!({
                    "error": "forbidden",
                    "message": "Set METRICS_TOKEN or OPEN_PUBLIC_METRICS=true to access /metrics"
                }));
            }
        }
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
