use actix_governor::{Governor, GovernorConfigBuilder};
use actix_web::{web, App, HttpServer};

use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use open_gateway::{ApiClient, GatewayConfig, WebhookVerifier};
use open_gateway_server::state::AppState;
use open_gateway_server::store::OrderStore;
use open_gateway_server::{routes, sweep};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match GatewayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid gateway configuration: {e}");
            std::process::exit(1);
        }
    };

    let db_path = std::env::var("OPEN_DB_PATH").unwrap_or_else(|_| "./open-orders.db".to_string());
    let store = match OrderStore::open(&db_path) {
        Ok(store) => {
            tracing::info!("Order store: SQLite at {db_path}");
            store
        }
        Err(e) => {
            tracing::error!("Failed to open order store at {db_path}: {e}");
            std::process::exit(1);
        }
    };

    let mut verifier = WebhookVerifier::new(config.credentials.webhook_secret.as_bytes());
    if let Some(max_age) = std::env::var("OPEN_WEBHOOK_MAX_AGE_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
    {
        tracing::info!("Webhook freshness window: {max_age}s");
        verifier = verifier.with_max_age(Duration::from_secs(max_age));
    }

    let metrics_token = std::env::var("METRICS_TOKEN")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.into_bytes());

    if metrics_token.is_none() {
        tracing::warn!(
            "METRICS_TOKEN not set — /metrics requires OPEN_PUBLIC_METRICS=true to be readable"
        );
    }

    let state = web::Data::new(AppState {
        api: ApiClient::new(config.credentials.clone()),
        store,
        verifier,
        config,
        metrics_token,
    });

    let sweep_interval: u64 = std::env::var("OPEN_SWEEP_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3600);
    sweep::spawn_scheduler(state.clone(), Duration::from_secs(sweep_interval));

    let port: u16 = std::env::var("OPEN_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(4080);

    let rate_limit_rpm: u64 = std::env::var("RATE_LIMIT_RPM")
        .ok()
        .and_then(|r| r.parse().ok())
        .unwrap_or(120);

    tracing::info!("Open gateway listening on port {port}");
    tracing::info!("Sweep interval: {sweep_interval}s");
    tracing::info!("Rate limit: {rate_limit_rpm} req/min per IP");
    tracing::info!("  POST http://localhost:{port}/checkout");
    tracing::info!("  POST http://localhost:{port}/webhook");
    tracing::info!("  GET  http://localhost:{port}/wallets");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(Governor::new(&governor_conf))
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(65_536))
            .service(routes::health)
            .service(routes::metrics_endpoint)
            .service(routes::checkout)
            .service(routes::webhook)
            .service(routes::wallets)
            .service(routes::archive_order)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
