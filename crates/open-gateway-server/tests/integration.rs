use std::time::Duration;

use actix_web::{test, web, App};

use open_gateway::signing::{collapse_whitespace, sign_body, unix_timestamp};
use open_gateway::{
    ApiClient, GatewayConfig, GatewayCredentials, OrderStatus, PaymentOrder, WebhookVerifier,
    META_EXTERNAL_STATUS, WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER,
};
use open_gateway_server::routes;
use open_gateway_server::state::AppState;
use open_gateway_server::store::OrderStore;

const SECRET: &[u8] = b"hook-secret";

/// Build an AppState over a throwaway SQLite file. The API URL points at a
/// closed port; webhook tests never reach the platform.
fn make_state_opts(
    secret: &[u8],
    metrics_token: Option<Vec<u8>>,
) -> (web::Data<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("orders.db");
    let store = OrderStore::open(db_path.to_str().unwrap()).unwrap();

    let credentials = GatewayCredentials {
        api_url: "http://127.0.0.1:1/".to_string(),
        api_key: "test-key".to_string(),
        secret_key: "test-secret".to_string(),
        webhook_secret: String::from_utf8(secret.to_vec()).unwrap(),
    };
    let config = GatewayConfig {
        credentials: credentials.clone(),
        accepted_blockchains: vec!["BTC".to_string()],
        test_mode: true,
        client_managed: false,
        sweep_delay: Duration::ZERO,
    };

    let state = web::Data::new(AppState {
        api: ApiClient::new(credentials),
        store,
        verifier: WebhookVerifier::new(secret),
        config,
        metrics_token,
    });
    (state, dir)
}

fn make_state(secret: &[u8]) -> (web::Data<AppState>, tempfile::TempDir) {
    make_state_opts(secret, None)
}

/// A delivery signed the way the platform signs: over the collapsed body.
fn webhook_request(body: &[u8], secret: &[u8]) -> test::TestRequest {
    let signature = sign_body(secret, &collapse_whitespace(body));
    test::TestRequest::post()
        .uri("/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .insert_header((WEBHOOK_TIMESTAMP_HEADER, unix_timestamp().to_string()))
        .set_payload(body.to_vec())
}

#[actix_rt::test]
async fn completed_webhook_updates_the_order_and_repeats_are_acknowledged() {
    let (state, _dir) = make_state(SECRET);
    state
        .store
        .create_or_fetch("wc_order_abc123", "10.00", "USD")
        .unwrap();

    let app =
        test::init_service(App::new().app_data(state.clone()).service(routes::webhook)).await;

    let body = br#"{"order_key":"wc_order_abc123","status":"COMPLETED"}"#;
    let resp = test::call_service(&app, webhook_request(body, SECRET).to_request()).await;
    assert_eq!(resp.status(), 200);

    let order = state.store.fetch_by_key("wc_order_abc123").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(
        order.meta(META_EXTERNAL_STATUS).as_deref(),
        Some("COMPLETED")
    );
    let paid_at = order.paid_at.expect("completion must set paid_at");

    // The platform retries deliveries; the repeat is acknowledged without
    // firing completion again.
    let resp = test::call_service(&app, webhook_request(body, SECRET).to_request()).await;
    assert_eq!(resp.status(), 200);

    let order = state.store.fetch_by_key("wc_order_abc123").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert_eq!(order.paid_at, Some(paid_at));
}

#[actix_rt::test]
async fn tampered_webhook_is_rejected_and_the_order_is_untouched() {
    let (state, _dir) = make_state(SECRET);
    state
        .store
        .create_or_fetch("wc_order_abc123", "10.00", "USD")
        .unwrap();

    let app =
        test::init_service(App::new().app_data(state.clone()).service(routes::webhook)).await;

    let good = br#"{"order_key":"wc_order_abc123","status":"COMPLETED"}"#;
    let evil = br#"{"order_key":"wc_order_abc123","status":"COMPLETEX"}"#;
    let signature = sign_body(SECRET, &collapse_whitespace(good));

    let req = test::TestRequest::post()
        .uri("/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .set_payload(evil.to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "webhook_verification_failed");

    let order = state.store.fetch_by_key("wc_order_abc123").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.meta(META_EXTERNAL_STATUS).is_none());
    assert!(order.paid_at.is_none());
}

#[actix_rt::test]
async fn webhook_for_an_unknown_order_reports_failure() {
    let (state, _dir) = make_state(SECRET);
    let app = test::init_service(App::new().app_data(state).service(routes::webhook)).await;

    let body = br#"{"order_key":"never-created","status":"COMPLETED"}"#;
    let resp = test::call_service(&app, webhook_request(body, SECRET).to_request()).await;

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "order_not_found");
    assert_eq!(body["message"], "Order does not exist");
}

#[actix_rt::test]
async fn webhook_without_a_signature_is_rejected() {
    let (state, _dir) = make_state(SECRET);
    let app = test::init_service(App::new().app_data(state).service(routes::webhook)).await;

    let req = test::TestRequest::post()
        .uri("/webhook")
        .set_payload(&br#"{"order_key":"wc_order_abc123","status":"COMPLETED"}"#[..])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 500);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "webhook_verification_failed");
}

#[actix_rt::test]
async fn empty_webhook_body_is_rejected() {
    let (state, _dir) = make_state(SECRET);
    let app = test::init_service(App::new().app_data(state).service(routes::webhook)).await;

    let resp =
        test::call_service(&app, test::TestRequest::post().uri("/webhook").to_request()).await;
    assert_eq!(resp.status(), 500);
}

#[actix_rt::test]
async fn reformatted_webhook_body_still_verifies() {
    let (state, _dir) = make_state(SECRET);
    state
        .store
        .create_or_fetch("wc_order_abc123", "10.00", "USD")
        .unwrap();

    let app =
        test::init_service(App::new().app_data(state.clone()).service(routes::webhook)).await;

    // Signed over the collapsed form, delivered pretty-printed.
    let compact = br#"{"order_key":"wc_order_abc123","status":"PROCESSING"}"#;
    let pretty = b"{\n  \"order_key\": \"wc_order_abc123\",\n  \"status\": \"PROCESSING\"\n}";
    let signature = sign_body(SECRET, &collapse_whitespace(compact));

    let req = test::TestRequest::post()
        .uri("/webhook")
        .insert_header((WEBHOOK_SIGNATURE_HEADER, signature))
        .set_payload(pretty.to_vec())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 200);
    let order = state.store.fetch_by_key("wc_order_abc123").unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[actix_rt::test]
async fn checkout_rejects_an_order_that_is_already_paid() {
    let (state, _dir) = make_state(SECRET);
    let mut order = state.store.create_or_fetch("k1", "1.00", "USD").unwrap();
    order.set_status(OrderStatus::Completed, "paid elsewhere");
    state.store.save(&order).unwrap();

    let app = test::init_service(App::new().app_data(state).service(routes::checkout)).await;
    let req = test::TestRequest::post()
        .uri("/checkout")
        .set_json(serde_json::json!({
            "orderKey": "k1",
            "total": "1.00",
            "currency": "USD"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_request");
}

#[actix_rt::test]
async fn health_reports_pending_orders() {
    let (state, _dir) = make_state(SECRET);
    state.store.create_or_fetch("k1", "1.00", "USD").unwrap();
    state.store.create_or_fetch("k2", "2.00", "USD").unwrap();

    let app = test::init_service(App::new().app_data(state).service(routes::health)).await;
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;

    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "open-gateway");
    assert_eq!(body["pendingOrders"], 2);
}

#[actix_rt::test]
async fn archive_excludes_an_order_and_reports_unknown_keys() {
    let (state, _dir) = make_state(SECRET);
    state.store.create_or_fetch("k1", "1.00", "USD").unwrap();

    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .service(routes::archive_order),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders/k1/archive")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
    assert_eq!(state.store.count_pending().unwrap(), 0);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/orders/never-created/archive")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 404);
}

#[actix_rt::test]
async fn metrics_stays_closed_without_a_token() {
    let (state, _dir) = make_state(SECRET);
    let app = test::init_service(App::new().app_data(state).service(routes::metrics_endpoint)).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
async fn metrics_requires_the_configured_bearer_token() {
    let (state, _dir) = make_state_opts(SECRET, Some(b"metrics-token".to_vec()));
    let app = test::init_service(App::new().app_data(state).service(routes::metrics_endpoint)).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/metrics")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 401);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/metrics")
            .insert_header(("Authorization", "Bearer metrics-token"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);
}
