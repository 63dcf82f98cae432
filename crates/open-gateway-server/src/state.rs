use open_gateway::{ApiClient, GatewayConfig, WebhookVerifier};

use crate::store::OrderStore;

/// Shared application state for the gateway server.
pub struct AppState {
    /// Signed client for the Open Platform API.
    pub api: ApiClient,
    pub store: OrderStore,
    pub verifier: WebhookVerifier,
    pub config: GatewayConfig,
    /// Bearer token guarding /metrics. `None` keeps the endpoint closed
    /// unless OPEN_PUBLIC_METRICS opts into exposing it.
    pub metrics_token: Option<Vec<u8>>,
}
