//! Signed client for the Open Platform API.

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use crate::config::GatewayCredentials;
use crate::constants::{
    ADDRESS_TRANSACTIONS_ENDPOINT, API_KEY_HEADER, API_SIGNATURE_HEADER, API_TIMESTAMP_HEADER,
    WALLET_DETAILS_ENDPOINT, WALLET_PROCESS_ENDPOINT,
};
use crate::error::GatewayError;
use crate::signing;
use crate::wallet::{CreatedWallet, PublicWallet, WalletRequest};

/// Platform operations the reconciliation layer depends on.
///
/// [`ApiClient`] is the production implementation; tests substitute mocks.
pub trait PlatformApi: Send + Sync {
    /// Create a payment wallet for an order.
    fn create_wallet(
        &self,
        request: &WalletRequest,
    ) -> impl std::future::Future<Output = Result<CreatedWallet, GatewayError>> + Send;

    /// Fetch the transactions seen for a payment address.
    fn transactions_for_address(
        &self,
        address: &str,
    ) -> impl std::future::Future<Output = Result<Value, GatewayError>> + Send;
}

/// HTTP client that signs every bodied request with the merchant secret.
pub struct ApiClient {
    http: reqwest::Client,
    credentials: GatewayCredentials,
}

/// Wallet-creation body. The wallet metadata is nested under a `metadata`
/// key, and the signature covers the whole envelope.
#[derive(Serialize)]
struct MetadataEnvelope<'a> {
    metadata: &'a WalletRequest,
}

impl ApiClient {
    pub fn new(credentials: GatewayCredentials) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("failed to build HTTP client"),
            credentials,
        }
    }

    /// Send a request to the platform and map its response.
    ///
    /// POST and PUT serialize `params` exactly once; the same bytes are
    /// signed and sent, so the signature always matches the body. Other
    /// methods carry `params` as query parameters and an empty signature.
    ///
    /// 200 and 201 yield the response body (`Null` when it is not JSON),
    /// 400 yields [`GatewayError::Api`] with the platform's error message,
    /// 401 yields [`GatewayError::Auth`] and anything else
    /// [`GatewayError::UnknownStatus`].
    pub async fn send<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        method: Method,
        params: &P,
    ) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.credentials.api_url, endpoint);
        let has_body = matches!(method, Method::POST | Method::PUT);

        tracing::info!(%method, endpoint, "platform API request");

        let mut request = self
            .http
            .request(method, &url)
            .header(API_KEY_HEADER, &self.credentials.api_key)
            .header(API_TIMESTAMP_HEADER, signing::unix_timestamp().to_string());

        if has_body {
            let body = serde_json::to_vec(params)?;
            let signature = signing::sign_body(self.credentials.secret_key.as_bytes(), &body);
            request = request
                .header(API_SIGNATURE_HEADER, signature)
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        } else {
            request = request.header(API_SIGNATURE_HEADER, "");
            if let Value::Object(map) = serde_json::to_value(params)? {
                if !map.is_empty() {
                    let pairs: Vec<(String, String)> = map
                        .into_iter()
                        .map(|(k, v)| match v {
                            Value::String(s) => (k, s),
                            other => (k, other.to_string()),
                        })
                        .collect();
                    request = request.query(&pairs);
                }
            }
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(endpoint, error = %e, "platform API request failed");
            GatewayError::Transport(e.to_string())
        })?;

        let status = response.status().as_u16();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        match status {
            200 | 201 => Ok(body),
            400 => {
                let message = body
                    .pointer("/error/message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string();
                tracing::error!(endpoint, message, "platform rejected request");
                Err(GatewayError::Api(message))
            }
            401 => {
                tracing::error!(endpoint, "platform rejected API key");
                Err(GatewayError::Auth)
            }
            code => {
                tracing::error!(endpoint, code, "unexpected platform response");
                Err(GatewayError::UnknownStatus(code))
            }
        }
    }

    /// List the wallets owned by the configured API key.
    pub async fn public_wallets(&self) -> Result<Vec<PublicWallet>, GatewayError> {
        let value = self.send(WALLET_DETAILS_ENDPOINT, Method::GET, &()).await?;
        Ok(serde_json::from_value(value)?)
    }
}

impl PlatformApi for ApiClient {
    async fn create_wallet(&self, request: &WalletRequest) -> Result<CreatedWallet, GatewayError> {
        let value = self
            .send(
                WALLET_PROCESS_ENDPOINT,
                Method::POST,
                &MetadataEnvelope { metadata: request },
            )
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn transactions_for_address(&self, address: &str) -> Result<Value, GatewayError> {
        self.send(
            &format!("{ADDRESS_TRANSACTIONS_ENDPOINT}{address}"),
            Method::GET,
            &(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_request_is_nested_under_metadata() {
        let request = WalletRequest {
            amount: "10.00".to_string(),
            order_key: "wc_order_abc123".to_string(),
            payment_currency: vec!["BTC".to_string()],
            product_currency: "USD".to_string(),
            source: "woocommerce".to_string(),
            test: false,
            client_managed: false,
        };
        let json = serde_json::to_value(MetadataEnvelope { metadata: &request }).unwrap();
        assert_eq!(json["metadata"]["orderKey"], "wc_order_abc123");
        assert_eq!(json["metadata"]["paymentCurrency"][0], "BTC");
    }
}
