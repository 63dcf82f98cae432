//! Gateway configuration and API credentials.

use std::time::Duration;

use crate::constants::{DEFAULT_API_URL, PUBLIC_PATH_MARKER, SWEEP_REQUEST_DELAY_MS};
use crate::error::GatewayError;

/// Credentials for the Open Platform API.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    /// Base URL of the platform API, always with a trailing slash.
    pub api_url: String,
    pub api_key: String,
    /// Secret used to sign outgoing API requests.
    pub secret_key: String,
    /// Secret webhook deliveries are signed with. The platform signs
    /// webhooks with the merchant secret key, so this defaults to
    /// `secret_key` unless a dedicated secret is configured.
    pub webhook_secret: String,
}

impl GatewayCredentials {
    /// Read credentials from the environment.
    ///
    /// `OPEN_API_KEY` and `OPEN_SECRET_KEY` are required. `OPEN_API_URL`
    /// defaults to the hosted platform and `OPEN_WEBHOOK_SECRET` defaults
    /// to the secret key.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_url = std::env::var("OPEN_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = if api_url.ends_with('/') {
            api_url
        } else {
            format!("{api_url}/")
        };

        let api_key = require_env("OPEN_API_KEY")?;
        let secret_key = require_env("OPEN_SECRET_KEY")?;
        let webhook_secret = std::env::var("OPEN_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| secret_key.clone());

        Ok(Self {
            api_url,
            api_key,
            secret_key,
            webhook_secret,
        })
    }

    /// Base URL of the hosted payment widget, derived by truncating the API
    /// URL at its `public` path segment:
    /// `https://api.openfuture.io/public/api/v1/` becomes
    /// `https://api.openfuture.io/`.
    ///
    /// Falls back to the full API URL with a warning when the marker is
    /// absent.
    pub fn widget_base_url(&self) -> String {
        match self.api_url.find(PUBLIC_PATH_MARKER) {
            Some(idx) => self.api_url[..idx].to_string(),
            None => {
                tracing::warn!(
                    api_url = %self.api_url,
                    "API URL has no 'public' path segment, using it as the widget base"
                );
                self.api_url.clone()
            }
        }
    }
}

/// Everything the gateway needs to process payments.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub credentials: GatewayCredentials,
    /// Blockchains offered to buyers, e.g. `["BTC", "ETH"]`.
    pub accepted_blockchains: Vec<String>,
    /// Marks wallet-creation requests as test payments.
    pub test_mode: bool,
    /// Request client-managed wallets, whose private keys are returned
    /// encrypted with the merchant password instead of being held by the
    /// platform.
    pub client_managed: bool,
    /// Pause between consecutive platform lookups during an order sweep.
    pub sweep_delay: Duration,
}

impl GatewayConfig {
    /// Read the full gateway configuration from the environment.
    ///
    /// Beyond the credential variables, honors `OPEN_BLOCKCHAINS` (comma
    /// separated, default `BTC`), `OPEN_TEST_MODE`, `OPEN_CLIENT_MANAGED`
    /// and `OPEN_SWEEP_DELAY_MS`.
    pub fn from_env() -> Result<Self, GatewayError> {
        let credentials = GatewayCredentials::from_env()?;

        let accepted_blockchains: Vec<String> = std::env::var("OPEN_BLOCKCHAINS")
            .ok()
            .map(|list| {
                list.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<String>>()
            })
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| vec!["BTC".to_string()]);

        let sweep_delay = std::env::var("OPEN_SWEEP_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(SWEEP_REQUEST_DELAY_MS));

        Ok(Self {
            credentials,
            accepted_blockchains,
            test_mode: env_flag("OPEN_TEST_MODE"),
            client_managed: env_flag("OPEN_CLIENT_MANAGED"),
            sweep_delay,
        })
    }
}

fn require_env(name: &str) -> Result<String, GatewayError> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GatewayError::Config(format!("{name} is required")))
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false)
}
