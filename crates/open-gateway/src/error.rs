use thiserror::Error;

/// Errors returned by gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("API request failed: {0}")]
    Transport(String),

    #[error("authentication error, please check your API key")]
    Auth,

    #[error("error response from API: {0}")]
    Api(String),

    #[error("unknown response from API: {0}")]
    UnknownStatus(u16),

    #[error("webhook verification failed: {0}")]
    Verification(String),

    #[error("order does not exist: {0}")]
    OrderNotFound(String),

    #[error("invalid password")]
    InvalidPassword,

    #[error("config error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
