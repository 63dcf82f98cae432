use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use open_gateway::GatewayError;

#[derive(Debug)]
pub enum ServerError {
    /// Request body failed validation
    Invalid(String),
    /// Gateway-level failure (platform API, verification, order lookup)
    Gateway(GatewayError),
    /// Database error
    Database(rusqlite::Error),
    /// Internal error
    Internal(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Invalid(msg) => write!(f, "invalid request: {}", msg),
            ServerError::Gateway(e) => write!(f, "{}", e),
            ServerError::Database(e) => write!(f, "database error: {}", e),
            ServerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        ServerError::Gateway(e)
    }
}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::Database(e)
    }
}

impl ResponseError for ServerError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServerError::Invalid(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_request",
                "message": msg
            })),
            // Webhook processing reports failure with a 500 so the platform
            // retries the delivery.
            ServerError::Gateway(GatewayError::Verification(msg)) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "webhook_verification_failed",
                    "message": msg
                }))
            }
            ServerError::Gateway(GatewayError::OrderNotFound(_)) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "order_not_found",
                    "message": "Order does not exist"
                }))
            }
            ServerError::Gateway(
                e @ (GatewayError::Transport(_)
                | GatewayError::Auth
                | GatewayError::Api(_)
                | GatewayError::UnknownStatus(_)),
            ) => {
                tracing::error!("Platform API error: {}", e);
                HttpResponse::BadGateway().json(serde_json::json!({
                    "error": "platform_api_error",
                    "message": e.to_string()
                }))
            }
            ServerError::Gateway(e) => {
                tracing::error!("Gateway error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
            ServerError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}
