//! Webhook delivery verification.
//!
//! The platform signs each delivery with HMAC-SHA256 over the body with all
//! whitespace removed, so a delivery that was re-serialized or reformatted
//! in transit still verifies. Verification happens on the raw bytes before
//! anything is parsed.

use std::time::Duration;

use serde::Deserialize;

use crate::constants::{WEBHOOK_SIGNATURE_HEADER, WEBHOOK_TIMESTAMP_HEADER};
use crate::error::GatewayError;
use crate::signing;

/// A raw webhook delivery as received from the transport layer.
#[derive(Debug, Clone)]
pub struct WebhookEnvelope {
    pub raw_body: Vec<u8>,
    pub signature: Option<String>,
    pub timestamp: Option<String>,
}

impl WebhookEnvelope {
    pub fn new(raw_body: Vec<u8>, signature: Option<String>, timestamp: Option<String>) -> Self {
        Self {
            raw_body,
            signature,
            timestamp,
        }
    }

    /// Build an envelope from a header list, matching the webhook header
    /// names case-insensitively.
    pub fn from_headers<'a, I>(raw_body: Vec<u8>, headers: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut signature = None;
        let mut timestamp = None;
        for (name, value) in headers {
            if name.eq_ignore_ascii_case(WEBHOOK_SIGNATURE_HEADER) {
                signature = Some(value.to_string());
            } else if name.eq_ignore_ascii_case(WEBHOOK_TIMESTAMP_HEADER) {
                timestamp = Some(value.to_string());
            }
        }
        Self {
            raw_body,
            signature,
            timestamp,
        }
    }
}

/// Payload of an order status delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub order_key: String,
    pub status: String,
}

impl WebhookEvent {
    pub fn from_body(body: &[u8]) -> Result<Self, GatewayError> {
        serde_json::from_slice(body)
            .map_err(|e| GatewayError::Verification(format!("invalid payload: {e}")))
    }
}

/// Verifies webhook deliveries against the shared secret.
///
/// Freshness enforcement is off by default; the platform has historically
/// sent timestamps that drift, so deliveries are accepted regardless of age
/// unless [`with_max_age`](Self::with_max_age) opts in.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
    max_age: Option<Duration>,
}

impl WebhookVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
            max_age: None,
        }
    }

    /// Reject deliveries whose timestamp is further than `max_age` from the
    /// current time, in either direction. Five minutes is a reasonable
    /// window once the platform's clocks can be trusted.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    /// Check a delivery's signature, and its freshness when enabled.
    ///
    /// A delivery without a signature header is rejected before anything is
    /// logged or parsed.
    pub fn verify(&self, envelope: &WebhookEnvelope) -> Result<(), GatewayError> {
        let signature = envelope
            .signature
            .as_deref()
            .ok_or_else(|| GatewayError::Verification("missing signature header".to_string()))?;

        let normalized = signing::collapse_whitespace(&envelope.raw_body);
        tracing::info!(
            body = %String::from_utf8_lossy(&normalized),
            "incoming webhook body"
        );

        let timestamp = envelope
            .timestamp
            .as_deref()
            .map(parse_timestamp)
            .unwrap_or(0);

        if let Some(max_age) = self.max_age {
            let now = signing::unix_timestamp() as i64;
            if now.abs_diff(timestamp) > max_age.as_secs() {
                return Err(GatewayError::Verification(format!(
                    "stale delivery: timestamp {timestamp} outside {}s window",
                    max_age.as_secs()
                )));
            }
        }

        if !signing::verify_signature(&self.secret, &normalized, signature) {
            return Err(GatewayError::Verification(
                "signature mismatch".to_string(),
            ));
        }

        Ok(())
    }

    /// Verify a delivery and parse its payload.
    pub fn verify_and_parse(&self, envelope: &WebhookEnvelope) -> Result<WebhookEvent, GatewayError> {
        self.verify(envelope)?;
        WebhookEvent::from_body(&envelope.raw_body)
    }
}

/// Integer prefix parsing matching how the timestamp header has always been
/// read: leading whitespace and sign, then digits up to the first non-digit.
/// Anything unparseable is 0, and overflow saturates.
fn parse_timestamp(value: &str) -> i64 {
    let s = value.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1i64, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits: &str = {
        let end = rest
            .as_bytes()
            .iter()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) => sign * n,
        Err(_) if sign < 0 => i64::MIN,
        Err(_) => i64::MAX,
    }
}
