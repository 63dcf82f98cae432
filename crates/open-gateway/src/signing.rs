use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute HMAC-SHA256 over the given body bytes using the shared secret.
/// Returns the hex-encoded MAC.
pub fn sign_body(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);
    let result = mac.finalize();
    hex::encode(result.into_bytes())
}

/// Verify an HMAC-SHA256 signature against the expected body.
/// Returns `true` if the signature is valid.
///
/// Uses constant-time comparison to prevent timing attacks.
/// Invalid hex signatures are handled without timing side-channels.
pub fn verify_signature(secret: &[u8], body: &[u8], signature: &str) -> bool {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(body);

    // Decode hex first - if invalid, compare against zeros to maintain constant-time
    let expected = hex::decode(signature).unwrap_or_else(|_| vec![0u8; 32]);

    // hmac crate's verify_slice uses constant-time comparison
    mac.verify_slice(&expected).is_ok()
}

/// Remove every whitespace byte from a webhook body.
///
/// Platform deliveries are signed over this collapsed form, so bodies that
/// differ only in formatting carry the same signature. The byte set matches
/// the platform's `\s` class: space, tab, line feed, carriage return,
/// vertical tab and form feed.
pub fn collapse_whitespace(body: &[u8]) -> Vec<u8> {
    body.iter()
        .copied()
        .filter(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c))
        .collect()
}

/// Current unix time in seconds.
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

pub(crate) mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().fold(String::new(), |mut s, b| {
            use std::fmt::Write;
            let _ = write!(s, "{b:02x}");
            s
        })
    }

    pub fn decode(s: &str) -> Result<Vec<u8>, ()> {
        if !s.len().is_multiple_of(2) || !s.is_ascii() {
            return Err(());
        }
        (0..s.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| ()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_roundtrip() {
        let secret = b"test-secret";
        let body = b"request body content";
        let sig = sign_body(secret, body);
        assert!(verify_signature(secret, body, &sig));
    }

    #[test]
    fn test_sign_known_vector() {
        // HMAC-SHA256 test vector.
        let sig = sign_body(b"key", b"The quick brown fox jumps over the lazy dog");
        assert_eq!(
            sig,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn test_sign_wrong_secret() {
        let body = b"request body content";
        let sig = sign_body(b"secret-1", body);
        assert!(!verify_signature(b"secret-2", body, &sig));
    }

    #[test]
    fn test_sign_tampered_body() {
        let secret = b"test-secret";
        let sig = sign_body(secret, b"original");
        assert!(!verify_signature(secret, b"tampered", &sig));
    }

    #[test]
    fn test_sign_invalid_hex() {
        assert!(!verify_signature(b"secret", b"body", "not-hex-zz"));
    }

    #[test]
    fn test_collapse_strips_all_whitespace() {
        let pretty = b"{\n  \"orderKey\": \"abc\",\r\n\t\"status\": \"COMPLETED\"\x0b\x0c }";
        let compact = b"{\"orderKey\":\"abc\",\"status\":\"COMPLETED\"}";
        assert_eq!(collapse_whitespace(pretty), compact.to_vec());
    }

    #[test]
    fn test_collapse_makes_signatures_format_independent() {
        let secret = b"hook-secret";
        let pretty = b"{ \"status\": \"COMPLETED\" }";
        let compact = b"{\"status\":\"COMPLETED\"}";
        assert_eq!(
            sign_body(secret, &collapse_whitespace(pretty)),
            sign_body(secret, &collapse_whitespace(compact))
        );
    }

    #[test]
    fn test_unix_timestamp_is_recent() {
        // 2023-11-14 in seconds; guards against millisecond confusion.
        assert!(unix_timestamp() > 1_700_000_000);
        assert!(unix_timestamp() < 10_000_000_000);
    }
}
