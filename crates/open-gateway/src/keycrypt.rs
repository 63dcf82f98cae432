//! Decryption of client-managed wallet keys.
//!
//! Client-managed wallets keep the private key with the merchant: the
//! platform returns it encrypted with the merchant's password and never
//! sees the plaintext again. The scheme is PBKDF2-SHA256 (1000 iterations,
//! fixed salt) deriving an AES-256-CTR key used with a fixed IV, with the
//! ciphertext carried as hex.
//!
//! The fixed salt and IV are part of the issued key format. This module
//! exists to read keys already in that format, not as a template for
//! encrypting anything new.

use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher};
use ctr::Ctr128BE;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::error::GatewayError;
use crate::signing::hex;

type Aes256Ctr = Ctr128BE<Aes256>;

/// PBKDF2 iteration count used when the key was issued.
const KDF_ITERATIONS: u32 = 1000;
/// Key-derivation salt baked into the key format.
const KDF_SALT: &[u8] = b"NaCl";
/// Counter-mode IV baked into the key format.
const CIPHER_IV: &[u8; 16] = b"IIIIIIIIIIIIIIII";

fn derive_key(password: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), KDF_SALT, KDF_ITERATIONS, &mut key);
    key
}

// CTR mode is symmetric; the same keystream encrypts and decrypts.
fn apply_keystream(password: &str, data: &mut [u8]) {
    let key = derive_key(password);
    let mut cipher = Aes256Ctr::new(&key.into(), CIPHER_IV.into());
    cipher.apply_keystream(data);
}

/// Decrypt a hex-encoded wallet key with the merchant password.
///
/// Any failure, including malformed ciphertext, surfaces as
/// [`GatewayError::InvalidPassword`]: a wrong password yields garbage bytes
/// that fail the UTF-8 check.
pub fn decrypt_key(encrypted_hex: &str, password: &str) -> Result<String, GatewayError> {
    let mut data = hex::decode(encrypted_hex).map_err(|_| GatewayError::InvalidPassword)?;
    apply_keystream(password, &mut data);
    String::from_utf8(data).map_err(|_| GatewayError::InvalidPassword)
}

/// Encrypt a wallet key into the format [`decrypt_key`] reads.
pub fn encrypt_key(plaintext: &str, password: &str) -> String {
    let mut data = plaintext.as_bytes().to_vec();
    apply_keystream(password, &mut data);
    hex::encode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVATE_KEY: &str =
        "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    #[test]
    fn decrypt_round_trips_with_the_right_password() {
        let encrypted = encrypt_key(PRIVATE_KEY, "hunter2");
        assert_eq!(decrypt_key(&encrypted, "hunter2").unwrap(), PRIVATE_KEY);
    }

    #[test]
    fn encryption_is_deterministic_for_the_fixed_parameters() {
        assert_eq!(
            encrypt_key(PRIVATE_KEY, "hunter2"),
            encrypt_key(PRIVATE_KEY, "hunter2")
        );
    }

    #[test]
    fn wrong_password_is_rejected() {
        let encrypted = encrypt_key(PRIVATE_KEY, "hunter2");
        assert!(matches!(
            decrypt_key(&encrypted, "wrong-password"),
            Err(GatewayError::InvalidPassword)
        ));
    }

    #[test]
    fn malformed_hex_is_rejected() {
        assert!(decrypt_key("zz-not-hex", "hunter2").is_err());
        // Odd number of hex digits.
        assert!(decrypt_key("abc", "hunter2").is_err());
    }
}
