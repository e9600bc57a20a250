use base64::{Engine as _, engine::general_purpose};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

use crate::errors::InternalError;

type HmacSha256 = Hmac<Sha256>;

const PASSWORD_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%^&*";

/// Compute HMAC-SHA256 for refresh tokens and return as hexadecimal string
pub fn hmac_sha256_token(key: &str, token: &str) -> Result<String, InternalError> {
    let mut mac = HmacSha256::new_from_slice(key.as_bytes())
        .map_err(|e| InternalError::crypto("hmac_init", e.to_string()))?;
    mac.update(token.as_bytes());
    let result = mac.finalize();
    Ok(format!("{:x}", result.into_bytes()))
}

/// URL-safe random token of `bytes` random bytes
///
/// Used for OAuth states and pending registration tokens.
pub fn generate_url_token(bytes: usize) -> String {
    let mut rng = rand::rng();
    let random_bytes: Vec<u8> = (0..bytes).map(|_| rng.random()).collect();
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes)
}

/// Generate a random password of `length` characters
///
/// Always contains at least one letter and one digit so it satisfies the
/// password policy. Ambiguous glyphs (0/O, 1/l/I) are excluded.
pub fn generate_secure_password(length: usize) -> String {
    let mut rng = rand::rng();
    loop {
        let password: String = (0..length)
            .map(|_| PASSWORD_CHARSET[rng.random_range(0..PASSWORD_CHARSET.len())] as char)
            .collect();

        let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
        let has_digit = password.chars().any(|c| c.is_ascii_digit());
        if has_letter && has_digit {
            return password;
        }
    }
}
