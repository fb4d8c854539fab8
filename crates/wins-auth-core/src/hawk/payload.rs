//! Hawk payload hashes.

use ::hawk::{PayloadHasher, SHA256};

use crate::error::AuthError;

/// Media type the hash covers: lowercased, parameters dropped.
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

/// Hash of a request or response body as carried in the `hash` attribute.
pub fn payload_hash(content_type: &str, body: &[u8]) -> Result<Vec<u8>, AuthError> {
    PayloadHasher::hash(normalize_content_type(content_type).as_bytes(), SHA256, body)
        .map_err(|e| AuthError::Crypto(e.to_string()))
}
