//! Caller side of Hawk: sign requests, verify signed responses.

use std::time::SystemTime;

use ::hawk::{Credentials, Header, Key, RequestBuilder, SHA256};

use super::header::parse;
use super::payload::payload_hash;
use super::principal::VerifiedRequest;
use super::RequestTarget;
use crate::compare::constant_time_eq;
use crate::error::AuthError;

/// Holds a Hawk id and key and signs requests with them.
#[derive(Clone)]
pub struct HawkClient {
    id: String,
    key: String,
}

impl HawkClient {
    pub fn new(id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
        }
    }

    fn key(&self) -> Result<Key, AuthError> {
        Key::new(self.key.as_bytes(), SHA256).map_err(|e| AuthError::Crypto(e.to_string()))
    }

    fn credentials(&self) -> Result<Credentials, AuthError> {
        Ok(Credentials {
            id: self.id.clone(),
            key: self.key()?,
        })
    }

    /// Sign a request with the current time and a random nonce.
    pub fn sign(
        &self,
        target: &RequestTarget<'_>,
        content_type: &str,
        body: &[u8],
    ) -> Result<Header, AuthError> {
        let hash = payload_hash(content_type, body)?;
        RequestBuilder::new(target.method, target.host, target.port, target.resource)
            .hash(&hash[..])
            .request()
            .make_header(&self.credentials()?)
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }

    /// Sign a request with an explicit timestamp, nonce and ext.
    pub fn sign_with(
        &self,
        target: &RequestTarget<'_>,
        content_type: &str,
        body: &[u8],
        ts: SystemTime,
        nonce: &str,
        ext: Option<&str>,
    ) -> Result<Header, AuthError> {
        let hash = payload_hash(content_type, body)?;
        RequestBuilder::new(target.method, target.host, target.port, target.resource)
            .hash(&hash[..])
            .ext(ext)
            .request()
            .make_header_full(&self.credentials()?, ts, nonce)
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }

    /// Check a `Server-Authorization` value against the request we sent and
    /// the response body we received.
    pub fn verify_response(
        &self,
        sent: &Header,
        target: &RequestTarget<'_>,
        server_authorization: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<(), AuthError> {
        let response = parse(server_authorization)?;

        let offered_hash = response.hash.as_deref().ok_or(AuthError::MissingPayloadHash)?;
        let expected_hash = payload_hash(content_type, body)?;
        if !constant_time_eq(offered_hash, &expected_hash) {
            return Err(AuthError::BadPayloadHash);
        }

        if !VerifiedRequest::new(sent, target).validate_response(&self.key()?, &expected_hash, &response) {
            return Err(AuthError::BadMac);
        }
        Ok(())
    }
}

impl std::fmt::Debug for HawkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HawkClient")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
