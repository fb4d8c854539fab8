//! The authenticated caller and its response-signing context.

use std::collections::HashSet;

use ::hawk::{Header, Key, ResponseBuilder};

use super::header::to_header_value;
use super::payload::payload_hash;
use super::RequestTarget;
use crate::credentials::{HawkCredential, Scope};
use crate::error::AuthError;

/// Artifacts of a verified request, reused to sign the response.
#[derive(Debug, Clone)]
pub(crate) struct VerifiedRequest {
    header: Header,
    method: String,
    resource: String,
    host: String,
    port: u16,
}

impl VerifiedRequest {
    pub(crate) fn new(header: &Header, target: &RequestTarget<'_>) -> Self {
        Self {
            header: header.clone(),
            method: target.method.to_string(),
            resource: target.resource.to_string(),
            host: target.host.to_string(),
            port: target.port,
        }
    }

    pub(crate) fn nonce(&self) -> &str {
        self.header.nonce.as_deref().unwrap_or("")
    }

    fn response<'a>(&'a self, hash: &'a [u8]) -> ::hawk::Response<'a> {
        ResponseBuilder::from_request_header(
            &self.header,
            &self.method,
            &self.host,
            self.port,
            &self.resource,
        )
        .hash(hash)
        .response()
    }

    /// `Server-Authorization` header for a response body hash.
    pub(crate) fn response_header(&self, key: &Key, hash: &[u8]) -> Result<Header, AuthError> {
        self.response(hash)
            .make_header(key)
            .map_err(|e| AuthError::Crypto(e.to_string()))
    }

    /// Check a `Server-Authorization` header against this request.
    pub(crate) fn validate_response(&self, key: &Key, hash: &[u8], header: &Header) -> bool {
        self.response(hash).validate_header(header, key)
    }
}

/// A caller that passed Hawk authentication.
///
/// Lives in the request extensions for the duration of the request.
#[derive(Debug, Clone)]
pub struct HawkPrincipal {
    credential: HawkCredential,
    request: VerifiedRequest,
}

impl HawkPrincipal {
    pub(crate) fn new(credential: HawkCredential, request: VerifiedRequest) -> Self {
        Self {
            credential,
            request,
        }
    }

    pub fn credential_id(&self) -> &str {
        &self.credential.id
    }

    pub fn scopes(&self) -> &HashSet<Scope> {
        &self.credential.scopes
    }

    pub fn has_scope(&self, required: Scope) -> bool {
        self.credential.has_scope(required)
    }

    /// Nonce of the authenticated request.
    pub fn nonce(&self) -> &str {
        self.request.nonce()
    }

    /// Build the `Server-Authorization` value for a response body.
    ///
    /// Uses the key that verified the request, so only the caller holding
    /// the same key can verify the answer.
    pub fn respond(&self, content_type: &str, body: &[u8]) -> Result<String, AuthError> {
        let hash = payload_hash(content_type, body)?;
        let key = self.credential.hawk_key()?;
        let header = self.request.response_header(&key, &hash)?;
        Ok(to_header_value(&header))
    }
}
