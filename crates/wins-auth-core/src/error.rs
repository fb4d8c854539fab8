//! Error types for request authentication.

use crate::credentials::Scope;

/// Coarse outcome of a failed check, as seen by the HTTP caller.
///
/// Callers only ever learn the category; the specific [`AuthError`] is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Signature gate rejection (HTTP 400).
    BadRequest,
    /// No credentials were offered (HTTP 401).
    NotAuthenticated,
    /// Credentials were offered but did not verify (HTTP 401).
    AuthenticationFailed,
    /// Authenticated, but not allowed on this route (HTTP 403).
    Forbidden,
}

/// Errors raised while authenticating or authorizing a single request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No `X-Signature` header on the request.
    #[error("signature header missing")]
    SignatureMissing,

    /// No configured caller secret produced the offered signature.
    #[error("signature did not match any configured caller")]
    SignatureMismatch,

    /// No `X-Forwarded-For` header on a Hawk request.
    #[error("X-Forwarded-For header missing")]
    MissingForwardedFor,

    /// `X-Forwarded-For` carries fewer addresses than the proxy chain appends.
    #[error("X-Forwarded-For has {found} address(es), need at least {required}")]
    InsufficientForwardedHops { found: usize, required: usize },

    /// Derived client address is not on the allow-list.
    #[error("client address {0} is not allow-listed")]
    UntrustedIp(String),

    /// No `Authorization` header on a Hawk request.
    #[error("authorization header missing")]
    NoCredentials,

    /// The `Authorization` header is not a well-formed Hawk header.
    #[error("malformed Hawk header: {0}")]
    MalformedHeader(String),

    /// The Hawk id does not belong to any configured credential.
    #[error("unknown Hawk credential id {0:?}")]
    UnknownCredentialId(String),

    /// The request MAC does not match.
    #[error("MAC mismatch")]
    BadMac,

    /// The request carried a body but no payload hash.
    #[error("payload hash missing")]
    MissingPayloadHash,

    /// The payload hash does not match the body.
    #[error("payload hash mismatch")]
    BadPayloadHash,

    /// The Hawk timestamp is outside the allowed clock skew.
    #[error("timestamp {ts} is {skew}s away from server time")]
    StaleTimestamp { ts: i64, skew: i64 },

    /// The `(credential, nonce)` pair was already used.
    #[error("nonce {nonce:?} already used by {credential_id:?}")]
    ReplayedNonce { credential_id: String, nonce: String },

    /// The nonce store could not answer.
    #[error("nonce store unavailable: {0}")]
    NonceStore(String),

    /// The principal lacks the scope the route requires.
    #[error("missing required scope {required}")]
    InsufficientScope { required: Scope },

    /// MAC construction failed.
    #[error("HMAC error: {0}")]
    Crypto(String),
}

impl AuthError {
    /// Category reported to the HTTP caller.
    pub fn failure(&self) -> AuthFailure {
        match self {
            Self::SignatureMissing | Self::SignatureMismatch => AuthFailure::BadRequest,
            Self::NoCredentials => AuthFailure::NotAuthenticated,
            Self::InsufficientScope { .. } => AuthFailure::Forbidden,
            _ => AuthFailure::AuthenticationFailed,
        }
    }

    /// Short stable label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SignatureMissing => "signature_missing",
            Self::SignatureMismatch => "signature_mismatch",
            Self::MissingForwardedFor => "missing_forwarded_for",
            Self::InsufficientForwardedHops { .. } => "insufficient_forwarded_hops",
            Self::UntrustedIp(_) => "untrusted_ip",
            Self::NoCredentials => "no_credentials",
            Self::MalformedHeader(_) => "malformed_header",
            Self::UnknownCredentialId(_) => "unknown_credential_id",
            Self::BadMac => "bad_mac",
            Self::MissingPayloadHash => "missing_payload_hash",
            Self::BadPayloadHash => "bad_payload_hash",
            Self::StaleTimestamp { .. } => "stale_timestamp",
            Self::ReplayedNonce { .. } => "replayed_nonce",
            Self::NonceStore(_) => "nonce_store",
            Self::InsufficientScope { .. } => "insufficient_scope",
            Self::Crypto(_) => "crypto",
        }
    }
}

/// Startup configuration errors. These are fatal and never reach a request.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Two callers share a secret, so a signature could not identify its caller.
    #[error("callers {first} and {second} share the same secret")]
    DuplicateCallerSecret { first: String, second: String },

    /// A required secret is absent or empty.
    #[error("missing required secret: {0}")]
    MissingSecret(String),

    /// Trusted hop count must be at least one.
    #[error("trusted hop count must be at least 1")]
    InvalidHopCount,

    /// An allow-list entry is not an IP address.
    #[error("invalid IP address in allow-list: {0:?}")]
    InvalidIp(String),

    /// A scope name is not recognised.
    #[error("unknown scope: {0:?}")]
    UnknownScope(String),

    /// Two Hawk credentials share an id.
    #[error("duplicate Hawk credential id: {0:?}")]
    DuplicateCredentialId(String),

    /// The authenticator builder is missing a component.
    #[error("authenticator misconfigured: {0}")]
    Incomplete(String),
}
