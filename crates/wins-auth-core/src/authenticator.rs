//! HawkAuthenticator - verifies machine-to-machine requests.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. client address derived from `X-Forwarded-For` is allow-listed
//! 2. an `Authorization` header is present
//! 3. the Hawk id names a configured credential
//! 4. payload hash and MAC match, timestamp is within the skew window
//! 5. the `(id, nonce)` pair has not been seen within the nonce TTL

use std::sync::Arc;
use std::time::Duration;

use ::hawk::RequestBuilder;

use crate::compare::constant_time_eq;
use crate::credentials::{CredentialStore, Scope};
use crate::error::{AuthError, ConfigError};
use crate::forwarded::IpAllowList;
use crate::hawk::header;
use crate::hawk::payload::payload_hash;
use crate::hawk::principal::VerifiedRequest;
use crate::hawk::{HawkPrincipal, HawkRequest};
use crate::nonce::NonceStore;
use crate::policy;

const DEFAULT_TIMESTAMP_SKEW: Duration = Duration::from_secs(60);
const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(60);

/// Authenticates Hawk-signed requests against a fixed credential table.
///
/// # Example
///
/// ```rust,ignore
/// let authenticator = HawkAuthenticator::builder()
///     .with_credentials(store)
///     .with_nonce_store(Arc::new(MemoryNonceStore::new()))
///     .with_ip_allow_list(IpAllowList::parse(["10.0.0.5"], 2)?)
///     .build()?;
///
/// let principal = authenticator.authenticate(&request).await?;
/// authenticator.authorize(&principal, Some(Scope::ActivityStream))?;
/// ```
pub struct HawkAuthenticator {
    credentials: CredentialStore,
    nonces: Arc<dyn NonceStore>,
    ip_allow_list: IpAllowList,
    timestamp_skew: Duration,
    nonce_ttl: Duration,
}

impl HawkAuthenticator {
    pub fn builder() -> HawkAuthenticatorBuilder {
        HawkAuthenticatorBuilder::new()
    }

    pub fn nonce_ttl(&self) -> Duration {
        self.nonce_ttl
    }

    /// Authenticate a request against the current server time.
    pub async fn authenticate(&self, request: &HawkRequest<'_>) -> Result<HawkPrincipal, AuthError> {
        self.authenticate_at(request, chrono::Utc::now().timestamp())
            .await
    }

    /// Authenticate a request as if the server clock read `now` (unix seconds).
    pub async fn authenticate_at(
        &self,
        request: &HawkRequest<'_>,
        now: i64,
    ) -> Result<HawkPrincipal, AuthError> {
        let result = self.run_checks(request, now).await;

        match &result {
            Ok(principal) => tracing::debug!(
                credential_id = principal.credential_id(),
                method = request.target.method,
                resource = request.target.resource,
                "Hawk authentication succeeded"
            ),
            Err(error) => {
                let attempted = request
                    .authorization
                    .and_then(|value| header::parse(value).ok());
                let attempted = attempted.as_ref();
                tracing::warn!(
                    kind = error.kind(),
                    error = %error,
                    credential_id = attempted.and_then(|h| h.id.as_deref()).unwrap_or(""),
                    nonce = attempted.and_then(|h| h.nonce.as_deref()).unwrap_or(""),
                    forwarded_for = request.forwarded_for.unwrap_or(""),
                    method = request.target.method,
                    resource = request.target.resource,
                    "Hawk authentication failed"
                )
            }
        }

        result
    }

    /// Require `required` (if any) to be among the principal's scopes.
    pub fn authorize(&self, principal: &HawkPrincipal, required: Option<Scope>) -> Result<(), AuthError> {
        policy::require_scope(principal, required)
    }

    async fn run_checks(&self, request: &HawkRequest<'_>, now: i64) -> Result<HawkPrincipal, AuthError> {
        self.ip_allow_list.check(request.forwarded_for)?;

        let authorization = request.authorization.ok_or(AuthError::NoCredentials)?;
        let header = header::parse(authorization)?;

        let id = header.id.as_deref().ok_or_else(|| missing("id"))?;
        let nonce = header.nonce.as_deref().ok_or_else(|| missing("nonce"))?;
        let ts = header::timestamp(&header).ok_or_else(|| missing("ts"))?;
        if header.mac.is_none() {
            return Err(missing("mac"));
        }

        let credential = self
            .credentials
            .lookup(id)
            .ok_or_else(|| AuthError::UnknownCredentialId(id.to_string()))?;

        let target = &request.target;
        let offered_hash = header.hash.as_deref().ok_or(AuthError::MissingPayloadHash)?;

        // Skew is judged below against `now`, not the library's clock.
        let verifier = RequestBuilder::new(target.method, target.host, target.port, target.resource)
            .hash(offered_hash)
            .request();
        if !verifier.validate_header(&header, &credential.hawk_key()?, Duration::MAX) {
            return Err(AuthError::BadMac);
        }

        let expected_hash = payload_hash(request.content_type, request.body)?;
        if !constant_time_eq(offered_hash, &expected_hash) {
            return Err(AuthError::BadPayloadHash);
        }

        let ts = i64::try_from(ts).unwrap_or(i64::MAX);
        if now.abs_diff(ts) > self.timestamp_skew.as_secs() {
            return Err(AuthError::StaleTimestamp {
                ts,
                skew: now.saturating_sub(ts),
            });
        }

        if !self.nonces.claim(&credential.id, nonce, self.nonce_ttl).await? {
            return Err(AuthError::ReplayedNonce {
                credential_id: credential.id.clone(),
                nonce: nonce.to_string(),
            });
        }

        Ok(HawkPrincipal::new(
            credential.clone(),
            VerifiedRequest::new(&header, target),
        ))
    }
}

fn missing(attribute: &str) -> AuthError {
    AuthError::MalformedHeader(format!("missing {attribute}"))
}

/// Builder for [`HawkAuthenticator`].
pub struct HawkAuthenticatorBuilder {
    credentials: Option<CredentialStore>,
    nonces: Option<Arc<dyn NonceStore>>,
    ip_allow_list: Option<IpAllowList>,
    timestamp_skew: Duration,
    nonce_ttl: Duration,
}

impl HawkAuthenticatorBuilder {
    fn new() -> Self {
        Self {
            credentials: None,
            nonces: None,
            ip_allow_list: None,
            timestamp_skew: DEFAULT_TIMESTAMP_SKEW,
            nonce_ttl: DEFAULT_NONCE_TTL,
        }
    }

    /// Set the credential table (required).
    pub fn with_credentials(mut self, credentials: CredentialStore) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set the nonce store (required).
    pub fn with_nonce_store(mut self, nonces: Arc<dyn NonceStore>) -> Self {
        self.nonces = Some(nonces);
        self
    }

    /// Set the client address allow-list (required).
    pub fn with_ip_allow_list(mut self, allow_list: IpAllowList) -> Self {
        self.ip_allow_list = Some(allow_list);
        self
    }

    /// Maximum distance between the Hawk timestamp and server time.
    pub fn with_timestamp_skew(mut self, skew: Duration) -> Self {
        self.timestamp_skew = skew;
        self
    }

    /// How long a claimed nonce stays claimed.
    pub fn with_nonce_ttl(mut self, ttl: Duration) -> Self {
        self.nonce_ttl = ttl;
        self
    }

    pub fn build(self) -> Result<HawkAuthenticator, ConfigError> {
        let credentials = self
            .credentials
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ConfigError::Incomplete("at least one Hawk credential is required".to_string()))?;
        let nonces = self
            .nonces
            .ok_or_else(|| ConfigError::Incomplete("nonce store is required".to_string()))?;
        let ip_allow_list = self
            .ip_allow_list
            .ok_or_else(|| ConfigError::Incomplete("IP allow-list is required".to_string()))?;

        Ok(HawkAuthenticator {
            credentials,
            nonces,
            ip_allow_list,
            timestamp_skew: self.timestamp_skew,
            nonce_ttl: self.nonce_ttl,
        })
    }
}
