//! Shared application state.

use std::sync::Arc;

use wins_auth_core::{ConfigError, HawkAuthenticator, NonceStore, SignatureGate};

use crate::config::Settings;

/// Immutable after startup; cloned into every middleware.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<SignatureGate>,
    pub hawk: Arc<HawkAuthenticator>,
    /// Scheme assumed when no `X-Forwarded-Proto` is present.
    pub default_scheme: Arc<str>,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Build the authentication components from settings.
    pub fn from_settings(settings: &Settings, nonces: Arc<dyn NonceStore>) -> Result<Self, ConfigError> {
        let gate = SignatureGate::new(settings.caller_secrets()?).with_bypass(settings.api_debug);

        let hawk = HawkAuthenticator::builder()
            .with_credentials(settings.credentials()?)
            .with_nonce_store(nonces)
            .with_ip_allow_list(settings.ip_allow_list()?)
            .with_nonce_ttl(settings.nonce_ttl())
            .with_timestamp_skew(settings.timestamp_skew())
            .build()?;

        Ok(Self {
            gate: Arc::new(gate),
            hawk: Arc::new(hawk),
            default_scheme: Arc::from(settings.default_scheme.as_str()),
            max_body_bytes: settings.max_body_bytes,
        })
    }
}
