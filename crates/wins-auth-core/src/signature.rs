//! Shared-secret request signatures identifying the upstream caller.
//!
//! A caller signs a request as `hex(SHA256(path || body || secret))`, where
//! `path` is the full request path including the query string. This is a
//! plain concatenated hash, not an HMAC; every caller computes it this way,
//! so it is reproduced exactly.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::compare::constant_time_str_eq;
use crate::error::{AuthError, ConfigError};

/// Header carrying the offered signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// The trusted upstream servers allowed to call the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerName {
    Ui,
    Admin,
    Mi,
    Data,
}

impl CallerName {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ui => "ui",
            Self::Admin => "admin",
            Self::Mi => "mi",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for CallerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compute the signature a caller holding `secret` sends for a request.
pub fn sign(secret: &str, path: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    hasher.update(body);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Ordered `(secret, caller)` pairs, fixed for the life of the process.
#[derive(Clone)]
pub struct CallerSecretTable {
    entries: Vec<(String, CallerName)>,
}

impl CallerSecretTable {
    /// Build the table, rejecting empty or repeated secrets.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, CallerName)>,
        S: Into<String>,
    {
        let mut table: Vec<(String, CallerName)> = Vec::new();
        for (secret, name) in entries {
            let secret = secret.into();
            if secret.is_empty() {
                return Err(ConfigError::MissingSecret(format!("{name} secret")));
            }
            if let Some((_, first)) = table.iter().find(|(existing, _)| *existing == secret) {
                return Err(ConfigError::DuplicateCallerSecret {
                    first: first.to_string(),
                    second: name.to_string(),
                });
            }
            table.push((secret, name));
        }
        Ok(Self { entries: table })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the caller whose secret produced `offered` for this request.
    ///
    /// Every entry is hashed and compared, so the time taken does not depend
    /// on which caller (if any) matched.
    pub fn identify(&self, offered: &str, path: &str, body: &[u8]) -> Option<CallerName> {
        let mut matched = None;
        for (secret, name) in &self.entries {
            let expected = sign(secret, path, body);
            if constant_time_str_eq(&expected, offered) && matched.is_none() {
                matched = Some(*name);
            }
        }
        matched
    }
}

impl fmt::Debug for CallerSecretTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(_, name)| name))
            .finish()
    }
}

/// Validates the shared-secret signature on every inbound request.
#[derive(Debug, Clone)]
pub struct SignatureGate {
    table: CallerSecretTable,
    bypass: bool,
}

impl SignatureGate {
    pub fn new(table: CallerSecretTable) -> Self {
        Self {
            table,
            bypass: false,
        }
    }

    /// Skip the check entirely. Only for local development.
    pub fn with_bypass(mut self, bypass: bool) -> Self {
        self.bypass = bypass;
        self
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Verify the offered signature for `path` and `body`.
    ///
    /// Returns the matching caller, or `Ok(None)` when the gate is bypassed.
    pub fn verify(
        &self,
        offered: Option<&str>,
        path: &str,
        body: &[u8],
    ) -> Result<Option<CallerName>, AuthError> {
        if self.bypass {
            return Ok(None);
        }

        let offered = offered
            .filter(|s| !s.is_empty())
            .ok_or(AuthError::SignatureMissing)?;

        self.table
            .identify(offered, path, body)
            .map(Some)
            .ok_or(AuthError::SignatureMismatch)
    }
}
