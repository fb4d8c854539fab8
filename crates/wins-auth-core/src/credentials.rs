//! Hawk credentials and the scopes they grant.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::compare::constant_time_str_eq;
use crate::error::{AuthError, ConfigError};

/// Permission bucket, one per machine-to-machine API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// Activity stream feed.
    #[serde(rename = "activity_stream")]
    ActivityStream,
    /// Data Flow datasets API.
    #[serde(rename = "data_flow_api")]
    DataFlowApi,
    /// Data Hub integration.
    #[serde(rename = "data_hub")]
    DataHub,
    /// Wildcard - all scopes
    #[serde(rename = "*")]
    All,
}

impl std::str::FromStr for Scope {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "activity_stream" => Ok(Self::ActivityStream),
            "data_flow_api" => Ok(Self::DataFlowApi),
            "data_hub" => Ok(Self::DataHub),
            "*" | "all" => Ok(Self::All),
            other => Err(ConfigError::UnknownScope(other.to_string())),
        }
    }
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ActivityStream => "activity_stream",
            Self::DataFlowApi => "data_flow_api",
            Self::DataHub => "data_hub",
            Self::All => "*",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// MAC algorithm of a credential. Only SHA-256 is deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Sha256,
}

/// A machine credential: public id, shared key and granted scopes.
#[derive(Clone, Serialize, Deserialize)]
pub struct HawkCredential {
    pub id: String,
    pub key: String,
    #[serde(default)]
    pub algorithm: Algorithm,
    pub scopes: HashSet<Scope>,
}

impl HawkCredential {
    pub fn new(
        id: impl Into<String>,
        key: impl Into<String>,
        scopes: impl IntoIterator<Item = Scope>,
    ) -> Self {
        Self {
            id: id.into(),
            key: key.into(),
            algorithm: Algorithm::Sha256,
            scopes: scopes.into_iter().collect(),
        }
    }

    /// Whether this credential may call a route requiring `required`.
    pub fn has_scope(&self, required: Scope) -> bool {
        self.scopes.contains(&Scope::All) || self.scopes.contains(&required)
    }

    /// The MAC key for this credential.
    pub(crate) fn hawk_key(&self) -> Result<::hawk::Key, AuthError> {
        let algorithm = match self.algorithm {
            Algorithm::Sha256 => ::hawk::SHA256,
        };
        ::hawk::Key::new(self.key.as_bytes(), algorithm).map_err(|e| AuthError::Crypto(e.to_string()))
    }
}

impl fmt::Debug for HawkCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HawkCredential")
            .field("id", &self.id)
            .field("key", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Read-only credential table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: Vec<HawkCredential>,
}

impl CredentialStore {
    pub fn new(credentials: Vec<HawkCredential>) -> Result<Self, ConfigError> {
        for (i, credential) in credentials.iter().enumerate() {
            if credential.id.is_empty() {
                return Err(ConfigError::MissingSecret("Hawk access key id".to_string()));
            }
            if credential.key.is_empty() {
                return Err(ConfigError::MissingSecret(format!(
                    "Hawk secret for {}",
                    credential.id
                )));
            }
            if credentials[..i].iter().any(|c| c.id == credential.id) {
                return Err(ConfigError::DuplicateCredentialId(credential.id.clone()));
            }
        }
        Ok(Self { credentials })
    }

    /// Look up a credential by id, comparing every entry in constant time.
    pub fn lookup(&self, id: &str) -> Option<&HawkCredential> {
        let mut found = None;
        for credential in &self.credentials {
            if constant_time_str_eq(&credential.id, id) && found.is_none() {
                found = Some(credential);
            }
        }
        found
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_from_str() {
        assert_eq!("activity_stream".parse::<Scope>().ok(), Some(Scope::ActivityStream));
        assert_eq!("data_flow_api".parse::<Scope>().ok(), Some(Scope::DataFlowApi));
        assert_eq!("DATA_HUB".parse::<Scope>().ok(), Some(Scope::DataHub));
        assert_eq!(" * ".parse::<Scope>().ok(), Some(Scope::All));
        assert_eq!("all".parse::<Scope>().ok(), Some(Scope::All));
        assert!(matches!(
            "export_wins".parse::<Scope>(),
            Err(ConfigError::UnknownScope(_))
        ));
    }

    #[test]
    fn test_has_scope_direct_and_wildcard() {
        let stream = HawkCredential::new("a", "k", [Scope::ActivityStream]);
        assert!(stream.has_scope(Scope::ActivityStream));
        assert!(!stream.has_scope(Scope::DataHub));

        let admin = HawkCredential::new("b", "k", [Scope::All]);
        assert!(admin.has_scope(Scope::ActivityStream));
        assert!(admin.has_scope(Scope::DataFlowApi));
        assert!(admin.has_scope(Scope::DataHub));
    }

    #[test]
    fn test_lookup() {
        let store = CredentialStore::new(vec![
            HawkCredential::new("activity-stream-id", "k1", [Scope::ActivityStream]),
            HawkCredential::new("data-flow-id", "k2", [Scope::DataFlowApi]),
        ])
        .unwrap();

        assert_eq!(store.lookup("data-flow-id").map(|c| c.key.as_str()), Some("k2"));
        assert!(store.lookup("activity-stream-i").is_none());
        assert!(store.lookup("").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = CredentialStore::new(vec![
            HawkCredential::new("same", "k1", [Scope::DataHub]),
            HawkCredential::new("same", "k2", [Scope::DataHub]),
        ]);
        assert!(matches!(result, Err(ConfigError::DuplicateCredentialId(_))));
    }

    #[test]
    fn test_empty_key_rejected() {
        let result = CredentialStore::new(vec![HawkCredential::new("id", "", [Scope::DataHub])]);
        assert!(matches!(result, Err(ConfigError::MissingSecret(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let credential = HawkCredential::new("id", "super-secret", [Scope::DataHub]);
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
