//! Server configuration.
//!
//! Loaded once at startup from an optional TOML file (path in
//! `WINS_AUTH_CONFIG`, default `wins-auth.toml`) overlaid with environment
//! variables of the same names, upper-cased (`UI_SECRET`,
//! `HAWK_IP_WHITELIST`, ...). List settings accept comma separated values.

use std::collections::HashSet;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use wins_auth_core::{
    CallerName, CallerSecretTable, ConfigError, CredentialStore, HawkCredential, IpAllowList,
    Scope, DEFAULT_TRUSTED_HOP_COUNT,
};

const CONFIG_PATH_VAR: &str = "WINS_AUTH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "wins-auth";
const LIST_KEYS: [&str; 2] = ["hawk_ip_whitelist", "hawk_scopes"];

/// Errors loading or validating settings. All are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Raw settings as read from file and environment.
///
/// Intentionally not `Debug`: it holds every shared secret.
#[derive(Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub ui_secret: String,
    #[serde(default)]
    pub admin_secret: String,
    #[serde(default)]
    pub mi_secret: String,
    #[serde(default)]
    pub data_server_secret: String,

    #[serde(default)]
    pub hawk_access_key_id: String,
    #[serde(default)]
    pub hawk_secret_access_key: String,
    #[serde(default = "default_hawk_scopes")]
    pub hawk_scopes: Vec<String>,
    #[serde(default)]
    pub hawk_ip_whitelist: Vec<String>,
    #[serde(default = "default_window_seconds")]
    pub hawk_receiver_nonce_expiry_seconds: u64,
    #[serde(default = "default_window_seconds")]
    pub hawk_timestamp_skew_seconds: u64,
    #[serde(default = "default_trusted_hop_count")]
    pub hawk_trusted_hop_count: usize,

    /// Skip the signature gate. Local development only.
    #[serde(default)]
    pub api_debug: bool,

    #[serde(default = "default_scheme")]
    pub default_scheme: String,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    #[serde(default = "default_window_seconds")]
    pub nonce_purge_interval_seconds: u64,
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_hawk_scopes() -> Vec<String> {
    vec![Scope::ActivityStream.as_str().to_string()]
}

fn default_window_seconds() -> u64 {
    60
}

fn default_trusted_hop_count() -> usize {
    DEFAULT_TRUSTED_HOP_COUNT
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_port() -> u16 {
    8080
}

impl Settings {
    /// Load from the config file (if present) and the process environment.
    pub fn load() -> Result<Self, SettingsError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let mut environment = Environment::default()
            .try_parsing(true)
            .list_separator(",");
        for key in LIST_KEYS {
            environment = environment.with_list_parse_key(key);
        }

        let config = Config::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(environment)
            .build()?;
        Self::from_config(config)
    }

    /// Deserialize from an already assembled [`Config`].
    pub fn from_config(config: Config) -> Result<Self, SettingsError> {
        Ok(config.try_deserialize()?)
    }

    /// The four trusted callers and their secrets.
    pub fn caller_secrets(&self) -> Result<CallerSecretTable, ConfigError> {
        CallerSecretTable::new([
            (self.ui_secret.clone(), CallerName::Ui),
            (self.admin_secret.clone(), CallerName::Admin),
            (self.mi_secret.clone(), CallerName::Mi),
            (self.data_server_secret.clone(), CallerName::Data),
        ])
    }

    /// The deployment's Hawk credential.
    pub fn credentials(&self) -> Result<CredentialStore, ConfigError> {
        let scopes = self
            .hawk_scopes
            .iter()
            .map(|s| s.parse::<Scope>())
            .collect::<Result<HashSet<_>, _>>()?;
        CredentialStore::new(vec![HawkCredential::new(
            self.hawk_access_key_id.clone(),
            self.hawk_secret_access_key.clone(),
            scopes,
        )])
    }

    pub fn ip_allow_list(&self) -> Result<IpAllowList, ConfigError> {
        IpAllowList::parse(
            self.hawk_ip_whitelist.iter().filter(|ip| !ip.trim().is_empty()),
            self.hawk_trusted_hop_count,
        )
    }

    pub fn nonce_ttl(&self) -> Duration {
        Duration::from_secs(self.hawk_receiver_nonce_expiry_seconds)
    }

    pub fn timestamp_skew(&self) -> Duration {
        Duration::from_secs(self.hawk_timestamp_skew_seconds)
    }

    pub fn nonce_purge_interval(&self) -> Duration {
        Duration::from_secs(self.nonce_purge_interval_seconds.max(1))
    }
}
