//! # wins-auth-core
//!
//! Request authentication for the Export Wins API.
//!
//! ## Overview
//!
//! Two independent mechanisms guard the API:
//!
//! - **Signature gate**: every request carries `X-Signature`, a SHA-256 over
//!   path, body and one of the trusted callers' secrets. The matching secret
//!   identifies the caller (ui, admin, mi or data).
//! - **Hawk**: machine-to-machine routes additionally require a Hawk
//!   `Authorization` header from an allow-listed address, with replay
//!   protection through a [`NonceStore`] and per-route [`Scope`]s. Responses
//!   are signed back with `Server-Authorization`.
//!
//! Both are framework-independent; the HTTP wiring lives in `wins-auth-api`.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wins_auth_core::{
//!     CredentialStore, HawkAuthenticator, HawkCredential, HawkRequest, IpAllowList,
//!     MemoryNonceStore, Scope,
//! };
//!
//! let authenticator = HawkAuthenticator::builder()
//!     .with_credentials(CredentialStore::new(vec![HawkCredential::new(
//!         "activity-stream-id",
//!         "activity-stream-key",
//!         [Scope::ActivityStream],
//!     )])?)
//!     .with_nonce_store(Arc::new(MemoryNonceStore::new()))
//!     .with_ip_allow_list(IpAllowList::parse(["10.0.0.5"], 2)?)
//!     .build()?;
//!
//! let principal = authenticator.authenticate(&request).await?;
//! authenticator.authorize(&principal, Some(Scope::ActivityStream))?;
//! let server_authorization = principal.respond("application/json", &body)?;
//! ```

pub mod authenticator;
pub mod compare;
pub mod credentials;
pub mod error;
pub mod forwarded;
pub mod hawk;
pub mod nonce;
pub mod policy;
pub mod signature;

// Primary exports
pub use authenticator::{HawkAuthenticator, HawkAuthenticatorBuilder};
pub use credentials::{CredentialStore, HawkCredential, Scope};
pub use error::{AuthError, AuthFailure, ConfigError};
pub use forwarded::{IpAllowList, DEFAULT_TRUSTED_HOP_COUNT};
pub use hawk::{HawkClient, HawkPrincipal, HawkRequest, RequestTarget};
pub use nonce::{MemoryNonceStore, NonceStore};
pub use signature::{CallerName, CallerSecretTable, SignatureGate};

#[cfg(feature = "redis")]
pub use nonce::RedisNonceStore;
