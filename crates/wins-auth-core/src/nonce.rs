//! Replay protection: one claim per `(credential, nonce)` within a TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::error::AuthError;

/// Atomic "claim this nonce or report it as already used" primitive.
///
/// Implementations must never answer `true` twice for the same pair within
/// `ttl`, including when the claims race.
#[async_trait]
pub trait NonceStore: Send + Sync {
    /// Returns `Ok(true)` if the pair was unclaimed and is now claimed.
    async fn claim(&self, credential_id: &str, nonce: &str, ttl: Duration) -> Result<bool, AuthError>;
}

/// In-process nonce store backed by a sharded concurrent map.
///
/// Each claim holds the shard lock for its key for the whole
/// test-and-set, so concurrent claims on one pair serialise.
#[derive(Debug, Default)]
pub struct MemoryNonceStore {
    /// (credential id, nonce) -> expiry
    nonces: DashMap<(String, String), Instant>,
}

impl MemoryNonceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_at(&self, credential_id: &str, nonce: &str, ttl: Duration, now: Instant) -> bool {
        match self.nonces.entry((credential_id.to_string(), nonce.to_string())) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return false;
                }
                entry.insert(now + ttl);
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(now + ttl);
                true
            }
        }
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.nonces.retain(|_, expiry| *expiry > now);
    }

    pub fn len(&self) -> usize {
        self.nonces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nonces.is_empty()
    }

    /// Spawn a task that purges expired entries every `interval`.
    pub fn start_purge_task(self: &Arc<Self>, interval: Duration) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let before = store.len();
                store.purge_expired();
                tracing::trace!(before, after = store.len(), "purged expired nonces");
            }
        })
    }
}

#[async_trait]
impl NonceStore for MemoryNonceStore {
    async fn claim(&self, credential_id: &str, nonce: &str, ttl: Duration) -> Result<bool, AuthError> {
        Ok(self.claim_at(credential_id, nonce, ttl, Instant::now()))
    }
}

#[cfg(feature = "redis")]
pub use self::redis_store::RedisNonceStore;

#[cfg(feature = "redis")]
mod redis_store {
    use super::*;

    use redis::aio::ConnectionManager;

    /// Nonce store shared across processes through Redis `SET NX EX`.
    #[derive(Clone)]
    pub struct RedisNonceStore {
        connection: ConnectionManager,
        prefix: String,
    }

    impl RedisNonceStore {
        pub async fn connect(url: &str) -> Result<Self, AuthError> {
            let client = redis::Client::open(url).map_err(|e| AuthError::NonceStore(e.to_string()))?;
            let connection = ConnectionManager::new(client)
                .await
                .map_err(|e| AuthError::NonceStore(e.to_string()))?;
            Ok(Self {
                connection,
                prefix: "hawk-nonce".to_string(),
            })
        }
    }

    #[async_trait]
    impl NonceStore for RedisNonceStore {
        async fn claim(&self, credential_id: &str, nonce: &str, ttl: Duration) -> Result<bool, AuthError> {
            let key = format!("{}:{}:{}", self.prefix, credential_id, nonce);
            let mut connection = self.connection.clone();
            let reply: Option<String> = redis::cmd("SET")
                .arg(&key)
                .arg(1)
                .arg("NX")
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, Option<String>>(&mut connection)
                .await
                .map_err(|e| AuthError::NonceStore(e.to_string()))?;
            Ok(reply.is_some())
        }
    }
}
