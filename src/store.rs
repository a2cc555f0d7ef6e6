use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tokio::sync::RwLock;

use crate::error::ProxyError;

/// Durable keyed counter store behind the rate limiter.
///
/// `put` overwrites unconditionally and resets the TTL; no compare-and-swap
/// is assumed, so callers must tolerate the read-then-write race documented
/// on [`crate::rate_limiter::RateLimiter`].
#[async_trait]
pub trait QuotaStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ProxyError>;

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), ProxyError>;

    async fn ping(&self) -> Result<(), ProxyError>;
}

/// Redis-backed store. The multiplexed connection is cheap to clone and
/// shared across concurrent requests.
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn connect(redis_url: &str) -> Result<Self, ProxyError> {
        let client = Client::open(redis_url).map_err(|e| {
            ProxyError::Configuration(format!("invalid Redis URL: {}", e))
        })?;

        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| {
                ProxyError::StoreUnavailable(format!("failed to connect to Redis: {}", e))
            })?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl QuotaStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ProxyError> {
        let mut conn = self.connection.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| ProxyError::StoreUnavailable(format!("GET failed: {}", e)))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), ProxyError> {
        let mut conn = self.connection.clone();
        redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(value)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| ProxyError::StoreUnavailable(format!("SETEX failed: {}", e)))
    }

    async fn ping(&self) -> Result<(), ProxyError> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| ProxyError::StoreUnavailable(format!("PING failed: {}", e)))
    }
}

/// In-memory store used when no `REDIS_URL` is configured (local mode) and
/// in tests. Entries expire lazily on read.
#[derive(Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining lifetime of a live entry, if any.
    pub async fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, ProxyError> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<(), ProxyError> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value: value.to_string(),
                expires_at: Instant::now() + Duration::from_secs(ttl_seconds),
            },
        );
        Ok(())
    }

    async fn ping(&self) -> Result<(), ProxyError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("rate_limit:1.2.3.4").await.unwrap(), None);

        store.put("rate_limit:1.2.3.4", "3", 60).await.unwrap();
        assert_eq!(
            store.get("rate_limit:1.2.3.4").await.unwrap(),
            Some("3".to_string())
        );
    }

    #[tokio::test]
    async fn test_memory_store_put_is_idempotent() {
        let store = MemoryStore::new();
        store.put("k", "2", 60).await.unwrap();
        store.put("k", "2", 60).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_overwrite_resets_ttl() {
        let store = MemoryStore::new();
        store.put("k", "1", 10).await.unwrap();
        store.put("k", "2", 120).await.unwrap();

        let ttl = store.remaining_ttl("k").await.unwrap();
        assert!(ttl > Duration::from_secs(100));
        assert_eq!(store.get("k").await.unwrap(), Some("2".to_string()));
    }

    #[tokio::test]
    async fn test_memory_store_expiry() {
        let store = MemoryStore::new();
        store.put("k", "5", 0).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
