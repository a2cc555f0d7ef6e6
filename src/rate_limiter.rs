use std::sync::Arc;

use crate::error::ProxyError;
use crate::store::QuotaStore;

/// Maximum admitted generations per client per window.
pub const MAX_REQUESTS_PER_IP: u32 = 5;

/// Quota window length. The TTL is reset on every commit, so the window
/// rolls from the client's most recent charged request.
pub const WINDOW_DAYS: u64 = 30;
pub const WINDOW_TTL_SECONDS: u64 = WINDOW_DAYS * 24 * 60 * 60;

/// Outcome of a quota check. An admission carries the count observed at
/// check time so the later commit increments from the same base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { current: u32 },
    Denied,
}

/// Per-client admission policy over an injected durable store.
///
/// `check` is read-only; the counter is only written by `commit`, which the
/// handler calls after a successful generation. A failed generation never
/// charges the client. Two concurrent requests from one client can observe
/// the same count and both be admitted; the store has no atomic increment,
/// and the under-count is accepted.
#[derive(Clone)]
pub struct RateLimiter {
    store: Arc<dyn QuotaStore>,
}

impl RateLimiter {
    pub fn new(store: Arc<dyn QuotaStore>) -> Self {
        Self { store }
    }

    fn bucket_key(client_id: &str) -> String {
        format!("rate_limit:{}", client_id)
    }

    /// Decide whether a client may proceed to generation.
    pub async fn check(&self, client_id: &str) -> Result<Admission, ProxyError> {
        let key = Self::bucket_key(client_id);
        let current = match self.store.get(&key).await? {
            Some(value) => value.parse::<u32>().unwrap_or(0),
            None => 0,
        };

        if current >= MAX_REQUESTS_PER_IP {
            tracing::info!(
                target: "playbook_proxy::rate_limiter",
                client_id = %client_id,
                count = current,
                "quota exhausted, denying request"
            );
            return Ok(Admission::Denied);
        }

        Ok(Admission::Admitted { current })
    }

    /// Charge one admitted, successfully-completed request. Writes
    /// `current + 1` and resets the full window TTL.
    pub async fn commit(&self, client_id: &str, current: u32) -> Result<(), ProxyError> {
        let key = Self::bucket_key(client_id);
        let next = current + 1;
        self.store
            .put(&key, &next.to_string(), WINDOW_TTL_SECONDS)
            .await?;

        tracing::debug!(
            target: "playbook_proxy::rate_limiter",
            client_id = %client_id,
            count = next,
            "quota counter updated"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    fn limiter_with_store() -> (RateLimiter, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (RateLimiter::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_first_request_is_admitted_with_zero_count() {
        let (limiter, _store) = limiter_with_store();
        let admission = limiter.check("203.0.113.1").await.unwrap();
        assert_eq!(admission, Admission::Admitted { current: 0 });
    }

    #[tokio::test]
    async fn test_check_has_no_side_effect() {
        let (limiter, store) = limiter_with_store();
        limiter.check("203.0.113.1").await.unwrap();
        assert_eq!(store.get("rate_limit:203.0.113.1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_commit_writes_incremented_count_with_window_ttl() {
        let (limiter, store) = limiter_with_store();
        limiter.commit("203.0.113.1", 0).await.unwrap();

        assert_eq!(
            store.get("rate_limit:203.0.113.1").await.unwrap(),
            Some("1".to_string())
        );
        let ttl = store.remaining_ttl("rate_limit:203.0.113.1").await.unwrap();
        assert!(ttl > Duration::from_secs(WINDOW_TTL_SECONDS - 60));
    }

    #[tokio::test]
    async fn test_denied_at_limit_without_mutation() {
        let (limiter, store) = limiter_with_store();
        store
            .put("rate_limit:198.51.100.7", "5", WINDOW_TTL_SECONDS)
            .await
            .unwrap();

        for _ in 0..3 {
            assert_eq!(limiter.check("198.51.100.7").await.unwrap(), Admission::Denied);
        }
        assert_eq!(
            store.get("rate_limit:198.51.100.7").await.unwrap(),
            Some("5".to_string())
        );
    }

    #[tokio::test]
    async fn test_denied_above_limit() {
        let (limiter, store) = limiter_with_store();
        store
            .put("rate_limit:198.51.100.7", "9", WINDOW_TTL_SECONDS)
            .await
            .unwrap();
        assert_eq!(limiter.check("198.51.100.7").await.unwrap(), Admission::Denied);
    }

    #[tokio::test]
    async fn test_unparseable_count_treated_as_zero() {
        let (limiter, store) = limiter_with_store();
        store
            .put("rate_limit:bad", "not-a-number", WINDOW_TTL_SECONDS)
            .await
            .unwrap();
        assert_eq!(
            limiter.check("bad").await.unwrap(),
            Admission::Admitted { current: 0 }
        );
    }

    #[tokio::test]
    async fn test_expired_bucket_is_admissible_again() {
        let (limiter, store) = limiter_with_store();
        store.put("rate_limit:expired", "5", 0).await.unwrap();
        assert_eq!(
            limiter.check("expired").await.unwrap(),
            Admission::Admitted { current: 0 }
        );
    }

    #[tokio::test]
    async fn test_full_cycle_to_denial() {
        let (limiter, _store) = limiter_with_store();
        for i in 0..MAX_REQUESTS_PER_IP {
            match limiter.check("client").await.unwrap() {
                Admission::Admitted { current } => {
                    assert_eq!(current, i);
                    limiter.commit("client", current).await.unwrap();
                }
                Admission::Denied => panic!("denied before limit"),
            }
        }
        assert_eq!(limiter.check("client").await.unwrap(), Admission::Denied);
    }
}
