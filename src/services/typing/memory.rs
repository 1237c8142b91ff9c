use super::TypingStore;
use crate::domain::typing::{TypingKey, is_live};
use crate::error::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Process-local typing signals keyed by ordered pair, valued by the instant they were last set.
///
/// Last writer wins for concurrent sets on the same pair.
#[derive(Debug)]
pub struct InMemoryTypingStore {
    signals: DashMap<TypingKey, Instant>,
    window: Duration,
}

impl InMemoryTypingStore {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self { signals: DashMap::new(), window }
    }

    fn is_live_at(&self, set_at: Instant, now: Instant) -> bool {
        is_live(now.saturating_duration_since(set_at), self.window)
    }
}

#[async_trait]
impl TypingStore for InMemoryTypingStore {
    async fn set(&self, key: TypingKey) -> Result<()> {
        self.signals.insert(key, Instant::now());
        Ok(())
    }

    async fn clear(&self, key: TypingKey) -> Result<()> {
        self.signals.remove(&key);
        Ok(())
    }

    async fn check(&self, key: TypingKey) -> Result<bool> {
        let now = Instant::now();
        // Copy out before touching the map again; holding a DashMap ref across remove deadlocks.
        let Some(set_at) = self.signals.get(&key).map(|entry| *entry.value()) else {
            return Ok(false);
        };

        if self.is_live_at(set_at, now) {
            return Ok(true);
        }

        // Re-checked under the shard lock so a concurrent refresh is not dropped.
        if self.signals.remove_if(&key, |_, set_at| !self.is_live_at(*set_at, now)).is_some() {
            tracing::debug!(key = %key, "Dropped stale typing signal");
        }
        Ok(false)
    }

    async fn purge_expired(&self) -> Result<u64> {
        let now = Instant::now();
        let mut removed = 0u64;
        self.signals.retain(|_, set_at| {
            let live = self.is_live_at(*set_at, now);
            if !live {
                removed += 1;
            }
            live
        });
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(3000);

    #[tokio::test(start_paused = true)]
    async fn test_never_set_pair_is_absent() {
        let store = InMemoryTypingStore::new(WINDOW);
        assert!(!store.check(TypingKey::new(1, 2)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_live_within_window() {
        let store = InMemoryTypingStore::new(WINDOW);
        let key = TypingKey::new(1, 2);

        store.set(key).await.unwrap();
        tokio::time::advance(Duration::from_millis(2999)).await;

        assert!(store.check(key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_signal_is_removed_on_check() {
        let store = InMemoryTypingStore::new(WINDOW);
        let key = TypingKey::new(1, 2);

        store.set(key).await.unwrap();
        tokio::time::advance(Duration::from_millis(3000)).await;

        assert!(!store.check(key).await.unwrap());
        assert!(store.signals.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_extends_liveness() {
        let store = InMemoryTypingStore::new(WINDOW);
        let key = TypingKey::new(1, 2);

        store.set(key).await.unwrap();
        tokio::time::advance(Duration::from_millis(2000)).await;
        store.set(key).await.unwrap();
        tokio::time::advance(Duration::from_millis(2000)).await;

        assert!(store.check(key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_is_idempotent() {
        let store = InMemoryTypingStore::new(WINDOW);
        let key = TypingKey::new(1, 2);

        store.set(key).await.unwrap();
        store.clear(key).await.unwrap();
        assert!(!store.check(key).await.unwrap());

        store.clear(key).await.unwrap();
        assert!(!store.check(key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairs_are_directional() {
        let store = InMemoryTypingStore::new(WINDOW);

        store.set(TypingKey::new(1, 2)).await.unwrap();

        assert!(store.check(TypingKey::new(1, 2)).await.unwrap());
        assert!(!store.check(TypingKey::new(2, 1)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_drops_only_stale_signals() {
        let store = InMemoryTypingStore::new(WINDOW);

        store.set(TypingKey::new(1, 2)).await.unwrap();
        store.set(TypingKey::new(3, 4)).await.unwrap();
        tokio::time::advance(Duration::from_millis(2500)).await;
        store.set(TypingKey::new(5, 6)).await.unwrap();
        tokio::time::advance(Duration::from_millis(1000)).await;

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert!(store.check(TypingKey::new(5, 6)).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_check_keeps_signal_refreshed_after_it_went_stale() {
        let store = InMemoryTypingStore::new(WINDOW);
        let key = TypingKey::new(1, 2);

        store.set(key).await.unwrap();
        tokio::time::advance(Duration::from_millis(3500)).await;
        store.set(key).await.unwrap();

        assert!(store.check(key).await.unwrap());
        assert_eq!(store.signals.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_purge_counts_exact_removals_under_concurrent_sets() {
        // A zero window makes every signal stale, so each one is either purged or still present.
        let store = std::sync::Arc::new(InMemoryTypingStore::new(Duration::ZERO));
        for i in 0..200 {
            store.set(TypingKey::new(i, i + 1)).await.unwrap();
        }

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 1000..3000 {
                    store.set(TypingKey::new(i, i + 1)).await.unwrap();
                }
            })
        };
        let mut purged = 0;
        for _ in 0..20 {
            purged += store.purge_expired().await.unwrap();
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();

        assert_eq!(purged + store.signals.len() as u64, 2200);
    }
}
