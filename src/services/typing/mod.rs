//! Typing signals: an advisory, self-expiring flag per ordered (from, to) pair.
//!
//! Per pair there are two states, Absent and Live. `set_typing(true)` makes the pair Live,
//! `set_typing(false)` makes it Absent, and a check that finds the signal older than the
//! liveness window removes it and reports Absent. Nothing else transitions.

mod memory;
mod postgres;

pub use memory::InMemoryTypingStore;
pub use postgres::PgTypingStore;

use crate::domain::typing::TypingKey;
use crate::error::Result;
use async_trait::async_trait;
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;

/// Backing storage for typing signals. Implementations own the liveness window.
#[async_trait]
pub trait TypingStore: Send + Sync + std::fmt::Debug {
    /// Marks the pair live as of now, replacing any previous signal.
    async fn set(&self, key: TypingKey) -> Result<()>;

    /// Removes the signal. Clearing an absent pair is not an error.
    async fn clear(&self, key: TypingKey) -> Result<()>;

    /// Whether the pair is live; a stale signal is removed as a side effect.
    async fn check(&self, key: TypingKey) -> Result<bool>;

    /// Removes every stale signal and returns how many were dropped.
    async fn purge_expired(&self) -> Result<u64>;
}

#[derive(Clone, Debug)]
struct Metrics {
    signals_set_total: Counter<u64>,
    checks_total: Counter<u64>,
    expired_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("alertdavao-server");
        Self {
            signals_set_total: meter
                .u64_counter("alertdavao_typing_signals_set_total")
                .with_description("Typing signal updates by state")
                .build(),
            checks_total: meter
                .u64_counter("alertdavao_typing_checks_total")
                .with_description("Typing status checks by outcome")
                .build(),
            expired_total: meter
                .u64_counter("alertdavao_typing_signals_expired_total")
                .with_description("Stale typing signals removed by the sweeper")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TypingService {
    store: Arc<dyn TypingStore>,
    metrics: Metrics,
}

impl TypingService {
    #[must_use]
    pub fn new(store: Arc<dyn TypingStore>) -> Self {
        Self { store, metrics: Metrics::new() }
    }

    /// # Errors
    /// Returns `AppError::Database` if a table-backed store cannot be written.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn set_typing(&self, from: i64, to: i64, is_typing: bool) -> Result<()> {
        let key = TypingKey::new(from, to);
        if is_typing {
            self.store.set(key).await?;
        } else {
            self.store.clear(key).await?;
        }
        self.metrics.signals_set_total.add(1, &[KeyValue::new("typing", is_typing)]);
        Ok(())
    }

    /// Never fails: a store error reads as "not typing" so polling clients stay responsive.
    #[tracing::instrument(skip(self))]
    pub async fn check_typing(&self, from: i64, to: i64) -> bool {
        let outcome = match self.store.check(TypingKey::new(from, to)).await {
            Ok(live) => live,
            Err(e) => {
                tracing::warn!(error = %e, "Typing status check failed, reporting not typing");
                self.metrics.checks_total.add(1, &[KeyValue::new("outcome", "error")]);
                return false;
            }
        };
        self.metrics.checks_total.add(1, &[KeyValue::new("outcome", if outcome { "typing" } else { "idle" })]);
        outcome
    }

    /// # Errors
    /// Returns `AppError::Database` if a table-backed store cannot be swept.
    pub async fn purge_expired(&self) -> Result<u64> {
        let purged = self.store.purge_expired().await?;
        if purged > 0 {
            self.metrics.expired_total.add(purged, &[]);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[derive(Debug)]
    struct BrokenStore;

    #[async_trait]
    impl TypingStore for BrokenStore {
        async fn set(&self, _key: TypingKey) -> Result<()> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn clear(&self, _key: TypingKey) -> Result<()> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn check(&self, _key: TypingKey) -> Result<bool> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }

        async fn purge_expired(&self) -> Result<u64> {
            Err(AppError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    #[tokio::test]
    async fn test_check_degrades_to_not_typing() {
        let service = TypingService::new(Arc::new(BrokenStore));
        assert!(!service.check_typing(1, 2).await);
    }

    #[tokio::test]
    async fn test_write_failures_propagate() {
        let service = TypingService::new(Arc::new(BrokenStore));
        assert!(matches!(service.set_typing(1, 2, true).await, Err(AppError::Database(_))));
        assert!(matches!(service.set_typing(1, 2, false).await, Err(AppError::Database(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_round_trip_with_memory_store() {
        let service = TypingService::new(Arc::new(InMemoryTypingStore::new(std::time::Duration::from_millis(3000))));

        assert!(!service.check_typing(1, 2).await);
        service.set_typing(1, 2, true).await.unwrap();
        assert!(service.check_typing(1, 2).await);
        assert!(!service.check_typing(2, 1).await);

        service.set_typing(1, 2, false).await.unwrap();
        assert!(!service.check_typing(1, 2).await);
    }
}
