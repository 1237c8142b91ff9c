use super::TypingStore;
use crate::adapters::database::DbPool;
use crate::adapters::database::typing_repo::TypingRepository;
use crate::domain::typing::TypingKey;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Typing signals kept in the `typing_signals` table, shared by every server instance.
#[derive(Debug)]
pub struct PgTypingStore {
    pool: DbPool,
    repo: TypingRepository,
    window: Duration,
}

impl PgTypingStore {
    #[must_use]
    pub const fn new(pool: DbPool, repo: TypingRepository, window: Duration) -> Self {
        Self { pool, repo, window }
    }
}

#[async_trait]
impl TypingStore for PgTypingStore {
    async fn set(&self, key: TypingKey) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.repo.upsert(&mut conn, key).await
    }

    async fn clear(&self, key: TypingKey) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        self.repo.delete(&mut conn, key).await
    }

    async fn check(&self, key: TypingKey) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        match self.repo.is_live(&mut conn, key, self.window).await? {
            None => Ok(false),
            Some(true) => Ok(true),
            Some(false) => {
                self.repo.delete_if_stale(&mut conn, key, self.window).await?;
                Ok(false)
            }
        }
    }

    async fn purge_expired(&self) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        self.repo.delete_expired(&mut conn, self.window).await
    }
}
