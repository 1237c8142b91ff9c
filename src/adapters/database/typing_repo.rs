use crate::domain::typing::TypingKey;
use crate::error::Result;
use sqlx::PgConnection;
use std::time::Duration;

/// Table-backed typing signals. Staleness is judged against the database clock.
#[derive(Clone, Debug, Default)]
pub struct TypingRepository {}

impl TypingRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// # Errors
    /// Returns `AppError::Database` if the upsert fails.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(key = %key))]
    pub(crate) async fn upsert(&self, conn: &mut PgConnection, key: TypingKey) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO typing_signals (from_user_id, to_user_id, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (from_user_id, to_user_id) DO UPDATE SET updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(key.from)
        .bind(key.to)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(key = %key))]
    pub(crate) async fn delete(&self, conn: &mut PgConnection, key: TypingKey) -> Result<()> {
        sqlx::query("DELETE FROM typing_signals WHERE from_user_id = $1 AND to_user_id = $2")
            .bind(key.from)
            .bind(key.to)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// `None` when no row exists, otherwise whether the row is still inside `window`.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(key = %key))]
    pub(crate) async fn is_live(&self, conn: &mut PgConnection, key: TypingKey, window: Duration) -> Result<Option<bool>> {
        let live: Option<bool> = sqlx::query_scalar(
            r#"
            SELECT (NOW() - updated_at) < make_interval(secs => $3)
            FROM typing_signals
            WHERE from_user_id = $1 AND to_user_id = $2
            "#,
        )
        .bind(key.from)
        .bind(key.to)
        .bind(window.as_secs_f64())
        .fetch_optional(conn)
        .await?;
        Ok(live)
    }

    /// Deletes the row only if it is stale, so a refresh racing with the check survives.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(level = "debug", skip(self, conn), fields(key = %key))]
    pub(crate) async fn delete_if_stale(&self, conn: &mut PgConnection, key: TypingKey, window: Duration) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM typing_signals
            WHERE from_user_id = $1 AND to_user_id = $2
              AND updated_at <= NOW() - make_interval(secs => $3)
            "#,
        )
        .bind(key.from)
        .bind(key.to)
        .bind(window.as_secs_f64())
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// # Errors
    /// Returns `AppError::Database` if the delete fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn delete_expired(&self, conn: &mut PgConnection, window: Duration) -> Result<u64> {
        let result = sqlx::query("DELETE FROM typing_signals WHERE updated_at <= NOW() - make_interval(secs => $1)")
            .bind(window.as_secs_f64())
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }
}
