use crate::adapters::database::records::{ConversationRecord, MessageRecord};
use crate::domain::conversation::ConversationSummary;
use crate::domain::message::Message;
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use time::OffsetDateTime;

#[derive(Clone, Debug, Default)]
pub struct MessageRepository {}

impl MessageRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Records a new unread message.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the receiver or the related report does not exist.
    /// Returns `AppError::Database` if the insert fails.
    #[tracing::instrument(level = "debug", skip(self, conn, body))]
    pub(crate) async fn create(
        &self,
        conn: &mut PgConnection,
        sender_id: i64,
        receiver_id: i64,
        report_id: Option<i64>,
        body: &str,
        sent_at: OffsetDateTime,
    ) -> Result<Message> {
        let result = sqlx::query_as::<_, MessageRecord>(
            r#"
            INSERT INTO messages (sender_id, receiver_id, report_id, body, is_read, sent_at)
            VALUES ($1, $2, $3, $4, FALSE, $5)
            RETURNING id, sender_id, receiver_id, report_id, body, is_read, sent_at
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(report_id)
        .bind(body)
        .bind(sent_at)
        .fetch_one(conn)
        .await;

        match result {
            Ok(record) => Ok(record.into()),
            // Foreign key violation: name the reference that is gone
            Err(sqlx::Error::Database(e)) if e.code().as_deref() == Some("23503") => match e.constraint() {
                Some("messages_receiver_id_fkey") => {
                    Err(AppError::invalid_field("receiverId", "Receiver does not exist"))
                }
                Some("messages_report_id_fkey") => Err(AppError::invalid_field("reportId", "Report does not exist")),
                // A valid token whose account has since been deleted
                Some("messages_sender_id_fkey") => Err(AppError::AuthError),
                _ => Err(AppError::Database(sqlx::Error::Database(e))),
            },
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// All messages exchanged between two identities, oldest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn fetch_between(&self, conn: &mut PgConnection, user_a: i64, user_b: i64) -> Result<Vec<Message>> {
        let messages = sqlx::query_as::<_, MessageRecord>(
            r#"
            SELECT id, sender_id, receiver_id, report_id, body, is_read, sent_at
            FROM messages
            WHERE (sender_id = $1 AND receiver_id = $2)
               OR (sender_id = $2 AND receiver_id = $1)
            ORDER BY sent_at ASC, id ASC
            "#,
        )
        .bind(user_a)
        .bind(user_b)
        .fetch_all(conn)
        .await?;

        Ok(messages.into_iter().map(Into::into).collect())
    }

    /// Marks a single message read if it is addressed to `receiver_id`. Returns rows changed.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn mark_read(&self, conn: &mut PgConnection, message_id: i64, receiver_id: i64) -> Result<u64> {
        let result =
            sqlx::query("UPDATE messages SET is_read = TRUE WHERE id = $1 AND receiver_id = $2 AND NOT is_read")
                .bind(message_id)
                .bind(receiver_id)
                .execute(conn)
                .await?;
        Ok(result.rows_affected())
    }

    /// Marks everything `counterpart_id` sent to `viewer_id` as read. Returns rows changed.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn mark_conversation_read(
        &self,
        conn: &mut PgConnection,
        viewer_id: i64,
        counterpart_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE messages SET is_read = TRUE
            WHERE receiver_id = $1 AND sender_id = $2 AND NOT is_read
            "#,
        )
        .bind(viewer_id)
        .bind(counterpart_id)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn count_unread(&self, conn: &mut PgConnection, receiver_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE receiver_id = $1 AND NOT is_read")
            .bind(receiver_id)
            .fetch_one(conn)
            .await?;
        Ok(count)
    }

    /// One summary per counterpart the viewer has exchanged messages with, unordered and unfiltered.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn))]
    pub(crate) async fn conversations_for(
        &self,
        conn: &mut PgConnection,
        viewer_id: i64,
    ) -> Result<Vec<ConversationSummary>> {
        let records = sqlx::query_as::<_, ConversationRecord>(
            r#"
            WITH touching AS (
                SELECT id,
                       CASE WHEN sender_id = $1 THEN receiver_id ELSE sender_id END AS counterpart_id,
                       body,
                       sent_at
                FROM messages
                WHERE sender_id = $1 OR receiver_id = $1
            ),
            latest AS (
                SELECT DISTINCT ON (counterpart_id) counterpart_id, body, sent_at
                FROM touching
                ORDER BY counterpart_id, sent_at DESC, id DESC
            )
            SELECT l.counterpart_id,
                   u.username,
                   u.role,
                   l.body AS last_message,
                   l.sent_at AS last_message_at,
                   (
                       SELECT COUNT(*) FROM messages m
                       WHERE m.receiver_id = $1 AND m.sender_id = l.counterpart_id AND NOT m.is_read
                   ) AS unread_count
            FROM latest l
            JOIN users u ON u.id = l.counterpart_id
            "#,
        )
        .bind(viewer_id)
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }
}
