use crate::adapters::database::DbPool;
use crate::adapters::database::message_repo::MessageRepository;
use crate::config::MessagingConfig;
use crate::domain::message::{Message, validate_body};
use crate::error::{AppError, Result};
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use time::OffsetDateTime;

#[derive(Clone, Debug)]
pub(crate) struct Metrics {
    pub(crate) sent_total: Counter<u64>,
    pub(crate) marked_read_total: Counter<u64>,
    pub(crate) thread_size: Histogram<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("alertdavao-server");
        Self {
            sent_total: meter
                .u64_counter("alertdavao_messages_sent_total")
                .with_description("Total message send attempts by status")
                .build(),
            marked_read_total: meter
                .u64_counter("alertdavao_messages_marked_read_total")
                .with_description("Messages transitioned from unread to read")
                .build(),
            thread_size: meter
                .u64_histogram("alertdavao_message_thread_size")
                .with_description("Number of messages returned for a two-party thread")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MessageService {
    pool: DbPool,
    repo: MessageRepository,
    config: MessagingConfig,
    metrics: Metrics,
}

impl MessageService {
    #[must_use]
    pub fn new(pool: DbPool, repo: MessageRepository, config: MessagingConfig) -> Self {
        Self { pool, repo, config, metrics: Metrics::new() }
    }

    /// Stores an unread message stamped with the current time and returns it.
    ///
    /// # Errors
    /// Returns `AppError::Validation` if the body is empty or too long, or if the receiver
    /// or related report does not exist.
    /// Returns `AppError::Database` if the message cannot be stored.
    #[tracing::instrument(
        err(level = "warn"),
        skip(self, body),
        fields(sender_id = %sender_id, receiver_id = %receiver_id)
    )]
    pub async fn send_message(
        &self,
        sender_id: i64,
        receiver_id: i64,
        body: &str,
        report_id: Option<i64>,
    ) -> Result<Message> {
        let body = validate_body(body, self.config.max_body_chars)
            .map_err(|e| AppError::invalid_field("message", e.to_string()))?;

        let mut conn = self.pool.acquire().await?;
        match self.repo.create(&mut conn, sender_id, receiver_id, report_id, body, OffsetDateTime::now_utc()).await {
            Ok(message) => {
                tracing::debug!(message_id = message.id, "Message stored");
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "success")]);
                Ok(message)
            }
            Err(e) => {
                self.metrics.sent_total.add(1, &[KeyValue::new("status", "failure")]);
                Err(e)
            }
        }
    }

    /// Both directions of the thread between two identities, oldest first.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn messages_between(&self, user_id: i64, other_user_id: i64) -> Result<Vec<Message>> {
        let mut conn = self.pool.acquire().await?;
        let messages = self.repo.fetch_between(&mut conn, user_id, other_user_id).await?;
        self.metrics.thread_size.record(messages.len() as u64, &[]);
        Ok(messages)
    }

    /// Marks one message read on behalf of its receiver.
    ///
    /// Unknown ids, messages addressed to someone else and already-read messages are all
    /// a successful no-op.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn mark_message_read(&self, viewer_id: i64, message_id: i64) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        let updated = self.repo.mark_read(&mut conn, message_id, viewer_id).await?;
        if updated == 0 {
            tracing::debug!("Mark-read matched no unread message");
        }
        self.metrics.marked_read_total.add(updated, &[]);
        Ok(())
    }

    /// Marks everything `counterpart_id` sent to `viewer_id` as read and returns how many changed.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn mark_conversation_read(&self, viewer_id: i64, counterpart_id: i64) -> Result<u64> {
        let mut conn = self.pool.acquire().await?;
        let updated = self.repo.mark_conversation_read(&mut conn, viewer_id, counterpart_id).await?;
        self.metrics.marked_read_total.add(updated, &[]);
        Ok(updated)
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(err(level = "warn"), skip(self))]
    pub async fn unread_count(&self, user_id: i64) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        self.repo.count_unread(&mut conn, user_id).await
    }
}
