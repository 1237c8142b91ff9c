use crate::adapters::database::DbPool;
use crate::adapters::database::message_repo::MessageRepository;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::conversation::{ConversationSummary, visible_conversations};
use crate::error::{AppError, Result};

/// Derives conversation summaries from the message log on every call; nothing is cached.
#[derive(Clone, Debug)]
pub struct ConversationService {
    pool: DbPool,
    message_repo: MessageRepository,
    user_repo: UserRepository,
}

impl ConversationService {
    #[must_use]
    pub const fn new(pool: DbPool, message_repo: MessageRepository, user_repo: UserRepository) -> Self {
        Self { pool, message_repo, user_repo }
    }

    /// Conversations visible to the viewer, newest first.
    ///
    /// # Errors
    /// Returns `AppError::NotFound` if the viewer does not exist.
    /// Returns `AppError::Database` if a query fails.
    #[tracing::instrument(err(level = "warn"), skip(self), fields(count = tracing::field::Empty))]
    pub async fn list_conversations(&self, viewer_id: i64) -> Result<Vec<ConversationSummary>> {
        let mut conn = self.pool.acquire().await?;
        let viewer = self.user_repo.find_by_id(&mut conn, viewer_id).await?.ok_or(AppError::NotFound)?;

        let summaries = self.message_repo.conversations_for(&mut conn, viewer_id).await?;
        let visible = visible_conversations(viewer.role, summaries);

        tracing::Span::current().record("count", visible.len());
        Ok(visible)
    }
}
