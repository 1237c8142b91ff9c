use crate::domain::conversation::ConversationSummary;
use crate::domain::user::Role;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct ConversationRecord {
    pub(crate) counterpart_id: i64,
    pub(crate) username: String,
    pub(crate) role: String,
    pub(crate) last_message: String,
    pub(crate) last_message_at: OffsetDateTime,
    pub(crate) unread_count: i64,
}

impl From<ConversationRecord> for ConversationSummary {
    fn from(record: ConversationRecord) -> Self {
        Self {
            counterpart_id: record.counterpart_id,
            counterpart_username: record.username,
            counterpart_role: Role::from_str(&record.role).unwrap_or(Role::User),
            last_message: record.last_message,
            last_message_at: record.last_message_at,
            unread_count: record.unread_count,
        }
    }
}
