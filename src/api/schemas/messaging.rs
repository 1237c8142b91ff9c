use crate::domain::conversation::ConversationSummary;
use crate::domain::message::Message;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Missing fields deserialize to `None` so they surface as field-level validation errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessage {
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub message: Option<String>,
    pub report_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRead {
    pub user_id: Option<i64>,
    pub other_user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTyping {
    pub sender_id: Option<i64>,
    pub receiver_id: Option<i64>,
    pub is_typing: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub sender_id: i64,
    pub receiver_id: i64,
    pub report_id: Option<i64>,
    pub message: String,
    pub is_read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

impl From<Message> for MessageView {
    fn from(m: Message) -> Self {
        Self {
            id: m.id,
            sender_id: m.sender_id,
            receiver_id: m.receiver_id,
            report_id: m.report_id,
            message: m.body,
            is_read: m.is_read,
            sent_at: m.sent_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationView {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub last_message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
    pub unread_count: i64,
}

impl From<ConversationSummary> for ConversationView {
    fn from(s: ConversationSummary) -> Self {
        Self {
            user_id: s.counterpart_id,
            username: s.counterpart_username,
            role: s.counterpart_role.to_string(),
            last_message: s.last_message,
            last_message_at: s.last_message_at,
            unread_count: s.unread_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationReadResponse {
    pub success: bool,
    pub updated: u64,
}

#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub success: bool,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct TypingStatusResponse {
    pub success: bool,
    pub is_typing: bool,
}
