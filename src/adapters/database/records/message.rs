use crate::domain::message::Message;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct MessageRecord {
    pub(crate) id: i64,
    pub(crate) sender_id: i64,
    pub(crate) receiver_id: i64,
    pub(crate) report_id: Option<i64>,
    pub(crate) body: String,
    pub(crate) is_read: bool,
    pub(crate) sent_at: OffsetDateTime,
}

impl From<MessageRecord> for Message {
    fn from(record: MessageRecord) -> Self {
        Self {
            id: record.id,
            sender_id: record.sender_id,
            receiver_id: record.receiver_id,
            report_id: record.report_id,
            body: record.body,
            is_read: record.is_read,
            sent_at: record.sent_at,
        }
    }
}
