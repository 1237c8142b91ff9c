use crate::domain::user::Role;
use time::OffsetDateTime;

/// Per-counterpart view of a viewer's message history. Derived on every read, never stored.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub counterpart_id: i64,
    pub counterpart_username: String,
    pub counterpart_role: Role,
    pub last_message: String,
    pub last_message_at: OffsetDateTime,
    /// Unread messages sent by the counterpart to the viewer.
    pub unread_count: i64,
}

/// Applies the visibility policy and orders conversations newest first.
///
/// Plain users only see conversations with privileged counterparts (admin/police);
/// privileged viewers see every counterpart.
#[must_use]
pub fn visible_conversations(viewer_role: Role, mut summaries: Vec<ConversationSummary>) -> Vec<ConversationSummary> {
    if !viewer_role.is_privileged() {
        summaries.retain(|s| s.counterpart_role.is_privileged());
    }
    summaries.sort_by(|a, b| {
        b.last_message_at.cmp(&a.last_message_at).then_with(|| a.counterpart_id.cmp(&b.counterpart_id))
    });
    summaries
}
