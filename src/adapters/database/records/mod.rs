pub mod conversation;
pub mod message;
pub mod report;
pub mod user;

pub use conversation::ConversationRecord;
pub use message::MessageRecord;
pub use report::{ReportMediaRecord, ReportRecord};
pub use user::UserRecord;
