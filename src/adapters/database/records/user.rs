use crate::domain::user::{Role, User};
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, sqlx::FromRow)]
pub struct UserRecord {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) password_hash: String,
    pub(crate) role: String,
    pub(crate) created_at: OffsetDateTime,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            password_hash: record.password_hash,
            // The CHECK constraint keeps unknown roles out; fall back to the least privileged one.
            role: Role::from_str(&record.role).unwrap_or(Role::User),
            created_at: record.created_at,
        }
    }
}
