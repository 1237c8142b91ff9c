use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Deserialize)]
pub struct Registration {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct Login {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub role: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self { id: user.id, username: user.username, role: user.role.to_string(), created_at: user.created_at }
    }
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub expires_at: i64,
    pub user: UserView,
}

impl From<AuthSession> for Session {
    fn from(session: AuthSession) -> Self {
        Self { token: session.token, expires_at: session.expires_at, user: session.user.into() }
    }
}
