use crate::domain::user::User;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub(crate) token: String,
    pub(crate) expires_at: i64,
    pub(crate) user: User,
}
