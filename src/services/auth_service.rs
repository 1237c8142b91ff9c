use crate::config::AuthConfig;
use crate::domain::auth::{Claims, Password};
use crate::domain::auth_session::AuthSession;
use crate::domain::user::User;
use crate::error::{AppError, Result};

#[derive(Clone, Debug)]
pub struct AuthService {
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub const fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Hashes on the blocking pool.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if hashing fails or the blocking task panics.
    #[tracing::instrument(err, skip(self, password))]
    pub async fn hash_password(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || Password::hash(&password)).await.map_err(|_| AppError::Internal)?
    }

    /// # Errors
    /// Returns `AppError::Internal` if the hash is malformed or the blocking task panics.
    #[tracing::instrument(err, skip(self, password, password_hash))]
    pub async fn verify_password(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        tokio::task::spawn_blocking(move || Password::verify(&password, &password_hash))
            .await
            .map_err(|_| AppError::Internal)?
    }

    /// Issues an access token for the given identity.
    ///
    /// # Errors
    /// Returns `AppError::Internal` if the token cannot be signed.
    #[tracing::instrument(err, skip(self, user), fields(user_id = %user.id))]
    pub fn create_session(&self, user: User) -> Result<AuthSession> {
        let claims = Claims::new(user.id, self.config.access_token_ttl_secs);
        let token = claims.encode(&self.config.jwt_secret)?;
        let expires_at = i64::try_from(claims.exp).map_err(|_| AppError::Internal)?;

        Ok(AuthSession { token, expires_at, user })
    }

    /// Verifies an access token and returns the identity it was issued for.
    ///
    /// # Errors
    /// Returns `AppError::AuthError` if the token is invalid or expired.
    pub fn verify_token(&self, token: &str) -> Result<i64> {
        Claims::decode(token, &self.config.jwt_secret).map(|claims| claims.sub)
    }
}
