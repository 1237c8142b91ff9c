use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::auth_session::AuthSession;
use crate::domain::user::{Role, User};
use crate::error::{AppError, FieldErrors, Result};
use crate::services::auth_service::AuthService;
use opentelemetry::{global, metrics::Counter};

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 50;
const PASSWORD_MIN_CHARS: usize = 8;

#[derive(Clone, Debug)]
struct Metrics {
    users_registered_total: Counter<u64>,
    login_total: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("alertdavao-server");
        Self {
            users_registered_total: meter
                .u64_counter("alertdavao_users_registered_total")
                .with_description("Total number of successful user registrations")
                .build(),
            login_total: meter
                .u64_counter("alertdavao_auth_login_total")
                .with_description("Total number of successful logins")
                .build(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AccountService {
    pool: DbPool,
    user_repo: UserRepository,
    auth_service: AuthService,
    metrics: Metrics,
}

impl AccountService {
    #[must_use]
    pub fn new(pool: DbPool, user_repo: UserRepository, auth_service: AuthService) -> Self {
        Self { pool, user_repo, auth_service, metrics: Metrics::new() }
    }

    /// Registers a plain citizen account and opens a session for it.
    ///
    /// # Errors
    /// Returns `AppError::Validation` for a malformed username or weak password.
    /// Returns `AppError::Conflict` if the username is taken.
    #[tracing::instrument(skip(self, username, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn register(&self, username: String, password: String) -> Result<AuthSession> {
        let username = username.trim().to_string();
        validate_registration(&username, &password)?;

        let password_hash = self.auth_service.hash_password(&password).await?;

        let mut conn = self.pool.acquire().await?;
        let user = self.user_repo.create(&mut conn, &username, &password_hash, Role::User).await?;

        tracing::Span::current().record("user_id", user.id);
        tracing::info!("User registered successfully");
        self.metrics.users_registered_total.add(1, &[]);

        self.auth_service.create_session(user)
    }

    /// # Errors
    /// Returns `AppError::AuthError` on unknown username or wrong password.
    #[tracing::instrument(skip(self, username, password), fields(user_id = tracing::field::Empty), err(level = "warn"))]
    pub async fn login(&self, username: String, password: String) -> Result<AuthSession> {
        let mut conn = self.pool.acquire().await?;
        let Some(user) = self.user_repo.find_by_username(&mut conn, username.trim()).await? else {
            tracing::warn!("Login failed: user not found");
            return Err(AppError::AuthError);
        };
        drop(conn);

        tracing::Span::current().record("user_id", user.id);

        if !self.auth_service.verify_password(&password, &user.password_hash).await? {
            tracing::warn!("Login failed: invalid password");
            return Err(AppError::AuthError);
        }

        self.metrics.login_total.add(1, &[]);
        self.auth_service.create_session(user)
    }

    /// # Errors
    /// Returns `AppError::NotFound` if the identity no longer exists.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn find_user(&self, user_id: i64) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_id(&mut conn, user_id).await?.ok_or(AppError::NotFound)
    }
}

fn validate_registration(username: &str, password: &str) -> Result<()> {
    let mut fields = FieldErrors::new();

    let username_len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len) {
        fields.insert(
            "username".into(),
            format!("Username must be between {USERNAME_MIN_CHARS} and {USERNAME_MAX_CHARS} characters"),
        );
    } else if username.chars().any(char::is_whitespace) {
        fields.insert("username".into(), "Username must not contain whitespace".into());
    }

    if password.chars().count() < PASSWORD_MIN_CHARS {
        fields.insert("password".into(), format!("Password must be at least {PASSWORD_MIN_CHARS} characters"));
    }

    AppError::check_fields(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_registration() {
        assert!(validate_registration("juan_dc", "password123").is_ok());
    }

    #[test]
    fn test_registration_collects_all_field_errors() {
        match validate_registration("ab", "short") {
            Err(AppError::Validation { fields, .. }) => {
                assert!(fields.contains_key("username"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_username_with_space_rejected() {
        assert!(matches!(validate_registration("juan dc", "password123"), Err(AppError::Validation { .. })));
    }
}
