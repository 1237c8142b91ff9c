use crate::api::AppState;
use crate::api::extract::ApiJson;
use crate::api::middleware::AuthUser;
use crate::api::schemas::auth::{Login, Registration, Session, UserView};
use crate::api::schemas::envelope::Envelope;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// # Errors
/// Returns `AppError::Validation` for a malformed username or short password.
/// Returns `AppError::Conflict` if the username is taken.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<impl IntoResponse> {
    let session = state.account_service.register(payload.username, payload.password).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(Session::from(session)))))
}

/// # Errors
/// Returns `AppError::AuthError` on unknown username or wrong password.
pub async fn login(State(state): State<AppState>, ApiJson(payload): ApiJson<Login>) -> Result<impl IntoResponse> {
    let session = state.account_service.login(payload.username, payload.password).await?;
    Ok(Json(Envelope::ok(Session::from(session))))
}

/// # Errors
/// Returns `AppError::NotFound` if the token outlived its identity.
pub async fn me(auth_user: AuthUser, State(state): State<AppState>) -> Result<impl IntoResponse> {
    let user = state.account_service.find_user(auth_user.user_id).await?;
    Ok(Json(Envelope::ok(UserView::from(user))))
}
