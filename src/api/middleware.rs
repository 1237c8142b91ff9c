use crate::api::AppState;
use crate::error::{AppError, Result};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{self, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Identity proven by the bearer token on the request.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: i64,
}

impl AuthUser {
    /// Requests may only act on behalf of the authenticated identity.
    ///
    /// # Errors
    /// Returns `AppError::Forbidden` if `claimed_id` names someone else.
    pub fn ensure_acting_as(&self, claimed_id: i64) -> Result<()> {
        if claimed_id == self.user_id { Ok(()) } else { Err(AppError::Forbidden) }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let auth_header = parts.headers.get(header::AUTHORIZATION).ok_or(AppError::AuthError)?;
        let auth_str = auth_header.to_str().map_err(|_| AppError::AuthError)?;
        let token = auth_str.strip_prefix("Bearer ").ok_or(AppError::AuthError)?;

        let user_id = state.auth_service.verify_token(token)?;
        tracing::Span::current().record("user_id", user_id);

        Ok(Self { user_id })
    }
}

/// Generates a UUIDv4 request id when the client did not send `x-request-id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeRequestUuidOrHeader;

impl MakeRequestId for MakeRequestUuidOrHeader {
    fn make_request_id<B>(&mut self, request: &http::Request<B>) -> Option<RequestId> {
        if let Some(existing) = request.headers().get("x-request-id") {
            return Some(RequestId::new(existing.clone()));
        }
        let id = Uuid::new_v4().to_string();
        http::HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Fails any request still running after `server.request_timeout_secs` with 408.
pub async fn enforce_deadline(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let deadline = Duration::from_secs(state.config.server.request_timeout_secs);
    match tokio::time::timeout(deadline, next.run(req)).await {
        Ok(response) => response,
        Err(_) => AppError::Timeout.into_response(),
    }
}

/// Records the governor's verdict for every request that reached it.
pub async fn log_rate_limit_events(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let response = next.run(req).await;
    let retry_after = response.headers().get(header::RETRY_AFTER).and_then(|v| v.to_str().ok());
    state.rate_limit_service.record(response.status(), retry_after);
    response
}
