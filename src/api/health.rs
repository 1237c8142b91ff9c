use crate::api::MgmtState;
use crate::api::schemas::health::HealthResponse;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Liveness: 200 as long as the process is serving.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness: the database pool and, when it is table-backed, the typing store.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let readiness = state.health_service.readiness().await;
    let (status_code, status) =
        if readiness.is_ready() { (StatusCode::OK, "ok") } else { (StatusCode::SERVICE_UNAVAILABLE, "error") };

    let response = HealthResponse {
        status: status.to_string(),
        database: readiness.database.as_str().to_string(),
        typing: readiness.typing.as_str().to_string(),
        typing_backend: readiness.typing_backend.as_str().to_string(),
    };
    (status_code, Json(response))
}
