use crate::api::AppState;
use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::middleware::AuthUser;
use crate::api::schemas::envelope::Envelope;
use crate::api::schemas::reports::{AreaView, NearbyQuery, ReportView, SubmitReport};
use crate::domain::report::GeoPoint;
use crate::error::Result;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Stores a report with its location and media in one transaction.
///
/// # Errors
/// Returns `AppError::Validation` for malformed input.
pub async fn submit_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<SubmitReport>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.submit_report(auth_user.user_id, payload.into()).await?;
    Ok((StatusCode::CREATED, Json(Envelope::ok(ReportView::from(report)))))
}

/// # Errors
/// Returns `AppError::NotFound` or `AppError::Forbidden`.
pub async fn get_report(
    auth_user: AuthUser,
    State(state): State<AppState>,
    ApiPath(report_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    let report = state.report_service.get_report(auth_user.user_id, report_id).await?;
    Ok(Json(Envelope::ok(ReportView::from(report))))
}

/// # Errors
/// Returns `AppError::Validation` for an invalid center or radius.
pub async fn nearby(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<NearbyQuery>,
) -> Result<impl IntoResponse> {
    let area =
        state.report_service.nearby(GeoPoint::new(query.latitude, query.longitude), query.radius_km).await?;
    Ok(Json(Envelope::ok(AreaView::from(area))))
}
