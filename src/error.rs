use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use thiserror::Error;

/// Field name to human-readable reason.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Validation failed: {message}")]
    Validation { message: String, fields: FieldErrors },
    #[error("Authentication failed")]
    AuthError,
    #[error("Forbidden")]
    Forbidden,
    #[error("Not found")]
    NotFound,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Request timed out")]
    Timeout,
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Validation failure on a single field.
    pub fn invalid_field(field: &str, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let mut fields = FieldErrors::new();
        fields.insert(field.to_string(), reason.clone());
        Self::Validation { message: reason, fields }
    }

    /// Turns a list of collected field failures into an error, or `Ok` when empty.
    ///
    /// # Errors
    /// Returns `AppError::Validation` when at least one field failed.
    pub fn check_fields(fields: FieldErrors) -> Result<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let message = if fields.len() == 1 {
            fields.values().next().cloned().unwrap_or_default()
        } else {
            "The given data was invalid".to_string()
        };
        Err(Self::Validation { message, fields })
    }

    fn status_and_body(self) -> (StatusCode, Value) {
        let (status, message, fields) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
            Self::Validation { message, fields } => {
                tracing::debug!(message = %message, "Validation failed");
                (StatusCode::UNPROCESSABLE_ENTITY, message, Some(fields))
            }
            Self::AuthError => {
                tracing::debug!("Authentication failed");
                (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None)
            }
            Self::Forbidden => {
                tracing::debug!("Forbidden");
                (StatusCode::FORBIDDEN, "Forbidden".to_string(), None)
            }
            Self::NotFound => {
                tracing::debug!("Resource not found");
                (StatusCode::NOT_FOUND, "Not found".to_string(), None)
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg, None)
            }
            Self::Conflict(msg) => {
                tracing::debug!(message = %msg, "Conflict");
                (StatusCode::CONFLICT, msg, None)
            }
            Self::Timeout => {
                tracing::warn!("Request deadline exceeded");
                (StatusCode::REQUEST_TIMEOUT, "Request timed out".to_string(), None)
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
        };

        let mut body = json!({
            "success": false,
            "message": message,
        });
        if let Some(fields) = fields {
            body["errors"] = json!(fields);
        }

        (status, body)
    }

    /// Error response for list endpoints: the usual envelope plus an empty `data` array,
    /// so clients can tell a failed listing apart from an empty one.
    #[must_use]
    pub fn into_list_response(self) -> Response {
        let (status, mut body) = self.status_and_body();
        body["data"] = json!([]);
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_unprocessable_with_field_map() {
        let (status, body) = AppError::invalid_field("receiverId", "Receiver does not exist").status_and_body();

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Receiver does not exist");
        assert_eq!(body["errors"]["receiverId"], "Receiver does not exist");
    }

    #[test]
    fn test_storage_detail_is_not_leaked() {
        let (status, body) = AppError::Database(sqlx::Error::PoolTimedOut).status_and_body();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn test_timeout_is_request_timeout() {
        let (status, _) = AppError::Timeout.status_and_body();
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_check_fields() {
        assert!(AppError::check_fields(FieldErrors::new()).is_ok());

        let mut fields = FieldErrors::new();
        fields.insert("latitude".into(), "out of range".into());
        fields.insert("longitude".into(), "out of range".into());
        match AppError::check_fields(fields) {
            Err(AppError::Validation { message, fields }) => {
                assert_eq!(message, "The given data was invalid");
                assert_eq!(fields.len(), 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
