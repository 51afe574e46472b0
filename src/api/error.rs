//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::db::DatabaseError;
use crate::qof::QofError;
use crate::recall::{RecallError, SaveFailure};
use crate::validation::InvalidField;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<InvalidField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<SaveFailure>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<InvalidField>),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Recall transitions could not be saved for {} patients", .0.len())]
    PartialSave(Vec<SaveFailure>),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut fields = Vec::new();
        let mut failures = Vec::new();

        let (status, code, message) = match self {
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::Validation(errors) => {
                fields = errors;
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "One or more fields are invalid".to_string(),
                )
            }
            ApiError::Conflict(detail) => (StatusCode::CONFLICT, "CONFLICT", detail),
            ApiError::PartialSave(save_failures) => {
                let message = format!(
                    "Recall transitions could not be saved for {} patients",
                    save_failures.len()
                );
                failures = save_failures;
                (StatusCode::INTERNAL_SERVER_ERROR, "PARTIAL_SAVE", message)
            }
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                fields,
                failures,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, id } => {
                ApiError::NotFound(format!("{entity_type} {id} not found"))
            }
            DatabaseError::Sqlite(rusqlite::Error::SqliteFailure(e, detail))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict(detail.unwrap_or_else(|| "Constraint violated".into()))
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<RecallError> for ApiError {
    fn from(err: RecallError) -> Self {
        match err {
            RecallError::Database(e) => e.into(),
            RecallError::PartialPersistence(failures) => ApiError::PartialSave(failures),
        }
    }
}

impl From<QofError> for ApiError {
    fn from(err: QofError) -> Self {
        match err {
            QofError::Database(e) => e.into(),
            QofError::NotFound(id) => ApiError::NotFound(format!("Disease indicator record {id} not found")),
            QofError::Validation(detail) => ApiError::BadRequest(detail),
            QofError::Catalogue(detail) => ApiError::Internal(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use uuid::Uuid;

    async fn json_of(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::NotFound("Record not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_request_returns_400() {
        let response = ApiError::BadRequest("Invalid ID format".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let response = ApiError::Internal("something broke".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"]["message"], "An internal error occurred");
        assert!(json["error"].get("fields").is_none());
    }

    #[tokio::test]
    async fn validation_lists_fields() {
        let response = ApiError::Validation(vec![InvalidField {
            field: "nhs_number".into(),
            reason: "must be exactly 10 digits".into(),
        }])
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "VALIDATION_FAILED");
        assert_eq!(json["error"]["fields"][0]["field"], "nhs_number");
    }

    #[tokio::test]
    async fn partial_save_returns_500_with_failures() {
        let patient_id = Uuid::new_v4();
        let err: ApiError = RecallError::PartialPersistence(vec![SaveFailure {
            patient_id,
            message: "write refused".into(),
        }])
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "PARTIAL_SAVE");
        assert_eq!(json["error"]["failures"][0]["patient_id"], patient_id.to_string());
    }

    #[tokio::test]
    async fn qof_not_found_maps_to_404() {
        let err: ApiError = QofError::NotFound(Uuid::new_v4()).into();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
