//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use utoipa::ToSchema;

use clinica_core::ClinicError;

/// Body of every error response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[schema(example = 409)]
    pub status_code: u16,
    #[schema(example = "Conflict")]
    pub error: String,
    #[schema(example = "patient already registered")]
    pub message: String,
}

/// An error a handler returns; rendered as [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        if err.is_client_error() {
            tracing::debug!("Rejected request: {}", err);
        }
        match err {
            ClinicError::Validation(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            ClinicError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            ClinicError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
            ClinicError::Storage(e) if e.is_connection_error() => {
                tracing::error!("Storage unavailable: {:?}", e);
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable")
            }
            other => {
                tracing::error!("Internal error: {:?}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            status_code: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clinica_core::store::StorageError;
    use clinica_core::UniqueField;

    #[test]
    fn test_client_errors_keep_their_message() {
        let err = ApiError::from(ClinicError::Conflict("patient already registered".into()));
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.message, "patient already registered");

        let err = ApiError::from(ClinicError::NotFound("patient not found".into()));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err = ApiError::from(ClinicError::validation("name is required"));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ApiError::from(ClinicError::Storage(StorageError::ConnectionError {
            message: "postgres://user:secret@db refused".into(),
        }));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message.contains("secret"));

        let err = ApiError::from(ClinicError::UniqueViolation {
            field: UniqueField::PatientDocument,
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Internal error");
    }
}
