//! Mapping of pipeline errors to HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use mediaflow::errors::MediaflowError;
use serde_json::json;

/// An error returned by a handler.
#[derive(Debug)]
pub struct ApiError(pub MediaflowError);

impl ApiError {
    /// Returns the HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            MediaflowError::Precondition(_) | MediaflowError::ProjectExists(_) => {
                StatusCode::CONFLICT
            }
            MediaflowError::PathEscape(_)
            | MediaflowError::InvalidArtifact { .. }
            | MediaflowError::InvalidProject(_)
            | MediaflowError::Serialization(_) => StatusCode::BAD_REQUEST,
            MediaflowError::Execution(e) if e.invalid_input => StatusCode::BAD_REQUEST,
            MediaflowError::NotFound(_) | MediaflowError::UnknownProject(_) => {
                StatusCode::NOT_FOUND
            }
            MediaflowError::Execution(e) if e.timed_out => StatusCode::GATEWAY_TIMEOUT,
            MediaflowError::Execution(_) | MediaflowError::Config(_) | MediaflowError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl<E: Into<MediaflowError>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Unwraps a JSON request body, turning axum's plain-text rejection into the
/// structured error body every other 400 uses.
pub fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError(MediaflowError::Serialization(rejection.body_text())))
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "Request failed");
        } else {
            tracing::warn!(error = %self.0, "Request rejected");
        }
        (status, Json(json!({ "error": self.0.to_dict() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediaflow::core::StageKind;
    use mediaflow::errors::{ExecutionError, PathEscapeError, PreconditionError};

    #[test]
    fn test_status_mapping() {
        let precondition: ApiError =
            PreconditionError::dependencies_unsatisfied(StageKind::Video, vec![StageKind::Image])
                .into();
        assert_eq!(precondition.status(), StatusCode::CONFLICT);

        let escape: ApiError = PathEscapeError::new("../x", "path contains a '..' segment").into();
        assert_eq!(escape.status(), StatusCode::BAD_REQUEST);

        let failed: ApiError = ExecutionError::new(StageKind::Image, "boom").into();
        assert_eq!(failed.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let timed_out: ApiError = ExecutionError::timeout(StageKind::Image, 1.0).into();
        assert_eq!(timed_out.status(), StatusCode::GATEWAY_TIMEOUT);

        let rejected: ApiError =
            ExecutionError::invalid_input(StageKind::Image, "prompt must not be empty").into();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let unknown = ApiError(MediaflowError::UnknownProject("p".to_string()));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
    }
}
