//! HTTP error mapping.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use tracing::error;

/// Errors returned by handlers. Bodies are `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Internal(quire_core::Error),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
}

impl From<quire_core::Error> for ApiError {
    fn from(err: quire_core::Error) -> Self {
        match err {
            quire_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            quire_core::Error::NotebookNotFound(id) => {
                ApiError::NotFound(format!("Notebook {} not found", id))
            }
            quire_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            quire_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(error = %err, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Unauthorized(msg) | ApiError::NotFound(msg) | ApiError::BadRequest(msg) => {
                msg
            }
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_core_error_mapping() {
        let cases = [
            (quire_core::Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (quire_core::Error::NotFound("x".into()), StatusCode::NOT_FOUND),
            (quire_core::Error::NotebookNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (quire_core::Error::Unauthorized("x".into()), StatusCode::UNAUTHORIZED),
            (quire_core::Error::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (quire_core::Error::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response =
            ApiError::from(quire_core::Error::Internal("secret".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
