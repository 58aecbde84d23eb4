use crate::error::{Failure, FailureKind};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

/// Everything a handler can answer with instead of a document.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The upload itself is unusable (no file, not a PDF, bad form field).
    #[error("{0}")]
    BadRequest(String),

    /// The document was accepted but could not be converted.
    #[error("Conversion failed: {0}")]
    Conversion(Failure),

    #[error("Conversion failed: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conversion(failure) => status_for(failure.kind),
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTTP status for a document that failed with `kind`.
pub fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::InvalidPageRange => StatusCode::BAD_REQUEST,
        FailureKind::UnreadableDocument | FailureKind::EncryptedDocument => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        FailureKind::ConversionEngineFailure | FailureKind::IoFailure => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("{}", self);
        }
        (status, self.to_string()).into_response()
    }
}
