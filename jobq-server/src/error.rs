use axum::{http::StatusCode, response::IntoResponse, Json};
use jobq_store::{JobStoreError, JobValidationError};
use serde_json::json;
use thiserror::Error;

/// Body text for every rejected submission, whichever field was at fault.
pub const MISSING_FIELDS_MESSAGE: &str = "Missing required fields";
/// Body text for every store-side failure. Causes stay in the server log.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error: {0}")]
    Validation(#[from] JobValidationError),
    #[error("job store error: {0}")]
    Store(#[from] JobStoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message. Deliberately independent of the wrapped error.
    pub fn public_message(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => MISSING_FIELDS_MESSAGE,
            ApiError::Store(_) => INTERNAL_ERROR_MESSAGE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let payload = json!({ "error": self.public_message() });
        (self.status(), Json(payload)).into_response()
    }
}
