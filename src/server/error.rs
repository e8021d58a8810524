//! server::error
//!
//! Request-level errors and their HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use crate::auth::AuthError;
use crate::engine::SubmitError;
use crate::forge::ForgeError;
use crate::store::StoreError;
use crate::validation::ValidationReport;

/// Body returned when a required form field is missing.
pub const MALFORMED_REQUEST: &str = "Malformed POST request";

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required field is missing or unusable.
    #[error("{0}")]
    Malformed(String),

    /// The request is well formed but cannot be honoured.
    #[error("{0}")]
    BadRequest(String),

    /// The submitted document failed validation with an error.
    #[error("{}", .0.summary)]
    Invalid(ValidationReport),

    /// An update that would not change the file.
    #[error("{0}")]
    Unchanged(String),

    /// A submission step failed on the forge.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// Reading from the forge failed while rendering a page.
    #[error(transparent)]
    Forge(#[from] ForgeError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// The standard response for a missing form field.
    pub fn malformed() -> Self {
        AppError::Malformed(MALFORMED_REQUEST.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Malformed(_) | AppError::BadRequest(_) | AppError::Invalid(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Unchanged(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Submit(_) => StatusCode::BAD_REQUEST,
            AppError::Forge(e) if e.is_not_found() => StatusCode::NOT_FOUND,
            AppError::Forge(_) | AppError::Auth(_) => StatusCode::BAD_GATEWAY,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::warn!(error = %self, status = status.as_u16(), "request rejected");
        }

        match self {
            AppError::Invalid(report) => (status, Json(report)).into_response(),
            other => (status, other.to_string()).into_response(),
        }
    }
}
