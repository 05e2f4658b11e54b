//! Error taxonomy shared by every route handler
//!
//! Handlers return `Result<_, AppError>`; the `IntoResponse` impl picks the
//! status code and renders a JSON body of the form
//! `{"message": ..., "error": ...}` where `error` carries upstream detail.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::database::StoreError;
use crate::uploader::UploadError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid input, including out-of-range indices
    #[error("{0}")]
    Validation(String),

    /// No profile for the given email, or no list entry matched
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Missing or malformed credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Credentials present but rejected
    #[error("{0}")]
    Forbidden(String),

    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    #[error("Media upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// The most common lookup failure across routes
    pub fn user_not_found() -> Self {
        Self::NotFound("User not found".to_string())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Store(_) | Self::Upload(_) | Self::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Store(e) => {
                error!("Document store failure: {}", e);
                json!({ "message": "Error accessing the document store", "error": e.to_string() })
            }
            Self::Upload(e) => {
                error!("Media upload failure: {}", e);
                json!({ "message": "Error uploading media", "error": e.to_string() })
            }
            Self::Token(e) => {
                error!("Token signing failure: {}", e);
                json!({ "message": "Error issuing token", "error": e.to_string() })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
