//! Error types for the analysis core and the HTTP layer.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::envelope::Envelope;
use crate::store::StoreError;

/// Failures surfaced by the pure analysis functions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// A range whose end precedes its start, or a non-positive lookback window
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

pub type AnalysisResult<T> = std::result::Result<T, AnalysisError>;

/// Application error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Analysis(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            AppError::Auth(e @ (AuthError::Issue | AuthError::Hash)) => {
                tracing::error!(error = %e, "Credential processing failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
            AppError::Auth(e) => {
                tracing::warn!(error = %e, "Rejected credentials");
                (StatusCode::UNAUTHORIZED, e.to_string())
            }
            AppError::Store(e) => {
                tracing::error!(error = %e, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
            }
        };

        (status, Json(Envelope::<()>::failure(message))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, AppError>;
