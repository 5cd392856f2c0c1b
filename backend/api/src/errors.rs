//! Application-wide error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use club_ledger::LedgerError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain failures from the ledger/aggregator/policy core.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Row-store I/O failure, opaque to the core.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Outbound HTTP failure (LINE profile lookup and the like).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Uniform error body: `{ "success": false, "error": "..." }`.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl ApiError {
    /// Boundary translation of the domain taxonomy.
    ///
    /// Authentication and authorization stay distinct (401 vs 403) so a
    /// client can prompt a re-login versus show a permission message.
    fn status(&self) -> StatusCode {
        match self {
            Self::Ledger(e) => match e {
                LedgerError::Validation(_) => StatusCode::BAD_REQUEST,
                LedgerError::Authentication(_) => StatusCode::UNAUTHORIZED,
                LedgerError::Authorization(_) => StatusCode::FORBIDDEN,
                LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InvalidTransition { .. } | LedgerError::Conflict(_) => {
                    StatusCode::CONFLICT
                }
                LedgerError::Schema(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Persistence(_) | Self::Http(_) | Self::Json(_) | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
