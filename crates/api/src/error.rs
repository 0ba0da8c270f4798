//! Error-to-response mapping for API handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use ironbank_core::ledger::LedgerError;
use ironbank_db::repositories::{LedgerOpError, UserRepoError};
use ironbank_shared::AppError;

/// Wrapper turning an `AppError` into an HTTP response.
///
/// Handlers return `Result<_, ApiError>`; every typed error below the API
/// boundary converts into this, so no business error ever escapes as a
/// panic or a bare 500.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Store-level detail stays in the logs, not in the response body.
        let message = match &self.0 {
            AppError::Database(detail) | AppError::Internal(detail) => {
                error!(detail = %detail, "Internal error while handling request");
                "An internal error occurred".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        Self(err.into())
    }
}

impl From<LedgerOpError> for ApiError {
    fn from(err: LedgerOpError) -> Self {
        Self(err.into())
    }
}

impl From<UserRepoError> for ApiError {
    fn from(err: UserRepoError) -> Self {
        Self(err.into())
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self(AppError::Database(err.to_string()))
    }
}
