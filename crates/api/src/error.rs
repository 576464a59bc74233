use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use projectree_core::codes::{Domain, ErrorCode, ErrorKind};
use projectree_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Every variant renders the failure envelope:
///
/// ```text
/// { "success": false, "code": 20001, "error": "NOT_FOUND", "message": "..." }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A malformed request the domain never saw (bad JSON body or path segment).
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, message) = match &self {
            AppError::Core(core) => {
                if let CoreError::Internal(msg) = core {
                    tracing::error!(error = %msg, "Internal core error");
                    (core.code(), INTERNAL_MESSAGE.to_string())
                } else {
                    (core.code(), core.to_string())
                }
            }
            AppError::Database(err) => classify_sqlx_error(err),
            AppError::BadRequest(msg) => (
                ErrorCode::new(Domain::Common, ErrorKind::Invalid),
                msg.clone(),
            ),
            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    ErrorCode::new(Domain::Common, ErrorKind::Internal),
                    INTERNAL_MESSAGE.to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "code": code.value(),
            "error": code.kind.as_str(),
            "message": message,
        });

        (status_for(code.kind), axum::Json(body)).into_response()
    }
}

/// HTTP status reported alongside a numeric code.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Invalid | ErrorKind::NotSupported | ErrorKind::LimitExceeded => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Classify a sqlx error into a code and message.
///
/// - `RowNotFound` maps to not found.
/// - Unique violations on a `uq_` constraint map to conflict.
/// - Foreign key violations map to not found (the referenced row is gone).
/// - Check violations map to invalid.
/// - Everything else is internal with a sanitized message.
fn classify_sqlx_error(err: &sqlx::Error) -> (ErrorCode, String) {
    match err {
        sqlx::Error::RowNotFound => (
            ErrorCode::new(Domain::Common, ErrorKind::NotFound),
            "Resource not found".to_string(),
        ),
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or("unknown");
            match db_err.code().as_deref() {
                Some("23505") if constraint.starts_with("uq_") => {
                    return (
                        ErrorCode::new(Domain::Common, ErrorKind::Conflict),
                        format!("Duplicate value violates unique constraint: {constraint}"),
                    );
                }
                Some("23503") => {
                    return (
                        ErrorCode::new(Domain::Common, ErrorKind::NotFound),
                        format!("Referenced row does not exist: {constraint}"),
                    );
                }
                Some("23514") => {
                    return (
                        ErrorCode::new(Domain::Common, ErrorKind::Invalid),
                        format!("Value violates check constraint: {constraint}"),
                    );
                }
                _ => {}
            }
            tracing::error!(error = %db_err, "Database error");
            (
                ErrorCode::new(Domain::Common, ErrorKind::Internal),
                INTERNAL_MESSAGE.to_string(),
            )
        }
        other => {
            tracing::error!(error = %other, "Database error");
            (
                ErrorCode::new(Domain::Common, ErrorKind::Internal),
                INTERNAL_MESSAGE.to_string(),
            )
        }
    }
}
