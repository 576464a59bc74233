//! Success envelope shared by every API handler.
//!
//! Successful responses look like
//!
//! ```text
//! { "success": true, "code": 200, "message": "OK", "data": ... }
//! ```
//!
//! where `code` repeats the HTTP status. Failures use the shape produced by
//! [`AppError`](crate::error::AppError).

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub code: u16,
    pub message: String,
    pub data: T,
}

/// What a handler returns on success: the status plus the JSON envelope.
pub type Envelope<T> = (StatusCode, Json<ApiResponse<T>>);

impl<T: Serialize> ApiResponse<T> {
    pub fn with_status(status: StatusCode, data: T) -> Envelope<T> {
        let body = ApiResponse {
            success: true,
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or("OK").to_string(),
            data,
        };
        (status, Json(body))
    }

    pub fn ok(data: T) -> Envelope<T> {
        Self::with_status(StatusCode::OK, data)
    }

    pub fn created(data: T) -> Envelope<T> {
        Self::with_status(StatusCode::CREATED, data)
    }

    /// Work was queued, not performed.
    pub fn accepted(data: T) -> Envelope<T> {
        Self::with_status(StatusCode::ACCEPTED, data)
    }
}
