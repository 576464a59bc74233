//! Request handlers.
//!
//! Handlers parse the request, call a repository or an [`engine`](crate::engine)
//! operation, and wrap the result in the [`ApiResponse`](crate::response::ApiResponse)
//! envelope. Errors are mapped by [`AppError`](crate::error::AppError).

pub mod candidate;
pub mod node;
pub mod position;
pub mod workspace;
