//! Route definitions for the `/workspaces` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::workspace;
use crate::state::AppState;

/// Routes mounted at `/workspaces`.
///
/// ```text
/// POST /                  -> create
/// GET  /{id}/tree         -> tree
/// GET  /{id}/statistics   -> statistics
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(workspace::create))
        .route("/{id}/tree", get(workspace::tree))
        .route("/{id}/statistics", get(workspace::statistics))
}
