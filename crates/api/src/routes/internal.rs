//! Routes called by the collaboration service rather than browsers.

use axum::routing::patch;
use axum::Router;

use crate::handlers::position;
use crate::state::AppState;

/// Routes mounted at `/internal`.
///
/// ```text
/// PATCH /workspaces/{workspace_id}/nodes/positions  -> update_positions
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/workspaces/{workspace_id}/nodes/positions",
        patch(position::update_positions),
    )
}
