//! Handler for bulk canvas position updates.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use projectree_core::types::DbId;

use crate::engine::positions::PositionItem;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::response::{ApiResponse, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PositionBatch {
    pub nodes: Vec<PositionItem>,
}

/// Acknowledgement of a queued batch. Carries no per-item outcome.
#[derive(Debug, Serialize)]
pub struct PositionsQueued {
    pub workspace_id: DbId,
    pub queued: usize,
}

/// PATCH /api/v1/internal/workspaces/{workspace_id}/nodes/positions
///
/// Responds as soon as the batch is queued. Items are applied in the
/// background; failures are logged and never reach the caller.
pub async fn update_positions(
    State(state): State<AppState>,
    Path(workspace_id): Path<DbId>,
    Json(batch): Json<PositionBatch>,
) -> AppResult<Envelope<PositionsQueued>> {
    let queued = batch.nodes.len();
    let _ = state.positions.submit(workspace_id, batch.nodes)?;
    Ok(ApiResponse::accepted(PositionsQueued {
        workspace_id,
        queued,
    }))
}
