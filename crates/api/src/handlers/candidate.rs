//! Handlers for candidates nested under `/nodes/{node_id}/candidates`.

use axum::extract::State;
use serde::Deserialize;

use projectree_core::error::CoreError;
use projectree_core::types::DbId;
use projectree_db::models::candidate::{Candidate, CreateCandidate};
use projectree_db::models::node::Node;
use projectree_db::repositories::{CandidateRepo, NodeRepo};

use crate::engine::node_ops;
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, Envelope};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCandidates {
    pub candidates: Vec<CreateCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct SelectCandidate {
    pub is_selected: bool,
}

fn candidate_not_found(id: DbId) -> CoreError {
    CoreError::NotFound {
        entity: "Candidate",
        id,
    }
}

/// GET /api/v1/nodes/{node_id}/candidates
pub async fn list(
    State(state): State<AppState>,
    Path(node_id): Path<DbId>,
) -> AppResult<Envelope<Vec<Candidate>>> {
    NodeRepo::find_by_id(&state.pool, node_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: node_id,
        })?;
    let candidates = CandidateRepo::list_by_parent(&state.pool, node_id).await?;
    Ok(ApiResponse::ok(candidates))
}

/// POST /api/v1/nodes/{node_id}/candidates
pub async fn create(
    State(state): State<AppState>,
    Path(node_id): Path<DbId>,
    Json(input): Json<CreateCandidates>,
) -> AppResult<Envelope<Vec<Candidate>>> {
    let created = node_ops::add_candidates(&state.pool, node_id, &input.candidates).await?;
    Ok(ApiResponse::created(created))
}

/// PUT /api/v1/nodes/{node_id}/candidates/{id}/selection
pub async fn select(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((node_id, id)): Path<(DbId, DbId)>,
    Json(input): Json<SelectCandidate>,
) -> AppResult<Envelope<Candidate>> {
    let candidate = CandidateRepo::set_selected(&state.pool, node_id, id, input.is_selected)
        .await?
        .ok_or(candidate_not_found(id))?;
    tracing::debug!(
        candidate_id = id,
        member_id = auth.member_id,
        is_selected = input.is_selected,
        "Candidate selection changed"
    );
    Ok(ApiResponse::ok(candidate))
}

/// POST /api/v1/nodes/{node_id}/candidates/{id}
///
/// Turns the candidate into a real child node.
pub async fn accept(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((node_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Envelope<Node>> {
    let node = node_ops::accept_candidate(&state, node_id, id).await?;
    tracing::debug!(candidate_id = id, member_id = auth.member_id, "Accepted by member");
    Ok(ApiResponse::created(node))
}

/// DELETE /api/v1/nodes/{node_id}/candidates/{id}
pub async fn delete(
    State(state): State<AppState>,
    Path((node_id, id)): Path<(DbId, DbId)>,
) -> AppResult<Envelope<()>> {
    if CandidateRepo::soft_delete(&state.pool, node_id, id).await? {
        Ok(ApiResponse::ok(()))
    } else {
        Err(candidate_not_found(id).into())
    }
}
