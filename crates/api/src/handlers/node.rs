//! Handlers for the `/nodes` resource.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use projectree_core::error::CoreError;
use projectree_core::node::NodeDetail;
use projectree_core::tree::TreeNode;
use projectree_core::types::DbId;
use projectree_db::models::candidate::Candidate;
use projectree_db::models::node::{Node, UpdateNodeDetail};
use projectree_db::repositories::{CandidateRepo, NodeRepo, NodeTreeRepo};

use crate::engine::node_ops::{self, CreateChildNode};
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::response::{ApiResponse, Envelope};
use crate::state::AppState;

/// A node with its kind-specific detail, parent and live candidates.
#[derive(Debug, Serialize)]
pub struct NodeView {
    #[serde(flatten)]
    pub node: Node,
    pub detail: NodeDetail,
    pub parent_id: Option<DbId>,
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct RelocateNode {
    pub parent_id: DbId,
}

#[derive(Debug, Serialize)]
pub struct DeletedNodes {
    pub deleted: u64,
}

fn not_found(id: DbId) -> CoreError {
    CoreError::NotFound { entity: "Node", id }
}

/// POST /api/v1/nodes
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateChildNode>,
) -> AppResult<Envelope<Node>> {
    let node = node_ops::create_child(&state, &input).await?;
    Ok(ApiResponse::created(node))
}

/// GET /api/v1/nodes/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<NodeView>> {
    let node = NodeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    let detail = node.detail()?;
    let parent_id = NodeTreeRepo::find_parent_id(&state.pool, id).await?;
    let candidates = CandidateRepo::list_by_parent(&state.pool, id).await?;

    Ok(ApiResponse::ok(NodeView {
        node,
        detail,
        parent_id,
        candidates,
    }))
}

/// PATCH /api/v1/nodes/{id}/detail
pub async fn update_detail(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateNodeDetail>,
) -> AppResult<Envelope<Node>> {
    let node = node_ops::update_detail(&state.pool, id, &input).await?;
    Ok(ApiResponse::ok(node))
}

/// DELETE /api/v1/nodes/{id}
///
/// Repeating the call is harmless and reports `deleted: 0`.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<DeletedNodes>> {
    let deleted = node_ops::delete_subtree(&state.pool, id).await?;
    Ok(ApiResponse::ok(DeletedNodes { deleted }))
}

/// PUT /api/v1/nodes/{id}/parent
pub async fn relocate(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<RelocateNode>,
) -> AppResult<Envelope<Node>> {
    let node = node_ops::relocate(&state.pool, id, input.parent_id).await?;
    Ok(ApiResponse::ok(node))
}

/// GET /api/v1/nodes/{id}/root
pub async fn root(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<Node>> {
    let root = NodeTreeRepo::find_root(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    Ok(ApiResponse::ok(root))
}

/// GET /api/v1/nodes/{id}/tree
pub async fn subtree(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<TreeNode<Node>>> {
    let tree = NodeTreeRepo::load_subtree(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    Ok(ApiResponse::ok(tree))
}
