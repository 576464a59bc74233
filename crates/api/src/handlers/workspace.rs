//! Handlers for the `/workspaces` resource.

use axum::extract::State;
use serde::Serialize;

use projectree_core::error::CoreError;
use projectree_core::progress::ProgressInfo;
use projectree_core::tree::TreeNode;
use projectree_core::types::DbId;
use projectree_db::models::node::Node;
use projectree_db::models::workspace::Workspace;
use projectree_db::repositories::{NodeRepo, NodeTreeRepo, WorkspaceRepo};

use crate::engine::node_ops::{self, NewWorkspace};
use crate::error::AppResult;
use crate::extract::{Json, Path};
use crate::middleware::auth::AuthUser;
use crate::response::{ApiResponse, Envelope};
use crate::state::AppState;

/// A new workspace, its PROJECT root and any seeded EPICs.
#[derive(Debug, Serialize)]
pub struct WorkspaceCreated {
    pub workspace: Workspace,
    pub root: Node,
    pub epics: Vec<Node>,
}

/// POST /api/v1/workspaces
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<NewWorkspace>,
) -> AppResult<Envelope<WorkspaceCreated>> {
    let (workspace, root, epics) =
        node_ops::create_workspace(&state, auth.member_id, &input).await?;
    Ok(ApiResponse::created(WorkspaceCreated {
        workspace,
        root,
        epics,
    }))
}

/// GET /api/v1/workspaces/{id}/tree
pub async fn tree(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<TreeNode<Node>>> {
    ensure_workspace(&state, id).await?;
    let tree = NodeTreeRepo::load_workspace_tree(&state.pool, id)
        .await?
        .ok_or_else(|| CoreError::Internal(format!("Workspace {id} has no live root")))?;
    Ok(ApiResponse::ok(tree))
}

/// GET /api/v1/workspaces/{id}/statistics
///
/// Completion counts per priority over the workspace's live nodes.
pub async fn statistics(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Envelope<ProgressInfo>> {
    ensure_workspace(&state, id).await?;
    let nodes = NodeRepo::list_by_workspace(&state.pool, id).await?;
    let pairs = nodes
        .iter()
        .map(|n| Ok((n.node_priority()?, n.node_status()?)))
        .collect::<Result<Vec<_>, CoreError>>()?;
    Ok(ApiResponse::ok(ProgressInfo::tally(pairs)))
}

async fn ensure_workspace(state: &AppState, id: DbId) -> AppResult<Workspace> {
    let workspace = WorkspaceRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Workspace",
            id,
        })?;
    Ok(workspace)
}
