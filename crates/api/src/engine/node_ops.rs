//! Tree writes that need more than one repository call.
//!
//! Each operation runs in a single transaction. Creations lock their parent
//! `FOR SHARE` before deriving closure rows from it; moves and deletes lock
//! the whole subtree `FOR UPDATE`. A child created concurrently with a move
//! therefore either moves along or waits and copies the new chain. Creations notify the
//! collaboration service only after commit.

use projectree_core::error::CoreError;
use projectree_core::naming::{node_identifier, validate_identifier_prefix};
use projectree_core::node::{
    ensure_child_allowed, validate_detail_fields, validate_name, NodeKind, Priority, TaskType,
    DIFFICULTY_MIN,
};
use projectree_core::types::{DbId, Position};
use projectree_db::models::candidate::{Candidate, CreateCandidate};
use projectree_db::models::node::{CreateNode, Node, NodeSchema, UpdateNodeDetail};
use projectree_db::models::workspace::{CreateWorkspace, EpicSeed, Workspace};
use projectree_db::repositories::{
    CandidateRepo, MemberRepo, NodeRepo, NodeTreeRepo, WorkspaceRepo,
};
use projectree_events::notify_best_effort;
use serde::Deserialize;
use sqlx::PgPool;

use crate::error::AppResult;
use crate::state::AppState;

/// Request body for creating a node under an existing parent.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateChildNode {
    pub parent_id: DbId,
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub note: Option<String>,
    pub priority: Option<Priority>,
    pub member_id: Option<DbId>,
    pub difficulty: Option<i32>,
    pub comparison: Option<String>,
    pub task_type: Option<TaskType>,
    pub position: Option<Position>,
}

/// Request body for a new workspace, optionally seeded with EPICs.
#[derive(Debug, Clone, Deserialize)]
pub struct NewWorkspace {
    #[serde(flatten)]
    pub workspace: CreateWorkspace,
    #[serde(default)]
    pub epics: Vec<EpicSeed>,
}

/// Create a workspace, its PROJECT root and the seeded EPICs under it.
///
/// Everything commits together; a bad epic name creates nothing.
pub async fn create_workspace(
    state: &AppState,
    owner_id: DbId,
    input: &NewWorkspace,
) -> AppResult<(Workspace, Node, Vec<Node>)> {
    validate_name(&input.workspace.name)?;
    validate_identifier_prefix(&input.workspace.identifier_prefix)?;
    for epic in &input.epics {
        validate_name(&epic.name)?;
    }

    let mut tx = state.pool.begin().await?;
    let workspace = WorkspaceRepo::create_in(&mut tx, Some(owner_id), &input.workspace).await?;

    let mut root = CreateNode::new(
        workspace.id,
        NodeKind::Project,
        &workspace.name,
        &workspace.identifier_prefix,
    );
    root.description = workspace.description.clone();
    let root = NodeTreeRepo::save_root_in(&mut tx, &root).await?;

    let mut epics = Vec::with_capacity(input.epics.len());
    for seed in &input.epics {
        let identifier = next_identifier(&mut tx, workspace.id).await?;
        let mut epic = CreateNode::new(workspace.id, NodeKind::Epic, &seed.name, identifier);
        epic.description = seed.description.clone();
        epics.push(NodeTreeRepo::save_with_parent_in(&mut tx, root.id, &epic).await?);
    }
    tx.commit().await?;

    tracing::info!(
        workspace_id = workspace.id,
        root_id = root.id,
        epics = epics.len(),
        owner_id,
        "Workspace created"
    );
    announce(state, &root, None).await;
    for epic in &epics {
        announce(state, epic, Some(root.id)).await;
    }
    Ok((workspace, root, epics))
}

/// Create a node of the requested kind under `input.parent_id`.
pub async fn create_child(state: &AppState, input: &CreateChildNode) -> AppResult<Node> {
    validate_name(&input.name)?;
    validate_detail_fields(
        input.kind,
        input.difficulty,
        input.comparison.as_deref(),
        input.task_type,
    )?;
    if let Some(member_id) = input.member_id {
        ensure_member(&state.pool, member_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let parent = lock_parent(&mut tx, input.parent_id).await?;
    ensure_child_allowed(parent.node_kind()?, input.kind)?;

    let identifier = next_identifier(&mut tx, parent.workspace_id).await?;
    let mut new_node = CreateNode::new(parent.workspace_id, input.kind, &input.name, identifier);
    new_node.member_id = input.member_id;
    new_node.description = input.description.clone();
    new_node.note = input.note.clone();
    new_node.priority = input.priority;
    new_node.position = input.position.unwrap_or_default();
    new_node.comparison = input.comparison.clone();
    new_node.task_type = input.task_type;
    new_node.difficulty = work_difficulty(input.kind, input.difficulty);

    let node = NodeTreeRepo::save_with_parent_in(&mut tx, parent.id, &new_node).await?;
    tx.commit().await?;

    tracing::info!(
        node_id = node.id,
        parent_id = parent.id,
        kind = %node.kind,
        identifier = %node.identifier,
        "Node created"
    );
    announce(state, &node, Some(parent.id)).await;
    Ok(node)
}

/// Apply a partial update after checking it against the node's kind.
pub async fn update_detail(
    pool: &PgPool,
    node_id: DbId,
    input: &UpdateNodeDetail,
) -> AppResult<Node> {
    let node = NodeRepo::find_by_id(pool, node_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: node_id,
        })?;
    if let Some(name) = &input.name {
        validate_name(name)?;
    }
    validate_detail_fields(
        node.node_kind()?,
        input.difficulty,
        input.comparison.as_deref(),
        input.task_type,
    )?;
    if let Some(member_id) = input.member_id {
        ensure_member(pool, member_id).await?;
    }

    let updated = NodeRepo::update_detail(pool, node_id, input)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: node_id,
        })?;
    tracing::debug!(node_id, "Node detail updated");
    Ok(updated)
}

/// Add candidates under `parent_id`, bounded by the parent kind's limit.
///
/// The parent row is locked exclusively so concurrent additions cannot both
/// pass the limit check.
pub async fn add_candidates(
    pool: &PgPool,
    parent_id: DbId,
    inputs: &[CreateCandidate],
) -> AppResult<Vec<Candidate>> {
    if inputs.is_empty() {
        return Err(CoreError::Validation("At least one candidate is required".into()).into());
    }
    for input in inputs {
        validate_name(&input.name)?;
    }

    let mut tx = pool.begin().await?;
    let parent = NodeRepo::lock_by_id(&mut tx, parent_id, true)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: parent_id,
        })?;
    let kind = parent.node_kind()?;
    let limit = kind.candidate_limit();
    let existing = CandidateRepo::count_by_parent_in(&mut tx, parent_id).await?;
    let existing = usize::try_from(existing).unwrap_or(usize::MAX);
    if existing.saturating_add(inputs.len()) > limit {
        return Err(CoreError::LimitExceeded {
            entity: "Candidate",
            message: format!(
                "{} nodes hold at most {limit} candidates ({existing} exist, {} requested)",
                kind.as_str(),
                inputs.len()
            ),
        }
        .into());
    }

    let created = CandidateRepo::create_many_in(&mut tx, parent_id, inputs).await?;
    tx.commit().await?;

    tracing::info!(parent_id, added = created.len(), "Candidates added");
    Ok(created)
}

/// Materialize a candidate as a child of `parent_id`.
///
/// The new node's kind is the parent's candidate child kind. The candidate
/// keeps a link to the node and becomes selected.
pub async fn accept_candidate(
    state: &AppState,
    parent_id: DbId,
    candidate_id: DbId,
) -> AppResult<Node> {
    let mut tx = state.pool.begin().await?;
    let parent = lock_parent(&mut tx, parent_id).await?;
    let parent_kind = parent.node_kind()?;
    let kind = parent_kind
        .candidate_child_kind()
        .ok_or_else(|| CoreError::Unsupported {
            entity: "Candidate",
            message: format!("{} nodes have no candidates", parent_kind.as_str()),
        })?;

    let Some(candidate) = CandidateRepo::lock_underived(&mut tx, parent_id, candidate_id).await?
    else {
        tx.rollback().await?;
        let err = match CandidateRepo::find_by_id(&state.pool, parent_id, candidate_id).await? {
            Some(_) => CoreError::Conflict(format!("Candidate {candidate_id} was already accepted")),
            None => CoreError::NotFound {
                entity: "Candidate",
                id: candidate_id,
            },
        };
        return Err(err.into());
    };
    validate_name(&candidate.name)?;

    let identifier = next_identifier(&mut tx, parent.workspace_id).await?;
    let mut new_node = CreateNode::new(parent.workspace_id, kind, &candidate.name, identifier);
    new_node.description = candidate.description.clone();
    new_node.difficulty = work_difficulty(kind, None);

    let node = NodeTreeRepo::save_with_parent_in(&mut tx, parent.id, &new_node).await?;
    CandidateRepo::set_derivation(&mut tx, candidate.id, node.id).await?;
    tx.commit().await?;

    tracing::info!(
        node_id = node.id,
        parent_id,
        candidate_id,
        "Candidate accepted"
    );
    announce(state, &node, Some(parent.id)).await;
    Ok(node)
}

/// Move the subtree rooted at `node_id` below `new_parent_id`.
pub async fn relocate(pool: &PgPool, node_id: DbId, new_parent_id: DbId) -> AppResult<Node> {
    let mut tx = pool.begin().await?;
    let node = NodeRepo::lock_by_id(&mut tx, node_id, true)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: node_id,
        })?;
    let kind = node.node_kind()?;
    if kind == NodeKind::Project {
        return Err(CoreError::Unsupported {
            entity: "Node",
            message: "The workspace root cannot be moved".into(),
        }
        .into());
    }
    NodeRepo::lock_subtree(&mut tx, node_id).await?;

    if NodeTreeRepo::is_ancestor(&mut tx, node_id, new_parent_id).await? {
        return Err(CoreError::Validation(format!(
            "Node {new_parent_id} is inside the subtree of node {node_id}"
        ))
        .into());
    }

    let parent = lock_parent(&mut tx, new_parent_id).await?;
    if parent.workspace_id != node.workspace_id {
        return Err(CoreError::Validation(format!(
            "Node {new_parent_id} belongs to another workspace"
        ))
        .into());
    }
    ensure_child_allowed(parent.node_kind()?, kind)?;

    let linked = NodeTreeRepo::move_subtree_in(&mut tx, node_id, new_parent_id).await?;
    tx.commit().await?;

    tracing::info!(node_id, new_parent_id, linked, "Subtree relocated");
    Ok(node)
}

/// Soft-delete `node_id` and its subtree. Returns how many nodes were marked.
///
/// A node that is already deleted or never existed yields `0`.
pub async fn delete_subtree(pool: &PgPool, node_id: DbId) -> AppResult<u64> {
    let mut tx = pool.begin().await?;
    let Some(node) = NodeRepo::lock_by_id(&mut tx, node_id, true).await? else {
        tx.rollback().await?;
        return Ok(0);
    };
    if node.node_kind()? == NodeKind::Project {
        return Err(CoreError::Unsupported {
            entity: "Node",
            message: "The workspace root cannot be deleted".into(),
        }
        .into());
    }
    NodeRepo::lock_subtree(&mut tx, node_id).await?;

    CandidateRepo::detach_subtree(&mut tx, node_id).await?;
    let deleted = NodeRepo::soft_delete_subtree(&mut tx, node_id).await?;
    tx.commit().await?;

    tracing::info!(node_id, deleted, "Subtree deleted");
    Ok(deleted)
}

async fn ensure_member(pool: &PgPool, member_id: DbId) -> AppResult<()> {
    MemberRepo::find_by_id(pool, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Member",
            id: member_id,
        })?;
    Ok(())
}

async fn lock_parent(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    parent_id: DbId,
) -> AppResult<Node> {
    let parent = NodeRepo::lock_by_id(tx, parent_id, false)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Node",
            id: parent_id,
        })?;
    Ok(parent)
}

/// `PREFIX-NNN` from the workspace's node counter.
async fn next_identifier(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    workspace_id: DbId,
) -> AppResult<String> {
    let prefix = WorkspaceRepo::find_prefix_in(tx, workspace_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Workspace",
            id: workspace_id,
        })?;
    let seq = WorkspaceRepo::next_node_seq(tx, workspace_id).await?;
    Ok(node_identifier(&prefix, seq))
}

/// Work items always store a difficulty; other kinds never do.
fn work_difficulty(kind: NodeKind, requested: Option<i32>) -> Option<i32> {
    kind.is_work_item()
        .then(|| requested.unwrap_or(DIFFICULTY_MIN))
}

/// Push a committed node to the collaboration service. Never fails.
async fn announce(state: &AppState, node: &Node, parent_id: Option<DbId>) {
    let schema = NodeSchema::from_node(node, parent_id);
    notify_best_effort(state.notifier.as_ref(), node.workspace_id, &schema).await;
}
