//! Node entity model, DTOs and the outbound wire schema.

use projectree_core::error::CoreError;
use projectree_core::node::{NodeDetail, NodeKind, NodeStatus, Priority, TaskType};
use projectree_core::types::{DbId, Position, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `nodes` table.
///
/// Enumerated columns are stored as TEXT; use the typed accessors
/// ([`Node::node_kind`], [`Node::detail`], ...) to read them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Node {
    pub id: DbId,
    pub workspace_id: DbId,
    pub member_id: Option<DbId>,
    pub kind: String,
    pub name: String,
    pub description: Option<String>,
    pub note: Option<String>,
    pub status: String,
    pub priority: Option<String>,
    pub identifier: String,
    pub x_pos: f64,
    pub y_pos: f64,
    pub difficulty: Option<i32>,
    pub comparison: Option<String>,
    pub task_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Node {
    pub fn node_kind(&self) -> Result<NodeKind, CoreError> {
        NodeKind::from_str_value(&self.kind).map_err(corrupt_column)
    }

    pub fn node_status(&self) -> Result<NodeStatus, CoreError> {
        NodeStatus::from_str_value(&self.status).map_err(corrupt_column)
    }

    pub fn node_priority(&self) -> Result<Option<Priority>, CoreError> {
        self.priority
            .as_deref()
            .map(Priority::from_str_value)
            .transpose()
            .map_err(corrupt_column)
    }

    pub fn node_task_type(&self) -> Result<Option<TaskType>, CoreError> {
        self.task_type
            .as_deref()
            .map(TaskType::from_str_value)
            .transpose()
            .map_err(corrupt_column)
    }

    /// Kind-specific payload assembled from the nullable columns.
    pub fn detail(&self) -> Result<NodeDetail, CoreError> {
        Ok(NodeDetail::from_parts(
            self.node_kind()?,
            self.difficulty,
            self.comparison.clone(),
            self.node_task_type()?,
        ))
    }

    pub fn position(&self) -> Position {
        Position::new(self.x_pos, self.y_pos)
    }
}

/// A stored value outside its CHECK constraint means the row was written
/// by something other than this service.
fn corrupt_column(err: CoreError) -> CoreError {
    CoreError::Internal(format!("Corrupt node column: {err}"))
}

/// DTO for inserting a node of any kind.
#[derive(Debug, Clone)]
pub struct CreateNode {
    pub workspace_id: DbId,
    pub member_id: Option<DbId>,
    pub kind: NodeKind,
    pub name: String,
    pub description: Option<String>,
    pub note: Option<String>,
    pub status: NodeStatus,
    pub priority: Option<Priority>,
    pub identifier: String,
    pub position: Position,
    pub difficulty: Option<i32>,
    pub comparison: Option<String>,
    pub task_type: Option<TaskType>,
}

impl CreateNode {
    /// A node of `kind` with only the required columns set.
    pub fn new(
        workspace_id: DbId,
        kind: NodeKind,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id,
            member_id: None,
            kind,
            name: name.into(),
            description: None,
            note: None,
            status: NodeStatus::Todo,
            priority: None,
            identifier: identifier.into(),
            position: Position::default(),
            difficulty: None,
            comparison: None,
            task_type: None,
        }
    }
}

/// DTO for a partial update of a node's editable fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNodeDetail {
    pub name: Option<String>,
    pub description: Option<String>,
    pub note: Option<String>,
    pub status: Option<NodeStatus>,
    pub priority: Option<Priority>,
    pub member_id: Option<DbId>,
    pub difficulty: Option<i32>,
    pub comparison: Option<String>,
    pub task_type: Option<TaskType>,
}

// ---------------------------------------------------------------------------
// Wire schema for the collaboration service
// ---------------------------------------------------------------------------

/// Flat node representation pushed to the collaboration service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    pub id: DbId,
    pub name: String,
    pub node_type: String,
    pub position: SchemaPosition,
    pub parent_id: Option<DbId>,
    pub data: NodeSchemaData,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SchemaPosition {
    pub xpos: f64,
    pub ypos: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchemaData {
    pub priority: Option<String>,
    pub identifier: String,
    pub task_type: Option<String>,
    pub status: String,
    /// Work-item difficulty; `0` for structural kinds.
    #[serde(rename = "difficult")]
    pub difficulty: i32,
}

impl NodeSchema {
    pub fn from_node(node: &Node, parent_id: Option<DbId>) -> Self {
        Self {
            id: node.id,
            name: node.name.clone(),
            node_type: node.kind.clone(),
            position: SchemaPosition {
                xpos: node.x_pos,
                ypos: node.y_pos,
            },
            parent_id,
            data: NodeSchemaData {
                priority: node.priority.clone(),
                identifier: node.identifier.clone(),
                task_type: node.task_type.clone(),
                status: node.status.clone(),
                difficulty: node.difficulty.unwrap_or(0),
            },
        }
    }
}
