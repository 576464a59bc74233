//! Node kinds and the rules attached to them.
//!
//! Every node is stored as one row with a `kind` discriminant plus the
//! optional kind-specific columns (`difficulty`, `comparison`, `task_type`).
//! The behaviour that differs per kind is expressed as a `match` over
//! [`NodeKind`] instead of a type hierarchy.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Maximum length of a node name, in characters.
pub const NAME_MAX_LEN: usize = 30;

/// Inclusive difficulty range for work items.
pub const DIFFICULTY_MIN: i32 = 1;
pub const DIFFICULTY_MAX: i32 = 5;

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

pub const KIND_PROJECT: &str = "PROJECT";
pub const KIND_EPIC: &str = "EPIC";
pub const KIND_STORY: &str = "STORY";
pub const KIND_TASK: &str = "TASK";
pub const KIND_ADVANCE: &str = "ADVANCE";
pub const KIND_SUBTASK: &str = "SUBTASK";

pub const VALID_KINDS: &[&str] = &[
    KIND_PROJECT,
    KIND_EPIC,
    KIND_STORY,
    KIND_TASK,
    KIND_ADVANCE,
    KIND_SUBTASK,
];

/// Discriminant of a node row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Project,
    Epic,
    Story,
    Task,
    Advance,
    Subtask,
}

impl NodeKind {
    /// Convert from a database string value.
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            KIND_PROJECT => Ok(Self::Project),
            KIND_EPIC => Ok(Self::Epic),
            KIND_STORY => Ok(Self::Story),
            KIND_TASK => Ok(Self::Task),
            KIND_ADVANCE => Ok(Self::Advance),
            KIND_SUBTASK => Ok(Self::Subtask),
            _ => Err(CoreError::Validation(format!(
                "Invalid node kind '{s}'. Must be one of: {}",
                VALID_KINDS.join(", ")
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Project => KIND_PROJECT,
            Self::Epic => KIND_EPIC,
            Self::Story => KIND_STORY,
            Self::Task => KIND_TASK,
            Self::Advance => KIND_ADVANCE,
            Self::Subtask => KIND_SUBTASK,
        }
    }

    /// The node's own type tag.
    pub fn node_type(self) -> Self {
        self
    }

    /// How many candidate children a node of this kind may hold.
    pub fn candidate_limit(self) -> usize {
        match self {
            Self::Epic | Self::Story => 6,
            Self::Task => 3,
            Self::Project | Self::Advance | Self::Subtask => 0,
        }
    }

    /// Kinds that may be attached directly below this kind.
    pub fn allowed_children(self) -> &'static [NodeKind] {
        match self {
            Self::Project => &[Self::Epic],
            Self::Epic => &[Self::Story],
            Self::Story => &[Self::Task],
            Self::Task => &[Self::Advance, Self::Subtask],
            Self::Advance | Self::Subtask => &[],
        }
    }

    pub fn accepts_child(self, child: NodeKind) -> bool {
        self.allowed_children().contains(&child)
    }

    /// The kind a candidate under this kind becomes when accepted.
    pub fn candidate_child_kind(self) -> Option<NodeKind> {
        match self {
            Self::Epic => Some(Self::Story),
            Self::Story => Some(Self::Task),
            Self::Task => Some(Self::Advance),
            Self::Project | Self::Advance | Self::Subtask => None,
        }
    }

    /// Work items carry a difficulty and an optional comparison note.
    pub fn is_work_item(self) -> bool {
        matches!(self, Self::Task | Self::Advance | Self::Subtask)
    }
}

/// Reject a child kind that may not sit under `parent`.
pub fn ensure_child_allowed(parent: NodeKind, child: NodeKind) -> Result<(), CoreError> {
    if parent.accepts_child(child) {
        Ok(())
    } else {
        Err(CoreError::Unsupported {
            entity: "Node",
            message: format!(
                "{} cannot be placed under {}",
                child.as_str(),
                parent.as_str()
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Status / priority / task type
// ---------------------------------------------------------------------------

pub const STATUS_TODO: &str = "TODO";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_DONE: &str = "DONE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl NodeStatus {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            STATUS_TODO => Ok(Self::Todo),
            STATUS_IN_PROGRESS => Ok(Self::InProgress),
            STATUS_DONE => Ok(Self::Done),
            _ => Err(CoreError::Validation(format!("Invalid node status '{s}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => STATUS_TODO,
            Self::InProgress => STATUS_IN_PROGRESS,
            Self::Done => STATUS_DONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
}

impl Priority {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "P0" => Ok(Self::P0),
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            _ => Err(CoreError::Validation(format!("Invalid priority '{s}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::P0 => "P0",
            Self::P1 => "P1",
            Self::P2 => "P2",
        }
    }
}

/// Frontend or backend work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "FE")]
    Frontend,
    #[serde(rename = "BE")]
    Backend,
}

impl TaskType {
    pub fn from_str_value(s: &str) -> Result<Self, CoreError> {
        match s {
            "FE" => Ok(Self::Frontend),
            "BE" => Ok(Self::Backend),
            _ => Err(CoreError::Validation(format!("Invalid task type '{s}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "FE",
            Self::Backend => "BE",
        }
    }
}

// ---------------------------------------------------------------------------
// Kind-specific payload
// ---------------------------------------------------------------------------

/// Kind-specific attributes of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum NodeDetail {
    /// PROJECT, EPIC and STORY carry nothing beyond the common columns.
    Structural,
    Task {
        difficulty: i32,
        comparison: Option<String>,
        task_type: Option<TaskType>,
    },
    /// ADVANCE and SUBTASK.
    Work {
        difficulty: i32,
        comparison: Option<String>,
    },
}

impl NodeDetail {
    /// Assemble the payload for `kind` from the nullable kind-specific columns.
    ///
    /// Work items with no stored difficulty default to [`DIFFICULTY_MIN`].
    pub fn from_parts(
        kind: NodeKind,
        difficulty: Option<i32>,
        comparison: Option<String>,
        task_type: Option<TaskType>,
    ) -> Self {
        let difficulty = difficulty.unwrap_or(DIFFICULTY_MIN);
        match kind {
            NodeKind::Task => Self::Task {
                difficulty,
                comparison,
                task_type,
            },
            NodeKind::Advance | NodeKind::Subtask => Self::Work {
                difficulty,
                comparison,
            },
            NodeKind::Project | NodeKind::Epic | NodeKind::Story => Self::Structural,
        }
    }

    pub fn difficulty(&self) -> Option<i32> {
        match self {
            Self::Task { difficulty, .. } | Self::Work { difficulty, .. } => Some(*difficulty),
            Self::Structural => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Names must be non-blank and at most [`NAME_MAX_LEN`] characters.
pub fn validate_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation("Node name must not be empty".into()));
    }
    let len = name.chars().count();
    if len > NAME_MAX_LEN {
        return Err(CoreError::Validation(format!(
            "Node name must be at most {NAME_MAX_LEN} characters (got {len})"
        )));
    }
    Ok(())
}

pub fn validate_difficulty(difficulty: i32) -> Result<(), CoreError> {
    if (DIFFICULTY_MIN..=DIFFICULTY_MAX).contains(&difficulty) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Difficulty must be between {DIFFICULTY_MIN} and {DIFFICULTY_MAX} (got {difficulty})"
        )))
    }
}

/// Kind-specific fields may only be set on kinds that carry them.
pub fn validate_detail_fields(
    kind: NodeKind,
    difficulty: Option<i32>,
    comparison: Option<&str>,
    task_type: Option<TaskType>,
) -> Result<(), CoreError> {
    if difficulty.is_some() && !kind.is_work_item() {
        return Err(CoreError::Unsupported {
            entity: "Node",
            message: format!("{} nodes have no difficulty", kind.as_str()),
        });
    }
    if comparison.is_some() && !kind.is_work_item() {
        return Err(CoreError::Unsupported {
            entity: "Node",
            message: format!("{} nodes have no comparison", kind.as_str()),
        });
    }
    if task_type.is_some() && kind != NodeKind::Task {
        return Err(CoreError::Unsupported {
            entity: "Node",
            message: format!("{} nodes have no task type", kind.as_str()),
        });
    }
    if let Some(d) = difficulty {
        validate_difficulty(d)?;
    }
    Ok(())
}
