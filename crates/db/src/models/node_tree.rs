//! Closure-table row model.

use projectree_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// One `(ancestor, descendant, depth)` row of `node_tree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize)]
pub struct NodePath {
    pub ancestor_id: DbId,
    pub descendant_id: DbId,
    pub depth: i32,
}

impl NodePath {
    pub fn is_self_path(&self) -> bool {
        self.depth == 0
    }
}
