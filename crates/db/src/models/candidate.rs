//! Candidate entity model and DTOs.
//!
//! A candidate is a proposed child of a node. Accepting it materializes a
//! real node and records that node in `derivation_node_id`.

use projectree_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `candidates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Candidate {
    pub id: DbId,
    pub parent_id: DbId,
    pub derivation_node_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub is_selected: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for one entry of a bulk candidate insert.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCandidate {
    pub name: String,
    pub description: Option<String>,
    pub summary: Option<String>,
}
