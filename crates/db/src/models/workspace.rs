//! Workspace entity model and DTOs.

use projectree_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `workspaces` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workspace {
    pub id: DbId,
    pub owner_id: Option<DbId>,
    pub name: String,
    pub description: Option<String>,
    pub identifier_prefix: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a workspace. The owner comes from the authenticated member.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub description: Option<String>,
    pub identifier_prefix: String,
}

/// An EPIC created under the root together with its workspace.
#[derive(Debug, Clone, Deserialize)]
pub struct EpicSeed {
    pub name: String,
    pub description: Option<String>,
}
