//! Repository for the `nodes` table.
//!
//! Inserting a node is only half of creating one: the closure rows are
//! written by [`NodeTreeRepo`](super::NodeTreeRepo), which calls
//! [`NodeRepo::insert`] inside its own transaction.

use projectree_core::types::{DbId, Position};
use sqlx::PgPool;

use crate::models::node::{CreateNode, Node, UpdateNodeDetail};

/// Column list shared across queries to avoid repetition.
pub(crate) const COLUMNS: &str = "id, workspace_id, member_id, kind, name, description, note, \
    status, priority, identifier, x_pos, y_pos, difficulty, comparison, task_type, \
    deleted_at, created_at, updated_at";

/// Provides queries over individual node rows.
pub struct NodeRepo;

impl NodeRepo {
    /// Insert a node row within an existing transaction. Writes no closure rows.
    pub async fn insert(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateNode,
    ) -> Result<Node, sqlx::Error> {
        let query = format!(
            "INSERT INTO nodes (workspace_id, member_id, kind, name, description, note, \
                 status, priority, identifier, x_pos, y_pos, difficulty, comparison, task_type)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(input.workspace_id)
            .bind(input.member_id)
            .bind(input.kind.as_str())
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.note)
            .bind(input.status.as_str())
            .bind(input.priority.map(|p| p.as_str()))
            .bind(&input.identifier)
            .bind(input.position.x)
            .bind(input.position.y)
            .bind(input.difficulty)
            .bind(&input.comparison)
            .bind(input.task_type.map(|t| t.as_str()))
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a live node by id. Excludes soft-deleted rows.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Node>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM nodes WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a live node and hold a row lock on it until the transaction ends.
    ///
    /// `exclusive = false` takes `FOR SHARE`, which is enough to keep the
    /// parent alive while children are attached concurrently. Relocation
    /// takes `FOR UPDATE`.
    pub async fn lock_by_id(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        exclusive: bool,
    ) -> Result<Option<Node>, sqlx::Error> {
        let mode = if exclusive { "FOR UPDATE" } else { "FOR SHARE" };
        let query =
            format!("SELECT {COLUMNS} FROM nodes WHERE id = $1 AND deleted_at IS NULL {mode}");
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
    }

    /// Lock every live node in the subtree of `root_id` with `FOR UPDATE`.
    ///
    /// Creations under any of these nodes take `FOR SHARE` on their parent,
    /// so they wait until a move or delete of the subtree has committed and
    /// then derive their closure rows from the new chain. Returns the locked
    /// ids in ascending order.
    pub async fn lock_subtree(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        root_id: DbId,
    ) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT id FROM nodes
             WHERE id IN (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)
               AND deleted_at IS NULL
             ORDER BY id
             FOR UPDATE",
        )
        .bind(root_id)
        .fetch_all(&mut **tx)
        .await
    }

    /// All live nodes of a workspace, in ascending id order.
    pub async fn list_by_workspace(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Vec<Node>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM nodes
             WHERE workspace_id = $1 AND deleted_at IS NULL
             ORDER BY id"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(workspace_id)
            .fetch_all(pool)
            .await
    }

    /// Overwrite the canvas position of one live node in `workspace_id`.
    ///
    /// Returns `false` when no such node exists (never created, deleted, or
    /// belonging to another workspace).
    pub async fn update_position(
        pool: &PgPool,
        workspace_id: DbId,
        id: DbId,
        position: Position,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE nodes SET x_pos = $3, y_pos = $4
             WHERE id = $1 AND workspace_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(workspace_id)
        .bind(position.x)
        .bind(position.y)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Apply the non-`None` fields of `input`.
    ///
    /// Returns `None` if no live node with `id` exists. Kind compatibility of
    /// `difficulty` / `task_type` is checked by the caller and enforced again
    /// by the table's CHECK constraints.
    pub async fn update_detail(
        pool: &PgPool,
        id: DbId,
        input: &UpdateNodeDetail,
    ) -> Result<Option<Node>, sqlx::Error> {
        let query = format!(
            "UPDATE nodes SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                note = COALESCE($4, note),
                status = COALESCE($5, status),
                priority = COALESCE($6, priority),
                member_id = COALESCE($7, member_id),
                difficulty = COALESCE($8, difficulty),
                comparison = COALESCE($9, comparison),
                task_type = COALESCE($10, task_type)
             WHERE id = $1 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.note)
            .bind(input.status.map(|s| s.as_str()))
            .bind(input.priority.map(|p| p.as_str()))
            .bind(input.member_id)
            .bind(input.difficulty)
            .bind(&input.comparison)
            .bind(input.task_type.map(|t| t.as_str()))
            .fetch_optional(pool)
            .await
    }

    /// Soft-delete `id` and every live descendant, found through the closure
    /// table. Returns the number of nodes marked deleted.
    pub async fn soft_delete_subtree(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE nodes SET deleted_at = NOW()
             WHERE deleted_at IS NULL
               AND id IN (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)",
        )
        .bind(id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }
}
