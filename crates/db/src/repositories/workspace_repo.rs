//! Repository for the `workspaces` table.

use projectree_core::types::DbId;
use sqlx::PgPool;

use crate::models::workspace::{CreateWorkspace, Workspace};

const COLUMNS: &str =
    "id, owner_id, name, description, identifier_prefix, created_at, updated_at";

pub struct WorkspaceRepo;

impl WorkspaceRepo {
    /// Insert a workspace within an existing transaction so its root node
    /// can be created atomically alongside it.
    pub async fn create_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        owner_id: Option<DbId>,
        input: &CreateWorkspace,
    ) -> Result<Workspace, sqlx::Error> {
        let query = format!(
            "INSERT INTO workspaces (owner_id, name, description, identifier_prefix)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(owner_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(&input.identifier_prefix)
            .fetch_one(&mut **tx)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Workspace>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM workspaces WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Identifier prefix of a workspace, read inside a transaction.
    pub async fn find_prefix_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT identifier_prefix FROM workspaces WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// Hand out the next node identifier sequence number for `id`.
    ///
    /// The counter row stays locked until the surrounding transaction ends,
    /// so concurrent creators in one workspace never share a number.
    pub async fn next_node_seq(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE workspaces SET node_seq = node_seq + 1
             WHERE id = $1
             RETURNING node_seq",
        )
        .bind(id)
        .fetch_one(&mut **tx)
        .await
    }
}
