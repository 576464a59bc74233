//! Repository for the `candidates` table.

use projectree_core::types::DbId;
use sqlx::PgPool;

use crate::models::candidate::{Candidate, CreateCandidate};

const COLUMNS: &str = "id, parent_id, derivation_node_id, name, description, summary, \
    is_selected, created_at, updated_at";

/// Provides queries over candidate children.
pub struct CandidateRepo;

impl CandidateRepo {
    /// Insert several candidates under `parent_id` inside the caller's
    /// transaction.
    pub async fn create_many_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: DbId,
        inputs: &[CreateCandidate],
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        let query = format!(
            "INSERT INTO candidates (parent_id, name, description, summary)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );

        let mut created = Vec::with_capacity(inputs.len());
        for input in inputs {
            let candidate = sqlx::query_as::<_, Candidate>(&query)
                .bind(parent_id)
                .bind(&input.name)
                .bind(&input.description)
                .bind(&input.summary)
                .fetch_one(&mut **tx)
                .await?;
            created.push(candidate);
        }
        Ok(created)
    }

    /// Live candidates under `parent_id`, oldest first.
    pub async fn list_by_parent(
        pool: &PgPool,
        parent_id: DbId,
    ) -> Result<Vec<Candidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM candidates
             WHERE parent_id = $1 AND deleted_at IS NULL
             ORDER BY id"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(parent_id)
            .fetch_all(pool)
            .await
    }

    /// Live candidate count, read inside the caller's transaction.
    pub async fn count_by_parent_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM candidates WHERE parent_id = $1 AND deleted_at IS NULL",
        )
        .bind(parent_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Find a live candidate by id, scoped to its parent node.
    pub async fn find_by_id(
        pool: &PgPool,
        parent_id: DbId,
        id: DbId,
    ) -> Result<Option<Candidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM candidates
             WHERE id = $1 AND parent_id = $2 AND deleted_at IS NULL"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(pool)
            .await
    }

    /// Lock a live, not yet derived candidate for acceptance.
    ///
    /// Returns `None` if it does not exist, is deleted, or was already
    /// accepted by a concurrent request.
    pub async fn lock_underived(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: DbId,
        id: DbId,
    ) -> Result<Option<Candidate>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM candidates
             WHERE id = $1 AND parent_id = $2
               AND deleted_at IS NULL AND derivation_node_id IS NULL
             FOR UPDATE"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(parent_id)
            .fetch_optional(&mut **tx)
            .await
    }

    pub async fn set_selected(
        pool: &PgPool,
        parent_id: DbId,
        id: DbId,
        is_selected: bool,
    ) -> Result<Option<Candidate>, sqlx::Error> {
        let query = format!(
            "UPDATE candidates SET is_selected = $3
             WHERE id = $1 AND parent_id = $2 AND deleted_at IS NULL
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Candidate>(&query)
            .bind(id)
            .bind(parent_id)
            .bind(is_selected)
            .fetch_optional(pool)
            .await
    }

    /// Record the node materialized from a candidate.
    pub async fn set_derivation(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: DbId,
        node_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE candidates SET derivation_node_id = $2, is_selected = TRUE WHERE id = $1")
            .bind(id)
            .bind(node_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Soft-delete a candidate. Returns `true` if a row was marked deleted.
    pub async fn soft_delete(pool: &PgPool, parent_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE candidates SET deleted_at = NOW()
             WHERE id = $1 AND parent_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(parent_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clean up candidates around a deleted subtree rooted at `node_id`:
    /// candidates under any subtree node are soft-deleted, and candidates
    /// elsewhere that were derived into a subtree node lose that link.
    pub async fn detach_subtree(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        node_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE candidates SET deleted_at = NOW()
             WHERE deleted_at IS NULL
               AND parent_id IN (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)",
        )
        .bind(node_id)
        .execute(&mut **tx)
        .await?;

        sqlx::query(
            "UPDATE candidates SET derivation_node_id = NULL, is_selected = FALSE
             WHERE derivation_node_id IN
                 (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)",
        )
        .bind(node_id)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
