//! Repository for the `members` table.
//!
//! Members are managed elsewhere; this service only creates them for
//! seeding and checks that referenced members exist.

use projectree_core::types::DbId;
use sqlx::PgPool;

use crate::models::member::{CreateMember, Member};

const COLUMNS: &str = "id, email, name, created_at, updated_at";

pub struct MemberRepo;

impl MemberRepo {
    pub async fn create(pool: &PgPool, input: &CreateMember) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members (email, name) VALUES ($1, $2) RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(&input.email)
            .bind(&input.name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE id = $1 AND deleted_at IS NULL");
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}
