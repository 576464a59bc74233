//! Closure-table store for the `node_tree` table.
//!
//! Every node has a self row `(n, n, 0)` and one row `(a, n, d)` for each
//! ancestor `a` at distance `d`. Paths are extended with a single
//! `INSERT ... SELECT` over the parent's ancestor rows, so attaching a node
//! costs O(depth of parent) regardless of tree size.
//!
//! Methods come in pairs: the plain form opens and commits its own
//! transaction; the `*_in` form joins a caller's transaction so node rows,
//! closure rows and any follow-up writes commit together.

use std::collections::HashMap;

use projectree_core::tree::{self, ParentLink, TreeNode};
use projectree_core::types::DbId;
use sqlx::PgPool;

use crate::models::node::{CreateNode, Node};
use crate::models::node_tree::NodePath;
use crate::repositories::node_repo::{self, NodeRepo};

/// Provides closure-table maintenance and subtree reads.
pub struct NodeTreeRepo;

impl NodeTreeRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Persist a workspace root node and its self path.
    ///
    /// The caller guarantees `input` is the workspace's PROJECT node; the
    /// `uq_nodes_workspace_root` index rejects a second live root.
    pub async fn save_root(pool: &PgPool, input: &CreateNode) -> Result<Node, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let node = Self::save_root_in(&mut tx, input).await?;
        tx.commit().await?;
        Ok(node)
    }

    /// [`save_root`](Self::save_root) within an existing transaction.
    pub async fn save_root_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        input: &CreateNode,
    ) -> Result<Node, sqlx::Error> {
        let node = NodeRepo::insert(tx, input).await?;
        Self::insert_self_path(tx, node.id).await?;
        tracing::debug!(node_id = node.id, workspace_id = node.workspace_id, "Saved root node");
        Ok(node)
    }

    /// Persist `input` as a child of `parent_id`.
    ///
    /// The parent's existence is NOT checked here: attaching to a missing
    /// parent silently produces an orphan with only a self path. Callers
    /// lock and validate the parent first.
    pub async fn save_with_parent(
        pool: &PgPool,
        parent_id: DbId,
        input: &CreateNode,
    ) -> Result<Node, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let node = Self::save_with_parent_in(&mut tx, parent_id, input).await?;
        tx.commit().await?;
        Ok(node)
    }

    /// [`save_with_parent`](Self::save_with_parent) within an existing transaction.
    pub async fn save_with_parent_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: DbId,
        input: &CreateNode,
    ) -> Result<Node, sqlx::Error> {
        let node = NodeRepo::insert(tx, input).await?;
        let derived = Self::add_path(tx, parent_id, node.id).await?;
        tracing::debug!(
            node_id = node.id,
            parent_id,
            ancestor_rows = derived,
            "Saved node under parent"
        );
        Ok(node)
    }

    /// Write the closure rows for `child_id` under `parent_id`:
    ///
    /// 1. the self path `(child, child, 0)`;
    /// 2. `(a, child, d + 1)` for every existing `(a, parent, d)`.
    ///
    /// Returns the number of derived (non-self) rows, which equals the
    /// parent's depth + 1 when the parent exists and 0 when it does not.
    pub async fn add_path(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        parent_id: DbId,
        child_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        Self::insert_self_path(tx, child_id).await?;

        let result = sqlx::query(
            "INSERT INTO node_tree (ancestor_id, descendant_id, depth)
             SELECT ancestor_id, $2, depth + 1
             FROM node_tree
             WHERE descendant_id = $1",
        )
        .bind(parent_id)
        .bind(child_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected())
    }

    /// Re-link the subtree rooted at `node_id` below `new_parent_id`.
    ///
    /// Rows linking subtree members to ancestors outside the subtree are
    /// removed, then every ancestor `a` of the new parent (at depth `da`)
    /// is linked to every subtree member `s` (at depth `ds` below `node_id`)
    /// with depth `da + ds + 1`. Rows inside the subtree are untouched.
    ///
    /// The caller must reject moves into the node's own subtree; see
    /// [`is_ancestor`](Self::is_ancestor). Returns the number of rows inserted.
    pub async fn move_subtree_in(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        node_id: DbId,
        new_parent_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let removed = sqlx::query(
            "DELETE FROM node_tree
             WHERE descendant_id IN (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)
               AND ancestor_id NOT IN (SELECT descendant_id FROM node_tree WHERE ancestor_id = $1)",
        )
        .bind(node_id)
        .execute(&mut **tx)
        .await?;

        let inserted = sqlx::query(
            "INSERT INTO node_tree (ancestor_id, descendant_id, depth)
             SELECT above.ancestor_id, below.descendant_id, above.depth + below.depth + 1
             FROM node_tree above
             CROSS JOIN node_tree below
             WHERE above.descendant_id = $2
               AND below.ancestor_id = $1",
        )
        .bind(node_id)
        .bind(new_parent_id)
        .execute(&mut **tx)
        .await?;

        tracing::debug!(
            node_id,
            new_parent_id,
            removed = removed.rows_affected(),
            inserted = inserted.rows_affected(),
            "Moved subtree"
        );
        Ok(inserted.rows_affected())
    }

    async fn insert_self_path(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        node_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO node_tree (ancestor_id, descendant_id, depth) VALUES ($1, $1, 0)")
            .bind(node_id)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// The PROJECT node at the top of `descendant_id`'s ancestor chain.
    ///
    /// Picks the PROJECT ancestor with the largest depth. A root asked about
    /// itself returns itself.
    pub async fn find_root(pool: &PgPool, descendant_id: DbId) -> Result<Option<Node>, sqlx::Error> {
        let columns = prefixed_columns("n");
        let query = format!(
            "SELECT {columns}
             FROM node_tree nt
             JOIN nodes n ON n.id = nt.ancestor_id
             WHERE nt.descendant_id = $1
               AND n.kind = 'PROJECT'
               AND n.deleted_at IS NULL
             ORDER BY nt.depth DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, Node>(&query)
            .bind(descendant_id)
            .fetch_optional(pool)
            .await
    }

    /// Every closure row whose descendant is `node_id`, nearest ancestor first.
    pub async fn find_ancestor_paths(
        pool: &PgPool,
        node_id: DbId,
    ) -> Result<Vec<NodePath>, sqlx::Error> {
        sqlx::query_as::<_, NodePath>(
            "SELECT ancestor_id, descendant_id, depth
             FROM node_tree
             WHERE descendant_id = $1
             ORDER BY depth",
        )
        .bind(node_id)
        .fetch_all(pool)
        .await
    }

    /// Every closure row whose ancestor is `node_id` (its whole subtree).
    pub async fn find_subtree_paths(
        pool: &PgPool,
        node_id: DbId,
    ) -> Result<Vec<NodePath>, sqlx::Error> {
        sqlx::query_as::<_, NodePath>(
            "SELECT ancestor_id, descendant_id, depth
             FROM node_tree
             WHERE ancestor_id = $1
             ORDER BY depth, descendant_id",
        )
        .bind(node_id)
        .fetch_all(pool)
        .await
    }

    /// Direct parent of `node_id`, if it has one.
    pub async fn find_parent_id(pool: &PgPool, node_id: DbId) -> Result<Option<DbId>, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "SELECT ancestor_id FROM node_tree WHERE descendant_id = $1 AND depth = 1",
        )
        .bind(node_id)
        .fetch_optional(pool)
        .await
    }

    /// Whether `ancestor_id` is `descendant_id` or one of its ancestors.
    pub async fn is_ancestor(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        ancestor_id: DbId,
        descendant_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM node_tree WHERE ancestor_id = $1 AND descendant_id = $2
             )",
        )
        .bind(ancestor_id)
        .bind(descendant_id)
        .fetch_one(&mut **tx)
        .await
    }

    // -----------------------------------------------------------------------
    // Subtree reconstruction
    // -----------------------------------------------------------------------

    /// Load the live subtree rooted at `root_id` as a nested tree.
    ///
    /// Runs three reads in one REPEATABLE READ snapshot:
    ///
    /// 1. the subtree's descendant ids (closure rows with `ancestor = root`);
    /// 2. the depth-1 rows among those descendants (parent links), in node
    ///    creation order;
    /// 3. the live node rows for those ids.
    ///
    /// Returns `None` when the root does not exist or is soft-deleted.
    /// Soft-deleted nodes are dropped together with their branch.
    pub async fn load_subtree(
        pool: &PgPool,
        root_id: DbId,
    ) -> Result<Option<TreeNode<Node>>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let descendant_ids: Vec<DbId> = sqlx::query_scalar(
            "SELECT descendant_id FROM node_tree WHERE ancestor_id = $1",
        )
        .bind(root_id)
        .fetch_all(&mut *tx)
        .await?;

        if descendant_ids.is_empty() {
            tx.commit().await?;
            return Ok(None);
        }

        let links: Vec<ParentLink> = sqlx::query_as::<_, (DbId, DbId)>(
            "SELECT ancestor_id, descendant_id
             FROM node_tree
             WHERE depth = 1
               AND descendant_id = ANY($1)
               AND descendant_id <> $2
             ORDER BY descendant_id",
        )
        .bind(&descendant_ids)
        .bind(root_id)
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .map(|(parent_id, child_id)| ParentLink {
            parent_id,
            child_id,
        })
        .collect();

        let node_query = format!(
            "SELECT {} FROM nodes WHERE id = ANY($1) AND deleted_at IS NULL",
            node_repo::COLUMNS
        );
        let nodes: HashMap<DbId, Node> = sqlx::query_as::<_, Node>(&node_query)
            .bind(&descendant_ids)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|n| (n.id, n))
            .collect();

        tx.commit().await?;

        tracing::debug!(
            root_id,
            descendants = descendant_ids.len(),
            live = nodes.len(),
            "Loaded subtree rows"
        );

        Ok(tree::assemble(root_id, &links, nodes).ok())
    }

    /// Load the full tree of a workspace, starting at its live PROJECT root.
    pub async fn load_workspace_tree(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Option<TreeNode<Node>>, sqlx::Error> {
        let root_id = sqlx::query_scalar::<_, DbId>(
            "SELECT id FROM nodes
             WHERE workspace_id = $1 AND kind = 'PROJECT' AND deleted_at IS NULL",
        )
        .bind(workspace_id)
        .fetch_optional(pool)
        .await?;

        match root_id {
            Some(id) => Self::load_subtree(pool, id).await,
            None => Ok(None),
        }
    }
}

/// [`node_repo::COLUMNS`] qualified with a table alias.
fn prefixed_columns(alias: &str) -> String {
    node_repo::COLUMNS
        .split(',')
        .map(|c| format!("{alias}.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
