//! Integration tests for closure-table maintenance.
//!
//! Covers self paths, ancestor propagation on attach, root lookup,
//! concurrent attaches under one parent, subtree relocation and
//! subtree soft delete.

use std::time::Duration;

use assert_matches::assert_matches;
use projectree_core::node::NodeKind;
use projectree_core::types::DbId;
use projectree_db::models::node::{CreateNode, Node};
use projectree_db::models::node_tree::NodePath;
use projectree_db::models::workspace::CreateWorkspace;
use projectree_db::repositories::{NodeRepo, NodeTreeRepo, WorkspaceRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_root(pool: &PgPool) -> Node {
    let mut tx = pool.begin().await.unwrap();
    let workspace = WorkspaceRepo::create_in(
        &mut tx,
        None,
        &CreateWorkspace {
            name: "Closure".to_string(),
            description: None,
            identifier_prefix: "PJT".to_string(),
        },
    )
    .await
    .unwrap();
    let root = NodeTreeRepo::save_root_in(
        &mut tx,
        &CreateNode::new(workspace.id, NodeKind::Project, "R", "PJT"),
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    root
}

async fn child(pool: &PgPool, parent: &Node, kind: NodeKind, name: &str) -> Node {
    let input = CreateNode::new(parent.workspace_id, kind, name, format!("PJT-{name}"));
    NodeTreeRepo::save_with_parent(pool, parent.id, &input)
        .await
        .unwrap()
}

async fn all_paths(pool: &PgPool) -> Vec<(DbId, DbId, i32)> {
    sqlx::query_as(
        "SELECT ancestor_id, descendant_id, depth FROM node_tree
         ORDER BY ancestor_id, descendant_id",
    )
    .fetch_all(pool)
    .await
    .unwrap()
}

async fn paths_to(pool: &PgPool, id: DbId) -> Vec<(DbId, i32)> {
    NodeTreeRepo::find_ancestor_paths(pool, id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| (p.ancestor_id, p.depth))
        .collect()
}

// ---------------------------------------------------------------------------
// Self path and propagation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_save_root_writes_exactly_one_self_path(pool: PgPool) {
    let root = seed_root(&pool).await;

    let paths = NodeTreeRepo::find_ancestor_paths(&pool, root.id).await.unwrap();
    assert_eq!(
        paths,
        vec![NodePath {
            ancestor_id: root.id,
            descendant_id: root.id,
            depth: 0,
        }]
    );
    assert!(paths[0].is_self_path());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_every_created_node_has_one_self_path(pool: PgPool) {
    let root = seed_root(&pool).await;
    let e = child(&pool, &root, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;

    for id in [root.id, e.id, s.id] {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM node_tree WHERE ancestor_id = $1 AND descendant_id = $1",
        )
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 1, "node {id} must have exactly one self path");
    }
}

/// R -> E -> S produces exactly the six expected rows.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_chain_produces_exact_closure(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;

    let mut expected = vec![
        (r.id, r.id, 0),
        (e.id, e.id, 0),
        (s.id, s.id, 0),
        (r.id, e.id, 1),
        (e.id, s.id, 1),
        (r.id, s.id, 2),
    ];
    expected.sort();

    assert_eq!(all_paths(&pool).await, expected);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_path_copies_parent_chain_plus_one(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;
    let before = all_paths(&pool).await;

    let t = child(&pool, &s, NodeKind::Task, "T").await;

    // Each (A, S, d) now has a matching (A, T, d + 1).
    for (ancestor, depth) in paths_to(&pool, s.id).await {
        assert!(paths_to(&pool, t.id).await.contains(&(ancestor, depth + 1)));
    }
    // Nothing else changed: only T's self path plus one row per S ancestor.
    let after = all_paths(&pool).await;
    assert_eq!(after.len(), before.len() + 1 + 3);
    assert!(before.iter().all(|row| after.contains(row)));
    assert_eq!(paths_to(&pool, t.id).await, vec![(t.id, 0), (s.id, 1), (e.id, 2), (r.id, 3)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_siblings_do_not_cross_link(pool: PgPool) {
    let r = seed_root(&pool).await;
    let a = child(&pool, &r, NodeKind::Epic, "A").await;
    let b = child(&pool, &r, NodeKind::Epic, "B").await;

    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM node_tree
         WHERE (ancestor_id = $1 AND descendant_id = $2)
            OR (ancestor_id = $2 AND descendant_id = $1)",
    )
    .bind(a.id)
    .bind(b.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
    assert_eq!(all_paths(&pool).await.len(), 5);
}

/// The store does not validate parents: a missing parent yields a node
/// with only its self path.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_add_path_with_missing_parent_derives_nothing(pool: PgPool) {
    let r = seed_root(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let orphan = NodeRepo::insert(
        &mut tx,
        &CreateNode::new(r.workspace_id, NodeKind::Epic, "Orphan", "PJT-X"),
    )
    .await
    .unwrap();
    let derived = NodeTreeRepo::add_path(&mut tx, 999_999, orphan.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(derived, 0);
    assert_eq!(paths_to(&pool, orphan.id).await, vec![(orphan.id, 0)]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_failed_transaction_leaves_no_rows(pool: PgPool) {
    let r = seed_root(&pool).await;

    let mut tx = pool.begin().await.unwrap();
    let e = NodeTreeRepo::save_with_parent_in(
        &mut tx,
        r.id,
        &CreateNode::new(r.workspace_id, NodeKind::Epic, "E", "PJT-001"),
    )
    .await
    .unwrap();
    tx.rollback().await.unwrap();

    assert!(NodeRepo::find_by_id(&pool, e.id).await.unwrap().is_none());
    assert!(paths_to(&pool, e.id).await.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_live_root_is_rejected(pool: PgPool) {
    let r = seed_root(&pool).await;

    let err = NodeTreeRepo::save_root(
        &pool,
        &CreateNode::new(r.workspace_id, NodeKind::Project, "R2", "PJT"),
    )
    .await
    .unwrap_err();

    assert_matches!(
        err,
        sqlx::Error::Database(ref db) if db.constraint() == Some("uq_nodes_workspace_root")
    );
}

// ---------------------------------------------------------------------------
// Root lookup
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_root_returns_project_at_top_of_chain(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;

    let found = NodeTreeRepo::find_root(&pool, s.id).await.unwrap().unwrap();
    assert_eq!(found.id, r.id);
    assert_eq!(found.kind, "PROJECT");

    let own = NodeTreeRepo::find_root(&pool, r.id).await.unwrap().unwrap();
    assert_eq!(own.id, r.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_root_unknown_node_is_none(pool: PgPool) {
    assert!(NodeTreeRepo::find_root(&pool, 424_242).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_find_parent_id(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;

    assert_eq!(NodeTreeRepo::find_parent_id(&pool, e.id).await.unwrap(), Some(r.id));
    assert_eq!(NodeTreeRepo::find_parent_id(&pool, r.id).await.unwrap(), None);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_children_under_one_parent(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;

    let inserts = (0..8).map(|i| {
        let pool = pool.clone();
        let input = CreateNode::new(e.workspace_id, NodeKind::Story, format!("S{i}"), format!("S{i}"));
        let parent_id = e.id;
        async move { NodeTreeRepo::save_with_parent(&pool, parent_id, &input).await }
    });
    let created: Vec<Node> = futures::future::join_all(inserts)
        .await
        .into_iter()
        .collect::<Result<_, _>>()
        .unwrap();

    for story in &created {
        assert_eq!(
            paths_to(&pool, story.id).await,
            vec![(story.id, 0), (e.id, 1), (r.id, 2)]
        );
    }
    let subtree = NodeTreeRepo::find_subtree_paths(&pool, e.id).await.unwrap();
    assert_eq!(subtree.len(), 1 + 8);
}

// ---------------------------------------------------------------------------
// Relocation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_move_subtree_relinks_every_member(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e1 = child(&pool, &r, NodeKind::Epic, "E1").await;
    let e2 = child(&pool, &r, NodeKind::Epic, "E2").await;
    let s = child(&pool, &e1, NodeKind::Story, "S").await;
    let t = child(&pool, &s, NodeKind::Task, "T").await;

    let mut tx = pool.begin().await.unwrap();
    let inserted = NodeTreeRepo::move_subtree_in(&mut tx, s.id, e2.id).await.unwrap();
    tx.commit().await.unwrap();

    // (E2, S), (R, S), (E2, T), (R, T)
    assert_eq!(inserted, 4);
    assert_eq!(paths_to(&pool, s.id).await, vec![(s.id, 0), (e2.id, 1), (r.id, 2)]);
    assert_eq!(
        paths_to(&pool, t.id).await,
        vec![(t.id, 0), (s.id, 1), (e2.id, 2), (r.id, 3)]
    );
    // E1 keeps only its own rows.
    let e1_subtree = NodeTreeRepo::find_subtree_paths(&pool, e1.id).await.unwrap();
    assert_eq!(e1_subtree.len(), 1);
}

/// Attach under `parent_id` the way node creation does: share-lock the
/// parent, then derive the closure rows. `None` when the parent is gone.
async fn attach_locked(
    pool: PgPool,
    parent_id: DbId,
    input: CreateNode,
) -> Result<Option<Node>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    if NodeRepo::lock_by_id(&mut tx, parent_id, false).await?.is_none() {
        tx.rollback().await?;
        return Ok(None);
    }
    let node = NodeTreeRepo::save_with_parent_in(&mut tx, parent_id, &input).await?;
    tx.commit().await?;
    Ok(Some(node))
}

/// A child attached below a subtree that is being moved waits for the move
/// and copies the new ancestor chain.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_child_attached_during_move_follows_the_subtree(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e1 = child(&pool, &r, NodeKind::Epic, "E1").await;
    let e2 = child(&pool, &r, NodeKind::Epic, "E2").await;
    let s = child(&pool, &e1, NodeKind::Story, "S").await;
    let t = child(&pool, &s, NodeKind::Task, "T").await;

    let mut mover = pool.begin().await.unwrap();
    NodeRepo::lock_by_id(&mut mover, s.id, true).await.unwrap().unwrap();
    NodeRepo::lock_subtree(&mut mover, s.id).await.unwrap();
    NodeTreeRepo::move_subtree_in(&mut mover, s.id, e2.id).await.unwrap();

    let input = CreateNode::new(t.workspace_id, NodeKind::Subtask, "A", "PJT-A");
    let attach = tokio::spawn(attach_locked(pool.clone(), t.id, input));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!attach.is_finished(), "attach must wait for the move to commit");

    mover.commit().await.unwrap();
    let a = attach.await.unwrap().unwrap().unwrap();

    assert_eq!(
        paths_to(&pool, a.id).await,
        vec![(a.id, 0), (t.id, 1), (s.id, 2), (e2.id, 3), (r.id, 4)]
    );
    let e2_subtree = NodeTreeRepo::find_subtree_paths(&pool, e2.id).await.unwrap();
    assert_eq!(e2_subtree.len(), 4, "E2, S, T and A");
    let e1_subtree = NodeTreeRepo::find_subtree_paths(&pool, e1.id).await.unwrap();
    assert_eq!(e1_subtree.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lock_subtree_returns_live_members(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;
    let other = child(&pool, &r, NodeKind::Epic, "O").await;

    let mut tx = pool.begin().await.unwrap();
    let locked = NodeRepo::lock_subtree(&mut tx, e.id).await.unwrap();
    tx.rollback().await.unwrap();

    assert_eq!(locked, vec![e.id, s.id]);
    assert!(!locked.contains(&other.id));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_is_ancestor(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;

    let mut tx = pool.begin().await.unwrap();
    assert!(NodeTreeRepo::is_ancestor(&mut tx, r.id, s.id).await.unwrap());
    assert!(NodeTreeRepo::is_ancestor(&mut tx, s.id, s.id).await.unwrap());
    assert!(!NodeTreeRepo::is_ancestor(&mut tx, s.id, e.id).await.unwrap());
    tx.rollback().await.unwrap();
}

// ---------------------------------------------------------------------------
// Soft delete
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_soft_delete_subtree_hides_descendants_only(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e1 = child(&pool, &r, NodeKind::Epic, "E1").await;
    let e2 = child(&pool, &r, NodeKind::Epic, "E2").await;
    let s = child(&pool, &e1, NodeKind::Story, "S").await;

    let mut tx = pool.begin().await.unwrap();
    let deleted = NodeRepo::soft_delete_subtree(&mut tx, e1.id).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(deleted, 2);
    assert!(NodeRepo::find_by_id(&pool, e1.id).await.unwrap().is_none());
    assert!(NodeRepo::find_by_id(&pool, s.id).await.unwrap().is_none());
    assert!(NodeRepo::find_by_id(&pool, e2.id).await.unwrap().is_some());

    // Second delete is a no-op.
    let mut tx = pool.begin().await.unwrap();
    assert_eq!(NodeRepo::soft_delete_subtree(&mut tx, e1.id).await.unwrap(), 0);
    tx.commit().await.unwrap();
}

/// An attach that waited on a deleted parent finds it gone.
#[sqlx::test(migrations = "../../db/migrations")]
async fn test_attach_waiting_on_deleted_subtree_finds_no_parent(pool: PgPool) {
    let r = seed_root(&pool).await;
    let e = child(&pool, &r, NodeKind::Epic, "E").await;
    let s = child(&pool, &e, NodeKind::Story, "S").await;

    let mut deleter = pool.begin().await.unwrap();
    NodeRepo::lock_subtree(&mut deleter, e.id).await.unwrap();
    NodeRepo::soft_delete_subtree(&mut deleter, e.id).await.unwrap();

    let input = CreateNode::new(s.workspace_id, NodeKind::Task, "T", "PJT-T");
    let attach = tokio::spawn(attach_locked(pool.clone(), s.id, input));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!attach.is_finished());

    deleter.commit().await.unwrap();
    assert!(attach.await.unwrap().unwrap().is_none());
    assert_eq!(NodeTreeRepo::find_subtree_paths(&pool, s.id).await.unwrap().len(), 1);
}
