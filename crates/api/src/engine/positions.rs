//! Fire-and-forget position batches from the collaborative canvas.
//!
//! [`PositionBatchUpdater::submit`] validates the batch size, spawns the
//! batch on a [`TaskTracker`], and returns immediately. Inside a batch,
//! items are applied one at a time in request order, each against the
//! [`PositionStore`] on its own. A failed item (unknown or deleted node,
//! non-finite coordinates, database error) is logged and recorded in the
//! [`BatchReport`]; the remaining items still run.
//!
//! A shared semaphore bounds how many item updates run at once across all
//! batches. Batches are never cancelled; [`PositionBatchUpdater::shutdown`]
//! waits for the ones in flight.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use projectree_core::error::CoreError;
use projectree_core::types::{DbId, Position};
use projectree_db::repositories::NodeRepo;
use serde::Deserialize;
use sqlx::PgPool;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Default number of item updates allowed in flight across all batches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Default cap on items in one request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1_000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionConfig {
    pub max_concurrency: usize,
    pub max_batch_size: usize,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl PositionConfig {
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `POSITION_MAX_CONCURRENCY` | `8`     |
    /// | `POSITION_MAX_BATCH_SIZE`  | `1000`  |
    ///
    /// Zero or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let read = |name: &str, default: usize| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };
        Self {
            max_concurrency: read("POSITION_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY),
            max_batch_size: read("POSITION_MAX_BATCH_SIZE", DEFAULT_MAX_BATCH_SIZE),
        }
    }
}

// ---------------------------------------------------------------------------
// Items and reports
// ---------------------------------------------------------------------------

/// One `{ "nodeId": 1, "position": { "x": 0.0, "y": 0.0 } }` entry.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionItem {
    pub node_id: DbId,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemFailureReason {
    /// No live node with this id in the batch's workspace.
    NodeNotFound,
    InvalidPosition,
    Store(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position of the item in the submitted batch.
    pub index: usize,
    pub node_id: DbId,
    pub reason: ItemFailureReason,
}

/// Outcome of one batch, available to whoever holds the batch's handle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub workspace_id: DbId,
    /// Node ids updated, in application order.
    pub succeeded: Vec<DbId>,
    pub failed: Vec<ItemFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Where positions are written. Returns `Ok(false)` when the node is not a
/// live node of `workspace_id`.
#[async_trait]
pub trait PositionStore: Send + Sync + 'static {
    async fn update_position(
        &self,
        workspace_id: DbId,
        node_id: DbId,
        position: Position,
    ) -> Result<bool, sqlx::Error>;
}

pub struct PgPositionStore {
    pool: PgPool,
}

impl PgPositionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PositionStore for PgPositionStore {
    async fn update_position(
        &self,
        workspace_id: DbId,
        node_id: DbId,
        position: Position,
    ) -> Result<bool, sqlx::Error> {
        NodeRepo::update_position(&self.pool, workspace_id, node_id, position).await
    }
}

// ---------------------------------------------------------------------------
// PositionBatchUpdater
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PositionBatchUpdater {
    store: Arc<dyn PositionStore>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    max_batch_size: usize,
}

impl PositionBatchUpdater {
    pub fn new(store: Arc<dyn PositionStore>, config: PositionConfig) -> Self {
        Self {
            store,
            permits: Arc::new(Semaphore::new(config.max_concurrency.max(1))),
            tracker: TaskTracker::new(),
            max_batch_size: config.max_batch_size,
        }
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Batches spawned and not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Queue a batch and return at once.
    ///
    /// Fails only when the batch exceeds the configured size, in which case
    /// nothing is queued. The returned handle resolves to the batch report;
    /// request handlers drop it.
    pub fn submit(
        &self,
        workspace_id: DbId,
        items: Vec<PositionItem>,
    ) -> Result<JoinHandle<BatchReport>, CoreError> {
        if items.len() > self.max_batch_size {
            return Err(CoreError::Validation(format!(
                "Position batch has {} items; at most {} are accepted",
                items.len(),
                self.max_batch_size
            )));
        }

        let store = Arc::clone(&self.store);
        let permits = Arc::clone(&self.permits);
        tracing::debug!(workspace_id, items = items.len(), "Position batch accepted");
        Ok(self
            .tracker
            .spawn(apply_batch(store, permits, workspace_id, items)))
    }

    /// Close the tracker and wait for in-flight batches.
    ///
    /// Returns `false` if `timeout` elapsed first; the unfinished batches keep
    /// running until the runtime stops.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.tracker.close();
        let pending = self.tracker.len();
        if pending > 0 {
            tracing::info!(pending, "Waiting for position batches to finish");
        }
        match tokio::time::timeout(timeout, self.tracker.wait()).await {
            Ok(()) => true,
            Err(_) => {
                tracing::warn!(
                    pending = self.tracker.len(),
                    "Position batches still running at shutdown timeout"
                );
                false
            }
        }
    }
}

async fn apply_batch(
    store: Arc<dyn PositionStore>,
    permits: Arc<Semaphore>,
    workspace_id: DbId,
    items: Vec<PositionItem>,
) -> BatchReport {
    let mut report = BatchReport {
        workspace_id,
        ..Default::default()
    };

    for (index, item) in items.into_iter().enumerate() {
        match apply_item(store.as_ref(), &permits, workspace_id, item).await {
            Ok(()) => report.succeeded.push(item.node_id),
            Err(reason) => {
                tracing::warn!(
                    workspace_id,
                    node_id = item.node_id,
                    index,
                    reason = ?reason,
                    "Position update failed"
                );
                report.failed.push(ItemFailure {
                    index,
                    node_id: item.node_id,
                    reason,
                });
            }
        }
    }

    if report.failed.is_empty() {
        tracing::debug!(workspace_id, updated = report.succeeded.len(), "Position batch applied");
    } else {
        tracing::info!(
            workspace_id,
            updated = report.succeeded.len(),
            failed = report.failed.len(),
            "Position batch applied with failures"
        );
    }
    report
}

async fn apply_item(
    store: &dyn PositionStore,
    permits: &Semaphore,
    workspace_id: DbId,
    item: PositionItem,
) -> Result<(), ItemFailureReason> {
    if !item.position.is_finite() {
        return Err(ItemFailureReason::InvalidPosition);
    }

    let _permit = permits
        .acquire()
        .await
        .map_err(|e| ItemFailureReason::Store(e.to_string()))?;

    match store
        .update_position(workspace_id, item.node_id, item.position)
        .await
    {
        Ok(true) => Ok(()),
        Ok(false) => Err(ItemFailureReason::NodeNotFound),
        Err(e) => Err(ItemFailureReason::Store(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
