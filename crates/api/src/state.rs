use std::sync::Arc;

use projectree_events::NodeNotifier;

use crate::config::ServerConfig;
use crate::engine::positions::PositionBatchUpdater;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: projectree_db::DbPool,
    /// Server configuration (JWT secret, limits).
    pub config: Arc<ServerConfig>,
    /// Receives every committed node creation.
    pub notifier: Arc<dyn NodeNotifier>,
    /// Background applier for canvas position batches.
    pub positions: PositionBatchUpdater,
}
