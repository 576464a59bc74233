//! The node notification seam.
//!
//! The relational store is the source of truth; the collaboration service
//! is a downstream mirror. Callers commit first, then hand the persisted
//! node to [`notify_best_effort`], which never fails.

use async_trait::async_trait;
use projectree_core::types::DbId;
use projectree_db::models::node::NodeSchema;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Collaboration service returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// NodeNotifier
// ---------------------------------------------------------------------------

/// Receives nodes after their creating transaction has committed.
#[async_trait]
pub trait NodeNotifier: Send + Sync {
    async fn node_created(&self, workspace_id: DbId, node: &NodeSchema)
        -> Result<(), NotifyError>;
}

/// Notifier used when no collaboration service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

#[async_trait]
impl NodeNotifier for NoopNotifier {
    async fn node_created(
        &self,
        workspace_id: DbId,
        node: &NodeSchema,
    ) -> Result<(), NotifyError> {
        tracing::debug!(workspace_id, node_id = node.id, "Collaboration service disabled");
        Ok(())
    }
}

/// Deliver a node-created notification, logging instead of returning errors.
pub async fn notify_best_effort(notifier: &dyn NodeNotifier, workspace_id: DbId, node: &NodeSchema) {
    match notifier.node_created(workspace_id, node).await {
        Ok(()) => {
            tracing::debug!(workspace_id, node_id = node.id, "Node notification delivered");
        }
        Err(e) => {
            tracing::error!(
                workspace_id,
                node_id = node.id,
                error = %e,
                "Node notification failed"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
