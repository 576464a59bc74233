//! HTTP delivery of node-created notifications.
//!
//! [`CollabDelivery`] POSTs a JSON-encoded [`NodeSchema`] to
//! `<base url><path prefix><new node path>`, where the new node path may
//! contain a `{workspace_id}` placeholder. A single attempt is made per
//! node; the request timeout bounds how long a caller can be held up.

use std::time::Duration;

use async_trait::async_trait;
use projectree_core::types::DbId;
use projectree_db::models::node::NodeSchema;

use crate::notifier::{NodeNotifier, NotifyError};

// ---------------------------------------------------------------------------
// CollabConfig
// ---------------------------------------------------------------------------

pub const DEFAULT_PATH_PREFIX: &str = "/internal";
pub const DEFAULT_NEW_NODE_PATH: &str = "/workspaces/{workspace_id}/nodes";
pub const DEFAULT_TIMEOUT_MS: u64 = 3_000;

const WORKSPACE_PLACEHOLDER: &str = "{workspace_id}";

#[derive(Debug, Clone)]
pub struct CollabConfig {
    /// Scheme and authority of the collaboration service.
    pub base_url: String,
    pub path_prefix: String,
    /// Path template for node creation; `{workspace_id}` is substituted.
    pub new_node_path: String,
    pub timeout: Duration,
}

impl CollabConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
            new_node_path: DEFAULT_NEW_NODE_PATH.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `COLLAB_SERVER_URL` is not set, signalling that
    /// notifications are disabled.
    ///
    /// | Variable               | Required | Default                             |
    /// |------------------------|----------|-------------------------------------|
    /// | `COLLAB_SERVER_URL`    | yes      | none                                |
    /// | `COLLAB_PATH_PREFIX`   | no       | `/internal`                         |
    /// | `COLLAB_NEW_NODE_PATH` | no       | `/workspaces/{workspace_id}/nodes`  |
    /// | `COLLAB_TIMEOUT_MS`    | no       | `3000`                              |
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("COLLAB_SERVER_URL").ok()?;
        let mut config = Self::new(base_url);
        if let Ok(prefix) = std::env::var("COLLAB_PATH_PREFIX") {
            config.path_prefix = prefix;
        }
        if let Ok(path) = std::env::var("COLLAB_NEW_NODE_PATH") {
            config.new_node_path = path;
        }
        if let Some(ms) = std::env::var("COLLAB_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms);
        }
        Some(config)
    }

    /// Full URL for a node created in `workspace_id`.
    pub fn new_node_url(&self, workspace_id: DbId) -> String {
        let path = self
            .new_node_path
            .replace(WORKSPACE_PLACEHOLDER, &workspace_id.to_string());
        format!(
            "{}{}{}",
            self.base_url.trim_end_matches('/'),
            normalize_segment(&self.path_prefix),
            normalize_segment(&path)
        )
    }
}

/// Leading slash, no trailing slash; empty stays empty.
fn normalize_segment(segment: &str) -> String {
    let trimmed = segment.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

// ---------------------------------------------------------------------------
// CollabDelivery
// ---------------------------------------------------------------------------

pub struct CollabDelivery {
    client: reqwest::Client,
    config: CollabConfig,
}

impl CollabDelivery {
    pub fn new(config: CollabConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CollabConfig {
        &self.config
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, node: &NodeSchema) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(node).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeNotifier for CollabDelivery {
    async fn node_created(
        &self,
        workspace_id: DbId,
        node: &NodeSchema,
    ) -> Result<(), NotifyError> {
        let url = self.config.new_node_url(workspace_id);
        tracing::debug!(url = %url, node_id = node.id, "Sending node to collaboration service");
        self.try_send(&url, node).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
