//! Outbound notifications to the real-time collaboration service.
//!
//! - [`NodeNotifier`] is the seam the API calls after a node commits.
//! - [`CollabDelivery`] pushes node schemas over HTTP.
//! - [`NoopNotifier`] stands in when no collaboration service is configured.
//! - [`notify_best_effort`] absorbs and logs delivery failures.

pub mod delivery;
pub mod notifier;

pub use delivery::collab::{CollabConfig, CollabDelivery};
pub use notifier::{notify_best_effort, NodeNotifier, NoopNotifier, NotifyError};
