//! Operations that span several repositories or outlive the request.
//!
//! - [`node_ops`] -- transactional tree writes followed by a best-effort
//!   collaboration notification.
//! - [`positions`] -- the fire-and-forget position batch updater.

pub mod node_ops;
pub mod positions;
