//! Per-priority completion counts for a workspace.

use serde::Serialize;

use crate::node::{NodeStatus, Priority};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PriorityProgress {
    pub total: u32,
    pub completed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressInfo {
    pub p0: PriorityProgress,
    pub p1: PriorityProgress,
    pub p2: PriorityProgress,
}

impl ProgressInfo {
    /// Tally `(priority, status)` pairs. Nodes without a priority are ignored.
    pub fn tally<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = (Option<Priority>, NodeStatus)>,
    {
        let mut info = Self::default();
        for (priority, status) in nodes {
            let Some(priority) = priority else { continue };
            let bucket = info.bucket_mut(priority);
            bucket.total += 1;
            if status == NodeStatus::Done {
                bucket.completed += 1;
            }
        }
        info
    }

    fn bucket_mut(&mut self, priority: Priority) -> &mut PriorityProgress {
        match priority {
            Priority::P0 => &mut self.p0,
            Priority::P1 => &mut self.p1,
            Priority::P2 => &mut self.p2,
        }
    }
}
