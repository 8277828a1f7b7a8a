//! PassReport - monitor pass 1 回分の結果

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::{JobId, NodeId, NodeStatusChange, PassId};

/// What one monitor pass saw and wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass_id: PassId,
    pub job_id: JobId,
    pub started_at: DateTime<Utc>,

    /// Live-OK nodes not persisted as `up`. Never written back.
    pub available: Vec<NodeId>,

    /// Departed nodes, sorted by name.
    pub changes: Vec<NodeStatusChange>,

    /// How many of `changes` were written back (0 on a dry run).
    pub recorded: usize,

    pub dry_run: bool,
}

impl PassReport {
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }
}
