//! Status change records: what reconciliation emits and what the store keeps.
//!
//! `NodeStatusChange` is the diff's output and has no timestamp; the time is
//! attached when the caller writes it back as a `NodeStatsRecord`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{JobId, NodeId};
use super::status::PersistedStatus;

/// Why a previously-up node left the live OK set.
///
/// - `Down`: the node did not report at all.
/// - `Error`: the node reported, but not OK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Departure {
    Down,
    Error,
}

impl From<Departure> for PersistedStatus {
    fn from(departure: Departure) -> Self {
        match departure {
            Departure::Down => PersistedStatus::Down,
            Departure::Error => PersistedStatus::Error,
        }
    }
}

/// One detected transition away from `up`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatusChange {
    pub job_id: JobId,
    pub node: NodeId,
    pub status: Departure,
}

impl NodeStatusChange {
    pub fn new(job_id: JobId, node: NodeId, status: Departure) -> Self {
        Self {
            job_id,
            node,
            status,
        }
    }

    /// The stored form of this change, stamped with the time of writing.
    pub fn into_record(self, recorded_at: DateTime<Utc>) -> NodeStatsRecord {
        NodeStatsRecord {
            job_id: self.job_id,
            node: self.node,
            status: self.status.into(),
            recorded_at,
        }
    }
}

/// A persisted (job, node, status, recorded_at) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStatsRecord {
    pub job_id: JobId,
    pub node: NodeId,
    pub status: PersistedStatus,
    pub recorded_at: DateTime<Utc>,
}

impl NodeStatsRecord {
    pub fn new(
        job_id: JobId,
        node: NodeId,
        status: PersistedStatus,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job_id,
            node,
            status,
            recorded_at,
        }
    }
}

/// Nodes that became available and unavailable between the two snapshots.
///
/// `available` is informational; only `unavailable` is ever written back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDelta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available: Vec<NodeId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable: Vec<NodeStatusChange>,
}

impl NodeDelta {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty() && self.unavailable.is_empty()
    }
}
