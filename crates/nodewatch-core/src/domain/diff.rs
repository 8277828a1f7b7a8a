//! The reconciliation diff: pure functions over two snapshots.
//!
//! Nothing here does I/O, so every law can be checked with literal maps.

use std::collections::BTreeSet;

use super::change::{Departure, NodeDelta, NodeStatusChange};
use super::ids::{JobId, NodeId};
use super::status::{LiveSnapshot, PersistedSnapshot, PersistedStatus};

fn live_ok_set(live: &LiveSnapshot) -> BTreeSet<&NodeId> {
    live.iter()
        .filter(|(_, status)| status.is_ok())
        .map(|(node, _)| node)
        .collect()
}

fn persisted_up_set(persisted: &PersistedSnapshot) -> BTreeSet<&NodeId> {
    persisted
        .iter()
        .filter(|(_, status)| **status == PersistedStatus::Up)
        .map(|(node, _)| node)
        .collect()
}

/// Nodes that were `up` in `persisted` but are not live-OK, sorted by name.
///
/// A departed node that still appears in `live` (with a non-OK token) is
/// classified `Error`; one missing from `live` entirely is `Down`.
pub fn diff(
    job_id: JobId,
    live: &LiveSnapshot,
    persisted: &PersistedSnapshot,
) -> Vec<NodeStatusChange> {
    let ok = live_ok_set(live);
    persisted_up_set(persisted)
        .difference(&ok)
        .map(|node| {
            let status = if live.contains_key(*node) {
                Departure::Error
            } else {
                Departure::Down
            };
            NodeStatusChange::new(job_id, (*node).clone(), status)
        })
        .collect()
}

/// `diff` plus the reverse direction: live-OK nodes not `up` in `persisted`.
pub fn delta(job_id: JobId, live: &LiveSnapshot, persisted: &PersistedSnapshot) -> NodeDelta {
    let up = persisted_up_set(persisted);
    let available = live_ok_set(live)
        .difference(&up)
        .map(|node| (*node).clone())
        .collect();
    NodeDelta {
        available,
        unavailable: diff(job_id, live, persisted),
    }
}
