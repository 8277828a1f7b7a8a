//! Domain model (ids, statuses, change records, the diff).
//!
//! - ids: JobId / PassId / NodeId
//! - status: LiveStatus, PersistedStatus とそのスナップショット
//! - change: NodeStatusChange, NodeStatsRecord, NodeDelta
//! - diff: 2 つのスナップショットの差分（純粋関数）

pub mod change;
pub mod diff;
pub mod ids;
pub mod status;

pub use change::{Departure, NodeDelta, NodeStatsRecord, NodeStatusChange};
pub use ids::{JobId, NodeId, PassId, ParseIdError};
pub use status::{LiveSnapshot, LiveStatus, PersistedSnapshot, PersistedStatus, UnknownStatus};
