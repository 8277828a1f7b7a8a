//! Node statuses, as seen live and as persisted.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ids::NodeId;

/// The token the cluster management layer prints for a healthy node.
pub const LIVE_OK: &str = "OK";

/// Status reported right now by the cluster management layer.
///
/// Only `Ok` counts as alive. Any other token means the node answered but is
/// not healthy; the raw token is kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum LiveStatus {
    Ok,
    NotOk(String),
}

impl LiveStatus {
    /// Exact, case-sensitive match on `"OK"`.
    pub fn from_token(token: &str) -> Self {
        if token == LIVE_OK {
            LiveStatus::Ok
        } else {
            LiveStatus::NotOk(token.to_string())
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, LiveStatus::Ok)
    }

    pub fn as_token(&self) -> &str {
        match self {
            LiveStatus::Ok => LIVE_OK,
            LiveStatus::NotOk(token) => token,
        }
    }
}

impl From<String> for LiveStatus {
    fn from(token: String) -> Self {
        LiveStatus::from_token(&token)
    }
}

impl From<LiveStatus> for String {
    fn from(status: LiveStatus) -> Self {
        status.as_token().to_string()
    }
}

impl fmt::Display for LiveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// Last status recorded for a node within a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistedStatus {
    Up,
    Down,
    Error,
}

impl PersistedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersistedStatus::Up => "up",
            PersistedStatus::Down => "down",
            PersistedStatus::Error => "error",
        }
    }
}

impl fmt::Display for PersistedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown node status '{0}' (expected up, down or error)")]
pub struct UnknownStatus(String);

impl FromStr for PersistedStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" => Ok(PersistedStatus::Up),
            "down" => Ok(PersistedStatus::Down),
            "error" => Ok(PersistedStatus::Error),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Live view: one entry per node the authority reported on.
pub type LiveSnapshot = BTreeMap<NodeId, LiveStatus>;

/// Persisted view: the latest recorded status per node for one job.
pub type PersistedSnapshot = BTreeMap<NodeId, PersistedStatus>;
