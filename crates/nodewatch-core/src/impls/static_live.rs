//! StaticLiveStatus - 固定スナップショットを返す（開発・テスト用）

use async_trait::async_trait;

use crate::domain::{LiveSnapshot, LiveStatus, NodeId};
use crate::ports::{LiveStatusError, LiveStatusProvider};

#[derive(Debug, Clone, Default)]
pub struct StaticLiveStatus {
    snapshot: LiveSnapshot,
}

impl StaticLiveStatus {
    /// Builds a snapshot from `(node, token)` pairs.
    pub fn from_tokens<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let snapshot = entries
            .into_iter()
            .map(|(node, token)| (NodeId::new(node), LiveStatus::from_token(token)))
            .collect();
        Self { snapshot }
    }
}

#[async_trait]
impl LiveStatusProvider for StaticLiveStatus {
    async fn fetch_live_status(&self) -> Result<LiveSnapshot, LiveStatusError> {
        Ok(self.snapshot.clone())
    }
}
