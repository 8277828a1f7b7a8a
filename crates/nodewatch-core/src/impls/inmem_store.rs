//! InMemoryNodeStatsStore - 開発・テスト用のストア
//!
//! 記録は書き込み順の Vec に追記するだけです。最新判定は読み出し時に
//! `latest_per_node` で行います。

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{JobId, NodeStatsRecord, PersistedSnapshot};
use crate::ports::{PersistedStatusProvider, StatusRecorder, StorageError, latest_per_node};

#[derive(Debug, Default)]
pub struct InMemoryNodeStatsStore {
    records: Mutex<Vec<NodeStatsRecord>>,
}

impl InMemoryNodeStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with existing records, in write order.
    pub fn with_records(records: Vec<NodeStatsRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// All records in write order.
    pub async fn records(&self) -> Vec<NodeStatsRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl PersistedStatusProvider for InMemoryNodeStatsStore {
    async fn fetch_persisted_status(
        &self,
        job_id: JobId,
    ) -> Result<PersistedSnapshot, StorageError> {
        let records = self.records.lock().await;
        Ok(latest_per_node(job_id, records.iter()))
    }
}

#[async_trait]
impl StatusRecorder for InMemoryNodeStatsStore {
    async fn record(&self, record: NodeStatsRecord) -> Result<(), StorageError> {
        self.records.lock().await.push(record);
        Ok(())
    }
}
