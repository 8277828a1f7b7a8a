//! NodeStatsStore port - ノード状態記録の正本（source of truth）
//!
//! 記録は (job, node, status, recorded_at) の追記のみ。
//! 読み出しは「job ごと・node ごとの最新 1 件」だけを返します。
//!
//! # 実装
//! - **InMemoryNodeStatsStore**: 開発・テスト用
//! - **JsonFileNodeStatsStore**: JSON Lines ファイル

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{JobId, NodeStatsRecord, PersistedSnapshot};

/// The persisted store could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("node stats store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode node stats record: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("corrupt node stats record at line {line}: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// PersistedStatusProvider は job ごとの最新ノード状態を返す
///
/// - 未知の job はエラーではなく空のマップ
/// - 同じ node の記録が複数ある場合は recorded_at が最新のもの
///   （同時刻なら後から書かれたもの）
#[async_trait]
pub trait PersistedStatusProvider: Send + Sync {
    async fn fetch_persisted_status(
        &self,
        job_id: JobId,
    ) -> Result<PersistedSnapshot, StorageError>;
}

/// StatusRecorder は記録を追記する（reconcile の外で呼ばれる書き戻し）
#[async_trait]
pub trait StatusRecorder: Send + Sync {
    async fn record(&self, record: NodeStatsRecord) -> Result<(), StorageError>;
}

#[async_trait]
impl<T: PersistedStatusProvider + ?Sized> PersistedStatusProvider for Arc<T> {
    async fn fetch_persisted_status(
        &self,
        job_id: JobId,
    ) -> Result<PersistedSnapshot, StorageError> {
        (**self).fetch_persisted_status(job_id).await
    }
}

#[async_trait]
impl<T: StatusRecorder + ?Sized> StatusRecorder for Arc<T> {
    async fn record(&self, record: NodeStatsRecord) -> Result<(), StorageError> {
        (**self).record(record).await
    }
}

/// 読み書き両方を持つストア
pub trait NodeStatsStore: PersistedStatusProvider + StatusRecorder {}

impl<T: PersistedStatusProvider + StatusRecorder> NodeStatsStore for T {}

/// Resolves records to the latest status per node for `job_id`.
///
/// Records are ordered by `recorded_at` with a stable sort, so records with
/// equal timestamps keep their write order and the last written wins.
pub fn latest_per_node<'a, I>(job_id: JobId, records: I) -> PersistedSnapshot
where
    I: IntoIterator<Item = &'a NodeStatsRecord>,
{
    let mut matching: Vec<&NodeStatsRecord> = records
        .into_iter()
        .filter(|record| record.job_id == job_id)
        .collect();
    matching.sort_by_key(|record| record.recorded_at);
    matching
        .into_iter()
        .map(|record| (record.node.clone(), record.status))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeId, PersistedStatus};
    use chrono::{DateTime, TimeZone, Utc};
    use ulid::Ulid;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, minute, 0).unwrap()
    }

    fn record(job_id: JobId, node: &str, status: PersistedStatus, minute: u32) -> NodeStatsRecord {
        NodeStatsRecord::new(job_id, NodeId::new(node), status, at(minute))
    }

    #[test]
    fn latest_record_wins_regardless_of_write_order() {
        let job_id = JobId::from_ulid(Ulid::new());
        let records = vec![
            record(job_id, "n1", PersistedStatus::Down, 5),
            record(job_id, "n1", PersistedStatus::Up, 1),
        ];
        let snapshot = latest_per_node(job_id, &records);
        assert_eq!(snapshot.get(&NodeId::new("n1")), Some(&PersistedStatus::Down));
    }

    #[test]
    fn ties_are_broken_by_write_order() {
        let job_id = JobId::from_ulid(Ulid::new());
        let records = vec![
            record(job_id, "n1", PersistedStatus::Up, 3),
            record(job_id, "n1", PersistedStatus::Error, 3),
        ];
        let snapshot = latest_per_node(job_id, &records);
        assert_eq!(snapshot.get(&NodeId::new("n1")), Some(&PersistedStatus::Error));
    }

    #[test]
    fn other_jobs_are_ignored() {
        let job_id = JobId::from_ulid(Ulid::new());
        let other = JobId::from_ulid(Ulid::new());
        let records = vec![
            record(other, "n1", PersistedStatus::Up, 1),
            record(job_id, "n2", PersistedStatus::Up, 1),
        ];
        let snapshot = latest_per_node(job_id, &records);
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.contains_key(&NodeId::new("n2")));

        let unknown = JobId::from_ulid(Ulid::new());
        assert!(latest_per_node(unknown, &records).is_empty());
    }
}
