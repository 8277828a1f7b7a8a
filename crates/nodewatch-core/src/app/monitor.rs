//! NodeMonitor - reconcile と書き戻しをつなぐ
//!
//! # フロー
//! 1. pass_id を採番（ログの相関用）
//! 2. Reconciler::delta でスナップショットを突き合わせ
//! 3. dry-run でなければ record_changes で書き戻し
//!
//! 書き戻しは reconcile の外の独立したステップです。途中で失敗したら
//! `MonitorError::Record` の `recorded` 以降だけを record_changes で再試行できます。

use std::sync::Arc;

use tracing::{Instrument, info, info_span, warn};

use super::reconciler::{ReconcileError, Reconciler};
use super::report::PassReport;
use crate::domain::{JobId, NodeId, NodeStatsRecord, NodeStatusChange, PassId, PersistedStatus};
use crate::ports::{
    Clock, IdGenerator, LiveStatusProvider, NodeStatsStore, StorageError, UlidGenerator,
};

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("recorded {recorded} of {total} status changes before failing: {source}")]
    Record {
        recorded: usize,
        total: usize,
        #[source]
        source: StorageError,
    },
}

pub struct NodeMonitor<L, S, C> {
    reconciler: Reconciler<L, Arc<S>>,
    store: Arc<S>,
    clock: C,
    id_gen: Box<dyn IdGenerator>,
    dry_run: bool,
}

impl<L, S, C> NodeMonitor<L, S, C>
where
    L: LiveStatusProvider,
    S: NodeStatsStore,
    C: Clock,
{
    /// Pass ids are generated from the same clock as `recorded_at`.
    pub fn new(live: L, store: Arc<S>, clock: C) -> Self
    where
        C: Clone + 'static,
    {
        Self {
            reconciler: Reconciler::new(live, store.clone()),
            store,
            id_gen: Box::new(UlidGenerator::new(clock.clone())),
            clock,
            dry_run: false,
        }
    }

    /// Detect only; `run_pass` will not write anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_id_generator(mut self, id_gen: impl IdGenerator + 'static) -> Self {
        self.id_gen = Box::new(id_gen);
        self
    }

    /// One reconciliation pass for `job_id`, then write-back of what it found.
    pub async fn run_pass(&self, job_id: JobId) -> Result<PassReport, MonitorError> {
        let pass_id = self.id_gen.generate_pass_id();
        let span = info_span!("monitor_pass", %pass_id, %job_id);
        self.pass(pass_id, job_id).instrument(span).await
    }

    async fn pass(&self, pass_id: PassId, job_id: JobId) -> Result<PassReport, MonitorError> {
        let started_at = self.clock.now();
        let delta = match self.reconciler.delta(job_id).await {
            Ok(delta) => delta,
            Err(e) => {
                warn!(error = %e, "reconciliation failed, skipping this cycle");
                return Err(e.into());
            }
        };

        for node in &delta.available {
            info!(%node, "node is live but not recorded as up");
        }
        for change in &delta.unavailable {
            warn!(node = %change.node, status = ?change.status, "node left the live set");
        }

        let recorded = if self.dry_run {
            info!(changes = delta.unavailable.len(), "dry run, not recording");
            0
        } else {
            self.record_changes(&delta.unavailable).await?.len()
        };

        info!(
            available = delta.available.len(),
            departed = delta.unavailable.len(),
            recorded,
            "monitor pass finished"
        );
        Ok(PassReport {
            pass_id,
            job_id,
            started_at,
            available: delta.available,
            changes: delta.unavailable,
            recorded,
            dry_run: self.dry_run,
        })
    }

    /// Writes each change back with the current time as `recorded_at`.
    ///
    /// Stops at the first failure; records already written stay written.
    pub async fn record_changes(
        &self,
        changes: &[NodeStatusChange],
    ) -> Result<Vec<NodeStatsRecord>, MonitorError> {
        let mut written = Vec::with_capacity(changes.len());
        for change in changes {
            let record = change.clone().into_record(self.clock.now());
            if let Err(source) = self.store.record(record.clone()).await {
                warn!(node = %change.node, error = %source, "failed to record status change");
                return Err(MonitorError::Record {
                    recorded: written.len(),
                    total: changes.len(),
                    source,
                });
            }
            written.push(record);
        }
        Ok(written)
    }

    /// Records `status` for `node` directly, e.g. when a node joins the job.
    pub async fn mark(
        &self,
        job_id: JobId,
        node: NodeId,
        status: PersistedStatus,
    ) -> Result<NodeStatsRecord, StorageError> {
        let record = NodeStatsRecord::new(job_id, node, status, self.clock.now());
        self.store.record(record.clone()).await?;
        info!(%job_id, node = %record.node, %status, "recorded node status");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Departure, PersistedSnapshot};
    use crate::impls::{InMemoryNodeStatsStore, StaticLiveStatus};
    use crate::ports::{FixedClock, LiveStatusError, PersistedStatusProvider, StatusRecorder};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use ulid::Ulid;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn later() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 13, 0, 0).unwrap()
    }

    fn seeded(job_id: JobId, entries: &[(&str, PersistedStatus)]) -> Arc<InMemoryNodeStatsStore> {
        Arc::new(InMemoryNodeStatsStore::with_records(
            entries
                .iter()
                .map(|(node, status)| {
                    NodeStatsRecord::new(job_id, NodeId::new(*node), *status, noon())
                })
                .collect(),
        ))
    }

    #[tokio::test]
    async fn pass_records_departed_nodes() {
        let job_id = JobId::from_ulid(Ulid::new());
        let store = seeded(
            job_id,
            &[("n1", PersistedStatus::Up), ("n2", PersistedStatus::Up)],
        );
        let monitor = NodeMonitor::new(
            StaticLiveStatus::from_tokens([("n1", "ERROR")]),
            store.clone(),
            FixedClock::new(later()),
        );

        let report = monitor.run_pass(job_id).await.unwrap();
        assert_eq!(report.recorded, 2);
        assert!(report.has_changes());
        assert!(report.pass_id.to_string().starts_with("pass-"));

        let records = store.records().await;
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[2],
            NodeStatsRecord::new(job_id, NodeId::new("n1"), PersistedStatus::Error, later())
        );
        assert_eq!(
            records[3],
            NodeStatsRecord::new(job_id, NodeId::new("n2"), PersistedStatus::Down, later())
        );

        // 書き戻し後の pass では再フラグしない
        let second = monitor.run_pass(job_id).await.unwrap();
        assert!(!second.has_changes());
        assert_eq!(store.records().await.len(), 4);
    }

    #[tokio::test]
    async fn dry_run_writes_nothing() {
        let job_id = JobId::from_ulid(Ulid::new());
        let store = seeded(job_id, &[("n1", PersistedStatus::Up)]);
        let monitor = NodeMonitor::new(
            StaticLiveStatus::default(),
            store.clone(),
            FixedClock::new(later()),
        )
        .with_dry_run(true);

        let report = monitor.run_pass(job_id).await.unwrap();
        assert!(report.dry_run);
        assert_eq!(report.recorded, 0);
        assert_eq!(
            report.changes,
            vec![NodeStatusChange::new(job_id, NodeId::new("n1"), Departure::Down)]
        );
        assert_eq!(store.records().await.len(), 1);
    }

    #[tokio::test]
    async fn mark_then_pass_sees_the_node() {
        let job_id = JobId::from_ulid(Ulid::new());
        let store = Arc::new(InMemoryNodeStatsStore::new());
        let monitor = NodeMonitor::new(
            StaticLiveStatus::from_tokens([("n1", "OK"), ("n2", "OK")]),
            store.clone(),
            FixedClock::new(noon()),
        );

        monitor
            .mark(job_id, NodeId::new("n1"), PersistedStatus::Up)
            .await
            .unwrap();

        let report = monitor.run_pass(job_id).await.unwrap();
        assert!(!report.has_changes());
        assert_eq!(report.available, vec![NodeId::new("n2")]);
    }

    struct FailingLive;

    #[async_trait]
    impl LiveStatusProvider for FailingLive {
        async fn fetch_live_status(&self) -> Result<crate::domain::LiveSnapshot, LiveStatusError> {
            Err(LiveStatusError::Timeout(std::time::Duration::from_secs(30)))
        }
    }

    #[tokio::test]
    async fn live_failure_writes_nothing() {
        let job_id = JobId::from_ulid(Ulid::new());
        let store = seeded(job_id, &[("n1", PersistedStatus::Up)]);
        let monitor = NodeMonitor::new(FailingLive, store.clone(), FixedClock::new(later()));

        let result = monitor.run_pass(job_id).await;
        assert!(matches!(
            result,
            Err(MonitorError::Reconcile(ReconcileError::Unavailable(
                LiveStatusError::Timeout(_)
            )))
        ));
        assert_eq!(store.records().await.len(), 1);
    }

    /// Accepts `budget` writes, then fails.
    struct FlakyStore {
        inner: InMemoryNodeStatsStore,
        budget: AtomicUsize,
    }

    #[async_trait]
    impl PersistedStatusProvider for FlakyStore {
        async fn fetch_persisted_status(
            &self,
            job_id: JobId,
        ) -> Result<PersistedSnapshot, StorageError> {
            self.inner.fetch_persisted_status(job_id).await
        }
    }

    #[async_trait]
    impl StatusRecorder for FlakyStore {
        async fn record(&self, record: NodeStatsRecord) -> Result<(), StorageError> {
            let left = self.budget.load(Ordering::SeqCst);
            if left == 0 {
                return Err(StorageError::Io(std::io::Error::other("disk full")));
            }
            self.budget.store(left - 1, Ordering::SeqCst);
            self.inner.record(record).await
        }
    }

    #[tokio::test]
    async fn partial_write_back_can_be_resumed() {
        let job_id = JobId::from_ulid(Ulid::new());
        let store = Arc::new(FlakyStore {
            inner: InMemoryNodeStatsStore::new(),
            budget: AtomicUsize::new(1),
        });
        let monitor = NodeMonitor::new(
            StaticLiveStatus::default(),
            store.clone(),
            FixedClock::new(later()),
        );
        let changes = vec![
            NodeStatusChange::new(job_id, NodeId::new("n1"), Departure::Down),
            NodeStatusChange::new(job_id, NodeId::new("n2"), Departure::Down),
        ];

        let err = monitor.record_changes(&changes).await.unwrap_err();
        let recorded = match err {
            MonitorError::Record {
                recorded, total, ..
            } => {
                assert_eq!(total, 2);
                recorded
            }
            other => panic!("unexpected error: {other:?}"),
        };
        assert_eq!(recorded, 1);

        store.budget.store(1, Ordering::SeqCst);
        let retried = monitor.record_changes(&changes[recorded..]).await.unwrap();
        assert_eq!(retried.len(), 1);

        let snapshot = store.fetch_persisted_status(job_id).await.unwrap();
        assert_eq!(snapshot.len(), 2);
    }

    #[tokio::test]
    async fn pass_ids_follow_the_injected_clock() {
        let job_id = JobId::from_ulid(Ulid::new());
        let monitor = NodeMonitor::new(
            StaticLiveStatus::default(),
            Arc::new(InMemoryNodeStatsStore::new()),
            FixedClock::new(later()),
        );

        let report = monitor.run_pass(job_id).await.unwrap();
        assert_eq!(
            report.pass_id.as_ulid().timestamp_ms(),
            later().timestamp_millis() as u64
        );
        assert_eq!(report.started_at, later());
    }

    /// Hands out the same pass id every time.
    struct SamePassId(PassId);

    impl IdGenerator for SamePassId {
        fn generate_job_id(&self) -> JobId {
            JobId::from_ulid(self.0.as_ulid())
        }

        fn generate_pass_id(&self) -> PassId {
            self.0
        }
    }

    #[tokio::test]
    async fn injected_id_generator_names_the_pass() {
        let job_id = JobId::from_ulid(Ulid::new());
        let pass_id = PassId::from_ulid(Ulid::new());
        let monitor = NodeMonitor::new(
            StaticLiveStatus::from_tokens([("n1", "OK")]),
            seeded(job_id, &[("n1", PersistedStatus::Up)]),
            FixedClock::new(later()),
        )
        .with_id_generator(SamePassId(pass_id));

        let first = monitor.run_pass(job_id).await.unwrap();
        let second = monitor.run_pass(job_id).await.unwrap();
        assert_eq!(first.pass_id, pass_id);
        assert_eq!(second.pass_id, pass_id);
        assert_eq!(first, second);
    }
}
