//! Reconciler - ライブ状態と永続状態の突き合わせ
//!
//! 1 pass = ライブ問い合わせ → 永続ストア問い合わせ → 純粋な差分計算。
//! Reconciler 自身は書き込みもログ出力もしません（書き戻しは呼び出し側）。

use crate::domain::diff;
use crate::domain::{JobId, LiveSnapshot, NodeDelta, NodeStatusChange, PersistedSnapshot};
use crate::ports::{LiveStatusError, LiveStatusProvider, PersistedStatusProvider, StorageError};

/// Either provider failed; the pass produced nothing.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Unavailable(#[from] LiveStatusError),

    #[error(transparent)]
    StorageUnavailable(#[from] StorageError),
}

pub struct Reconciler<L, P> {
    live: L,
    persisted: P,
}

impl<L, P> Reconciler<L, P>
where
    L: LiveStatusProvider,
    P: PersistedStatusProvider,
{
    pub fn new(live: L, persisted: P) -> Self {
        Self { live, persisted }
    }

    /// Live first: if it fails, the store is never queried.
    async fn snapshots(
        &self,
        job_id: JobId,
    ) -> Result<(LiveSnapshot, PersistedSnapshot), ReconcileError> {
        let live = self.live.fetch_live_status().await?;
        let persisted = self.persisted.fetch_persisted_status(job_id).await?;
        Ok((live, persisted))
    }

    /// Nodes persisted as `up` that no longer report OK, sorted by name.
    pub async fn reconcile(&self, job_id: JobId) -> Result<Vec<NodeStatusChange>, ReconcileError> {
        let (live, persisted) = self.snapshots(job_id).await?;
        Ok(diff::diff(job_id, &live, &persisted))
    }

    /// Same snapshots as `reconcile`, plus nodes that newly report OK.
    pub async fn delta(&self, job_id: JobId) -> Result<NodeDelta, ReconcileError> {
        let (live, persisted) = self.snapshots(job_id).await?;
        Ok(diff::delta(job_id, &live, &persisted))
    }
}
