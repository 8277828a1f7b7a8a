//! LiveStatusProvider port - クラスタ管理層への問い合わせ
//!
//! 1 回の呼び出しで外部に 1 回だけ問い合わせます（キャッシュなし）。
//!
//! # 実装
//! - **CommandLiveStatus**: 外部コマンド（`celeryctl status -C` など）の出力を解析
//! - **StaticLiveStatus**: 固定スナップショット（開発・テスト用）

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::LiveSnapshot;

/// The live status authority could not be reached or its answer could not be read.
#[derive(Debug, thiserror::Error)]
pub enum LiveStatusError {
    #[error("failed to run status command '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("status command exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },

    #[error("status command did not finish within {0:?}")]
    Timeout(Duration),

    #[error("status command output is not valid UTF-8")]
    InvalidOutput(#[from] std::string::FromUtf8Error),
}

/// LiveStatusProvider は node → live status のスナップショットを返す
///
/// 失敗したら reconciliation pass 全体が中断されます（部分的な回復はしない）。
#[async_trait]
pub trait LiveStatusProvider: Send + Sync {
    async fn fetch_live_status(&self) -> Result<LiveSnapshot, LiveStatusError>;
}

#[async_trait]
impl<T: LiveStatusProvider + ?Sized> LiveStatusProvider for Arc<T> {
    async fn fetch_live_status(&self) -> Result<LiveSnapshot, LiveStatusError> {
        (**self).fetch_live_status().await
    }
}
