//! App - アプリケーション層
//!
//! ports を組み合わせて reconciliation を実行します。
//!
//! # 主要コンポーネント
//! - **Reconciler**: 2 つのスナップショットの取得と差分（書き込みなし）
//! - **NodeMonitor**: pass 1 回分の実行、ログ、書き戻し
//! - **PassReport**: pass の結果

pub mod monitor;
pub mod reconciler;
pub mod report;

pub use self::monitor::{MonitorError, NodeMonitor};
pub use self::reconciler::{ReconcileError, Reconciler};
pub use self::report::PassReport;
