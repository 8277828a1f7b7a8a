//! Ports - 抽象化レイヤー
//!
//! 外部システム（クラスタ管理層、永続ストア、時計）へのインターフェースを
//! trait として定義し、reconciliation のロジックから実装の詳細を隠蔽します。

pub mod clock;
pub mod id_generator;
pub mod live_status;
pub mod node_stats_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::live_status::{LiveStatusError, LiveStatusProvider};
pub use self::node_stats_store::{
    NodeStatsStore, PersistedStatusProvider, StatusRecorder, StorageError, latest_per_node,
};
