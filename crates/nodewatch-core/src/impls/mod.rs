//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **CommandLiveStatus**: 外部コマンドによるライブ状態
//! - **StaticLiveStatus**: 固定スナップショット（開発・テスト用）
//! - **InMemoryNodeStatsStore**: 開発・テスト用のストア
//! - **JsonFileNodeStatsStore**: JSON Lines ファイルのストア

pub mod command_live;
pub mod inmem_store;
pub mod json_store;
pub mod static_live;

pub use self::command_live::{CommandLiveStatus, parse_status_lines};
pub use self::inmem_store::InMemoryNodeStatsStore;
pub use self::json_store::JsonFileNodeStatsStore;
pub use self::static_live::StaticLiveStatus;
