//! nodewatch-core
//!
//! Compute node liveness tracking for a job-processing cluster.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, change, diff）
//! - **ports**: 抽象化レイヤー（LiveStatusProvider, PersistedStatusProvider, StatusRecorder, Clock, IdGenerator）
//! - **impls**: 実装（CommandLiveStatus, InMemoryNodeStatsStore, JsonFileNodeStatsStore など）
//! - **app**: アプリケーションロジック（Reconciler, NodeMonitor）
//! - **config**: MonitorConfig（デフォルト / JSON / 環境変数）

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
