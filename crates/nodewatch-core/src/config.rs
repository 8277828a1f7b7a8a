//! MonitorConfig - 監視 pass の設定
//!
//! 優先順位: デフォルト < JSON 設定ファイル < 環境変数（< CLI フラグ）

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::impls::{CommandLiveStatus, JsonFileNodeStatsStore};

pub const ENV_STATUS_COMMAND: &str = "NODEWATCH_STATUS_COMMAND";
pub const ENV_STATUS_DIR: &str = "NODEWATCH_STATUS_DIR";
pub const ENV_STATUS_TIMEOUT_MS: &str = "NODEWATCH_STATUS_TIMEOUT_MS";
pub const ENV_STORE: &str = "NODEWATCH_STORE";
pub const ENV_DRY_RUN: &str = "NODEWATCH_DRY_RUN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("status command is empty")]
    EmptyStatusCommand,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Program followed by its arguments.
    pub status_command: Vec<String>,

    /// Working directory for the status command.
    pub status_dir: Option<PathBuf>,

    pub status_timeout_ms: u64,

    /// JSON Lines file holding node stats records.
    pub store_path: PathBuf,

    pub dry_run: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            status_command: vec![
                "celeryctl".to_string(),
                "status".to_string(),
                "-C".to_string(),
            ],
            status_dir: None,
            status_timeout_ms: 30_000,
            store_path: PathBuf::from("nodewatch-stats.jsonl"),
            dry_run: false,
        }
    }
}

impl MonitorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Overrides from the `NODEWATCH_*` environment variables.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `lookup` (keyed by the `ENV_*` names).
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_STATUS_COMMAND) {
            let parts: Vec<String> = value.split_whitespace().map(str::to_string).collect();
            if parts.is_empty() {
                return Err(ConfigError::EmptyStatusCommand);
            }
            self.status_command = parts;
        }
        if let Some(value) = lookup(ENV_STATUS_DIR) {
            self.status_dir = (!value.is_empty()).then(|| PathBuf::from(value));
        }
        if let Some(value) = lookup(ENV_STATUS_TIMEOUT_MS) {
            let parsed = value.trim().parse::<u64>();
            self.status_timeout_ms = match parsed {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_STATUS_TIMEOUT_MS,
                        value,
                        reason: "expected a positive number of milliseconds",
                    });
                }
            };
        }
        if let Some(value) = lookup(ENV_STORE) {
            self.store_path = PathBuf::from(value);
        }
        if let Some(value) = lookup(ENV_DRY_RUN) {
            self.dry_run = parse_bool(ENV_DRY_RUN, value)?;
        }
        Ok(self)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_timeout_ms)
    }

    pub fn live_provider(&self) -> Result<CommandLiveStatus, ConfigError> {
        let (program, args) = self
            .status_command
            .split_first()
            .ok_or(ConfigError::EmptyStatusCommand)?;
        let provider = CommandLiveStatus::new(program.clone(), args.to_vec(), self.status_timeout());
        Ok(match &self.status_dir {
            Some(dir) => provider.with_working_dir(dir),
            None => provider,
        })
    }

    pub fn store(&self) -> JsonFileNodeStatsStore {
        JsonFileNodeStatsStore::new(&self.store_path)
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value,
            reason: "expected true or false",
        }),
    }
}
