//! JsonFileNodeStatsStore - JSON Lines ファイルに記録を追記するストア
//!
//! 1 行 = 1 NodeStatsRecord。ファイルが無ければ空のストアとして扱います。

use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::domain::{JobId, NodeStatsRecord, PersistedSnapshot};
use crate::ports::{PersistedStatusProvider, StatusRecorder, StorageError, latest_per_node};

#[derive(Debug)]
pub struct JsonFileNodeStatsStore {
    path: PathBuf,
    /// Serializes appends from this process.
    write_lock: Mutex<()>,
}

impl JsonFileNodeStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Reads every record in file order.
    pub async fn load(&self) -> Result<Vec<NodeStatsRecord>, StorageError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = Vec::new();
        for (index, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|source| StorageError::Corrupt {
                line: index + 1,
                source,
            })?;
            records.push(record);
        }
        Ok(records)
    }
}

#[async_trait]
impl PersistedStatusProvider for JsonFileNodeStatsStore {
    async fn fetch_persisted_status(
        &self,
        job_id: JobId,
    ) -> Result<PersistedSnapshot, StorageError> {
        let records = self.load().await?;
        Ok(latest_per_node(job_id, &records))
    }
}

#[async_trait]
impl StatusRecorder for JsonFileNodeStatsStore {
    async fn record(&self, record: NodeStatsRecord) -> Result<(), StorageError> {
        let mut line = serde_json::to_string(&record).map_err(StorageError::Encode)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
