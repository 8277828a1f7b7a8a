//! CommandLiveStatus - 外部コマンドの出力からライブ状態を得る
//!
//! 出力は行指向のテキストで、`"<node>: <status>"` の行だけが意味を持ちます。
//! それ以外の行（ヘッダ、空行、`7 nodes online.` など）は黙って読み飛ばします。

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, trace};

use crate::domain::{LiveSnapshot, LiveStatus, NodeId};
use crate::ports::{LiveStatusError, LiveStatusProvider};

/// Parses `"<node>: <status>"` lines into a snapshot.
///
/// A line counts if it splits on the first `": "` into a non-empty node name
/// and a non-empty status. The whole trimmed rest of the line is the status,
/// so `n1: ERROR timeout` is a reporting, not-OK node. A leading `->` marker
/// on the node name is dropped. If a node appears twice, the later line wins.
pub fn parse_status_lines(output: &str) -> LiveSnapshot {
    let mut snapshot = LiveSnapshot::new();
    for line in output.lines() {
        match parse_line(line) {
            Some((node, status)) => {
                snapshot.insert(node, status);
            }
            None => trace!(line, "skipping non-status line"),
        }
    }
    snapshot
}

fn parse_line(line: &str) -> Option<(NodeId, LiveStatus)> {
    let (node, status) = line.split_once(": ")?;
    let node = node.trim().trim_start_matches("->").trim();
    let status = status.trim();
    if node.is_empty() || status.is_empty() {
        return None;
    }
    Some((NodeId::new(node), LiveStatus::from_token(status)))
}

/// Runs a status command and parses its stdout.
///
/// The command gets no stdin and is killed if the timeout elapses.
#[derive(Debug, Clone)]
pub struct CommandLiveStatus {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    timeout: Duration,
}

impl CommandLiveStatus {
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            working_dir: None,
            timeout,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    async fn run(&self) -> Result<String, LiveStatusError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        debug!(program = %self.program, args = ?self.args, "querying live node status");
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| LiveStatusError::Timeout(self.timeout))?
            .map_err(|source| LiveStatusError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(LiveStatusError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

#[async_trait]
impl LiveStatusProvider for CommandLiveStatus {
    async fn fetch_live_status(&self) -> Result<LiveSnapshot, LiveStatusError> {
        let stdout = self.run().await?;
        let snapshot = parse_status_lines(&stdout);
        debug!(nodes = snapshot.len(), "parsed live node status");
        Ok(snapshot)
    }
}
