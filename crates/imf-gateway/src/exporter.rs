// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! History exporter backed by an external program.
//!
//! The program receives `last_update_time` as its final argument and the
//! history database location in `CHAT_PATH`, and writes its export to stdout.
//! Stdout is forwarded chunk by chunk; stderr goes to the log.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use imf_config::model::ExporterConfig;
use imf_core::{ByteStream, HistoryExporter, ImfError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::time::Instant;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, warn};

/// Runs the configured exporter program once per [`HistoryExporter::open`].
#[derive(Debug, Clone)]
pub struct CommandExporter {
    program: String,
    args: Vec<String>,
    chat_path: PathBuf,
    timeout: Duration,
}

impl CommandExporter {
    pub fn new(
        program: impl Into<String>,
        args: Vec<String>,
        chat_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            chat_path: chat_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExporterConfig, chat_path: impl Into<PathBuf>) -> Self {
        Self::new(
            config.program.clone(),
            config.args.clone(),
            chat_path,
            Duration::from_secs(config.timeout_secs),
        )
    }
}

#[async_trait]
impl HistoryExporter for CommandExporter {
    fn name(&self) -> &str {
        &self.program
    }

    async fn open(&self, last_update_time: i64) -> Result<ByteStream, ImfError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(last_update_time.to_string())
            .env("CHAT_PATH", &self.chat_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ImfError::Exporter {
                message: format!("failed to start `{}`: {e}", self.program),
                source: Some(Box::new(e)),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| ImfError::Exporter {
            message: "exporter stdout was not captured".to_string(),
            source: None,
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_stderr(stderr, self.program.clone()));
        }

        info!(
            exporter = %self.program,
            pid = child.id(),
            last_update_time,
            "history export started"
        );

        let export = Export {
            child: Some(child),
            stdout: ReaderStream::new(stdout),
            deadline: Instant::now() + self.timeout,
            timeout: self.timeout,
            program: self.program.clone(),
        };
        Ok(futures::stream::unfold(export, Export::next_chunk).boxed())
    }
}

/// State of one running export. Dropping it kills the child.
struct Export {
    child: Option<Child>,
    stdout: ReaderStream<ChildStdout>,
    deadline: Instant,
    timeout: Duration,
    program: String,
}

impl Export {
    async fn next_chunk(mut self) -> Option<(Result<Bytes, std::io::Error>, Self)> {
        self.child.as_ref()?;

        match tokio::time::timeout_at(self.deadline, self.stdout.next()).await {
            Ok(Some(Ok(chunk))) => Some((Ok(chunk), self)),
            Ok(Some(Err(e))) => {
                warn!(exporter = %self.program, error = %e, "reading exporter output failed");
                self.child = None;
                Some((Err(e), self))
            }
            Ok(None) => {
                if let Some(child) = self.child.take() {
                    tokio::spawn(reap(child, self.program.clone(), self.deadline));
                }
                None
            }
            Err(_) => {
                warn!(
                    exporter = %self.program,
                    timeout = ?self.timeout,
                    "history export exceeded its deadline, killing exporter"
                );
                self.child = None;
                let err = std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    ImfError::Timeout {
                        duration: self.timeout,
                    },
                );
                Some((Err(err), self))
            }
        }
    }
}

/// Wait for an exporter whose output is complete. A child still running at
/// the deadline is dropped, which kills it.
async fn reap(mut child: Child, program: String, deadline: Instant) {
    match tokio::time::timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) if status.success() => {
            debug!(exporter = %program, "history export finished");
        }
        Ok(Ok(status)) => {
            warn!(exporter = %program, %status, "exporter exited unsuccessfully");
        }
        Ok(Err(e)) => {
            warn!(exporter = %program, error = %e, "failed to wait for exporter");
        }
        Err(_) => {
            warn!(exporter = %program, "exporter closed stdout but did not exit, killing it");
        }
    }
}

async fn forward_stderr(stderr: ChildStderr, program: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!(exporter = %program, "{line}");
    }
}
