use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::warn;

use chirp_core::{FrameContent, RadioEvent, RadioFrame};

use crate::error::{RadioError, Result};

/// A running modem daemon. Frames go out on stdin, come back on stdout;
/// anything the daemon prints on stderr is surfaced as a diagnostic.
pub struct DaemonHandle {
    child: Child,
    stdin_tx: mpsc::Sender<String>,
}

impl DaemonHandle {
    pub fn spawn(command: &Path, event_tx: mpsc::Sender<RadioEvent>) -> Result<Self> {
        let mut child = Command::new(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RadioError::SpawnFailed(e.to_string()))?;

        let stdout = child.stdout.take().ok_or(RadioError::NotRunning)?;
        let stderr = child.stderr.take().ok_or(RadioError::NotRunning)?;
        let mut stdin = child.stdin.take().ok_or(RadioError::NotRunning)?;

        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(100);

        tokio::spawn(async move {
            while let Some(line) = stdin_rx.recv().await {
                if stdin.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if stdin.flush().await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let Some(frame) = RadioFrame::from_line(&line) else {
                    warn!("dropping unparseable modem line: {line}");
                    continue;
                };
                match frame.content {
                    FrameContent::Event(event) => {
                        if event_tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    FrameContent::Command(_) => {
                        warn!("modem daemon sent a command frame, ignoring it");
                    }
                }
            }
        });

        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                warn!("modem: {line}");
            }
        });

        Ok(Self { child, stdin_tx })
    }

    /// Queues one frame line; does not wait for the daemon to act on it.
    pub fn write_line(&self, line: String) -> Result<()> {
        self.stdin_tx
            .try_send(line)
            .map_err(|_| RadioError::ChannelClosed)
    }

    pub async fn kill(&mut self) -> Result<()> {
        self.child.kill().await?;
        Ok(())
    }
}
