use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info};

use chirp_core::{RadioCommand, RadioEvent, RadioFrame};

use crate::error::{RadioError, Result};
use crate::process::DaemonHandle;

/// Supervises the external modem daemon and exposes the two halves of the
/// telephony contract: fire-and-forget sends and a stream of deliveries.
pub struct RadioLink {
    modem_cmd: PathBuf,
    daemon: Option<DaemonHandle>,
    event_tx: mpsc::Sender<RadioEvent>,
    event_rx: Option<mpsc::Receiver<RadioEvent>>,
}

impl RadioLink {
    pub fn new(modem_cmd: PathBuf) -> Self {
        let (event_tx, event_rx) = mpsc::channel(1000);
        Self {
            modem_cmd,
            daemon: None,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// The delivery stream. Can only be taken once.
    pub fn take_event_receiver(&mut self) -> Option<mpsc::Receiver<RadioEvent>> {
        self.event_rx.take()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.daemon.is_some() {
            return Ok(());
        }
        info!("starting modem daemon {}", self.modem_cmd.display());
        let handle = DaemonHandle::spawn(&self.modem_cmd, self.event_tx.clone())?;
        self.daemon = Some(handle);
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(mut daemon) = self.daemon.take() {
            info!("stopping modem daemon");
            let _ = daemon.write_line(RadioFrame::command(RadioCommand::Shutdown).to_line());
            tokio::time::sleep(Duration::from_millis(500)).await;
            let _ = daemon.kill().await;
        }
        Ok(())
    }

    /// Queues an outbound text. The daemon's transmission outcome is never
    /// reported back to the caller; this only fails when the daemon itself
    /// is unreachable.
    pub fn send_text(&self, to: &str, text: &str) -> Result<()> {
        debug!(to, "queueing outbound sms");
        self.send_command(RadioCommand::SendText {
            to: to.to_string(),
            text: text.to_string(),
        })
    }

    fn send_command(&self, command: RadioCommand) -> Result<()> {
        let daemon = self.daemon.as_ref().ok_or(RadioError::NotRunning)?;
        daemon.write_line(RadioFrame::command(command).to_line())
    }
}
