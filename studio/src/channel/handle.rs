//! Handle to a live push channel

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::ChannelKind;

/// How a channel is shut down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseMode {
    /// Send `{"type":"cancel"}` so the backend stops its task, then close
    Cancel,
    /// Close only; the stream already delivered its terminal event
    Retire,
}

/// Owned reference to a running channel reader task
///
/// Dropping a handle retires the channel.
#[derive(Debug)]
pub struct ChannelHandle {
    kind: ChannelKind,
    epoch: u64,
    close_tx: Option<oneshot::Sender<CloseMode>>,
    task: Option<JoinHandle<()>>,
}

impl ChannelHandle {
    pub fn new(kind: ChannelKind, epoch: u64, close_tx: oneshot::Sender<CloseMode>, task: JoinHandle<()>) -> Self {
        debug!(%kind, epoch, "ChannelHandle::new: called");
        Self {
            kind,
            epoch,
            close_tx: Some(close_tx),
            task: Some(task),
        }
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Whether the reader task is still running
    pub fn is_live(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Ask the reader task to shut the channel down
    ///
    /// Returns the reader task so callers can wait for the close frames to
    /// go out. Dropping the returned handle leaves the task running.
    pub fn close(mut self, mode: CloseMode) -> Option<JoinHandle<()>> {
        self.signal_close(mode);
        self.task.take()
    }

    fn signal_close(&mut self, mode: CloseMode) {
        if let Some(tx) = self.close_tx.take() {
            debug!(kind = %self.kind, epoch = self.epoch, ?mode, "ChannelHandle: closing");
            // The task may already have exited on a remote close
            let _ = tx.send(mode);
        }
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.signal_close(CloseMode::Retire);
    }
}
