//! Single owner of the push channels
//!
//! At most one channel is held at a time, so the planning and execution
//! streams cannot deliver concurrently.

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::handle::{ChannelHandle, CloseMode};
use super::{ChannelError, ChannelKind};

#[derive(Debug, Default)]
pub struct ConnectionOwner {
    current: Option<ChannelHandle>,
    retired: Option<ChannelKind>,
}

impl ConnectionOwner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a freshly connected channel
    ///
    /// Fails while a live channel of another kind is held; the rejected
    /// handle is retired when dropped.
    pub fn install(&mut self, handle: ChannelHandle) -> Result<(), ChannelError> {
        debug!(kind = %handle.kind(), epoch = handle.epoch(), "ConnectionOwner::install: called");
        if let Some(current) = self.current.as_ref().filter(|h| h.is_live()) {
            warn!(open = %current.kind(), requested = %handle.kind(), "refusing second live channel");
            return Err(ChannelError::Busy {
                open: current.kind(),
                requested: handle.kind(),
            });
        }
        info!(kind = %handle.kind(), "channel installed");
        self.current = Some(handle);
        Ok(())
    }

    /// Close the channel of `kind` without cancelling the backend task
    pub fn retire(&mut self, kind: ChannelKind) {
        debug!(%kind, "ConnectionOwner::retire: called");
        self.retired = Some(kind);
        if let Some(handle) = self.current.take_if(|h| h.kind() == kind) {
            let _ = handle.close(CloseMode::Retire);
        }
    }

    /// Cancel and close whatever is open; used on reset
    ///
    /// Returns the reader task of the cancelled channel, which finishes once
    /// the cancel frame has been sent.
    pub fn close_all(&mut self) -> Option<JoinHandle<()>> {
        debug!(has_channel = self.current.is_some(), "ConnectionOwner::close_all: called");
        self.retired = None;
        let handle = self.current.take()?;
        info!(kind = %handle.kind(), "closing channel");
        handle.close(CloseMode::Cancel)
    }

    /// Kind of the live channel, if any
    pub fn live_kind(&self) -> Option<ChannelKind> {
        self.current.as_ref().filter(|h| h.is_live()).map(ChannelHandle::kind)
    }

    /// Whether input from a channel of `kind` should still reach the reducer
    pub fn accepts(&self, kind: ChannelKind) -> bool {
        self.retired != Some(kind)
    }
}
