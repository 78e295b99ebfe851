//! Push channels
//!
//! A push channel is a WebSocket the backend streams typed progress events
//! over. The `PushConnector` trait is the seam between the runtime and the
//! transport; `WsConnector` is the tokio-tungstenite implementation.
//!
//! Each connected channel runs a reader task that decodes frames into
//! workflow inputs tagged with the attempt epoch and forwards them to the
//! runtime's signal queue.

mod handle;
mod owner;
mod ws;

pub use handle::{ChannelHandle, CloseMode};
pub use owner::ConnectionOwner;
pub use ws::WsConnector;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::protocol::{ExecutionEvent, PlanningEvent, ProtocolError, WireMessage};
use crate::runtime::Signal;
use crate::workflow::Input;

/// Which of the two push channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Planning,
    Execution,
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planning => write!(f, "planning"),
            Self::Execution => write!(f, "execution"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Failed to connect {kind} channel: {source}")]
    Connect {
        kind: ChannelKind,
        #[source]
        source: Box<tokio_tungstenite::tungstenite::Error>,
    },

    #[error("Cannot open {requested} channel while the {open} channel is live")]
    Busy { open: ChannelKind, requested: ChannelKind },
}

/// Opens push channels
#[async_trait]
pub trait PushConnector: Send + Sync {
    /// Connect to `url` and start forwarding decoded events to `tx`
    ///
    /// Returns once the connection is established; frames are forwarded by a
    /// background task owned by the returned handle.
    async fn connect(
        &self,
        kind: ChannelKind,
        url: &str,
        epoch: u64,
        tx: mpsc::UnboundedSender<Signal>,
    ) -> Result<ChannelHandle, ChannelError>;
}

/// Decode one text frame from a channel of `kind` into a workflow input
pub fn decode_frame(kind: ChannelKind, epoch: u64, text: &str) -> Result<Input, ProtocolError> {
    let msg = WireMessage::parse(text)?;
    let input = match kind {
        ChannelKind::Planning => Input::Planning {
            epoch,
            event: PlanningEvent::decode(msg)?,
        },
        ChannelKind::Execution => Input::Execution {
            epoch,
            event: ExecutionEvent::decode(msg)?,
        },
    };
    Ok(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_frame_by_kind() {
        let input = decode_frame(ChannelKind::Planning, 3, r#"{"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(
            input,
            Input::Planning {
                epoch: 3,
                event: PlanningEvent::Error {
                    message: Some("boom".to_string())
                }
            }
        );

        let input = decode_frame(ChannelKind::Execution, 3, r#"{"type":"error","message":"boom"}"#).unwrap();
        assert!(matches!(
            input,
            Input::Execution {
                epoch: 3,
                event: ExecutionEvent::Error { .. }
            }
        ));
    }

    #[test]
    fn test_decode_frame_rejects_garbage() {
        assert!(decode_frame(ChannelKind::Planning, 1, "{").is_err());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ChannelKind::Planning.to_string(), "planning");
        assert_eq!(ChannelKind::Execution.to_string(), "execution");
    }
}
