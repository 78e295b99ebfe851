//! WebSocket transport for push channels

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::handle::{ChannelHandle, CloseMode};
use super::{ChannelError, ChannelKind, PushConnector, decode_frame};
use crate::protocol::CancelFrame;
use crate::runtime::Signal;
use crate::workflow::Input;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connects push channels over WebSocket
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

impl WsConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PushConnector for WsConnector {
    async fn connect(
        &self,
        kind: ChannelKind,
        url: &str,
        epoch: u64,
        tx: mpsc::UnboundedSender<Signal>,
    ) -> Result<ChannelHandle, ChannelError> {
        debug!(%kind, %url, epoch, "WsConnector::connect: called");
        let (stream, response) = connect_async(url).await.map_err(|e| ChannelError::Connect {
            kind,
            source: Box::new(e),
        })?;
        info!(%kind, %url, status = %response.status(), "channel connected");

        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(pump(kind, epoch, stream, close_rx, tx));
        Ok(ChannelHandle::new(kind, epoch, close_tx, task))
    }
}

/// Reader loop: forwards decoded frames until the remote closes or the
/// handle asks to close
async fn pump(
    kind: ChannelKind,
    epoch: u64,
    stream: WsStream,
    mut close_rx: oneshot::Receiver<CloseMode>,
    tx: mpsc::UnboundedSender<Signal>,
) {
    debug!(%kind, epoch, "pump: started");
    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            mode = &mut close_rx => {
                let mode = mode.unwrap_or(CloseMode::Retire);
                debug!(%kind, ?mode, "pump: close requested");
                if mode == CloseMode::Cancel {
                    if let Err(e) = write.send(Message::Text(CancelFrame::new().to_text())).await {
                        debug!(%kind, error = %e, "pump: cancel frame not delivered");
                    }
                }
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => forward(kind, epoch, &text, &tx),
                Some(Ok(Message::Binary(bytes))) => forward(kind, epoch, &String::from_utf8_lossy(&bytes), &tx),
                Some(Ok(Message::Close(_))) | None => {
                    info!(%kind, "channel closed by remote");
                    let _ = tx.send(Signal::Input(Input::ChannelClosed { epoch, kind }));
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    warn!(%kind, error = %e, "channel failed");
                    let _ = tx.send(Signal::Input(Input::ChannelFailed {
                        epoch,
                        kind,
                        reason: e.to_string(),
                    }));
                    break;
                }
            }
        }
    }
    debug!(%kind, epoch, "pump: exiting");
}

fn forward(kind: ChannelKind, epoch: u64, text: &str, tx: &mpsc::UnboundedSender<Signal>) {
    match decode_frame(kind, epoch, text) {
        Ok(input) => {
            if tx.send(Signal::Input(input)).is_err() {
                debug!(%kind, "forward: runtime queue closed");
            }
        }
        Err(e) => warn!(%kind, error = %e, "dropping undecodable frame"),
    }
}
