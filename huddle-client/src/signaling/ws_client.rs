use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use huddle_core::SignalMessage;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::ClientError;
use crate::signaling::SignalingOutput;

/// WebSocket link to the hub. Outbound messages go through a queue drained by
/// a writer task; inbound frames are parsed by a reader task and delivered on
/// the receiver returned from [`WsSignalingClient::connect`].
pub struct WsSignalingClient {
    outbound: mpsc::UnboundedSender<SignalMessage>,
    reader: JoinHandle<()>,
}

impl WsSignalingClient {
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SignalMessage>), ClientError> {
        let (stream, _) = connect_async(url).await?;
        info!("Connected to hub at {}", url);

        let (mut sink, mut source) = stream.split();
        let (outbound, mut outbound_rx) = mpsc::unbounded_channel::<SignalMessage>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // Stops once every queued message is written and `outbound` is dropped.
        tokio::spawn(async move {
            while let Some(msg) = outbound_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize {}: {}", msg.kind(), e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    warn!("Hub link write failed: {}", e);
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<SignalMessage>(&text) {
                        Ok(msg) => {
                            debug!("Received {} from hub", msg.kind());
                            if inbound_tx.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Ignoring unparseable frame from hub: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Hub link read failed: {}", e);
                        break;
                    }
                }
            }
            info!("Hub link closed");
        });

        Ok((
            Self { outbound, reader },
            inbound_rx,
        ))
    }
}

impl Drop for WsSignalingClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl SignalingOutput for WsSignalingClient {
    async fn send_signal(&self, msg: SignalMessage) -> Result<(), ClientError> {
        self.outbound
            .send(msg)
            .map_err(|_| ClientError::SignalingClosed)
    }
}
