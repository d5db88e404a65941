use crate::relay::OutboundMessage;
use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use parley_core::{NegotiationPayload, ServerMessage};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

/// Inbound frames as the voice client consumes them.
pub type InboundMessage = ServerMessage<NegotiationPayload>;

/// A live WebSocket to the relay, split into two channels.
///
/// `incoming` closes when the socket does; dropping `outgoing` closes the socket.
pub struct RelayLink {
    pub outgoing: mpsc::UnboundedSender<OutboundMessage>,
    pub incoming: mpsc::UnboundedReceiver<InboundMessage>,
}

impl RelayLink {
    pub async fn connect(url: &str) -> Result<Self> {
        let (stream, _) = connect_async(url)
            .await
            .with_context(|| format!("Failed to connect to relay at {}", url))?;
        info!("Connected to relay at {}", url);

        let (mut write, mut read) = stream.split();
        let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (incoming_tx, incoming) = mpsc::unbounded_channel::<InboundMessage>();

        tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        error!("Failed to serialize client message: {}", e);
                        continue;
                    }
                };
                if write.send(Message::Text(json.into())).await.is_err() {
                    break;
                }
            }
            let _ = write.send(Message::Close(None)).await;
            debug!("Relay writer finished");
        });

        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<InboundMessage>(&text) {
                            Ok(msg) => {
                                if incoming_tx.send(msg).is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!("Invalid frame from relay: {}", e),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Relay socket error: {}", e);
                        break;
                    }
                }
            }
            info!("Relay connection closed");
        });

        Ok(Self { outgoing, incoming })
    }
}
