use anyhow::{Context, Result, bail};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parley_core::{ClientMessage, ConnectionId, Participant, RoomId, ServerMessage};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for a single frame to arrive (ms).
pub const FRAME_TIMEOUT_MS: u64 = 5000;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Raw WebSocket client speaking the relay protocol.
pub struct WsTestClient {
    pub connection_id: ConnectionId,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl WsTestClient {
    /// Connect and consume the `welcome` frame.
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .context("Failed to connect to relay")?;
        let (write, mut read) = stream.split();

        let connection_id = match next_frame(&mut read).await? {
            ServerMessage::Welcome { connection_id } => connection_id,
            other => bail!("Expected welcome, got {:?}", other),
        };

        Ok(Self {
            connection_id,
            write,
            read,
        })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.send_text(json).await
    }

    pub async fn send_text(&mut self, text: String) -> Result<()> {
        self.write.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn join(&mut self, room: &str, name: &str) -> Result<()> {
        self.send(&ClientMessage::JoinRoom {
            room_id: RoomId::from(room),
            user_id: format!("user-{}", name),
            display_name: name.to_string(),
        })
        .await
    }

    pub async fn recv(&mut self) -> Result<ServerMessage> {
        next_frame(&mut self.read).await
    }

    /// Skip frames until a membership snapshot arrives.
    pub async fn recv_members(&mut self) -> Result<(RoomId, Vec<Participant>)> {
        loop {
            if let ServerMessage::Members {
                room_id,
                participants,
            } = self.recv().await?
            {
                return Ok((room_id, participants));
            }
        }
    }

    /// Skip frames until a relayed signal arrives.
    pub async fn recv_signal(&mut self) -> Result<parley_core::Envelope<parley_core::RawPayload>> {
        loop {
            if let ServerMessage::Signal(envelope) = self.recv().await? {
                return Ok(envelope);
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.write.send(Message::Close(None)).await?;
        Ok(())
    }
}

async fn next_frame(read: &mut SplitStream<WsStream>) -> Result<ServerMessage> {
    loop {
        let frame = tokio::time::timeout(
            std::time::Duration::from_millis(FRAME_TIMEOUT_MS),
            read.next(),
        )
        .await
        .context("Timeout waiting for frame")?;

        match frame {
            Some(Ok(Message::Text(text))) => {
                return serde_json::from_str(&text).context("Invalid server frame");
            }
            Some(Ok(_)) => continue,
            Some(Err(e)) => bail!("WebSocket error: {}", e),
            None => bail!("WebSocket closed"),
        }
    }
}
