use crate::client::VoiceCommand;
use crate::error::ClientError;
use crate::negotiation::NegotiationState;
use parley_core::{ConnectionId, RoomId};
use tokio::sync::{mpsc, oneshot};

/// Cloneable front door to a running [`VoiceClient`](crate::VoiceClient).
#[derive(Clone)]
pub struct VoiceHandle {
    command_tx: mpsc::Sender<VoiceCommand>,
}

impl VoiceHandle {
    pub(crate) fn new(command_tx: mpsc::Sender<VoiceCommand>) -> Self {
        Self { command_tx }
    }

    /// Acquires local audio and joins `room_id`. Fails with
    /// [`ClientError::JoinFailed`] without announcing anything to the relay if audio is
    /// unavailable.
    pub async fn join(
        &self,
        room_id: impl Into<RoomId>,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(VoiceCommand::Join {
            room_id: room_id.into(),
            user_id: user_id.into(),
            display_name: display_name.into(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| ClientError::Stopped)?
    }

    pub async fn leave(&self) -> Result<(), ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(VoiceCommand::Leave { reply }).await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    pub async fn set_muted(&self, muted: bool) -> Result<(), ClientError> {
        self.send(VoiceCommand::SetMuted(muted)).await
    }

    pub async fn set_deafened(&self, deafened: bool) -> Result<(), ClientError> {
        self.send(VoiceCommand::SetDeafened(deafened)).await
    }

    pub async fn peers(&self) -> Result<Vec<(ConnectionId, NegotiationState)>, ClientError> {
        let (reply, rx) = oneshot::channel();
        self.send(VoiceCommand::Peers { reply }).await?;
        rx.await.map_err(|_| ClientError::Stopped)
    }

    async fn send(&self, cmd: VoiceCommand) -> Result<(), ClientError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| ClientError::Stopped)
    }
}
