use crate::room::{MembershipService, RoomCommand};
use crate::signaling::SignalingOutput;
use parley_core::{ConnectionId, Participant, RoomId};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::error;

/// Cloneable front door to the membership actor.
#[derive(Clone)]
pub struct RoomManager {
    command_tx: mpsc::Sender<RoomCommand>,
}

impl RoomManager {
    /// Spawns the membership actor on the current runtime.
    pub fn spawn(signaling: Arc<dyn SignalingOutput>, buffer: usize) -> Self {
        let (command_tx, command_rx) = mpsc::channel(buffer);
        let service = MembershipService::new(command_rx, signaling);
        tokio::spawn(service.run());

        Self { command_tx }
    }

    pub async fn join(&self, room_id: RoomId, participant: Participant) {
        self.send(RoomCommand::Join {
            room_id,
            participant,
        })
        .await;
    }

    pub async fn leave(&self, room_id: RoomId, connection_id: ConnectionId) {
        self.send(RoomCommand::Leave {
            room_id,
            connection_id,
        })
        .await;
    }

    pub async fn disconnect(&self, connection_id: ConnectionId) {
        self.send(RoomCommand::Disconnect { connection_id }).await;
    }

    pub async fn join_text(&self, room_id: RoomId, connection_id: ConnectionId) {
        self.send(RoomCommand::JoinText {
            room_id,
            connection_id,
        })
        .await;
    }

    pub async fn leave_text(&self, room_id: RoomId, connection_id: ConnectionId) {
        self.send(RoomCommand::LeaveText {
            room_id,
            connection_id,
        })
        .await;
    }

    pub async fn typing(
        &self,
        room_id: RoomId,
        connection_id: ConnectionId,
        user_id: String,
        display_name: String,
        active: bool,
    ) {
        self.send(RoomCommand::Typing {
            room_id,
            connection_id,
            user_id,
            display_name,
            active,
        })
        .await;
    }

    /// Current participants of `room_id`; empty if the actor is gone.
    pub async fn members(&self, room_id: RoomId) -> Vec<Participant> {
        let (reply, rx) = oneshot::channel();
        self.send(RoomCommand::Members { room_id, reply }).await;
        rx.await.unwrap_or_default()
    }

    async fn send(&self, cmd: RoomCommand) {
        if let Err(e) = self.command_tx.send(cmd).await {
            error!("Membership service died: {}", e);
        }
    }
}
