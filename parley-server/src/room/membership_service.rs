use crate::room::room_command::RoomCommand;
use crate::room::room_membership::{RoomMembership, Snapshot};
use crate::room::text_channels::TextChannels;
use crate::signaling::SignalingOutput;
use parley_core::ServerMessage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Membership actor. It is the only owner of the room membership set; everything
/// else talks to it through [`RoomCommand`]s.
pub struct MembershipService {
    membership: RoomMembership,
    text: TextChannels,
    command_rx: mpsc::Receiver<RoomCommand>,
    signaling: Arc<dyn SignalingOutput>,
}

impl MembershipService {
    pub fn new(command_rx: mpsc::Receiver<RoomCommand>, signaling: Arc<dyn SignalingOutput>) -> Self {
        Self {
            membership: RoomMembership::new(),
            text: TextChannels::new(),
            command_rx,
            signaling,
        }
    }

    /// Event loop; runs until every command sender is dropped.
    pub async fn run(mut self) {
        info!("Membership service started");

        while let Some(cmd) = self.command_rx.recv().await {
            self.handle_command(cmd).await;
        }

        info!("Command channel closed. Membership service finished.");
    }

    async fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join {
                room_id,
                participant,
            } => {
                info!(
                    "Connection {:?} joins voice room '{}' as '{}'",
                    participant.connection_id, room_id, participant.display_name
                );
                let snapshot = self.membership.join(room_id, participant);
                self.publish(snapshot).await;
            }

            RoomCommand::Leave {
                room_id,
                connection_id,
            } => {
                let Some(snapshot) = self.membership.leave(&room_id, &connection_id) else {
                    debug!(
                        "Leave for {:?} ignored: not in room '{}'",
                        connection_id, room_id
                    );
                    return;
                };
                info!("Connection {:?} left voice room '{}'", connection_id, room_id);
                self.publish(snapshot).await;
            }

            RoomCommand::Disconnect { connection_id } => {
                self.text.forget(&connection_id);
                for snapshot in self.membership.disconnect_all(&connection_id) {
                    info!(
                        "Disconnected {:?} removed from voice room '{}'",
                        connection_id, snapshot.room_id
                    );
                    self.publish(snapshot).await;
                }
            }

            RoomCommand::JoinText {
                room_id,
                connection_id,
            } => self.text.subscribe(room_id, connection_id),

            RoomCommand::LeaveText {
                room_id,
                connection_id,
            } => self.text.unsubscribe(&room_id, &connection_id),

            RoomCommand::Typing {
                room_id,
                connection_id,
                user_id,
                display_name,
                active,
            } => {
                let msg = if active {
                    ServerMessage::TypingStart {
                        room_id: room_id.clone(),
                        user_id,
                        display_name,
                    }
                } else {
                    ServerMessage::TypingStop {
                        room_id: room_id.clone(),
                        user_id,
                        display_name,
                    }
                };
                for target in self.text.others(&room_id, &connection_id) {
                    self.signaling.deliver(&target, msg.clone()).await;
                }
            }

            RoomCommand::Members { room_id, reply } => {
                let _ = reply.send(self.membership.snapshot(&room_id).participants);
            }
        }
    }

    async fn publish(&self, snapshot: Snapshot) {
        debug!(
            "Publishing snapshot of '{}' ({} participants)",
            snapshot.room_id,
            snapshot.participants.len()
        );

        let msg = ServerMessage::Members {
            room_id: snapshot.room_id.clone(),
            participants: snapshot.participants.clone(),
        };
        for connection_id in snapshot.recipients() {
            self.signaling.deliver(connection_id, msg.clone()).await;
        }
    }
}
