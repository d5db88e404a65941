use crate::client::{VoiceCommand, VoiceEvent, VoiceHandle};
use crate::error::ClientError;
use crate::media::{MediaBackend, MediaEvent, MediaEventKind};
use crate::negotiation::{NegotiationEngine, NegotiationState};
use crate::reconciler::MembershipReconciler;
use crate::relay::{InboundMessage, SignalSink};
use parley_core::{
    ClientMessage, ConnectionId, Envelope, NegotiationPayload, Participant, RoomId, ServerMessage,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 32;

struct ActiveRoom {
    room_id: RoomId,
    engine: NegotiationEngine,
    reconciler: MembershipReconciler,
}

/// Client-side actor. Owns the voice room the user is in and every peer session in it,
/// and processes relay frames, media events and user commands one at a time.
pub struct VoiceClient {
    media: Arc<dyn MediaBackend>,
    sink: Arc<dyn SignalSink>,
    command_rx: mpsc::Receiver<VoiceCommand>,
    relay_rx: mpsc::UnboundedReceiver<InboundMessage>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
    media_rx: mpsc::UnboundedReceiver<MediaEvent>,
    event_tx: mpsc::UnboundedSender<VoiceEvent>,
    local_id: Option<ConnectionId>,
    active: Option<ActiveRoom>,
    muted: bool,
    deafened: bool,
}

impl VoiceClient {
    /// Starts the actor on the current runtime. It stops when the relay channel closes
    /// or every handle is dropped, leaving the room on the way out.
    pub fn spawn(
        media: Arc<dyn MediaBackend>,
        sink: Arc<dyn SignalSink>,
        relay_rx: mpsc::UnboundedReceiver<InboundMessage>,
    ) -> (VoiceHandle, mpsc::UnboundedReceiver<VoiceEvent>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let client = Self {
            media,
            sink,
            command_rx,
            relay_rx,
            media_tx,
            media_rx,
            event_tx,
            local_id: None,
            active: None,
            muted: false,
            deafened: false,
        };
        tokio::spawn(client.run());

        (VoiceHandle::new(command_tx), event_rx)
    }

    async fn run(mut self) {
        info!("Voice client started");

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => break,
                },
                msg = self.relay_rx.recv() => match msg {
                    Some(msg) => self.handle_relay(msg).await,
                    None => {
                        warn!("Relay link closed");
                        break;
                    }
                },
                Some(event) = self.media_rx.recv() => self.handle_media(event).await,
            }
        }

        self.leave_room(false).await;
        info!("Voice client finished");
    }

    async fn handle_command(&mut self, cmd: VoiceCommand) {
        match cmd {
            VoiceCommand::Join {
                room_id,
                user_id,
                display_name,
                reply,
            } => {
                let result = self.join(room_id, user_id, display_name).await;
                let _ = reply.send(result);
            }

            VoiceCommand::Leave { reply } => {
                self.leave_room(true).await;
                let _ = reply.send(());
            }

            VoiceCommand::SetMuted(muted) => {
                info!("Microphone {}", if muted { "muted" } else { "live" });
                self.muted = muted;
                self.media.set_microphone_enabled(!muted);
            }

            VoiceCommand::SetDeafened(deafened) => {
                info!("Playback {}", if deafened { "deafened" } else { "on" });
                self.deafened = deafened;
                self.media.set_playback_enabled(!deafened);
            }

            VoiceCommand::Peers { reply } => {
                let mut peers: Vec<(ConnectionId, NegotiationState)> = match &self.active {
                    Some(active) => active
                        .engine
                        .peers()
                        .into_iter()
                        .filter_map(|peer| {
                            let state = active.engine.state(&peer)?;
                            Some((peer, state))
                        })
                        .collect(),
                    None => Vec::new(),
                };
                peers.sort_by(|a, b| a.0.cmp(&b.0));
                let _ = reply.send(peers);
            }
        }
    }

    async fn join(
        &mut self,
        room_id: RoomId,
        user_id: String,
        display_name: String,
    ) -> Result<(), ClientError> {
        let Some(local_id) = self.local_id.clone() else {
            return Err(ClientError::NotConnected);
        };
        if let Some(active) = &self.active {
            if active.room_id == room_id {
                // Same room: the relay overwrites our entry, sessions stay up.
                debug!("Re-announcing in voice room '{}'", room_id);
                return self
                    .sink
                    .send(ClientMessage::JoinRoom {
                        room_id,
                        user_id,
                        display_name,
                    })
                    .await;
            }
            self.leave_room(true).await;
        }

        if let Err(e) = self.media.acquire_local_audio().await {
            error!("Could not acquire local audio: {:#}", e);
            return Err(ClientError::JoinFailed(format!("{:#}", e)));
        }
        self.media.set_microphone_enabled(!self.muted);
        self.media.set_playback_enabled(!self.deafened);

        self.active = Some(ActiveRoom {
            room_id: room_id.clone(),
            engine: NegotiationEngine::new(
                local_id,
                room_id.clone(),
                self.media.clone(),
                self.sink.clone(),
                self.media_tx.clone(),
            ),
            reconciler: MembershipReconciler::new(),
        });

        let announced = self
            .sink
            .send(ClientMessage::JoinRoom {
                room_id: room_id.clone(),
                user_id,
                display_name,
            })
            .await;
        if let Err(e) = announced {
            self.active = None;
            self.media.release_local_audio().await;
            return Err(e);
        }

        info!("Joined voice room '{}'", room_id);
        self.emit(VoiceEvent::Joined { room_id });
        Ok(())
    }

    /// Tears down every session and releases local audio. `announce` also tells the
    /// relay, which is pointless once the link is gone.
    async fn leave_room(&mut self, announce: bool) {
        let Some(mut active) = self.active.take() else {
            return;
        };

        active.engine.teardown_all().await;
        if announce {
            let leave = ClientMessage::LeaveRoom {
                room_id: active.room_id.clone(),
            };
            if let Err(e) = self.sink.send(leave).await {
                warn!("Could not announce leaving '{}': {}", active.room_id, e);
            }
        }
        self.media.release_local_audio().await;

        info!("Left voice room '{}'", active.room_id);
        self.emit(VoiceEvent::Left {
            room_id: active.room_id,
        });
    }

    async fn handle_relay(&mut self, msg: InboundMessage) {
        match msg {
            ServerMessage::Welcome { connection_id } => {
                info!("Relay assigned connection id {:?}", connection_id);
                self.local_id = Some(connection_id.clone());
                self.emit(VoiceEvent::Ready { connection_id });
            }

            ServerMessage::IceConfig { ice_servers } => {
                self.media.set_ice_servers(ice_servers).await;
            }

            ServerMessage::Members {
                room_id,
                participants,
            } => self.on_members(room_id, participants).await,

            ServerMessage::Signal(envelope) => self.on_signal(envelope).await,

            ServerMessage::TypingStart { room_id, .. } | ServerMessage::TypingStop { room_id, .. } => {
                debug!("Typing indicator for '{}' ignored", room_id);
            }
        }
    }

    async fn on_members(&mut self, room_id: RoomId, participants: Vec<Participant>) {
        let Some(active) = self.active.as_mut() else {
            debug!("Snapshot for '{}' while not in voice, ignored", room_id);
            return;
        };
        if active.room_id != room_id {
            debug!("Snapshot for other room '{}' ignored", room_id);
            return;
        }

        let outcome = active
            .reconciler
            .reconcile(&mut active.engine, &participants)
            .await;

        self.emit(VoiceEvent::MembersUpdated { participants });
        for peer in outcome.removed {
            self.emit(VoiceEvent::PeerLeft { peer });
        }
    }

    async fn on_signal(&mut self, envelope: Envelope<NegotiationPayload>) {
        let Some(active) = self.active.as_mut() else {
            warn!("Signal from {:?} while not in voice, dropped", envelope.sender);
            return;
        };
        if envelope.room_id != active.room_id {
            warn!(
                "Signal for room '{}' while in '{}', dropped",
                envelope.room_id, active.room_id
            );
            return;
        }
        if &envelope.target != active.engine.local_id() {
            warn!("Signal addressed to {:?}, dropped", envelope.target);
            return;
        }

        let from = envelope.sender;
        if !active.engine.has_session(&from) {
            if !active.reconciler.is_member(&from) {
                warn!("Signal from non-member {:?}, dropped", from);
                return;
            }
            if let Err(e) = active.engine.create_session(&from, false).await {
                error!("Could not open session for {:?}: {}", from, e);
                return;
            }
        }

        let before = active.engine.state(&from);
        active.engine.handle_payload(&from, envelope.payload).await;
        let after = active.engine.state(&from);

        if after == Some(NegotiationState::Connected) && before != after {
            self.emit(VoiceEvent::PeerConnected { peer: from });
        }
    }

    async fn handle_media(&mut self, event: MediaEvent) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let peer = event.peer.clone();
        match active.engine.handle_media_event(event).await {
            Some(MediaEventKind::RemoteTrack { track_id }) => {
                self.emit(VoiceEvent::RemoteTrack { peer, track_id });
            }
            Some(MediaEventKind::StateChanged(state)) => {
                debug!("Media state with {:?}: {:?}", peer, state);
            }
            _ => {}
        }
    }

    fn emit(&self, event: VoiceEvent) {
        let _ = self.event_tx.send(event);
    }
}
