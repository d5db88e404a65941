use crate::error::ClientError;
use crate::media::{MediaBackend, MediaEvent, MediaEventKind, MediaState, SessionTag};
use crate::negotiation::{NegotiationState, PeerSession, Role, should_initiate};
use crate::relay::SignalSink;
use parley_core::{
    ClientMessage, ConnectionId, Envelope, IceCandidate, NegotiationPayload, RoomId, SdpKind,
    SessionDescription,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Drives the offer/answer/candidate handshake with every remote participant of one
/// room. The session table is the single owner of per-peer media resources, and
/// [`NegotiationEngine::teardown`] is the only way they are released.
pub struct NegotiationEngine {
    local_id: ConnectionId,
    room_id: RoomId,
    media: Arc<dyn MediaBackend>,
    sink: Arc<dyn SignalSink>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
    sessions: HashMap<ConnectionId, PeerSession>,
    next_tag: u64,
}

impl NegotiationEngine {
    pub fn new(
        local_id: ConnectionId,
        room_id: RoomId,
        media: Arc<dyn MediaBackend>,
        sink: Arc<dyn SignalSink>,
        media_tx: mpsc::UnboundedSender<MediaEvent>,
    ) -> Self {
        Self {
            local_id,
            room_id,
            media,
            sink,
            media_tx,
            sessions: HashMap::new(),
            next_tag: 0,
        }
    }

    pub fn local_id(&self) -> &ConnectionId {
        &self.local_id
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn has_session(&self, peer: &ConnectionId) -> bool {
        self.sessions.contains_key(peer)
    }

    pub fn state(&self, peer: &ConnectionId) -> Option<NegotiationState> {
        self.sessions.get(peer).map(|s| s.state)
    }

    pub fn role(&self, peer: &ConnectionId) -> Option<Role> {
        self.sessions.get(peer).map(|s| s.role)
    }

    pub fn pending_candidates(&self, peer: &ConnectionId) -> usize {
        self.sessions
            .get(peer)
            .map(|s| s.pending_candidates())
            .unwrap_or(0)
    }

    /// Peers with a live session, in no particular order.
    pub fn peers(&self) -> Vec<ConnectionId> {
        self.sessions.keys().cloned().collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Opens a session with `peer`. Does nothing if one already exists. An initiator
    /// sends its offer right away; a responder waits for one.
    pub async fn create_session(
        &mut self,
        peer: &ConnectionId,
        initiate: bool,
    ) -> Result<(), ClientError> {
        if self.sessions.contains_key(peer) {
            debug!("Session with {:?} already exists", peer);
            return Ok(());
        }
        if peer == &self.local_id {
            warn!("Refusing to open a session with ourselves");
            return Ok(());
        }

        self.next_tag += 1;
        let tag = SessionTag(self.next_tag);
        let media = self
            .media
            .create_session(peer, tag, self.media_tx.clone())
            .await
            .map_err(|e| ClientError::media(peer, e))?;

        let role = Role::from_initiate(initiate);
        let mut session = PeerSession::new(peer.clone(), tag, role, media);
        info!("Session {} with {:?} created as {:?}", tag, peer, role);

        match role {
            Role::Responder => {
                session.state = NegotiationState::AwaitingOffer;
                self.sessions.insert(peer.clone(), session);
            }
            Role::Initiator => {
                session.state = NegotiationState::Offering;
                self.sessions.insert(peer.clone(), session);
                if let Err(e) = self.send_offer(peer).await {
                    self.teardown(peer).await;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    async fn send_offer(&mut self, peer: &ConnectionId) -> Result<(), ClientError> {
        let Some(session) = self.sessions.get_mut(peer) else {
            return Ok(());
        };

        let offer = session
            .media()
            .create_offer()
            .await
            .map_err(|e| ClientError::media(peer, e))?;
        session
            .media()
            .set_local_description(offer.clone())
            .await
            .map_err(|e| ClientError::media(peer, e))?;
        session.state = NegotiationState::AwaitingAnswer;

        debug!("Sending offer to {:?}", peer);
        self.send(peer, NegotiationPayload::description(offer)).await
    }

    /// Handles the payload of one relayed envelope from `from`.
    pub async fn handle_payload(&mut self, from: &ConnectionId, payload: NegotiationPayload) {
        let NegotiationPayload {
            description,
            candidate,
        } = payload;

        if description.is_none() && candidate.is_none() {
            warn!("Empty negotiation message from {:?}, dropped", from);
            return;
        }
        if let Some(description) = description {
            self.handle_description(from, description).await;
        }
        if let Some(candidate) = candidate {
            self.handle_candidate(from, candidate).await;
        }
    }

    pub async fn handle_description(&mut self, from: &ConnectionId, description: SessionDescription) {
        let Some(state) = self.state(from) else {
            warn!("Description from {:?} without a session, dropped", from);
            return;
        };

        match description.kind {
            SdpKind::Offer => {
                if state.has_pending_offer() {
                    if should_initiate(&self.local_id, from) {
                        info!("Glare with {:?}: keeping our offer", from);
                        return;
                    }
                    info!("Glare with {:?}: withdrawing our offer", from);
                    self.teardown(from).await;
                    if let Err(e) = self.create_session(from, false).await {
                        error!("Could not recreate session with {:?}: {}", from, e);
                        return;
                    }
                }

                if let Err(e) = self.answer(from, description).await {
                    error!("Answering {:?} failed: {}", from, e);
                    self.teardown(from).await;
                }
            }

            SdpKind::Answer => {
                if state != NegotiationState::AwaitingAnswer {
                    warn!(
                        "Unexpected answer from {:?} in state {:?}, dropped",
                        from, state
                    );
                    return;
                }
                let Some(session) = self.sessions.get_mut(from) else {
                    return;
                };

                let applied = session.apply_remote_description(description).await;
                match applied {
                    Ok(()) => {
                        session.state = NegotiationState::Connected;
                        info!("Negotiation with {:?} complete", from);
                    }
                    Err(e) => {
                        error!("Applying answer from {:?} failed: {:#}", from, e);
                        self.teardown(from).await;
                    }
                }
            }
        }
    }

    async fn answer(
        &mut self,
        from: &ConnectionId,
        offer: SessionDescription,
    ) -> Result<(), ClientError> {
        let Some(session) = self.sessions.get_mut(from) else {
            return Ok(());
        };

        session.state = NegotiationState::Answering;
        session
            .apply_remote_description(offer)
            .await
            .map_err(|e| ClientError::media(from, e))?;
        let answer = session
            .media()
            .create_answer()
            .await
            .map_err(|e| ClientError::media(from, e))?;
        session
            .media()
            .set_local_description(answer.clone())
            .await
            .map_err(|e| ClientError::media(from, e))?;
        session.state = NegotiationState::Connected;

        debug!("Sending answer to {:?}", from);
        self.send(from, NegotiationPayload::description(answer)).await?;
        info!("Negotiation with {:?} complete", from);
        Ok(())
    }

    pub async fn handle_candidate(&mut self, from: &ConnectionId, candidate: IceCandidate) {
        let Some(session) = self.sessions.get_mut(from) else {
            warn!("Candidate from {:?} without a session, dropped", from);
            return;
        };
        session.add_candidate(candidate).await;
    }

    /// Acts on an event from a media session. Local candidates are sent to the peer;
    /// anything else belonging to a live session is handed back to the caller.
    pub async fn handle_media_event(&mut self, event: MediaEvent) -> Option<MediaEventKind> {
        let current = self.sessions.get(&event.peer).map(|s| s.tag);
        if current != Some(event.session) {
            debug!(
                "Stale media event for {:?} session {}, ignored",
                event.peer, event.session
            );
            return None;
        }

        match event.kind {
            MediaEventKind::LocalCandidate(candidate) => {
                if let Err(e) = self
                    .send(&event.peer, NegotiationPayload::candidate(candidate))
                    .await
                {
                    warn!("Failed to send candidate to {:?}: {}", event.peer, e);
                }
                None
            }
            MediaEventKind::StateChanged(MediaState::Failed) => {
                warn!("Media connection with {:?} failed", event.peer);
                Some(MediaEventKind::StateChanged(MediaState::Failed))
            }
            other => Some(other),
        }
    }

    /// Closes and forgets the session with `peer`. Returns `false` if there was none.
    pub async fn teardown(&mut self, peer: &ConnectionId) -> bool {
        let Some(session) = self.sessions.remove(peer) else {
            return false;
        };
        info!("Tearing down session with {:?}", peer);
        session.close().await;
        true
    }

    pub async fn teardown_all(&mut self) {
        for peer in self.peers() {
            self.teardown(&peer).await;
        }
    }

    async fn send(&self, peer: &ConnectionId, payload: NegotiationPayload) -> Result<(), ClientError> {
        self.sink
            .send(ClientMessage::Signal(Envelope {
                room_id: self.room_id.clone(),
                target: peer.clone(),
                sender: self.local_id.clone(),
                payload,
            }))
            .await
    }
}
