use crate::media::{MediaSession, SessionTag};
use crate::negotiation::{NegotiationState, Role};
use anyhow::Result;
use parley_core::{ConnectionId, IceCandidate, SessionDescription};
use tracing::{debug, warn};

/// Everything held for one remote participant.
pub struct PeerSession {
    pub peer: ConnectionId,
    pub tag: SessionTag,
    pub role: Role,
    pub state: NegotiationState,
    media: Box<dyn MediaSession>,
    pending_candidates: Vec<IceCandidate>,
    remote_description_set: bool,
}

impl PeerSession {
    pub fn new(peer: ConnectionId, tag: SessionTag, role: Role, media: Box<dyn MediaSession>) -> Self {
        Self {
            peer,
            tag,
            role,
            state: NegotiationState::Idle,
            media,
            pending_candidates: Vec::new(),
            remote_description_set: false,
        }
    }

    pub fn media(&self) -> &dyn MediaSession {
        self.media.as_ref()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Applies the remote description, then any candidates that arrived before it.
    pub async fn apply_remote_description(&mut self, description: SessionDescription) -> Result<()> {
        self.media.set_remote_description(description).await?;
        self.remote_description_set = true;

        let pending = std::mem::take(&mut self.pending_candidates);
        if !pending.is_empty() {
            debug!(
                "Flushing {} buffered candidates for {:?}",
                pending.len(),
                self.peer
            );
        }
        for candidate in pending {
            self.apply_candidate(candidate).await;
        }
        Ok(())
    }

    /// Applies a remote candidate, or holds it until the remote description is set.
    pub async fn add_candidate(&mut self, candidate: IceCandidate) {
        if self.remote_description_set {
            self.apply_candidate(candidate).await;
        } else {
            debug!("Buffering early candidate from {:?}", self.peer);
            self.pending_candidates.push(candidate);
        }
    }

    async fn apply_candidate(&self, candidate: IceCandidate) {
        if let Err(e) = self.media.add_ice_candidate(candidate).await {
            warn!("Failed to apply candidate from {:?}: {:#}", self.peer, e);
        }
    }

    pub async fn close(mut self) {
        self.pending_candidates.clear();
        self.media.close().await;
        self.state = NegotiationState::Closed;
        debug!("Session {} for {:?} is {:?}", self.tag, self.peer, self.state);
    }
}
