use crate::signaling::SignalingOutput;
use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::{ConnectionId, Envelope, IceServerConfig, RawPayload, ServerMessage};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error};

struct SignalingInner {
    connections: DashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>,
    ice_servers: Vec<IceServerConfig>,
}

/// Table of attached connections and the relay between them.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(ice_servers: Vec<IceServerConfig>) -> Self {
        Self {
            inner: Arc::new(SignalingInner {
                connections: DashMap::new(),
                ice_servers,
            }),
        }
    }

    pub fn ice_servers(&self) -> Vec<IceServerConfig> {
        self.inner.ice_servers.clone()
    }

    pub fn attach(&self, connection_id: ConnectionId, tx: mpsc::UnboundedSender<ServerMessage>) {
        self.inner.connections.insert(connection_id, tx);
    }

    pub fn detach(&self, connection_id: &ConnectionId) {
        self.inner.connections.remove(connection_id);
    }

    pub fn is_attached(&self, connection_id: &ConnectionId) -> bool {
        self.inner.connections.contains_key(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Queues a frame for one connection. Returns `false` if it is not attached.
    pub fn send_signal(&self, connection_id: &ConnectionId, msg: ServerMessage) -> bool {
        let Some(peer) = self.inner.connections.get(connection_id) else {
            debug!("Dropping frame for detached connection {:?}", connection_id);
            return false;
        };
        if let Err(e) = peer.send(msg) {
            error!("Failed to queue frame for {:?}: {}", connection_id, e);
            return false;
        }
        true
    }

    /// Forwards a negotiation envelope to its target. The payload is passed through
    /// untouched; only the sender field is overwritten with the real origin. A target
    /// that is not attached means the message is silently dropped.
    pub fn relay(&self, sender: &ConnectionId, mut envelope: Envelope<RawPayload>) {
        envelope.sender = sender.clone();
        let target = envelope.target.clone();

        if !self.send_signal(&target, ServerMessage::Signal(envelope)) {
            debug!(
                "Relay from {:?} to {:?} dropped: target not attached",
                sender, target
            );
        }
    }
}

#[async_trait]
impl SignalingOutput for SignalingService {
    async fn deliver(&self, connection_id: &ConnectionId, msg: ServerMessage) {
        self.send_signal(connection_id, msg);
    }
}
