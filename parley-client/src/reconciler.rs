use crate::negotiation::{NegotiationEngine, should_initiate};
use parley_core::{ConnectionId, Participant};
use std::collections::HashSet;
use tracing::{debug, error};

/// What one reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub added: Vec<ConnectionId>,
    pub removed: Vec<ConnectionId>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps the engine's session table equal to the latest snapshot minus ourselves.
#[derive(Debug, Default)]
pub struct MembershipReconciler {
    latest: HashSet<ConnectionId>,
}

impl MembershipReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `peer` was in the last snapshot applied.
    pub fn is_member(&self, peer: &ConnectionId) -> bool {
        self.latest.contains(peer)
    }

    pub async fn reconcile(
        &mut self,
        engine: &mut NegotiationEngine,
        participants: &[Participant],
    ) -> Reconciliation {
        let local_id = engine.local_id().clone();
        let current: Vec<&ConnectionId> = participants
            .iter()
            .map(|p| &p.connection_id)
            .filter(|id| **id != local_id)
            .collect();
        self.latest = current.iter().map(|id| (*id).clone()).collect();

        let mut outcome = Reconciliation::default();

        for peer in engine.peers() {
            if !self.latest.contains(&peer) && engine.teardown(&peer).await {
                outcome.removed.push(peer);
            }
        }

        for peer in current {
            if engine.has_session(peer) {
                continue;
            }
            match engine
                .create_session(peer, should_initiate(&local_id, peer))
                .await
            {
                Ok(()) if engine.has_session(peer) => outcome.added.push(peer.clone()),
                Ok(()) => {}
                Err(e) => error!("Could not start session with {:?}: {}", peer, e),
            }
        }

        if !outcome.is_empty() {
            debug!(
                "Reconciled: +{} -{} ({} sessions)",
                outcome.added.len(),
                outcome.removed.len(),
                engine.session_count()
            );
        }
        outcome
    }
}
