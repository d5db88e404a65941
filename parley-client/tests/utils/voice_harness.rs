use anyhow::{Context, Result};
use parley_client::{InboundMessage, OutboundMessage, VoiceClient, VoiceEvent, VoiceHandle};
use parley_core::{
    ConnectionId, Envelope, NegotiationPayload, Participant, RoomId, ServerMessage,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use super::MockMedia;

/// Timeout for an event or frame to show up (ms).
pub const EVENT_TIMEOUT_MS: u64 = 2000;

/// A running voice client whose relay is played by the test.
pub struct VoiceHarness {
    pub voice: VoiceHandle,
    pub events: mpsc::UnboundedReceiver<VoiceEvent>,
    pub relay: mpsc::UnboundedSender<InboundMessage>,
    pub outbound: mpsc::UnboundedReceiver<OutboundMessage>,
    pub media: MockMedia,
}

impl VoiceHarness {
    pub fn spawn(media: MockMedia) -> Self {
        let (relay, relay_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound) = mpsc::unbounded_channel();
        let (voice, events) =
            VoiceClient::spawn(Arc::new(media.clone()), Arc::new(outbound_tx), relay_rx);

        Self {
            voice,
            events,
            relay,
            outbound,
            media,
        }
    }

    /// Plays the relay's welcome and waits until the client took it.
    pub async fn welcome(&mut self, connection_id: &str) -> Result<()> {
        self.relay.send(ServerMessage::Welcome {
            connection_id: ConnectionId::from(connection_id),
        })?;
        self.wait_for_event(|e| matches!(e, VoiceEvent::Ready { .. }))
            .await
            .map(|_| ())
    }

    /// Plays a snapshot and waits until the client reconciled it.
    pub async fn members(&mut self, room: &str, ids: &[&str]) -> Result<()> {
        self.relay.send(ServerMessage::Members {
            room_id: RoomId::from(room),
            participants: participants(ids),
        })?;
        self.wait_for_event(|e| matches!(e, VoiceEvent::MembersUpdated { .. }))
            .await
            .map(|_| ())
    }

    pub fn signal(&self, room: &str, from: &str, to: &str, payload: NegotiationPayload) -> Result<()> {
        self.relay.send(ServerMessage::Signal(Envelope {
            room_id: RoomId::from(room),
            target: ConnectionId::from(to),
            sender: ConnectionId::from(from),
            payload,
        }))?;
        Ok(())
    }

    /// Skips events until one matches.
    pub async fn wait_for_event(
        &mut self,
        matches: impl Fn(&VoiceEvent) -> bool,
    ) -> Result<VoiceEvent> {
        loop {
            let event = tokio::time::timeout(
                Duration::from_millis(EVENT_TIMEOUT_MS),
                self.events.recv(),
            )
            .await
            .context("Timeout waiting for voice event")?
            .context("Voice client stopped")?;
            if matches(&event) {
                return Ok(event);
            }
        }
    }

    pub async fn next_outbound(&mut self) -> Result<OutboundMessage> {
        tokio::time::timeout(
            Duration::from_millis(EVENT_TIMEOUT_MS),
            self.outbound.recv(),
        )
        .await
        .context("Timeout waiting for outbound frame")?
        .context("Outbound channel closed")
    }

    /// Skips outbound frames until a signal arrives.
    pub async fn next_signal(&mut self) -> Result<Envelope<NegotiationPayload>> {
        loop {
            if let parley_core::ClientMessage::Signal(envelope) = self.next_outbound().await? {
                return Ok(envelope);
            }
        }
    }
}

pub fn participants(ids: &[&str]) -> Vec<Participant> {
    ids.iter()
        .map(|id| Participant {
            connection_id: ConnectionId::from(*id),
            user_id: format!("user-{}", id),
            display_name: id.to_uppercase(),
        })
        .collect()
}
