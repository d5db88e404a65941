use crate::error::ClientError;
use async_trait::async_trait;
use parley_core::{ClientMessage, NegotiationPayload};
use tokio::sync::mpsc;

/// Outbound frames as the voice client produces them.
pub type OutboundMessage = ClientMessage<NegotiationPayload>;

/// Where the voice client writes frames meant for the relay.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ClientError>;
}

#[async_trait]
impl SignalSink for mpsc::UnboundedSender<OutboundMessage> {
    async fn send(&self, msg: OutboundMessage) -> Result<(), ClientError> {
        mpsc::UnboundedSender::send(self, msg).map_err(|_| ClientError::RelayClosed)
    }
}
