/// Per-peer handshake progress.
///
/// Initiators go `Idle -> Offering -> AwaitingAnswer -> Connected`, responders go
/// `Idle -> AwaitingOffer -> Answering -> Connected`. `Closed` is reachable from anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Idle,
    Offering,
    AwaitingAnswer,
    AwaitingOffer,
    Answering,
    Connected,
    Closed,
}

impl NegotiationState {
    /// True while our own offer is out and unanswered.
    pub fn has_pending_offer(self) -> bool {
        matches!(self, Self::Offering | Self::AwaitingAnswer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Initiator,
    Responder,
}

impl Role {
    pub fn from_initiate(initiate: bool) -> Self {
        if initiate {
            Self::Initiator
        } else {
            Self::Responder
        }
    }
}
