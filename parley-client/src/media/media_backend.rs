use crate::media::{MediaEvent, SessionTag};
use anyhow::Result;
use async_trait::async_trait;
use parley_core::{ConnectionId, IceCandidate, IceServerConfig, SessionDescription};
use tokio::sync::mpsc;

/// Everything the voice client needs from the media stack.
///
/// Implementations push asynchronous happenings (local candidates, remote tracks,
/// connection state) into the `events` channel handed to [`MediaBackend::create_session`],
/// tagged with the session they belong to.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    async fn set_ice_servers(&self, ice_servers: Vec<IceServerConfig>);

    async fn acquire_local_audio(&self) -> Result<()>;

    async fn release_local_audio(&self);

    /// New peer session with the local audio already attached.
    async fn create_session(
        &self,
        peer: &ConnectionId,
        tag: SessionTag,
        events: mpsc::UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSession>>;

    /// Mute switch. Affects every session, existing and future.
    fn set_microphone_enabled(&self, enabled: bool);

    /// Deafen switch. Affects every session, existing and future.
    fn set_playback_enabled(&self, enabled: bool);
}

/// One peer-to-peer media session.
#[async_trait]
pub trait MediaSession: Send + Sync {
    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_local_description(&self, description: SessionDescription) -> Result<()>;

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()>;

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self);
}
