use crate::media::{MediaBackend, MediaEvent, MediaEventKind, MediaSession, MediaState, SessionTag};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use parley_core::utils::DEFAULT_STUN_ADDR;
use parley_core::{ConnectionId, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MediaEngine};
use webrtc::api::{API, APIBuilder};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::media::Sample;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
#[cfg(test)]
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

/// Audio received from one peer, as raw RTP payload.
#[derive(Debug, Clone)]
pub struct RemoteAudio {
    pub peer: ConnectionId,
    pub payload: Bytes,
}

/// webrtc-rs media backend. One opus track is shared by every peer session; capture is
/// fed in from outside through [`WebRtcBackend::write_sample`].
pub struct WebRtcBackend {
    api: API,
    ice_servers: RwLock<Vec<IceServerConfig>>,
    local_track: RwLock<Option<Arc<TrackLocalStaticSample>>>,
    microphone: Arc<AtomicBool>,
    playback: Arc<AtomicBool>,
    playback_tx: Option<mpsc::UnboundedSender<RemoteAudio>>,
}

impl WebRtcBackend {
    pub fn new() -> Result<Self> {
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        Ok(Self {
            api,
            ice_servers: RwLock::new(Vec::new()),
            local_track: RwLock::new(None),
            microphone: Arc::new(AtomicBool::new(true)),
            playback: Arc::new(AtomicBool::new(true)),
            playback_tx: None,
        })
    }

    /// Forward received remote audio to a player.
    pub fn with_playback(mut self, tx: mpsc::UnboundedSender<RemoteAudio>) -> Self {
        self.playback_tx = Some(tx);
        self
    }

    /// Push one captured opus frame. Returns `false` when it was dropped: while muted
    /// or before audio is acquired.
    pub async fn write_sample(&self, sample: &Sample) -> Result<bool> {
        if !self.microphone.load(Ordering::Relaxed) {
            return Ok(false);
        }
        let track = self.local_track.read().await.clone();
        let Some(track) = track else {
            return Ok(false);
        };
        track.write_sample(sample).await?;
        Ok(true)
    }

    async fn rtc_configuration(&self) -> RTCConfiguration {
        let configured = self.ice_servers.read().await;
        let ice_servers = if configured.is_empty() {
            vec![RTCIceServer {
                urls: vec![DEFAULT_STUN_ADDR.to_owned()],
                ..Default::default()
            }]
        } else {
            configured
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect()
        };

        RTCConfiguration {
            ice_servers,
            ..Default::default()
        }
    }
}

#[async_trait]
impl MediaBackend for WebRtcBackend {
    async fn set_ice_servers(&self, ice_servers: Vec<IceServerConfig>) {
        debug!("Using {} ICE server entries", ice_servers.len());
        *self.ice_servers.write().await = ice_servers;
    }

    async fn acquire_local_audio(&self) -> Result<()> {
        let mut slot = self.local_track.write().await;
        if slot.is_none() {
            *slot = Some(Arc::new(TrackLocalStaticSample::new(
                RTCRtpCodecCapability {
                    mime_type: MIME_TYPE_OPUS.to_owned(),
                    ..Default::default()
                },
                "audio".to_owned(),
                "parley".to_owned(),
            )));
            info!("Local audio track created");
        }
        Ok(())
    }

    async fn release_local_audio(&self) {
        if self.local_track.write().await.take().is_some() {
            info!("Local audio track released");
        }
    }

    async fn create_session(
        &self,
        peer: &ConnectionId,
        tag: SessionTag,
        events: mpsc::UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSession>> {
        let Some(track) = self.local_track.read().await.clone() else {
            bail!("local audio has not been acquired");
        };

        let config = self.rtc_configuration().await;
        let peer_connection = Arc::new(self.api.new_peer_connection(config).await?);

        let rtp_sender = peer_connection
            .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
            .await?;
        // RTCP has to be drained for the interceptors to work.
        tokio::spawn(async move {
            let mut rtcp_buf = vec![0u8; 1500];
            while rtp_sender.read(&mut rtcp_buf).await.is_ok() {}
        });

        let state_tx = events.clone();
        let uid_state = peer.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                let uid = uid_state.clone();

                Box::pin(async move {
                    debug!("Peer connection state for {:?} {}: {:?}", uid, tag, s);
                    let state = match s {
                        RTCPeerConnectionState::Connected => MediaState::Connected,
                        RTCPeerConnectionState::Disconnected => MediaState::Disconnected,
                        RTCPeerConnectionState::Failed => MediaState::Failed,
                        RTCPeerConnectionState::Closed => MediaState::Closed,
                        _ => MediaState::Connecting,
                    };
                    let _ = tx.send(MediaEvent {
                        peer: uid,
                        session: tag,
                        kind: MediaEventKind::StateChanged(state),
                    });
                })
            },
        ));

        let ice_tx = events.clone();
        let uid_ice = peer.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            let uid = uid_ice.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let _ = tx.send(MediaEvent {
                    peer: uid,
                    session: tag,
                    kind: MediaEventKind::LocalCandidate(IceCandidate {
                        candidate: init.candidate,
                        sdp_mid: init.sdp_mid,
                        sdp_m_line_index: init.sdp_mline_index,
                        username_fragment: init.username_fragment,
                    }),
                });
            })
        }));

        let track_tx = events;
        let uid_track = peer.clone();
        let playback = self.playback.clone();
        let playback_tx = self.playback_tx.clone();
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let uid = uid_track.clone();
                let playback = playback.clone();
                let playback_tx = playback_tx.clone();

                Box::pin(async move {
                    info!("Remote audio track from {:?}", uid);
                    let _ = tx.send(MediaEvent {
                        peer: uid.clone(),
                        session: tag,
                        kind: MediaEventKind::RemoteTrack {
                            track_id: track.id().to_string(),
                        },
                    });

                    tokio::spawn(async move {
                        while let Ok((packet, _)) = track.read_rtp().await {
                            forward_remote_audio(
                                &playback,
                                playback_tx.as_ref(),
                                &uid,
                                packet.payload,
                            );
                        }
                        debug!("Remote track from {:?} ended", uid);
                    });
                })
            },
        ));

        Ok(Box::new(WebRtcSession { peer_connection }))
    }

    fn set_microphone_enabled(&self, enabled: bool) {
        self.microphone.store(enabled, Ordering::Relaxed);
    }

    fn set_playback_enabled(&self, enabled: bool) {
        self.playback.store(enabled, Ordering::Relaxed);
    }
}

/// Hands one received packet to the player unless deafened.
fn forward_remote_audio(
    playback: &AtomicBool,
    out: Option<&mpsc::UnboundedSender<RemoteAudio>>,
    peer: &ConnectionId,
    payload: Bytes,
) -> bool {
    if !playback.load(Ordering::Relaxed) {
        return false;
    }
    let Some(out) = out else {
        return false;
    };
    out.send(RemoteAudio {
        peer: peer.clone(),
        payload,
    })
    .is_ok()
}

pub struct WebRtcSession {
    peer_connection: Arc<RTCPeerConnection>,
}

fn to_rtc(description: SessionDescription) -> Result<RTCSessionDescription> {
    let rtc = match description.kind {
        SdpKind::Offer => RTCSessionDescription::offer(description.sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(description.sdp)?,
    };
    Ok(rtc)
}

#[async_trait]
impl MediaSession for WebRtcSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_local_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(description)?)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(description)?)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate,
            sdp_mid: candidate.sdp_mid,
            sdp_mline_index: candidate.sdp_m_line_index,
            username_fragment: candidate.username_fragment,
        };
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Err(e) = self.peer_connection.close().await {
            warn!("Failed to close peer connection: {}", e);
        }
    }
}
