use anyhow::{Result, bail};
use async_trait::async_trait;
use parley_client::{MediaBackend, MediaEvent, MediaEventKind, MediaSession, SessionTag};
use parley_core::{ConnectionId, IceCandidate, IceServerConfig, SdpKind, SessionDescription};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;

/// Everything the mock backend was asked to do.
#[derive(Debug, Clone)]
pub struct MediaLog {
    pub sessions_created: Vec<ConnectionId>,
    pub sessions_closed: Vec<ConnectionId>,
    pub remote_descriptions: Vec<(ConnectionId, SdpKind)>,
    pub applied_candidates: Vec<(ConnectionId, IceCandidate)>,
    pub audio_acquired: bool,
    pub audio_releases: usize,
    pub microphone_enabled: bool,
    pub playback_enabled: bool,
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for MediaLog {
    fn default() -> Self {
        Self {
            sessions_created: Vec::new(),
            sessions_closed: Vec::new(),
            remote_descriptions: Vec::new(),
            applied_candidates: Vec::new(),
            audio_acquired: false,
            audio_releases: 0,
            microphone_enabled: true,
            playback_enabled: true,
            ice_servers: Vec::new(),
        }
    }
}

/// Media backend with fake SDP.
///
/// Each session reports one local candidate when its local description is set and one
/// remote track when its remote description is set. Candidates whose text contains
/// `"bad"` are rejected, as are candidates arriving before the remote description.
#[derive(Clone, Default)]
pub struct MockMedia {
    log: Arc<Mutex<MediaLog>>,
    fail_audio: Arc<AtomicBool>,
    fail_sessions: Arc<AtomicBool>,
}

impl MockMedia {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_microphone() -> Self {
        let media = Self::default();
        media.fail_audio.store(true, Ordering::SeqCst);
        media
    }

    pub fn fail_sessions(&self, fail: bool) {
        self.fail_sessions.store(fail, Ordering::SeqCst);
    }

    pub fn log(&self) -> MediaLog {
        lock(&self.log).clone()
    }
}

fn lock(log: &Mutex<MediaLog>) -> MutexGuard<'_, MediaLog> {
    log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl MediaBackend for MockMedia {
    async fn set_ice_servers(&self, ice_servers: Vec<IceServerConfig>) {
        lock(&self.log).ice_servers = ice_servers;
    }

    async fn acquire_local_audio(&self) -> Result<()> {
        if self.fail_audio.load(Ordering::SeqCst) {
            bail!("no input device");
        }
        lock(&self.log).audio_acquired = true;
        Ok(())
    }

    async fn release_local_audio(&self) {
        let mut log = lock(&self.log);
        log.audio_acquired = false;
        log.audio_releases += 1;
    }

    async fn create_session(
        &self,
        peer: &ConnectionId,
        tag: SessionTag,
        events: mpsc::UnboundedSender<MediaEvent>,
    ) -> Result<Box<dyn MediaSession>> {
        if self.fail_sessions.load(Ordering::SeqCst) {
            bail!("peer connection refused");
        }
        lock(&self.log).sessions_created.push(peer.clone());

        Ok(Box::new(MockSession {
            peer: peer.clone(),
            tag,
            events,
            log: self.log.clone(),
            remote_set: AtomicBool::new(false),
        }))
    }

    fn set_microphone_enabled(&self, enabled: bool) {
        lock(&self.log).microphone_enabled = enabled;
    }

    fn set_playback_enabled(&self, enabled: bool) {
        lock(&self.log).playback_enabled = enabled;
    }
}

struct MockSession {
    peer: ConnectionId,
    tag: SessionTag,
    events: mpsc::UnboundedSender<MediaEvent>,
    log: Arc<Mutex<MediaLog>>,
    remote_set: AtomicBool,
}

impl MockSession {
    fn emit(&self, kind: MediaEventKind) {
        let _ = self.events.send(MediaEvent {
            peer: self.peer.clone(),
            session: self.tag,
            kind,
        });
    }
}

#[async_trait]
impl MediaSession for MockSession {
    async fn create_offer(&self) -> Result<SessionDescription> {
        Ok(SessionDescription::offer(format!("v=0 offer for {}", self.peer)))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        if !self.remote_set.load(Ordering::SeqCst) {
            bail!("answer requested without a remote offer");
        }
        Ok(SessionDescription::answer(format!("v=0 answer for {}", self.peer)))
    }

    async fn set_local_description(&self, _description: SessionDescription) -> Result<()> {
        self.emit(MediaEventKind::LocalCandidate(local_candidate(self.tag)));
        Ok(())
    }

    async fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        lock(&self.log)
            .remote_descriptions
            .push((self.peer.clone(), description.kind));
        self.remote_set.store(true, Ordering::SeqCst);
        self.emit(MediaEventKind::RemoteTrack {
            track_id: format!("audio-{}", self.peer),
        });
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        if !self.remote_set.load(Ordering::SeqCst) {
            bail!("remote description not set");
        }
        if candidate.candidate.contains("bad") {
            bail!("malformed candidate");
        }
        lock(&self.log)
            .applied_candidates
            .push((self.peer.clone(), candidate));
        Ok(())
    }

    async fn close(&self) {
        lock(&self.log).sessions_closed.push(self.peer.clone());
    }
}

/// The candidate a mock session reports for itself.
pub fn local_candidate(tag: SessionTag) -> IceCandidate {
    IceCandidate {
        candidate: format!("candidate:{} 1 udp 2130706431 127.0.0.1 5000 typ host", tag.0),
        sdp_mid: Some("0".to_string()),
        sdp_m_line_index: Some(0),
        username_fragment: None,
    }
}
