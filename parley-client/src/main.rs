use anyhow::{Context, bail};
use bytes::Bytes;
use clap::Parser;
use parley_client::{RelayLink, RemoteAudio, VoiceClient, VoiceEvent, WebRtcBackend};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use webrtc::media::Sample;

/// One 20ms opus frame of silence.
const OPUS_SILENCE: &[u8] = &[0xf8, 0xff, 0xfe];
const FRAME: Duration = Duration::from_millis(20);

#[derive(Debug, Parser)]
#[command(name = "parley-voice", about = "Join a parley voice room from the terminal")]
struct Args {
    /// Relay WebSocket endpoint.
    #[arg(long, env = "PARLEY_URL", default_value = "ws://127.0.0.1:4000/ws")]
    url: String,

    #[arg(long)]
    room: String,

    #[arg(long, env = "PARLEY_USER")]
    user: String,

    #[arg(long)]
    name: Option<String>,

    /// Join with the microphone muted.
    #[arg(long)]
    muted: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let display_name = args.name.clone().unwrap_or_else(|| args.user.clone());

    let link = RelayLink::connect(&args.url).await?;
    let (playback_tx, playback_rx) = mpsc::unbounded_channel();
    let media = Arc::new(
        WebRtcBackend::new()
            .context("failed to set up media")?
            .with_playback(playback_tx),
    );
    tokio::spawn(capture(media.clone()));
    tokio::spawn(playback(playback_rx));

    let (voice, mut events) = VoiceClient::spawn(media, Arc::new(link.outgoing), link.incoming);

    match events.recv().await {
        Some(VoiceEvent::Ready { connection_id }) => info!("Attached as {}", connection_id),
        Some(other) => bail!("unexpected first event: {:?}", other),
        None => bail!("relay closed before welcome"),
    }

    voice.set_muted(args.muted).await?;
    voice.join(args.room.as_str(), args.user, display_name).await?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(VoiceEvent::MembersUpdated { participants }) => {
                    let names: Vec<&str> = participants.iter().map(|p| p.display_name.as_str()).collect();
                    info!("In room: {}", names.join(", "));
                }
                Some(event) => info!("{:?}", event),
                None => {
                    warn!("Voice client stopped");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Leaving");
                voice.leave().await?;
                break;
            }
        }
    }

    Ok(())
}

/// No audio device layer here: the microphone is a silence source, gated by mute.
async fn capture(media: Arc<WebRtcBackend>) {
    let mut ticker = tokio::time::interval(FRAME);
    loop {
        ticker.tick().await;
        let sample = Sample {
            data: Bytes::from_static(OPUS_SILENCE),
            duration: FRAME,
            ..Default::default()
        };
        if let Err(e) = media.write_sample(&sample).await {
            warn!("Failed to write audio frame: {:#}", e);
        }
    }
}

/// Counts received audio per peer; nothing is played out.
async fn playback(mut rx: mpsc::UnboundedReceiver<RemoteAudio>) {
    let mut received: HashMap<String, usize> = HashMap::new();
    while let Some(audio) = rx.recv().await {
        let bytes = received.entry(audio.peer.to_string()).or_default();
        *bytes += audio.payload.len();
        debug!("{} bytes of audio from {}", bytes, audio.peer);
    }
}
