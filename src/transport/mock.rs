use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{encode_pcm, ConnectPayload, LiveConnector, MediaChunk, RemoteEvent, SessionHandle};
use crate::config::{SessionConfig, PLAYBACK_RATE};
use crate::error::{Result, SessionError};

const REPLY_PHRASES: [&str; 4] = [
    "Hello, how can I help you today?",
    "I heard you loud and clear.",
    "Still listening.",
    "Go on, I'm with you.",
];

/// In-process stand-in for the remote live API.
///
/// Counts inbound frames and answers with synthesized tone segments and
/// canned transcript fragments, so the whole engine can run end to end
/// without network access or provider credentials.
#[derive(Debug, Clone)]
pub struct MockConnector {
    /// Reply once per this many inbound frames.
    pub reply_every: u64,
    /// Frequency of the synthesized reply tone.
    pub tone_hz: f32,
    /// Duration of each reply segment in milliseconds.
    pub reply_ms: u64,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            reply_every: 4,
            tone_hz: 440.0,
            reply_ms: 400,
        }
    }
}

impl LiveConnector for MockConnector {
    async fn connect(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<RemoteEvent>,
    ) -> Result<Arc<dyn SessionHandle>> {
        let payload = ConnectPayload::from_config(config);
        let setup = serde_json::to_string(&payload)
            .map_err(|e| SessionError::ConnectionFailure(e.to_string()))?;
        info!(setup = %setup, "mock session opening");

        events
            .send(RemoteEvent::Opened)
            .await
            .map_err(|_| SessionError::ConnectionFailure("event channel closed".to_string()))?;

        let cancel = CancellationToken::new();
        let frames = Arc::new(AtomicU64::new(0));

        tokio::spawn(pump(
            events.clone(),
            cancel.clone(),
            frames.clone(),
            self.clone(),
        ));

        Ok(Arc::new(MockSession {
            closed: AtomicBool::new(false),
            frames,
            events,
            cancel,
        }))
    }
}

/// Periodically checks how much audio arrived and emits scripted replies.
/// The cadence is deliberately decoupled from the inbound sends so events
/// arrive the way a real remote does: asynchronously, but in order.
async fn pump(
    events: mpsc::Sender<RemoteEvent>,
    cancel: CancellationToken,
    frames: Arc<AtomicU64>,
    script: MockConnector,
) {
    let mut cadence = tokio::time::interval(Duration::from_millis(250));
    let mut replied = 0u64;
    let mut turn = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = cadence.tick() => {
                let due = frames.load(Ordering::Relaxed) / script.reply_every;
                if due > replied {
                    replied = due;
                    let payload = tone_payload(script.tone_hz, script.reply_ms);
                    if events.send(RemoteEvent::Audio(payload)).await.is_err() {
                        break;
                    }
                    let phrase = REPLY_PHRASES[turn % REPLY_PHRASES.len()];
                    if events.send(RemoteEvent::Transcript(phrase.to_string())).await.is_err() {
                        break;
                    }
                    turn += 1;
                }
            }
        }
    }
    debug!("mock pump stopped");
}

/// Synthesize a sine segment in the inbound wire format.
fn tone_payload(hz: f32, ms: u64) -> String {
    let total = (PLAYBACK_RATE as u64 * ms / 1000) as usize;
    let samples: Vec<i16> = (0..total)
        .map(|i| {
            let t = i as f32 / PLAYBACK_RATE as f32;
            ((TAU * hz * t).sin() * 0.3 * 32767.0) as i16
        })
        .collect();
    encode_pcm(&samples)
}

struct MockSession {
    closed: AtomicBool,
    frames: Arc<AtomicU64>,
    events: mpsc::Sender<RemoteEvent>,
    cancel: CancellationToken,
}

impl SessionHandle for MockSession {
    fn send_realtime(&self, chunk: MediaChunk) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(SessionError::TransportSend("session closed".to_string()));
        }
        if chunk.data.is_empty() {
            return Err(SessionError::TransportSend("empty payload".to_string()));
        }
        self.frames.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.cancel.cancel();
            let _ = self.events.try_send(RemoteEvent::Closed);
            debug!("mock session closed");
        }
    }
}
