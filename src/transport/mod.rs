pub mod mock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};

/// Events pushed by the remote session. Delivery is ordered per
/// connection; nothing is ever replayed.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    /// The session confirmed open; audio may now flow both ways.
    Opened,
    /// A model audio segment: base64 PCM16, 24 kHz mono.
    Audio(String),
    /// A fragment of the model's output transcription.
    Transcript(String),
    /// The user spoke over the model; flush playback immediately.
    Interrupted,
    Closed,
    Error(String),
}

/// One outbound media chunk, already transport-encoded. Ownership moves
/// to the handle on send; there is no retry path back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaChunk {
    pub data: String,
    pub mime_type: String,
}

/// Setup message a connector sends when opening a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectPayload {
    pub model: String,
    pub response_modalities: Vec<String>,
    pub voice_name: String,
    pub output_audio_transcription: bool,
}

impl ConnectPayload {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            model: config.model.clone(),
            response_modalities: vec!["AUDIO".to_string()],
            voice_name: config.voice.name().to_string(),
            output_audio_transcription: config.output_transcription,
        }
    }
}

/// Live handle to an open remote session.
///
/// Handles are shared between the session driver and the capture worker,
/// so both operations take `&self`. `close` must be idempotent: closing
/// twice, or closing a session that never fully opened, is a no-op.
pub trait SessionHandle: Send + Sync {
    /// Fire-and-forget. A failed send means the frame is gone; callers
    /// drop it rather than buffer it.
    fn send_realtime(&self, chunk: MediaChunk) -> Result<()>;

    fn close(&self);
}

/// Factory for live sessions. Implementations own the wire protocol and
/// report everything that happens through the event channel.
#[allow(async_fn_in_trait)]
pub trait LiveConnector {
    async fn connect(
        &self,
        config: &SessionConfig,
        events: mpsc::Sender<RemoteEvent>,
    ) -> Result<Arc<dyn SessionHandle>>;
}

/// Serialize PCM16 samples into the transport's base64 wire form.
pub fn encode_pcm(samples: &[i16]) -> String {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        bytes.extend_from_slice(&s.to_le_bytes());
    }
    STANDARD.encode(&bytes)
}

/// Decode a base64 PCM16 payload into normalized f32 samples.
pub fn decode_pcm(data: &str) -> Result<Vec<f32>> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| SessionError::Decode(e.to_string()))?;
    if bytes.len() % 2 != 0 {
        return Err(SessionError::Decode(format!(
            "odd payload length {}",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
        .collect())
}
