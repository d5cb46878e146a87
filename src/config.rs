use serde::{Deserialize, Serialize};

/// Sample rate of outbound capture audio expected by the remote session.
pub const CAPTURE_RATE: u32 = 16_000;

/// Sample rate of inbound model audio.
pub const PLAYBACK_RATE: u32 = 24_000;

/// Samples per outbound frame (256 ms at 16 kHz).
pub const FRAME_SAMPLES: usize = 4096;

/// MIME tag attached to every outbound frame.
pub const OUTBOUND_MIME: &str = "audio/pcm;rate=16000";

/// The fixed set of prebuilt voices the remote session can speak with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Voice {
    Kore,
    Puck,
    Charon,
    Fenrir,
    Zephyr,
}

impl Voice {
    pub fn name(&self) -> &'static str {
        match self {
            Voice::Kore => "Kore",
            Voice::Puck => "Puck",
            Voice::Charon => "Charon",
            Voice::Fenrir => "Fenrir",
            Voice::Zephyr => "Zephyr",
        }
    }
}

/// Connect-time session configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Model identifier handed to the connector verbatim.
    pub model: String,
    pub voice: Voice,
    /// Ask the remote session to transcribe its own audio output.
    pub output_transcription: bool,
    /// How many transcript fragments are kept for display.
    pub transcript_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash-native-audio-preview-12-2025".to_string(),
            voice: Voice::Zephyr,
            output_transcription: true,
            transcript_depth: 5,
        }
    }
}
