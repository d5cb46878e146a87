use crate::config::{FRAME_SAMPLES, OUTBOUND_MIME};
use crate::transport::{encode_pcm, MediaChunk};

/// Scale a float sample in [-1, 1] to 16-bit signed PCM.
/// The clamp matters: a full-scale 1.0 would otherwise overflow to -32768.
pub fn quantize(sample: f32) -> i16 {
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Groups 16 kHz samples into fixed-size blocks and emits them as
/// transport-ready chunks. Partial blocks stay pending until filled;
/// capture order is preserved.
pub struct FrameEncoder {
    pending: Vec<f32>,
    block: usize,
}

impl FrameEncoder {
    pub fn new() -> Self {
        Self::with_block(FRAME_SAMPLES)
    }

    pub fn with_block(block: usize) -> Self {
        let block = block.max(1);
        Self {
            pending: Vec::with_capacity(block),
            block,
        }
    }

    /// Feed resampled samples; returns every frame completed by this call.
    pub fn push(&mut self, samples: &[f32]) -> Vec<MediaChunk> {
        self.pending.extend_from_slice(samples);
        let mut frames = Vec::new();
        while self.pending.len() >= self.block {
            let rest = self.pending.split_off(self.block);
            let block = std::mem::replace(&mut self.pending, rest);
            frames.push(encode_frame(&block));
        }
        frames
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for FrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Quantize and transport-encode one block of samples.
pub fn encode_frame(samples: &[f32]) -> MediaChunk {
    let ints: Vec<i16> = samples.iter().map(|&s| quantize(s)).collect();
    MediaChunk {
        data: encode_pcm(&ints),
        mime_type: OUTBOUND_MIME.to_string(),
    }
}
