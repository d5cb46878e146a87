use rubato::{FftFixedIn, Resampler};
use std::collections::VecDeque;
use tracing::warn;

use crate::config::CAPTURE_RATE;

/// Input frames handed to the resampler per pass.
const CHUNK_FRAMES: usize = 1024;

/// Converts the capture device's native rate down to the 16 kHz the
/// session expects. Passthrough when the device already runs at 16 kHz.
///
/// Input is buffered until a full chunk is available, so output lags
/// input by less than one chunk.
pub struct InputResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: VecDeque<f32>,
}

impl InputResampler {
    pub fn new(source_rate: u32) -> anyhow::Result<Self> {
        let inner = if source_rate == CAPTURE_RATE {
            None
        } else {
            Some(FftFixedIn::<f32>::new(
                source_rate as usize,
                CAPTURE_RATE as usize,
                CHUNK_FRAMES,
                2,
                1,
            )?)
        };
        Ok(Self {
            inner,
            pending: VecDeque::with_capacity(CHUNK_FRAMES * 4),
        })
    }

    /// Feed device samples, get 16 kHz samples back. May return nothing
    /// until enough input has accumulated for a full chunk.
    pub fn process(&mut self, samples: &[f32]) -> Vec<f32> {
        let resampler = match self.inner.as_mut() {
            None => return samples.to_vec(),
            Some(r) => r,
        };

        self.pending.extend(samples.iter().copied());
        let mut out = Vec::new();
        let mut chunk = vec![0.0f32; CHUNK_FRAMES];

        while self.pending.len() >= CHUNK_FRAMES {
            for slot in chunk.iter_mut() {
                // Length checked above; the queue cannot run dry here.
                *slot = self.pending.pop_front().unwrap_or(0.0);
            }
            match resampler.process(&[&chunk], None) {
                Ok(mut resampled) => {
                    if let Some(channel) = resampled.pop() {
                        out.extend(channel);
                    }
                }
                Err(e) => {
                    warn!(error = %e, "resampler pass failed; chunk dropped");
                }
            }
        }
        out
    }
}
