use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::{Arc, Mutex};
use tracing::{error, info};

use crate::audio::frame::quantize;
use crate::audio::playback::PlaybackScheduler;
use crate::config::PLAYBACK_RATE;

/// Owns the cpal output stream; its callback renders from the shared
/// scheduler, which is what advances the playback clock.
pub struct SpeakerOutput {
    _stream: cpal::Stream,
}

impl SpeakerOutput {
    pub fn open(scheduler: Arc<Mutex<PlaybackScheduler>>) -> Result<Self, anyhow::Error> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no output device available"))?;
        info!("audio output device: {}", device.name().unwrap_or_default());

        let mut selected = None;
        for range in device.supported_output_configs()? {
            if range.min_sample_rate().0 <= PLAYBACK_RATE
                && range.max_sample_rate().0 >= PLAYBACK_RATE
            {
                selected = Some(range.with_sample_rate(cpal::SampleRate(PLAYBACK_RATE)));
                break;
            }
        }
        let config = selected.ok_or_else(|| {
            anyhow::anyhow!("output device does not support {}Hz", PLAYBACK_RATE)
        })?;
        let channels = config.channels() as usize;
        info!(
            "output config: rate={}Hz channels={} format={:?}",
            PLAYBACK_RATE,
            channels,
            config.sample_format()
        );

        let err_fn = |err| error!("output stream error: {}", err);
        let mut mono: Vec<f32> = Vec::new();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &_| {
                    let frames = data.len() / channels.max(1);
                    mono.resize(frames, 0.0);
                    render_window(&scheduler, &mut mono);
                    for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
                        frame.fill(mono[i]);
                    }
                },
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_output_stream(
                &config.into(),
                move |data: &mut [i16], _: &_| {
                    let frames = data.len() / channels.max(1);
                    mono.resize(frames, 0.0);
                    render_window(&scheduler, &mut mono);
                    for (i, frame) in data.chunks_exact_mut(channels).enumerate() {
                        frame.fill(quantize(mono[i]));
                    }
                },
                err_fn,
                None,
            )?,
            other => return Err(anyhow::anyhow!("unsupported sample format {:?}", other)),
        };

        stream.play()?;

        Ok(Self { _stream: stream })
    }
}

// A poisoned lock means a panic elsewhere; render silence rather than
// take the audio thread down with it.
fn render_window(scheduler: &Arc<Mutex<PlaybackScheduler>>, mono: &mut [f32]) {
    match scheduler.lock() {
        Ok(mut sched) => sched.render(mono),
        Err(_) => mono.fill(0.0),
    }
}
