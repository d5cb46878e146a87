use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::traits::{Consumer, Producer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::audio::frame::FrameEncoder;
use crate::audio::resample::InputResampler;
use crate::config::CAPTURE_RATE;
use crate::transport::SessionHandle;

/// Ring between the hardware callback and the worker thread.
/// Roomy enough to ride out scheduling jitter (~340 ms at 48 kHz).
pub const RING_CAPACITY: usize = 16_384;

/// Owns the cpal input stream. Dropping this releases the hardware
/// tracks; nothing else holds the device.
pub struct MicCapture {
    _stream: cpal::Stream,
    pub sample_rate: u32,
}

impl MicCapture {
    /// Acquire the default input device and start pushing mono f32
    /// samples into `producer`. Prefers a native 16 kHz configuration so
    /// no resampling is needed; otherwise the device default rate is
    /// accepted and reported back for the worker to resample.
    pub fn open<P>(mut producer: P) -> Result<Self, anyhow::Error>
    where
        P: Producer<Item = f32> + Send + 'static,
    {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("no input device available"))?;
        info!("audio input device: {}", device.name().unwrap_or_default());

        let mut selected = None;
        for range in device.supported_input_configs()? {
            if range.min_sample_rate().0 <= CAPTURE_RATE
                && range.max_sample_rate().0 >= CAPTURE_RATE
            {
                selected = Some(range.with_sample_rate(cpal::SampleRate(CAPTURE_RATE)));
                break;
            }
        }
        let config = match selected {
            Some(c) => c,
            None => device.default_input_config()?,
        };
        let sample_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!(
            "capture config: rate={}Hz channels={} format={:?}",
            sample_rate,
            channels,
            config.sample_format()
        );

        let err_fn = |err| error!("capture stream error: {}", err);

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &_| push_mono(data, channels, &mut producer),
                err_fn,
                None,
            )?,
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &_| push_mono_i16(data, channels, &mut producer),
                err_fn,
                None,
            )?,
            other => return Err(anyhow::anyhow!("unsupported sample format {:?}", other)),
        };

        stream.play()?;

        Ok(Self {
            _stream: stream,
            sample_rate,
        })
    }
}

// The ring is lossy by design: when the worker falls behind, samples
// are dropped at the producer rather than blocking the audio thread.
fn push_mono<P>(input: &[f32], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    if channels <= 1 {
        producer.push_slice(input);
        return;
    }
    for frame in input.chunks_exact(channels) {
        let mono = frame.iter().sum::<f32>() / channels as f32;
        let _ = producer.try_push(mono);
    }
}

fn push_mono_i16<P>(input: &[i16], channels: usize, producer: &mut P)
where
    P: Producer<Item = f32>,
{
    if channels <= 1 {
        for &sample in input {
            let _ = producer.try_push(sample as f32 / i16::MAX as f32);
        }
        return;
    }
    for frame in input.chunks_exact(channels) {
        let sum: f32 = frame.iter().map(|&s| s as f32 / i16::MAX as f32).sum();
        let _ = producer.try_push(sum / channels as f32);
    }
}

/// A wired capture pipeline: microphone stream plus the worker thread
/// that resamples, frames, and ships audio to the session handle.
///
/// Dropping the rig stops the worker and releases the microphone
/// synchronously.
pub struct CaptureRig {
    _mic: MicCapture,
    stop: Arc<AtomicBool>,
    worker: Option<std::thread::JoinHandle<()>>,
}

impl CaptureRig {
    /// Connect an already-open microphone to an open session.
    pub fn wire<C>(mic: MicCapture, consumer: C, handle: Arc<dyn SessionHandle>) -> Self
    where
        C: Consumer<Item = f32> + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let rate = mic.sample_rate;
        let worker = {
            let stop = stop.clone();
            std::thread::spawn(move || capture_worker(consumer, rate, handle, stop))
        };
        Self {
            _mic: mic,
            stop,
            worker: Some(worker),
        }
    }
}

impl Drop for CaptureRig {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn capture_worker<C>(
    mut consumer: C,
    source_rate: u32,
    handle: Arc<dyn SessionHandle>,
    stop: Arc<AtomicBool>,
) where
    C: Consumer<Item = f32>,
{
    info!("capture worker started at {}Hz", source_rate);

    let mut resampler = match InputResampler::new(source_rate) {
        Ok(r) => r,
        Err(e) => {
            error!("capture worker cannot resample {}Hz: {}", source_rate, e);
            return;
        }
    };
    let mut encoder = FrameEncoder::new();
    let mut buf = vec![0.0f32; 2048];

    while !stop.load(Ordering::Acquire) {
        let popped = consumer.pop_slice(&mut buf);
        if popped == 0 {
            std::thread::sleep(Duration::from_millis(10));
            continue;
        }

        let resampled = resampler.process(&buf[..popped]);
        for chunk in encoder.push(&resampled) {
            // Real-time audio has no value late; a failed send is final.
            if let Err(e) = handle.send_realtime(chunk) {
                debug!(error = %e, "outbound frame dropped");
            }
        }
    }

    info!("capture worker stopped");
}
