use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::config::PLAYBACK_RATE;

/// Monotonic output clock: counts frames actually rendered to the sink.
///
/// Time never comes from the wall clock, only from rendered frames, so
/// scheduling stays deterministic whatever drives the renderer.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    frames: Arc<AtomicU64>,
    sample_rate: u32,
}

impl PlaybackClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            sample_rate,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Current output time in seconds.
    pub fn now(&self) -> f64 {
        self.frame() as f64 / self.sample_rate as f64
    }

    fn advance(&self, frames: u64) {
        self.frames.fetch_add(frames, Ordering::AcqRel);
    }
}

/// One scheduled-but-unfinished segment.
#[derive(Debug)]
struct ScheduledSegment {
    arrival: u64,
    start_frame: u64,
    samples: Vec<f32>,
}

impl ScheduledSegment {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

/// Schedules inbound audio segments for gapless sequential playback.
///
/// Segments play back-to-back in arrival order as long as arrival keeps
/// pace with rendering; if arrival lags, a gap opens and is not
/// compensated. `interrupt` flushes everything instantly.
#[derive(Debug)]
pub struct PlaybackScheduler {
    clock: PlaybackClock,
    next_start_frame: u64,
    active: Vec<ScheduledSegment>,
    arrivals: u64,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::with_clock(PlaybackClock::new(PLAYBACK_RATE))
    }

    pub fn with_clock(clock: PlaybackClock) -> Self {
        Self {
            clock,
            next_start_frame: 0,
            active: Vec::new(),
            arrivals: 0,
        }
    }

    pub fn clock(&self) -> PlaybackClock {
        self.clock.clone()
    }

    /// Schedule decoded samples to begin as soon as the queue allows:
    /// right after the previously scheduled segment, or immediately if
    /// the queue has drained. Returns the scheduled start in seconds.
    pub fn enqueue(&mut self, samples: Vec<f32>) -> f64 {
        let start_frame = self.next_start_frame.max(self.clock.frame());
        self.next_start_frame = start_frame + samples.len() as u64;
        self.active.push(ScheduledSegment {
            arrival: self.arrivals,
            start_frame,
            samples,
        });
        self.arrivals += 1;
        start_frame as f64 / self.clock.sample_rate as f64
    }

    /// Stop every scheduled segment and rewind the cursor, so the next
    /// enqueue starts at the clock's current time. Callable at any time;
    /// a no-op when nothing is queued.
    pub fn interrupt(&mut self) {
        if !self.active.is_empty() {
            debug!(flushed = self.active.len(), "playback flushed");
        }
        self.active.clear();
        self.next_start_frame = 0;
    }

    /// Mix scheduled segments into `out` and advance the clock by
    /// `out.len()` frames. Segments that finish inside this window leave
    /// the active set.
    pub fn render(&mut self, out: &mut [f32]) {
        out.fill(0.0);
        let t0 = self.clock.frame();
        let t1 = t0 + out.len() as u64;

        for seg in &self.active {
            if seg.start_frame >= t1 || seg.end_frame() <= t0 {
                continue;
            }
            let from = seg.start_frame.max(t0);
            let to = seg.end_frame().min(t1);
            for f in from..to {
                out[(f - t0) as usize] += seg.samples[(f - seg.start_frame) as usize];
            }
        }

        self.active.retain(|seg| seg.end_frame() > t1);
        self.clock.advance(out.len() as u64);
    }

    /// Count of scheduled-but-unfinished segments.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    /// Earliest time the next enqueued segment may begin, in seconds.
    pub fn next_start(&self) -> f64 {
        self.next_start_frame as f64 / self.clock.sample_rate as f64
    }

    /// Scheduled start times of active segments, in arrival order.
    pub fn start_times(&self) -> Vec<f64> {
        let mut segs: Vec<&ScheduledSegment> = self.active.iter().collect();
        segs.sort_by_key(|s| s.arrival);
        segs.iter()
            .map(|s| s.start_frame as f64 / self.clock.sample_rate as f64)
            .collect()
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}
