use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::playback::PlaybackScheduler;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::session::event::SessionEvent;
use crate::transcript::TranscriptBuffer;
use crate::transport::{decode_pcm, RemoteEvent};

/// Lifecycle of the one live session this machine may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Closing,
}

/// Instructions for the driver. The machine decides; the driver touches
/// hardware and the network. Effects execute in order, within the same
/// loop turn as the event that produced them.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    /// Acquire the microphone and report back with `MicAcquired` or
    /// `MicFailed`.
    AcquireMic,
    /// Open the remote session; its events flow in as `Remote(..)`.
    Connect,
    /// Wire the capture worker to the open session.
    StartCapture,
    /// Unwire capture and release the hardware tracks.
    StopCapture,
    /// Close the remote handle. Closing an absent or already-closed
    /// handle is a no-op.
    CloseHandle,
    /// Surface a fatal error to the user.
    ReportError(SessionError),
}

/// The live audio session: a single-threaded state machine owning the
/// playback scheduler, the transcript sink, and (through its driver)
/// the remote session handle.
///
/// At most one session is ever underway; a start while not idle is
/// ignored rather than queued.
pub struct LiveSession {
    id: Uuid,
    state: SessionState,
    config: SessionConfig,
    playback: Arc<Mutex<PlaybackScheduler>>,
    transcript: TranscriptBuffer,
}

impl LiveSession {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_playback(config, PlaybackScheduler::new())
    }

    pub fn with_playback(config: SessionConfig, playback: PlaybackScheduler) -> Self {
        let depth = config.transcript_depth;
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            config,
            playback: Arc::new(Mutex::new(playback)),
            transcript: TranscriptBuffer::new(depth),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared with the output renderer; the machine and the renderer
    /// serialize on this lock.
    pub fn playback(&self) -> Arc<Mutex<PlaybackScheduler>> {
        self.playback.clone()
    }

    pub fn transcript(&self) -> &TranscriptBuffer {
        &self.transcript
    }

    /// Advance the machine by one event.
    pub fn handle(&mut self, event: SessionEvent) -> Vec<SideEffect> {
        match event {
            SessionEvent::StartRequested => self.on_start(),
            SessionEvent::StopRequested => self.begin_teardown("stop requested"),
            SessionEvent::MicAcquired { sample_rate } => self.on_mic_acquired(sample_rate),
            SessionEvent::MicFailed(reason) => self.on_mic_failed(reason),
            SessionEvent::ConnectFailed(reason) => self.on_connect_failed(reason),
            SessionEvent::TornDown => self.on_torn_down(),
            SessionEvent::Remote(remote) => self.on_remote(remote),
        }
    }

    fn on_start(&mut self) -> Vec<SideEffect> {
        if self.state != SessionState::Idle {
            debug!(state = ?self.state, "start ignored; session already underway");
            return Vec::new();
        }
        info!(session = %self.id, "session starting");
        self.state = SessionState::Connecting;
        vec![SideEffect::AcquireMic]
    }

    fn on_mic_acquired(&mut self, sample_rate: u32) -> Vec<SideEffect> {
        if self.state != SessionState::Connecting {
            // Stop raced ahead of the acquisition; let go of the device.
            return vec![SideEffect::StopCapture];
        }
        debug!(sample_rate, "microphone acquired");
        vec![SideEffect::Connect]
    }

    fn on_mic_failed(&mut self, reason: String) -> Vec<SideEffect> {
        warn!(session = %self.id, reason = %reason, "microphone denied");
        self.state = SessionState::Idle;
        vec![SideEffect::ReportError(SessionError::PermissionDenied(
            reason,
        ))]
    }

    fn on_connect_failed(&mut self, reason: String) -> Vec<SideEffect> {
        warn!(session = %self.id, reason = %reason, "session failed to open");
        self.state = SessionState::Idle;
        // The microphone was already acquired; holding it after a failed
        // connect would leak the hardware lock.
        vec![
            SideEffect::StopCapture,
            SideEffect::ReportError(SessionError::ConnectionFailure(reason)),
        ]
    }

    fn on_torn_down(&mut self) -> Vec<SideEffect> {
        if self.state == SessionState::Closing {
            info!(session = %self.id, "session closed");
            self.state = SessionState::Idle;
        }
        Vec::new()
    }

    fn on_remote(&mut self, remote: RemoteEvent) -> Vec<SideEffect> {
        match remote {
            RemoteEvent::Opened => {
                if self.state != SessionState::Connecting {
                    debug!(state = ?self.state, "open confirmation ignored");
                    return Vec::new();
                }
                info!(session = %self.id, "session active");
                self.state = SessionState::Active;
                // Fresh session, fresh cursor.
                if let Ok(mut playback) = self.playback.lock() {
                    playback.interrupt();
                }
                vec![SideEffect::StartCapture]
            }
            RemoteEvent::Audio(payload) => {
                if self.state != SessionState::Active {
                    debug!("inbound audio outside active session dropped");
                    return Vec::new();
                }
                match decode_pcm(&payload) {
                    Ok(samples) if samples.is_empty() => {
                        debug!("empty inbound segment dropped");
                    }
                    Ok(samples) => {
                        if let Ok(mut playback) = self.playback.lock() {
                            let start = playback.enqueue(samples);
                            debug!(start, "inbound segment scheduled");
                        }
                    }
                    // Bad segment, live session: drop it and move on.
                    Err(e) => warn!(error = %e, "inbound segment dropped"),
                }
                Vec::new()
            }
            RemoteEvent::Transcript(text) => {
                if self.state == SessionState::Active {
                    self.transcript.append("AI", &text);
                }
                Vec::new()
            }
            RemoteEvent::Interrupted => {
                if self.state == SessionState::Active {
                    debug!(session = %self.id, "barge-in; flushing playback");
                    if let Ok(mut playback) = self.playback.lock() {
                        playback.interrupt();
                    }
                }
                // Capture keeps running; the user is mid-sentence.
                Vec::new()
            }
            RemoteEvent::Closed => match self.state {
                SessionState::Connecting | SessionState::Active => {
                    self.begin_teardown("remote closed")
                }
                _ => Vec::new(),
            },
            RemoteEvent::Error(reason) => match self.state {
                SessionState::Connecting | SessionState::Active => {
                    let mut effects = self.begin_teardown("remote error");
                    effects.push(SideEffect::ReportError(SessionError::ConnectionFailure(
                        reason,
                    )));
                    effects
                }
                _ => Vec::new(),
            },
        }
    }

    fn begin_teardown(&mut self, why: &str) -> Vec<SideEffect> {
        match self.state {
            SessionState::Idle => {
                debug!("stop ignored; no session");
                Vec::new()
            }
            SessionState::Closing => Vec::new(),
            SessionState::Connecting | SessionState::Active => {
                info!(session = %self.id, why, "session closing");
                self.state = SessionState::Closing;
                vec![SideEffect::StopCapture, SideEffect::CloseHandle]
            }
        }
    }
}
