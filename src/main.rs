use anyhow::Result;
use ringbuf::traits::Split;
use ringbuf::{HeapCons, HeapRb};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use voxline::audio::capture::{CaptureRig, MicCapture, RING_CAPACITY};
use voxline::audio::output::SpeakerOutput;
use voxline::session::event::SessionEvent;
use voxline::session::machine::{LiveSession, SessionState, SideEffect};
use voxline::transport::mock::MockConnector;
use voxline::transport::{LiveConnector, RemoteEvent, SessionHandle};
use voxline::SessionConfig;

/// Everything the driver holds on the machine's behalf: hardware and the
/// remote handle. The machine only ever sees events and emits effects.
struct Driver {
    config: SessionConfig,
    connector: MockConnector,
    remote_tx: mpsc::Sender<RemoteEvent>,
    mic: Option<(MicCapture, HeapCons<f32>)>,
    rig: Option<CaptureRig>,
    handle: Option<Arc<dyn SessionHandle>>,
}

impl Driver {
    /// Feed one event through the machine and execute every resulting
    /// side effect before returning. Effects that produce follow-up
    /// events (mic reports, teardown confirmation) loop back in-turn.
    async fn dispatch(&mut self, session: &mut LiveSession, event: SessionEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            for effect in session.handle(event) {
                match effect {
                    SideEffect::AcquireMic => {
                        let rb = HeapRb::<f32>::new(RING_CAPACITY);
                        let (producer, consumer) = rb.split();
                        match MicCapture::open(producer) {
                            Ok(mic) => {
                                let sample_rate = mic.sample_rate;
                                self.mic = Some((mic, consumer));
                                queue.push_back(SessionEvent::MicAcquired { sample_rate });
                            }
                            Err(e) => {
                                queue.push_back(SessionEvent::MicFailed(e.to_string()));
                            }
                        }
                    }
                    SideEffect::Connect => {
                        match self
                            .connector
                            .connect(&self.config, self.remote_tx.clone())
                            .await
                        {
                            Ok(handle) => self.handle = Some(handle),
                            Err(e) => {
                                queue.push_back(SessionEvent::ConnectFailed(e.to_string()));
                            }
                        }
                    }
                    SideEffect::StartCapture => {
                        if let (Some((mic, consumer)), Some(handle)) =
                            (self.mic.take(), self.handle.clone())
                        {
                            self.rig = Some(CaptureRig::wire(mic, consumer, handle));
                        }
                    }
                    SideEffect::StopCapture => {
                        self.rig = None;
                        self.mic = None;
                    }
                    SideEffect::CloseHandle => {
                        if let Some(handle) = self.handle.take() {
                            handle.close();
                        }
                        queue.push_back(SessionEvent::TornDown);
                    }
                    SideEffect::ReportError(e) => {
                        eprintln!("session error: {e}");
                    }
                }
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = SessionConfig::default();
    let mut session = LiveSession::new(config.clone());

    let (remote_tx, mut remote_rx) = mpsc::channel::<RemoteEvent>(100);
    let mut driver = Driver {
        config,
        connector: MockConnector::default(),
        remote_tx,
        mic: None,
        rig: None,
        handle: None,
    };

    let _speaker = SpeakerOutput::open(session.playback())?;

    println!("Live voice demo (mock remote). Speak; Ctrl+C to stop.");
    driver.dispatch(&mut session, SessionEvent::StartRequested).await;
    if session.state() == SessionState::Idle {
        anyhow::bail!("session failed to start");
    }

    loop {
        tokio::select! {
            remote = remote_rx.recv() => {
                match remote {
                    Some(event) => {
                        let spoke = matches!(event, RemoteEvent::Transcript(_));
                        driver.dispatch(&mut session, SessionEvent::Remote(event)).await;
                        if spoke {
                            if let Some(fragment) = session.transcript().latest() {
                                println!("{}: {}", fragment.speaker, fragment.text);
                            }
                        }
                    }
                    None => break,
                }
                if session.state() == SessionState::Idle {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                driver.dispatch(&mut session, SessionEvent::StopRequested).await;
                break;
            }
        }
    }

    tracing::info!("demo finished");
    Ok(())
}
