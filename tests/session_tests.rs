use voxline::session::event::SessionEvent;
use voxline::session::machine::{LiveSession, SessionState, SideEffect};
use voxline::transport::{encode_pcm, RemoteEvent};
use voxline::{SessionConfig, SessionError};

fn machine() -> LiveSession {
    LiveSession::new(SessionConfig::default())
}

/// Walk a fresh machine to `Active` the way a driver would.
fn activated() -> LiveSession {
    let mut session = machine();
    session.handle(SessionEvent::StartRequested);
    session.handle(SessionEvent::MicAcquired { sample_rate: 48_000 });
    session.handle(SessionEvent::Remote(RemoteEvent::Opened));
    assert_eq!(session.state(), SessionState::Active);
    session
}

fn audio_payload(samples: usize) -> String {
    encode_pcm(&vec![1_000i16; samples])
}

#[test]
fn start_from_idle_requests_the_microphone() {
    let mut session = machine();
    let effects = session.handle(SessionEvent::StartRequested);
    assert_eq!(effects, vec![SideEffect::AcquireMic]);
    assert_eq!(session.state(), SessionState::Connecting);
}

#[test]
fn start_while_underway_is_ignored() {
    let mut session = machine();
    session.handle(SessionEvent::StartRequested);
    assert!(session.handle(SessionEvent::StartRequested).is_empty());
    assert_eq!(session.state(), SessionState::Connecting);

    let mut session = activated();
    assert!(session.handle(SessionEvent::StartRequested).is_empty());
    assert_eq!(session.state(), SessionState::Active);
}

#[test]
fn stop_while_idle_is_a_noop() {
    let mut session = machine();
    assert!(session.handle(SessionEvent::StopRequested).is_empty());
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn mic_denial_reports_and_returns_to_idle() {
    let mut session = machine();
    session.handle(SessionEvent::StartRequested);
    let effects = session.handle(SessionEvent::MicFailed("denied".to_string()));
    assert_eq!(
        effects,
        vec![SideEffect::ReportError(SessionError::PermissionDenied(
            "denied".to_string()
        ))]
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn failed_connect_still_releases_the_microphone() {
    let mut session = machine();
    session.handle(SessionEvent::StartRequested);
    let effects = session.handle(SessionEvent::MicAcquired { sample_rate: 44_100 });
    assert_eq!(effects, vec![SideEffect::Connect]);

    let effects = session.handle(SessionEvent::ConnectFailed("refused".to_string()));
    assert_eq!(
        effects,
        vec![
            SideEffect::StopCapture,
            SideEffect::ReportError(SessionError::ConnectionFailure("refused".to_string())),
        ]
    );
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn open_confirmation_wires_capture_and_resets_the_cursor() {
    let mut session = machine();
    session.handle(SessionEvent::StartRequested);
    session.handle(SessionEvent::MicAcquired { sample_rate: 16_000 });

    // Dirty the cursor to prove the open resets it.
    session.playback().lock().unwrap().enqueue(vec![0.0; 2_400]);

    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Opened));
    assert_eq!(effects, vec![SideEffect::StartCapture]);
    assert_eq!(session.state(), SessionState::Active);

    let playback = session.playback();
    let playback = playback.lock().unwrap();
    assert_eq!(playback.active_len(), 0);
    assert_eq!(playback.next_start(), 0.0);
}

#[test]
fn inbound_segments_schedule_in_arrival_order() {
    let mut session = activated();
    for n in [2_400, 4_800, 1_200] {
        session.handle(SessionEvent::Remote(RemoteEvent::Audio(audio_payload(n))));
    }
    let playback = session.playback();
    let playback = playback.lock().unwrap();
    assert_eq!(playback.start_times(), vec![0.0, 0.1, 0.3]);
    assert_eq!(playback.next_start(), 0.35);
}

#[test]
fn barge_in_flushes_playback_but_keeps_capture() {
    let mut session = activated();
    // A one-second reply arrives and starts playing.
    session.handle(SessionEvent::Remote(RemoteEvent::Audio(audio_payload(
        24_000,
    ))));
    {
        let playback = session.playback();
        let mut playback = playback.lock().unwrap();
        assert_eq!(playback.start_times(), vec![0.0]);
        // 0.3 s of it has rendered when the user barges in.
        let mut out = vec![0.0f32; 7_200];
        playback.render(&mut out);
    }

    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Interrupted));
    assert!(effects.is_empty(), "capture must keep running");
    assert_eq!(session.state(), SessionState::Active);
    assert!(session.playback().lock().unwrap().is_idle());

    // The next reply starts where the clock is now, not at 1.0 s.
    session.handle(SessionEvent::Remote(RemoteEvent::Audio(audio_payload(
        12_000,
    ))));
    let playback = session.playback();
    let playback = playback.lock().unwrap();
    assert_eq!(playback.start_times(), vec![0.3]);
    assert_eq!(playback.next_start(), 0.8);
}

#[test]
fn undecodable_segments_do_not_tear_the_session_down() {
    let mut session = activated();
    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Audio(
        "*** not audio ***".to_string(),
    )));
    assert!(effects.is_empty());
    assert_eq!(session.state(), SessionState::Active);
    assert!(session.playback().lock().unwrap().is_idle());
}

#[test]
fn transcript_keeps_only_the_most_recent_fragments() {
    let mut session = activated();
    for text in ["one", "two", "three", "four", "five", "six"] {
        session.handle(SessionEvent::Remote(RemoteEvent::Transcript(
            text.to_string(),
        )));
    }
    let texts: Vec<&str> = session
        .transcript()
        .fragments()
        .map(|f| f.text.as_str())
        .collect();
    assert_eq!(texts, vec!["two", "three", "four", "five", "six"]);
    assert!(session.transcript().fragments().all(|f| f.speaker == "AI"));
}

#[test]
fn user_stop_closes_the_handle_exactly_once() {
    let mut session = activated();
    let effects = session.handle(SessionEvent::StopRequested);
    assert_eq!(
        effects,
        vec![SideEffect::StopCapture, SideEffect::CloseHandle]
    );
    assert_eq!(session.state(), SessionState::Closing);

    // The remote acks the close while we are already closing.
    assert!(session
        .handle(SessionEvent::Remote(RemoteEvent::Closed))
        .is_empty());
    assert!(session.handle(SessionEvent::TornDown).is_empty());
    assert_eq!(session.state(), SessionState::Idle);

    // A second stop finds nothing to do.
    assert!(session.handle(SessionEvent::StopRequested).is_empty());
}

#[test]
fn remote_close_and_error_both_reach_idle_with_teardown() {
    let mut session = activated();
    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Closed));
    assert_eq!(
        effects,
        vec![SideEffect::StopCapture, SideEffect::CloseHandle]
    );
    session.handle(SessionEvent::TornDown);
    assert_eq!(session.state(), SessionState::Idle);

    let mut session = activated();
    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Error(
        "socket dropped".to_string(),
    )));
    assert_eq!(
        effects,
        vec![
            SideEffect::StopCapture,
            SideEffect::CloseHandle,
            SideEffect::ReportError(SessionError::ConnectionFailure(
                "socket dropped".to_string()
            )),
        ]
    );
    session.handle(SessionEvent::TornDown);
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn late_audio_after_stop_is_dropped() {
    let mut session = activated();
    session.handle(SessionEvent::StopRequested);
    let effects = session.handle(SessionEvent::Remote(RemoteEvent::Audio(audio_payload(
        2_400,
    ))));
    assert!(effects.is_empty());
    assert!(session.playback().lock().unwrap().is_idle());
}

#[test]
fn session_can_restart_after_a_full_stop() {
    let mut session = activated();
    session.handle(SessionEvent::StopRequested);
    session.handle(SessionEvent::TornDown);
    assert_eq!(session.state(), SessionState::Idle);

    let effects = session.handle(SessionEvent::StartRequested);
    assert_eq!(effects, vec![SideEffect::AcquireMic]);
    assert_eq!(session.state(), SessionState::Connecting);
}
