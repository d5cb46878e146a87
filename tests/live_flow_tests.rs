use std::time::Duration;
use tokio::sync::mpsc;

use voxline::audio::frame::encode_frame;
use voxline::transport::mock::MockConnector;
use voxline::transport::{decode_pcm, LiveConnector, MediaChunk, RemoteEvent};
use voxline::{SessionConfig, SessionError};

fn outbound_chunk() -> MediaChunk {
    encode_frame(&vec![0.1f32; 4_096])
}

async fn next_event(rx: &mut mpsc::Receiver<RemoteEvent>) -> RemoteEvent {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("mock reply timed out")
        .expect("event channel closed")
}

#[tokio::test]
async fn mock_session_answers_streamed_frames() {
    let (tx, mut rx) = mpsc::channel(32);
    let connector = MockConnector::default();
    let handle = connector
        .connect(&SessionConfig::default(), tx)
        .await
        .unwrap();

    assert_eq!(next_event(&mut rx).await, RemoteEvent::Opened);

    for _ in 0..connector.reply_every {
        handle.send_realtime(outbound_chunk()).unwrap();
    }

    match next_event(&mut rx).await {
        RemoteEvent::Audio(payload) => {
            let samples = decode_pcm(&payload).unwrap();
            assert!(!samples.is_empty());
            assert!(samples.iter().all(|s| s.abs() <= 1.0));
        }
        other => panic!("expected audio, got {other:?}"),
    }
    assert!(matches!(
        next_event(&mut rx).await,
        RemoteEvent::Transcript(_)
    ));

    handle.close();
    assert_eq!(next_event(&mut rx).await, RemoteEvent::Closed);

    // Closed means closed: sends fail and a second close stays quiet.
    assert!(matches!(
        handle.send_realtime(outbound_chunk()),
        Err(SessionError::TransportSend(_))
    ));
    handle.close();
    let quiet = tokio::time::timeout(Duration::from_millis(600), rx.recv()).await;
    assert!(quiet.is_err(), "no further events after close");
}

#[tokio::test]
async fn connect_fails_cleanly_when_nobody_listens() {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    let connector = MockConnector::default();
    let result = connector.connect(&SessionConfig::default(), tx).await;
    assert!(matches!(result, Err(SessionError::ConnectionFailure(_))));
}

#[tokio::test]
async fn mock_stays_silent_until_enough_audio_arrives() {
    let (tx, mut rx) = mpsc::channel(32);
    let connector = MockConnector::default();
    let handle = connector
        .connect(&SessionConfig::default(), tx)
        .await
        .unwrap();
    assert_eq!(next_event(&mut rx).await, RemoteEvent::Opened);

    // One frame short of a reply.
    for _ in 0..connector.reply_every - 1 {
        handle.send_realtime(outbound_chunk()).unwrap();
    }
    let quiet = tokio::time::timeout(Duration::from_millis(600), rx.recv()).await;
    assert!(quiet.is_err(), "mock replied too early");

    handle.close();
}
