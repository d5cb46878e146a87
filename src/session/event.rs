use crate::transport::RemoteEvent;

/// Everything that can drive the session machine, in arrival order.
///
/// User actions and driver reports are local; `Remote` wraps whatever
/// the live connection pushes. The machine consumes these one at a time
/// on a single event loop, which is what makes interrupt-vs-enqueue
/// ordering trivial.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// User pressed start.
    StartRequested,
    /// User pressed stop.
    StopRequested,
    /// The driver acquired the microphone at the given native rate.
    MicAcquired { sample_rate: u32 },
    /// The driver could not acquire the microphone.
    MicFailed(String),
    /// The remote connect call failed before the session opened.
    ConnectFailed(String),
    /// The driver finished executing a teardown.
    TornDown,
    /// Pushed by the remote session.
    Remote(RemoteEvent),
}
