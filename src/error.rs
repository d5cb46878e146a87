use thiserror::Error;

/// Everything that can go wrong inside a live session.
///
/// None of these are retried automatically; the only recovery path is a
/// fresh user-initiated start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Microphone access was refused or no input device exists.
    /// Fatal to session start.
    #[error("microphone unavailable: {0}")]
    PermissionDenied(String),

    /// The remote session failed to open or dropped mid-flight.
    #[error("session connection failed: {0}")]
    ConnectionFailure(String),

    /// A single outbound frame could not be sent. Non-fatal; the frame
    /// is dropped because late real-time audio is worthless.
    #[error("outbound frame not sent: {0}")]
    TransportSend(String),

    /// An inbound segment could not be decoded. The segment is dropped;
    /// the session stays up.
    #[error("inbound segment rejected: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
