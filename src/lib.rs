//! Live duplex voice session engine: microphone capture framed for a
//! remote generative session, gapless playback of its replies, and a
//! barge-in-aware lifecycle around both.

pub mod audio;
pub mod config;
pub mod error;
pub mod session;
pub mod transcript;
pub mod transport;

// Re-export the main entry points for convenient access
pub use config::{SessionConfig, Voice};
pub use error::SessionError;
pub use session::machine::{LiveSession, SessionState, SideEffect};
