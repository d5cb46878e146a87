pub mod event;
pub mod machine;

pub use event::SessionEvent;
pub use machine::{LiveSession, SessionState, SideEffect};
