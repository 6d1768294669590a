//! The session bridge: one remote shell per transport channel.

mod session;
mod state;

pub use session::{SessionBridge, SessionSettings, CONNECTED_STATUS};
pub use state::{SessionEvent, SessionState};

#[cfg(test)]
mod tests;
