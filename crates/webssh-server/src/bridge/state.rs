//! Session lifecycle states and their legal transitions.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Channel open, no `init` yet.
    Idle,
    /// `init` received; connecting and opening the shell.
    Connecting,
    /// Shell open; input, output and resize are forwarded.
    Ready,
    /// Torn down after the shell or the channel closed.
    Closed,
    /// Connect or shell-open failed. The channel is left to the client.
    Failed,
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    InitReceived,
    ConnectorReady,
    ConnectFailed,
    ShellOpened,
    ShellOpenFailed,
    ShellClosed,
    ChannelClosed,
}

impl SessionState {
    /// The state after `event`, or `None` if the event is not legal here and
    /// must be ignored.
    pub fn next(self, event: SessionEvent) -> Option<SessionState> {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            (Idle, InitReceived) => Some(Connecting),
            (Idle, ChannelClosed) => Some(Closed),

            (Connecting, ConnectorReady) => Some(Connecting),
            (Connecting, ShellOpened) => Some(Ready),
            (Connecting, ConnectFailed) => Some(Failed),
            (Connecting, ShellOpenFailed) => Some(Failed),
            (Connecting, ChannelClosed) => Some(Closed),

            (Ready, ShellClosed) => Some(Closed),
            (Ready, ChannelClosed) => Some(Closed),

            // Duplicate init, late remote events, and anything after a
            // terminal state.
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
            SessionState::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
