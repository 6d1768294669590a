use std::time::Duration;

/// Failure to establish the remote session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("failed to connect to {addr}: {reason}")]
    Unreachable { addr: String, reason: String },

    #[error("SSH handshake failed: {0}")]
    Handshake(String),

    #[error("auth failed for user {username:?} (server allows: {methods})")]
    AuthFailed { username: String, methods: String },

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("already connected")]
    AlreadyConnected,
}

/// Failure to open or drive the interactive shell.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    #[error("not connected")]
    NotConnected,

    #[error("failed to open session channel: {0}")]
    ChannelOpen(String),

    #[error("PTY request failed: {0}")]
    Pty(String),

    #[error("shell request failed: {0}")]
    Shell(String),

    #[error("write failed: {0}")]
    Write(String),

    #[error("window change failed: {0}")]
    Resize(String),

    #[error("shell stream closed")]
    Closed,

    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}
