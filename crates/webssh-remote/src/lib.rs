//! Remote shell connector.
//!
//! A [`RemoteShellConnector`] establishes one authenticated remote session
//! and opens at most one interactive shell on it. The shell is a
//! [`ShellStream`]: a duplex byte stream with a window-size control.
//!
//! [`SshConnector`] is the production implementation on top of `russh`.
//! With the `testing` feature, [`fake::FakeConnector`] provides a scripted
//! in-memory connector.

pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod fake;
pub mod ssh;

use async_trait::async_trait;
use webssh_common::{ConnectionConfig, WindowSize};

pub use error::{ConnectError, ShellError};
pub use ssh::{SshConnector, SshOptions, SshShell};

/// Something the shell stream reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Output bytes, exactly as received from the remote.
    Data(Vec<u8>),
    /// The remote closed the shell.
    Closed { exit_status: Option<u32> },
}

/// Owns the connection to one remote host.
///
/// One instance serves exactly one session. `close` releases the connection
/// and anything opened on it, and is safe to call more than once.
#[async_trait]
pub trait RemoteShellConnector: Send {
    type Shell: ShellStream + 'static;

    /// Connect and authenticate with the password credential. No retry.
    async fn connect(&mut self, config: &ConnectionConfig) -> Result<(), ConnectError>;

    /// Open an interactive shell with a PTY of the given size.
    async fn open_shell(&mut self, size: WindowSize) -> Result<Self::Shell, ShellError>;

    async fn close(&mut self);

    fn is_connected(&self) -> bool;
}

/// Duplex byte stream of an open shell.
#[async_trait]
pub trait ShellStream: Send {
    /// Send input to the shell. Callers treat this as fire-and-forget; this
    /// is the place to put a bounded queue if backpressure is ever wanted.
    async fn write(&mut self, data: &[u8]) -> Result<(), ShellError>;

    async fn set_window_size(&mut self, size: WindowSize) -> Result<(), ShellError>;

    /// Wait for the next output chunk or for the shell to close.
    ///
    /// Must be cancel safe: callers select on it together with other
    /// sources and drop the future when another branch wins.
    async fn next_event(&mut self) -> ShellEvent;

    async fn close(&mut self);
}
