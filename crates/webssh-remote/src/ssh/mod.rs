//! `russh`-backed connector: password auth, PTY, interactive shell.

mod connector;
mod handler;
mod shell;

pub use connector::{SshConnector, SshOptions};
pub use shell::SshShell;
