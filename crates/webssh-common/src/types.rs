use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_SSH_PORT: u16 = 22;

/// Parameters for one remote shell session.
///
/// Immutable once a session starts. Empty-field checks happen on the client
/// before the config is ever sent.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    /// Missing, `null` and `0` all mean [`DEFAULT_SSH_PORT`].
    #[serde(default = "default_port", deserialize_with = "port_or_default")]
    pub port: u16,
    pub username: String,
    #[serde(alias = "password")]
    pub credential: String,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: if port == 0 { DEFAULT_SSH_PORT } else { port },
            username: username.into(),
            credential: credential.into(),
        }
    }

    /// `host:port` for socket connects and log lines.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port)
    }
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

fn port_or_default<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let port = Option::<u16>::deserialize(deserializer)?;
    Ok(match port {
        Some(0) | None => DEFAULT_SSH_PORT,
        Some(p) => p,
    })
}

/// PTY window size in character cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub rows: u16,
    pub cols: u16,
}

impl WindowSize {
    pub const fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl fmt::Display for WindowSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}
