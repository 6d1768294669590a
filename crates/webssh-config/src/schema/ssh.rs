//! Remote shell settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SshConfig {
    /// Terminal type requested with the PTY.
    pub term: String,
    /// PTY size used when the client has not sent a resize yet.
    pub default_cols: u16,
    pub default_rows: u16,
    /// SSH keepalive interval. `0` disables keepalives.
    pub keepalive_interval_secs: u64,
    /// Upper bound on connect and shell-open. `0` waits forever.
    pub connect_timeout_secs: u64,
    /// Close the channel after reporting a connect or shell failure.
    pub close_on_failure: bool,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            term: "xterm-256color".into(),
            default_cols: 80,
            default_rows: 24,
            keepalive_interval_secs: 20,
            connect_timeout_secs: 0,
            close_on_failure: false,
        }
    }
}

impl SshConfig {
    pub fn keepalive_interval(&self) -> Option<Duration> {
        (self.keepalive_interval_secs > 0).then(|| Duration::from_secs(self.keepalive_interval_secs))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        (self.connect_timeout_secs > 0).then(|| Duration::from_secs(self.connect_timeout_secs))
    }
}
