use serde::{Deserialize, Serialize};

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the `webssh` crates: trace, debug, info, warn or error.
    /// `RUST_LOG` still takes precedence when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

impl LoggingConfig {
    /// `EnvFilter` directive covering every workspace crate.
    pub fn directive(&self) -> String {
        let level = self.level.trim().to_ascii_lowercase();
        ["webssh", "webssh_server", "webssh_remote", "webssh_config", "webssh_client"]
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}
