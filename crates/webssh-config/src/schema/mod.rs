//! Configuration schema types for the webssh server.
//!
//! All structs derive `Serialize` and `Deserialize` and use
//! `#[serde(default)]` so that partial TOML files work correctly.

mod logging;
mod server;
mod ssh;

pub use logging::LoggingConfig;
pub use server::{Mode, ServerSection};
pub use ssh::SshConfig;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    pub server: ServerSection,
    pub ssh: SshConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.mode, Mode::Development);
        assert_eq!(config.ssh.term, "xterm-256color");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
[server]
port = 8022
mode = "production"

[ssh]
close_on_failure = true
"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8022);
        assert_eq!(config.server.mode, Mode::Production);
        assert_eq!(config.server.ws_path, "/ws");
        assert!(config.ssh.close_on_failure);
        assert_eq!(config.ssh.default_cols, 80);
    }
}
