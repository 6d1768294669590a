//! Environment overrides for process configuration.

use tracing::warn;

use crate::schema::{Mode, ServerConfig};

/// Listening port override.
pub const PORT_VAR: &str = "PORT";
/// `production` or `development`.
pub const MODE_VAR: &str = "WEBSSH_MODE";

/// Apply overrides from the process environment.
pub fn apply_env_overrides(config: &mut ServerConfig) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

/// Apply overrides using `lookup` to read variables. Unparseable values are
/// logged and ignored.
pub fn apply_env_overrides_from<F>(config: &mut ServerConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup(PORT_VAR) {
        match port.trim().parse::<u16>() {
            Ok(p) => config.server.port = p,
            Err(e) => warn!("ignoring {PORT_VAR}={port:?}: {e}"),
        }
    }

    if let Some(mode) = lookup(MODE_VAR) {
        match Mode::parse(&mode) {
            Some(m) => config.server.mode = m,
            None => warn!("ignoring {MODE_VAR}={mode:?}: expected production or development"),
        }
    }
}
