//! webssh server configuration.
//!
//! Provides TOML-based configuration with environment overrides and
//! validation. Every section has defaults, so an empty or missing file
//! yields a working development server.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use webssh_config::{load_config, config_to_json};
//!
//! let config = load_config(None).expect("failed to load config");
//! println!("{}", config_to_json(&config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_env_overrides, apply_env_overrides_from};
pub use schema::{LoggingConfig, Mode, ServerConfig, ServerSection, SshConfig};

use std::path::Path;

use webssh_common::ConfigError;

/// Load config from `path`, or from the platform default location.
///
/// A missing default file is not an error: defaults are used. Environment
/// overrides (`PORT`, `WEBSSH_MODE`) are applied before validation.
pub fn load_config(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
    let mut config = match path {
        Some(p) => toml_loader::load_from_path(p)?,
        None => toml_loader::load_default()?,
    };

    apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &ServerConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
