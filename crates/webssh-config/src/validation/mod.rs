//! Configuration validation.
//!
//! Collects every problem into a single `ConfigError` so one run of the
//! server reports all of them.

mod helpers;


use crate::schema::ServerConfig;
use helpers::validate_range;
use webssh_common::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ServerConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_server(&mut errors, config);
    validate_ssh(&mut errors, config);
    validate_logging(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_server(errors: &mut Vec<String>, config: &ServerConfig) {
    if config.server.host.trim().is_empty() {
        errors.push("server.host must not be empty".into());
    }
    if !config.server.ws_path.starts_with('/') {
        errors.push(format!(
            "server.ws_path = {:?} must start with '/'",
            config.server.ws_path
        ));
    }
}

fn validate_ssh(errors: &mut Vec<String>, config: &ServerConfig) {
    if config.ssh.term.trim().is_empty() {
        errors.push("ssh.term must not be empty".into());
    }
    validate_range(errors, "ssh.default_cols", config.ssh.default_cols.into(), 1, 500);
    validate_range(errors, "ssh.default_rows", config.ssh.default_rows.into(), 1, 500);
}

fn validate_logging(errors: &mut Vec<String>, config: &ServerConfig) {
    let level = config.logging.level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }
}
