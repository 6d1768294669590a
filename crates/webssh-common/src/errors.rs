use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),
}

/// Rejected connection form, caught before any channel traffic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("host is required")]
    MissingHost,

    #[error("username is required")]
    MissingUsername,

    #[error("credential is required")]
    MissingCredential,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,

    #[error("message encode error: {0}")]
    Encode(String),

    #[error("websocket error: {0}")]
    WebSocket(String),
}
