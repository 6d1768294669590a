//! The connection form and its validation gate.

use webssh_common::{ConfigValidationError, ConnectionConfig, DEFAULT_SSH_PORT};

/// Raw form fields as typed by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectForm {
    pub host: String,
    /// Free text; anything that is not a port number falls back to 22.
    pub port: String,
    pub username: String,
    pub credential: String,
}

impl Default for ConnectForm {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_SSH_PORT.to_string(),
            username: String::new(),
            credential: String::new(),
        }
    }
}

impl std::fmt::Debug for ConnectForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectForm")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("credential", &"<redacted>")
            .finish()
    }
}

impl ConnectForm {
    /// Check that host, username and credential are filled in.
    ///
    /// Nothing is sent anywhere when this fails.
    pub fn validate(&self) -> Result<ConnectionConfig, ConfigValidationError> {
        if self.host.trim().is_empty() {
            return Err(ConfigValidationError::MissingHost);
        }
        if self.username.trim().is_empty() {
            return Err(ConfigValidationError::MissingUsername);
        }
        if self.credential.is_empty() {
            return Err(ConfigValidationError::MissingCredential);
        }

        Ok(ConnectionConfig::new(
            self.host.trim(),
            parse_port(&self.port),
            self.username.trim(),
            self.credential.clone(),
        ))
    }
}

fn parse_port(text: &str) -> u16 {
    match text.trim().parse::<u16>() {
        Ok(0) | Err(_) => DEFAULT_SSH_PORT,
        Ok(port) => port,
    }
}
