use serde::{Deserialize, Serialize};

/// Deployment mode. Only affects the cross-origin policy of the upgrade
/// handshake; the session bridge behaves the same in both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    /// Parse `production`/`development` (case-insensitive). Returns `None`
    /// for anything else.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub mode: Mode,
    /// Path the WebSocket upgrade must target.
    pub ws_path: String,
    /// Extra origins accepted in development mode.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 4000,
            mode: Mode::Development,
            ws_path: "/ws".into(),
            allowed_origins: vec![
                "http://localhost:3000".into(),
                "http://127.0.0.1:3000".into(),
            ],
        }
    }
}

impl ServerSection {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parse() {
        assert_eq!(Mode::parse("production"), Some(Mode::Production));
        assert_eq!(Mode::parse(" PROD "), Some(Mode::Production));
        assert_eq!(Mode::parse("development"), Some(Mode::Development));
        assert_eq!(Mode::parse("staging"), None);
    }

    #[test]
    fn bind_address_joins_host_and_port() {
        let section = ServerSection {
            host: "127.0.0.1".into(),
            port: 9000,
            ..Default::default()
        };
        assert_eq!(section.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn default_origins_cover_dev_server() {
        let section = ServerSection::default();
        assert!(section
            .allowed_origins
            .contains(&"http://localhost:3000".to_string()));
    }
}
