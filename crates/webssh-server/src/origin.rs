//! Upgrade-request policy: path and cross-origin checks.

use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request};
use tokio_tungstenite::tungstenite::http::{header, StatusCode};
use webssh_config::{Mode, ServerSection};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("no WebSocket endpoint at {0}")]
    NotFound(String),

    #[error("origin {0} is not allowed")]
    Forbidden(String),
}

impl Rejection {
    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::NotFound(_) => StatusCode::NOT_FOUND,
            Rejection::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }

    pub fn into_response(self) -> ErrorResponse {
        let status = self.status();
        let mut response = ErrorResponse::new(Some(self.to_string()));
        *response.status_mut() = status;
        response
    }
}

/// Which upgrade requests are accepted.
///
/// Production accepts same-origin requests only (the `Origin` host equals
/// the `Host` header, or there is no `Origin` at all). Development also
/// accepts the configured `allowed_origins`.
#[derive(Debug, Clone)]
pub struct OriginPolicy {
    mode: Mode,
    ws_path: String,
    allowed_origins: Vec<String>,
}

impl OriginPolicy {
    pub fn from_config(section: &ServerSection) -> Self {
        Self {
            mode: section.mode,
            ws_path: section.ws_path.clone(),
            allowed_origins: section
                .allowed_origins
                .iter()
                .map(|o| normalize(o))
                .collect(),
        }
    }

    pub fn check(
        &self,
        path: &str,
        origin: Option<&str>,
        host: Option<&str>,
    ) -> Result<(), Rejection> {
        if path != self.ws_path {
            return Err(Rejection::NotFound(path.to_string()));
        }

        let Some(origin) = origin else {
            return Ok(());
        };
        let origin = normalize(origin);

        let same_origin = host.is_some_and(|host| origin_host(&origin) == host.to_ascii_lowercase());
        if same_origin {
            return Ok(());
        }
        if self.mode == Mode::Development && self.allowed_origins.contains(&origin) {
            return Ok(());
        }
        Err(Rejection::Forbidden(origin))
    }

    pub fn check_request(&self, request: &Request) -> Result<(), Rejection> {
        let header_str = |name: header::HeaderName| {
            request
                .headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
        };
        self.check(
            request.uri().path(),
            header_str(header::ORIGIN),
            header_str(header::HOST),
        )
    }
}

fn normalize(origin: &str) -> String {
    origin.trim().trim_end_matches('/').to_ascii_lowercase()
}

/// `host[:port]` part of a normalized origin.
fn origin_host(origin: &str) -> &str {
    origin
        .strip_prefix("https://")
        .or_else(|| origin.strip_prefix("http://"))
        .unwrap_or(origin)
}
