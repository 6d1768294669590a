//! Wire protocol between the browser terminal and the session bridge.
//!
//! Each message is one JSON text frame tagged by `type`. Control events
//! (`resize`, `status`) and data events (`input`, `output`) share the
//! channel and are told apart by the tag alone.

use serde::{Deserialize, Serialize};

use crate::errors::TransportError;
use crate::types::{ConnectionConfig, WindowSize};

/// Messages sent from the browser to the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "init")]
    Init(ConnectionConfig),

    #[serde(rename = "input")]
    Input { data: String },

    #[serde(rename = "resize")]
    Resize { rows: u16, cols: u16 },
}

/// Messages sent from the server to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "output")]
    Output { data: String },

    #[serde(rename = "status")]
    Status { text: String },
}

impl ClientMessage {
    pub fn resize(size: WindowSize) -> Self {
        Self::Resize {
            rows: size.rows,
            cols: size.cols,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init(_) => "init",
            Self::Input { .. } => "input",
            Self::Resize { .. } => "resize",
        }
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encode(e.to_string()))
    }
}

impl ServerMessage {
    pub fn output(data: impl Into<String>) -> Self {
        Self::Output { data: data.into() }
    }

    pub fn status(text: impl Into<String>) -> Self {
        Self::Status { text: text.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Output { .. } => "output",
            Self::Status { .. } => "status",
        }
    }

    /// Text the terminal should render for this message.
    pub fn text(&self) -> &str {
        match self {
            Self::Output { data } => data,
            Self::Status { text } => text,
        }
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn encode(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encode(e.to_string()))
    }
}
