use std::net::SocketAddr;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use tracing::{debug, trace, warn};
use webssh_common::{ChannelId, ClientMessage, ServerMessage, TransportError};

use super::TransportChannel;

/// [`TransportChannel`] over an accepted WebSocket. One JSON text frame per
/// message.
pub struct WsChannel<S> {
    id: ChannelId,
    peer: SocketAddr,
    ws: WebSocketStream<S>,
    open: bool,
    close_sent: bool,
}

impl<S> WsChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(ws: WebSocketStream<S>, peer: SocketAddr) -> Self {
        Self {
            id: ChannelId::new(),
            peer,
            ws,
            open: true,
            close_sent: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    fn decode(&self, text: &str) -> Option<ClientMessage> {
        match ClientMessage::decode(text) {
            Ok(message) => Some(message),
            Err(e) => {
                warn!(peer = %self.peer, channel = %self.id.short(), error = %e, "Invalid client message");
                None
            }
        }
    }
}

#[async_trait]
impl<S> TransportChannel for WsChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        let json = message.encode()?;
        self.ws
            .send(Message::Text(json.into()))
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))
    }

    async fn recv(&mut self) -> Option<ClientMessage> {
        while self.open {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    if let Some(message) = self.decode(&text) {
                        return Some(message);
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => {
                        if let Some(message) = self.decode(text) {
                            return Some(message);
                        }
                    }
                    Err(_) => {
                        warn!(peer = %self.peer, channel = %self.id.short(), "Binary frame is not UTF-8");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = self.ws.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => {
                    debug!(peer = %self.peer, channel = %self.id.short(), "Client closed channel");
                    self.open = false;
                }
                Some(Err(e)) => {
                    debug!(peer = %self.peer, channel = %self.id.short(), error = %e, "WS error");
                    self.open = false;
                }
                Some(Ok(other)) => {
                    trace!(frame = ?other, "Ignoring frame");
                }
            }
        }
        None
    }

    async fn close(&mut self) {
        self.open = false;
        if self.close_sent {
            return;
        }
        self.close_sent = true;
        if let Err(e) = self.ws.close(None).await {
            debug!(peer = %self.peer, channel = %self.id.short(), error = %e, "WS close error (may already be closed)");
        }
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
