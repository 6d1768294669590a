//! Client end of the server channel.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use webssh_common::{ClientMessage, ServerMessage, TransportError};

/// What the channel reports back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Connected,
    Message(ServerMessage),
    /// The channel is gone, whether it never connected, the server closed
    /// it, or the network dropped it.
    Closed,
}

pub trait ClientChannel {
    fn send(&mut self, message: ClientMessage) -> Result<(), TransportError>;

    /// Next pending event without blocking.
    fn try_next_event(&mut self) -> Option<ChannelEvent>;

    /// Close the channel. Idempotent.
    fn close(&mut self);

    fn is_connected(&self) -> bool;
}

enum Command {
    Send(String),
    Close,
}

/// [`ClientChannel`] over a WebSocket running in a background tokio task.
pub struct WsClientChannel {
    cmd_tx: mpsc::UnboundedSender<Command>,
    event_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    connected: bool,
    closed: bool,
}

impl WsClientChannel {
    /// Start connecting to `url`. Must be called inside a tokio runtime.
    pub fn connect(url: impl Into<String>) -> Self {
        let url = url.into();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_channel(url, cmd_rx, event_tx));
        Self {
            cmd_tx,
            event_rx,
            connected: false,
            closed: false,
        }
    }

    /// Wait for the next event. `None` once the background task is gone and
    /// every event has been consumed.
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        let event = self.event_rx.recv().await;
        if let Some(event) = &event {
            self.observe(event);
        }
        event
    }

    fn observe(&mut self, event: &ChannelEvent) {
        match event {
            ChannelEvent::Connected => self.connected = true,
            ChannelEvent::Closed => {
                self.connected = false;
                self.closed = true;
            }
            ChannelEvent::Message(_) => {}
        }
    }
}

impl ClientChannel for WsClientChannel {
    fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let json = message.encode()?;
        self.cmd_tx
            .send(Command::Send(json))
            .map_err(|_| TransportError::Closed)
    }

    fn try_next_event(&mut self) -> Option<ChannelEvent> {
        let event = self.event_rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.connected = false;
        let _ = self.cmd_tx.send(Command::Close);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

async fn run_channel(
    url: String,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
) {
    let ws = match connect_async(&url).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            warn!(%url, error = %e, "Failed to connect to server");
            let _ = event_tx.send(ChannelEvent::Closed);
            return;
        }
    };
    info!(%url, "Connected to server");
    let _ = event_tx.send(ChannelEvent::Connected);

    let (mut sink, mut stream) = ws.split();

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => match cmd {
                Some(Command::Send(json)) => {
                    if let Err(e) = sink.send(Message::Text(json.into())).await {
                        debug!(error = %e, "Send failed");
                        break;
                    }
                }
                Some(Command::Close) | None => {
                    let _ = sink.close().await;
                    break;
                }
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => match ServerMessage::decode(&text) {
                    Ok(message) => {
                        let _ = event_tx.send(ChannelEvent::Message(message));
                    }
                    Err(e) => {
                        warn!(error = %e, "Invalid server message");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    let _ = sink.send(Message::Pong(data)).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "WS error");
                    break;
                }
                _ => {}
            },
        }
    }

    info!(%url, "Disconnected from server");
    let _ = event_tx.send(ChannelEvent::Closed);
}
