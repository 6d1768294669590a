//! In-memory channel for session tests.

use async_trait::async_trait;
use tokio::sync::mpsc;
use webssh_common::{ChannelId, ClientMessage, ServerMessage, TransportError};
use webssh_remote::fake::Journal;

use super::TransportChannel;

pub(crate) struct MemoryChannel {
    id: ChannelId,
    inbound: mpsc::UnboundedReceiver<ClientMessage>,
    outbound: mpsc::UnboundedSender<ServerMessage>,
    journal: Journal,
    open: bool,
}

/// Client end of a [`MemoryChannel`]. Dropping it closes the channel.
pub(crate) struct MemoryClient {
    pub tx: mpsc::UnboundedSender<ClientMessage>,
    pub rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl MemoryClient {
    pub fn send(&self, message: ClientMessage) {
        let _ = self.tx.send(message);
    }

    /// Drop the sending half, as a browser closing the tab would.
    pub fn hang_up(self) -> mpsc::UnboundedReceiver<ServerMessage> {
        self.rx
    }

    /// Everything the server has sent so far.
    pub fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        out
    }
}

impl MemoryChannel {
    pub fn new(journal: Journal) -> (Self, MemoryClient) {
        let (client_tx, inbound) = mpsc::unbounded_channel();
        let (outbound, client_rx) = mpsc::unbounded_channel();
        let channel = Self {
            id: ChannelId::new(),
            inbound,
            outbound,
            journal,
            open: true,
        };
        let client = MemoryClient {
            tx: client_tx,
            rx: client_rx,
        };
        (channel, client)
    }
}

#[async_trait]
impl TransportChannel for MemoryChannel {
    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError> {
        if !self.open {
            return Err(TransportError::Closed);
        }
        self.journal.push(format!("send {}", message.kind()));
        self.outbound
            .send(message)
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<ClientMessage> {
        if !self.open {
            return None;
        }
        let message = self.inbound.recv().await;
        if message.is_none() {
            self.open = false;
            self.journal.push("channel_closed_by_client");
        }
        message
    }

    async fn close(&mut self) {
        if self.open {
            self.open = false;
            self.journal.push("channel_close");
        }
        self.inbound.close();
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
