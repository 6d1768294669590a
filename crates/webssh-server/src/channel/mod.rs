//! Duplex typed message channel between one browser client and one session.

mod ws;

#[cfg(test)]
pub(crate) mod memory;

pub use ws::WsChannel;

use async_trait::async_trait;
use webssh_common::{ChannelId, ClientMessage, ServerMessage, TransportError};

/// Ordered, reliable message channel for the lifetime of one connection.
///
/// No retries, no acknowledgements and no buffering across a severed
/// connection.
#[async_trait]
pub trait TransportChannel: Send {
    fn id(&self) -> &ChannelId;

    async fn send(&mut self, message: ServerMessage) -> Result<(), TransportError>;

    /// Next client message, or `None` once the channel is closed.
    ///
    /// Cancel safe: dropping the future before it resolves loses nothing.
    async fn recv(&mut self) -> Option<ClientMessage>;

    /// Close the channel. Idempotent.
    async fn close(&mut self);

    fn is_open(&self) -> bool;
}
