//! webssh-client: the browser-side terminal bridge.
//!
//! [`TerminalClient`] wires a terminal emulator to a server channel: it
//! validates the connection form, sends `init` and `resize`, forwards
//! keystrokes, and renders whatever the server sends back. Rendering and
//! keystroke capture live behind the [`Emulator`] trait; the transport lives
//! behind [`ClientChannel`], with [`WsClientChannel`] as the WebSocket
//! implementation.

pub mod channel;
pub mod credential_cache;
pub mod emulator;
pub mod form;
pub mod terminal;

pub use channel::{ChannelEvent, ClientChannel, WsClientChannel};
pub use credential_cache::{default_cache_path, CacheError, CredentialCache};
pub use emulator::Emulator;
pub use form::ConnectForm;
pub use terminal::{ClientBackend, TerminalClient, View, WsBackend};
