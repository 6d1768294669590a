pub mod errors;
pub mod id;
pub mod protocol;
pub mod types;

pub use errors::{ConfigError, ConfigValidationError, TransportError};
pub use id::{new_id, ChannelId};
pub use protocol::{ClientMessage, ServerMessage};
pub use types::{ConnectionConfig, WindowSize, DEFAULT_SSH_PORT};
