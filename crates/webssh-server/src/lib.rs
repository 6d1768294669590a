//! webssh-server: bridges browser terminals to SSH shells over WebSocket.
//!
//! Each accepted connection becomes one [`bridge::SessionBridge`] running on
//! its own task. The bridge owns the remote connector and tears the shell
//! and the channel down together.

pub mod bridge;
pub mod channel;
mod listener;
pub mod origin;
pub mod output;
pub mod registry;

pub use listener::serve;

use tokio::sync::watch;

/// Resolves once `shutdown` flips to `true`. Never resolves if the sender is
/// dropped without signalling.
pub(crate) async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
