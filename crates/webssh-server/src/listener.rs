use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tracing::{debug, info, warn};
use webssh_config::ServerConfig;
use webssh_remote::RemoteShellConnector;

use crate::bridge::{SessionBridge, SessionSettings};
use crate::channel::WsChannel;
use crate::origin::OriginPolicy;
use crate::registry::SessionRegistry;
use crate::wait_for_shutdown;

/// Accept WebSocket upgrades on `listener` until `shutdown` fires.
///
/// `make_connector` is called once per accepted connection; each session
/// owns the connector it gets.
pub async fn serve<F, C>(
    listener: TcpListener,
    config: &ServerConfig,
    make_connector: F,
    registry: SessionRegistry,
    mut shutdown: watch::Receiver<bool>,
) where
    F: Fn() -> C,
    C: RemoteShellConnector + 'static,
{
    let policy = Arc::new(OriginPolicy::from_config(&config.server));
    let settings = SessionSettings::from(&config.ssh);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "TCP connection accepted");
                    let policy = Arc::clone(&policy);
                    let settings = settings.clone();
                    let registry = registry.clone();
                    let shutdown = shutdown.clone();
                    let connector = make_connector();
                    tokio::spawn(async move {
                        handle_connection(stream, peer, &policy, settings, registry, shutdown, connector)
                            .await;
                    });
                }
                Err(e) => {
                    warn!(error = %e, "TCP accept error");
                }
            },
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Listener stopped");
                break;
            }
        }
    }
}

async fn handle_connection<C: RemoteShellConnector>(
    stream: TcpStream,
    peer: SocketAddr,
    policy: &OriginPolicy,
    settings: SessionSettings,
    registry: SessionRegistry,
    shutdown: watch::Receiver<bool>,
    connector: C,
) {
    let _ = stream.set_nodelay(true);

    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        match policy.check_request(request) {
            Ok(()) => Ok(response),
            Err(rejection) => {
                warn!(%peer, reason = %rejection, "Upgrade rejected");
                Err(rejection.into_response())
            }
        }
    };

    match accept_hdr_async(stream, callback).await {
        Ok(ws) => {
            let channel = WsChannel::new(ws, peer);
            SessionBridge::new(channel, peer, settings, registry, shutdown)
                .run(connector)
                .await;
        }
        Err(e) => {
            debug!(%peer, error = %e, "WS handshake failed");
        }
    }
}
