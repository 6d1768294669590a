use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, trace, warn};
use webssh_common::{ChannelId, ClientMessage, ServerMessage, WindowSize};
use webssh_config::SshConfig;
use webssh_remote::{ConnectError, RemoteShellConnector, ShellError, ShellEvent, ShellStream};

use super::state::{SessionEvent, SessionState};
use crate::channel::TransportChannel;
use crate::output::Utf8Decoder;
use crate::registry::SessionRegistry;
use crate::wait_for_shutdown;

/// Status line sent once the remote shell is open.
pub const CONNECTED_STATUS: &str = "SSH connection established\r\n";

/// Per-session knobs taken from `[ssh]`.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// PTY size when no resize arrived before the shell opened.
    pub default_size: WindowSize,
    /// Bound on `connect` and `open_shell`. `None` waits forever.
    pub remote_timeout: Option<Duration>,
    /// Close the channel after reporting a failure instead of leaving it to
    /// the client.
    pub close_on_failure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_size: WindowSize::default(),
            remote_timeout: None,
            close_on_failure: false,
        }
    }
}

impl From<&SshConfig> for SessionSettings {
    fn from(config: &SshConfig) -> Self {
        Self {
            default_size: WindowSize::new(config.default_rows, config.default_cols),
            remote_timeout: config.connect_timeout(),
            close_on_failure: config.close_on_failure,
        }
    }
}

/// Drives one session from `init` to teardown.
///
/// Everything runs on the task that calls [`SessionBridge::run`]: the
/// channel, the shell stream and the shutdown signal are multiplexed with
/// `select!`, so no two handlers of one session ever overlap.
pub struct SessionBridge<T> {
    id: ChannelId,
    peer: SocketAddr,
    channel: T,
    settings: SessionSettings,
    registry: SessionRegistry,
    shutdown: watch::Receiver<bool>,
    state: SessionState,
    pending_size: Option<WindowSize>,
    decoder: Utf8Decoder,
    shutting_down: bool,
}

impl<T: TransportChannel> SessionBridge<T> {
    pub fn new(
        channel: T,
        peer: SocketAddr,
        settings: SessionSettings,
        registry: SessionRegistry,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id: channel.id().clone(),
            peer,
            channel,
            settings,
            registry,
            shutdown,
            state: SessionState::Idle,
            pending_size: None,
            decoder: Utf8Decoder::new(),
            shutting_down: false,
        }
    }

    /// Run the session to completion and return its final state.
    ///
    /// On every exit path the channel is closed before the connector is
    /// released.
    pub async fn run<C: RemoteShellConnector>(mut self, mut connector: C) -> SessionState {
        self.registry.register(&self.id, self.peer).await;
        info!(session = %self.id.short(), peer = %self.peer, "Session opened");

        self.drive(&mut connector).await;

        self.channel.close().await;
        debug!(
            session = %self.id.short(),
            connected = connector.is_connected(),
            "Releasing connector"
        );
        connector.close().await;
        self.registry.unregister(&self.id).await;

        info!(
            session = %self.id.short(),
            peer = %self.peer,
            state = %self.state,
            "Session ended"
        );
        self.state
    }

    async fn drive<C: RemoteShellConnector>(&mut self, connector: &mut C) {
        // Idle: only `init` moves the session forward.
        let config = loop {
            match self.next_inbound().await {
                None => {
                    self.advance(SessionEvent::ChannelClosed).await;
                    return;
                }
                Some(ClientMessage::Init(config)) => break config,
                Some(ClientMessage::Resize { rows, cols }) => {
                    self.pending_size = Some(WindowSize::new(rows, cols));
                }
                Some(ClientMessage::Input { .. }) => {
                    debug!(session = %self.id.short(), "Dropping input before init");
                }
            }
        };

        self.advance(SessionEvent::InitReceived).await;
        let target = config.address();
        self.registry.set_target(&self.id, target.clone()).await;
        info!(session = %self.id.short(), %target, user = %config.username, "Connecting");

        match self
            .await_remote(connector.connect(&config), ConnectError::Timeout)
            .await
        {
            None => {
                self.advance(SessionEvent::ChannelClosed).await;
                return;
            }
            Some(Err(e)) => {
                let text = format!("\r\n*** SSH Connection Error: {e} ***\r\n");
                self.fail(text, SessionEvent::ConnectFailed, connector).await;
                return;
            }
            Some(Ok(())) => self.advance(SessionEvent::ConnectorReady).await,
        }

        let size = self
            .pending_size
            .take()
            .unwrap_or(self.settings.default_size);
        let mut shell = match self
            .await_remote(connector.open_shell(size), ShellError::Timeout)
            .await
        {
            None => {
                self.advance(SessionEvent::ChannelClosed).await;
                return;
            }
            Some(Err(e)) => {
                let text = format!("\r\n*** SSH Shell Error: {e} ***\r\n");
                self.fail(text, SessionEvent::ShellOpenFailed, connector).await;
                return;
            }
            Some(Ok(shell)) => shell,
        };

        // A resize that arrived while the shell was opening wins over the
        // size it was opened with.
        if let Some(latest) = self.pending_size.take() {
            if latest != size {
                self.resize(&mut shell, latest).await;
            }
        }

        self.advance(SessionEvent::ShellOpened).await;
        self.send(ServerMessage::status(CONNECTED_STATUS)).await;
        info!(session = %self.id.short(), %target, %size, "Shell ready");

        self.forward(&mut shell).await;
    }

    /// Ready: shuttle input, resize and output until either side closes.
    async fn forward<S: ShellStream>(&mut self, shell: &mut S) {
        loop {
            tokio::select! {
                inbound = self.next_inbound() => match inbound {
                    None => {
                        self.advance(SessionEvent::ChannelClosed).await;
                        shell.close().await;
                        return;
                    }
                    Some(ClientMessage::Input { data }) => {
                        if let Err(e) = shell.write(data.as_bytes()).await {
                            debug!(session = %self.id.short(), error = %e, "Shell write failed");
                        }
                    }
                    Some(ClientMessage::Resize { rows, cols }) => {
                        self.resize(shell, WindowSize::new(rows, cols)).await;
                    }
                    Some(ClientMessage::Init(_)) => {
                        debug!(session = %self.id.short(), "Ignoring duplicate init");
                    }
                },
                event = shell.next_event() => match event {
                    ShellEvent::Data(bytes) => {
                        if let Some(text) = self.decoder.decode(&bytes) {
                            self.send(ServerMessage::output(text)).await;
                        }
                    }
                    ShellEvent::Closed { exit_status } => {
                        info!(session = %self.id.short(), ?exit_status, "Remote shell closed");
                        if let Some(text) = self.decoder.flush() {
                            self.send(ServerMessage::output(text)).await;
                        }
                        self.advance(SessionEvent::ShellClosed).await;
                        shell.close().await;
                        self.channel.close().await;
                        return;
                    }
                },
            }
        }
    }

    /// Await a connector call while still servicing the channel.
    ///
    /// Returns `None` if the channel closed first; the pending call is
    /// dropped with it.
    async fn await_remote<F, V, E>(
        &mut self,
        call: F,
        on_timeout: fn(Duration) -> E,
    ) -> Option<Result<V, E>>
    where
        F: Future<Output = Result<V, E>>,
    {
        let limit = self.settings.remote_timeout;
        let call = async move {
            match limit {
                Some(limit) => tokio::time::timeout(limit, call)
                    .await
                    .unwrap_or_else(|_| Err(on_timeout(limit))),
                None => call.await,
            }
        };
        tokio::pin!(call);

        loop {
            tokio::select! {
                result = &mut call => return Some(result),
                inbound = self.next_inbound() => match inbound {
                    None => return None,
                    Some(ClientMessage::Resize { rows, cols }) => {
                        self.pending_size = Some(WindowSize::new(rows, cols));
                    }
                    Some(ClientMessage::Input { .. }) => {
                        debug!(session = %self.id.short(), "Dropping input before shell is ready");
                    }
                    Some(ClientMessage::Init(_)) => {
                        debug!(session = %self.id.short(), "Ignoring duplicate init");
                    }
                },
            }
        }
    }

    /// Report a remote failure, release the connector and, unless configured
    /// otherwise, leave the channel open until the client closes it.
    async fn fail<C: RemoteShellConnector>(
        &mut self,
        text: String,
        event: SessionEvent,
        connector: &mut C,
    ) {
        warn!(session = %self.id.short(), error = %text.trim(), "Session failed");
        self.advance(event).await;
        connector.close().await;
        self.send(ServerMessage::output(text)).await;

        if self.settings.close_on_failure {
            self.channel.close().await;
            return;
        }
        while let Some(message) = self.next_inbound().await {
            trace!(session = %self.id.short(), kind = message.kind(), "Ignoring message on failed session");
        }
        self.advance(SessionEvent::ChannelClosed).await;
    }

    async fn resize<S: ShellStream>(&mut self, shell: &mut S, size: WindowSize) {
        match shell.set_window_size(size).await {
            Ok(()) => debug!(session = %self.id.short(), %size, "Window resized"),
            Err(e) => debug!(session = %self.id.short(), error = %e, "Window resize failed"),
        }
    }

    /// Next client message; `None` once the channel closed or the server is
    /// shutting down.
    async fn next_inbound(&mut self) -> Option<ClientMessage> {
        if self.shutting_down {
            return None;
        }
        tokio::select! {
            message = self.channel.recv() => message,
            _ = wait_for_shutdown(&mut self.shutdown) => {
                info!(session = %self.id.short(), "Server shutting down");
                self.shutting_down = true;
                None
            }
        }
    }

    async fn send(&mut self, message: ServerMessage) {
        if !self.channel.is_open() {
            trace!(session = %self.id.short(), kind = message.kind(), "Channel closed, dropping message");
            return;
        }
        if let Err(e) = self.channel.send(message).await {
            debug!(session = %self.id.short(), error = %e, "Send failed");
        }
    }

    async fn advance(&mut self, event: SessionEvent) {
        let Some(next) = self.state.next(event) else {
            trace!(session = %self.id.short(), state = %self.state, ?event, "Event ignored");
            return;
        };
        if next != self.state {
            debug!(session = %self.id.short(), from = %self.state, to = %next, ?event, "State change");
            self.state = next;
            self.registry.set_state(&self.id, next).await;
        }
    }
}
