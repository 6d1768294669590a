use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, AuthResult};
use russh::Disconnect;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use webssh_common::{ConnectionConfig, WindowSize};

use super::handler::{allowed_methods, AcceptAllHosts};
use super::shell::SshShell;
use crate::error::{ConnectError, ShellError};
use crate::RemoteShellConnector;

/// Connection-independent SSH settings.
#[derive(Debug, Clone)]
pub struct SshOptions {
    /// Terminal type sent with the PTY request.
    pub term: String,
    pub keepalive_interval: Option<Duration>,
}

impl Default for SshOptions {
    fn default() -> Self {
        Self {
            term: "xterm-256color".into(),
            keepalive_interval: Some(Duration::from_secs(20)),
        }
    }
}

/// [`RemoteShellConnector`] over `russh`.
pub struct SshConnector {
    options: SshOptions,
    handle: Option<client::Handle<AcceptAllHosts>>,
}

impl SshConnector {
    pub fn new(options: SshOptions) -> Self {
        Self {
            options,
            handle: None,
        }
    }

    fn client_config(&self) -> client::Config {
        let mut config = client::Config::default();
        // Idle shells stay open for as long as the browser keeps the channel.
        config.inactivity_timeout = None;
        config.keepalive_interval = self.options.keepalive_interval;
        // 0 means "do not auto-close after missed keepalive replies".
        config.keepalive_max = 0;
        config
    }
}

#[async_trait]
impl RemoteShellConnector for SshConnector {
    type Shell = SshShell;

    async fn connect(&mut self, config: &ConnectionConfig) -> Result<(), ConnectError> {
        if self.handle.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }

        let addr = config.address();
        debug!(%addr, "connecting TCP");
        let tcp = TcpStream::connect(&addr)
            .await
            .map_err(|e| ConnectError::Unreachable {
                addr: addr.clone(),
                reason: e.to_string(),
            })?;
        let _ = tcp.set_nodelay(true);

        debug!(%addr, "performing SSH handshake");
        let mut handle = client::connect_stream(Arc::new(self.client_config()), tcp, AcceptAllHosts)
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;

        let username = config.username.trim();
        let auth = handle
            .authenticate_password(username, config.credential.clone())
            .await
            .map_err(|e| ConnectError::Handshake(e.to_string()))?;

        match auth {
            AuthResult::Success => {
                info!(%addr, user = %username, "SSH connection ready");
                self.handle = Some(handle);
                Ok(())
            }
            AuthResult::Failure {
                remaining_methods, ..
            } => {
                let methods = allowed_methods(&remaining_methods);
                warn!(%addr, user = %username, %methods, "password authentication rejected");
                let _ = handle
                    .disconnect(Disconnect::ByApplication, "", "English")
                    .await;
                Err(ConnectError::AuthFailed {
                    username: username.to_string(),
                    methods,
                })
            }
        }
    }

    async fn open_shell(&mut self, size: WindowSize) -> Result<SshShell, ShellError> {
        let handle = self.handle.as_ref().ok_or(ShellError::NotConnected)?;

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| ShellError::ChannelOpen(e.to_string()))?;

        debug!(term = %self.options.term, %size, "requesting PTY");
        channel
            .request_pty(
                false,
                &self.options.term,
                size.cols.into(),
                size.rows.into(),
                0,
                0,
                &[],
            )
            .await
            .map_err(|e| ShellError::Pty(e.to_string()))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| ShellError::Shell(e.to_string()))?;

        Ok(SshShell::new(channel))
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await
            {
                debug!(error = %e, "SSH disconnect error (may already be closed)");
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.handle.is_some()
    }
}
