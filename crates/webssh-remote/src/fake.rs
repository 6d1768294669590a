//! Fake connector for tests without a network or SSH server.
//!
//! [`FakeConnector`] is scripted up front (succeed, fail to connect, fail to
//! open the shell, or hang) and driven at runtime through its
//! [`FakeRemote`] handle: push output, close the shell, and inspect what the
//! bridge wrote, resized and released. Every call is also appended to a
//! shared [`Journal`] so tests can assert ordering across components.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc;
use webssh_common::{ConnectionConfig, WindowSize};

use crate::error::{ConnectError, ShellError};
use crate::{RemoteShellConnector, ShellEvent, ShellStream};

/// Ordered log of calls, shareable with other test doubles.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        lock(&self.0).push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    /// Index of the first entry equal to `entry`.
    pub fn position(&self, entry: &str) -> Option<usize> {
        lock(&self.0).iter().position(|e| e == entry)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone)]
enum ConnectBehavior {
    Succeed,
    Fail(ConnectError),
    Hang,
}

#[derive(Debug, Clone)]
enum ShellBehavior {
    Succeed,
    Fail(ShellError),
    Hang,
}

#[derive(Debug, Default)]
struct FakeState {
    connect_configs: Vec<ConnectionConfig>,
    opened_size: Option<WindowSize>,
    writes: Vec<Vec<u8>>,
    resizes: Vec<WindowSize>,
    shell_closed: bool,
    released: bool,
}

#[derive(Debug)]
enum FakeInput {
    Data(Vec<u8>),
    Close(Option<u32>),
}

/// Scripted [`RemoteShellConnector`].
pub struct FakeConnector {
    connect: ConnectBehavior,
    shell: ShellBehavior,
    state: Arc<Mutex<FakeState>>,
    journal: Journal,
    input_rx: Option<mpsc::UnboundedReceiver<FakeInput>>,
    connected: bool,
}

/// Test-side handle of a [`FakeConnector`].
#[derive(Clone)]
pub struct FakeRemote {
    state: Arc<Mutex<FakeState>>,
    journal: Journal,
    input_tx: mpsc::UnboundedSender<FakeInput>,
}

impl FakeConnector {
    /// A connector whose connect and shell-open both succeed.
    pub fn new() -> (Self, FakeRemote) {
        Self::with_journal(Journal::new())
    }

    pub fn with_journal(journal: Journal) -> (Self, FakeRemote) {
        let state = Arc::new(Mutex::new(FakeState::default()));
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let connector = Self {
            connect: ConnectBehavior::Succeed,
            shell: ShellBehavior::Succeed,
            state: Arc::clone(&state),
            journal: journal.clone(),
            input_rx: Some(input_rx),
            connected: false,
        };
        let remote = FakeRemote {
            state,
            journal,
            input_tx,
        };
        (connector, remote)
    }

    pub fn fail_connect(mut self, err: ConnectError) -> Self {
        self.connect = ConnectBehavior::Fail(err);
        self
    }

    pub fn hang_connect(mut self) -> Self {
        self.connect = ConnectBehavior::Hang;
        self
    }

    pub fn fail_shell(mut self, err: ShellError) -> Self {
        self.shell = ShellBehavior::Fail(err);
        self
    }

    pub fn hang_shell(mut self) -> Self {
        self.shell = ShellBehavior::Hang;
        self
    }
}

#[async_trait]
impl RemoteShellConnector for FakeConnector {
    type Shell = FakeShell;

    async fn connect(&mut self, config: &ConnectionConfig) -> Result<(), ConnectError> {
        if self.connected {
            return Err(ConnectError::AlreadyConnected);
        }
        lock(&self.state).connect_configs.push(config.clone());
        self.journal.push("connect");

        match self.connect.clone() {
            ConnectBehavior::Succeed => {
                self.connected = true;
                Ok(())
            }
            ConnectBehavior::Fail(err) => Err(err),
            ConnectBehavior::Hang => std::future::pending().await,
        }
    }

    async fn open_shell(&mut self, size: WindowSize) -> Result<FakeShell, ShellError> {
        if !self.connected {
            return Err(ShellError::NotConnected);
        }
        self.journal.push(format!("open_shell {size}"));

        match self.shell.clone() {
            ShellBehavior::Succeed => {}
            ShellBehavior::Fail(err) => return Err(err),
            ShellBehavior::Hang => std::future::pending().await,
        }

        let input_rx = self.input_rx.take().ok_or(ShellError::Shell(
            "fake connector already opened a shell".into(),
        ))?;
        lock(&self.state).opened_size = Some(size);
        Ok(FakeShell {
            state: Arc::clone(&self.state),
            journal: self.journal.clone(),
            input_rx,
            closed: false,
        })
    }

    async fn close(&mut self) {
        self.connected = false;
        let mut state = lock(&self.state);
        if !state.released {
            state.released = true;
            self.journal.push("release");
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Shell opened by a [`FakeConnector`].
#[derive(Debug)]
pub struct FakeShell {
    state: Arc<Mutex<FakeState>>,
    journal: Journal,
    input_rx: mpsc::UnboundedReceiver<FakeInput>,
    closed: bool,
}

#[async_trait]
impl ShellStream for FakeShell {
    async fn write(&mut self, data: &[u8]) -> Result<(), ShellError> {
        if self.closed {
            return Err(ShellError::Closed);
        }
        lock(&self.state).writes.push(data.to_vec());
        self.journal.push(format!("write {}", String::from_utf8_lossy(data)));
        Ok(())
    }

    async fn set_window_size(&mut self, size: WindowSize) -> Result<(), ShellError> {
        if self.closed {
            return Err(ShellError::Closed);
        }
        lock(&self.state).resizes.push(size);
        self.journal.push(format!("resize {size}"));
        Ok(())
    }

    async fn next_event(&mut self) -> ShellEvent {
        if self.closed {
            return std::future::pending().await;
        }
        match self.input_rx.recv().await {
            Some(FakeInput::Data(data)) => ShellEvent::Data(data),
            Some(FakeInput::Close(exit_status)) => {
                self.closed = true;
                ShellEvent::Closed { exit_status }
            }
            None => {
                self.closed = true;
                ShellEvent::Closed { exit_status: None }
            }
        }
    }

    async fn close(&mut self) {
        self.closed = true;
        let mut state = lock(&self.state);
        if !state.shell_closed {
            state.shell_closed = true;
            self.journal.push("shell_close");
        }
    }
}

impl FakeRemote {
    /// Queue output as if the remote shell printed it.
    pub fn emit(&self, data: &[u8]) {
        let _ = self.input_tx.send(FakeInput::Data(data.to_vec()));
    }

    /// Close the shell from the remote side.
    pub fn close_shell(&self, exit_status: Option<u32>) {
        let _ = self.input_tx.send(FakeInput::Close(exit_status));
    }

    pub fn journal(&self) -> Journal {
        self.journal.clone()
    }

    pub fn connect_configs(&self) -> Vec<ConnectionConfig> {
        lock(&self.state).connect_configs.clone()
    }

    pub fn opened_size(&self) -> Option<WindowSize> {
        lock(&self.state).opened_size
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    pub fn resizes(&self) -> Vec<WindowSize> {
        lock(&self.state).resizes.clone()
    }

    pub fn is_released(&self) -> bool {
        lock(&self.state).released
    }

    pub fn is_shell_closed(&self) -> bool {
        lock(&self.state).shell_closed
    }
}
