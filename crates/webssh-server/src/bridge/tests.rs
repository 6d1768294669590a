use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use webssh_common::{ChannelId, ClientMessage, ConnectionConfig, ServerMessage, WindowSize};
use webssh_remote::fake::{FakeConnector, FakeRemote, Journal};
use webssh_remote::{ConnectError, ShellError};

use super::*;
use crate::channel::memory::{MemoryChannel, MemoryClient};
use crate::channel::TransportChannel;
use crate::registry::SessionRegistry;

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    client: MemoryClient,
    remote: FakeRemote,
    journal: Journal,
    registry: SessionRegistry,
    shutdown: watch::Sender<bool>,
    id: ChannelId,
    task: JoinHandle<SessionState>,
}

fn fake() -> (FakeConnector, FakeRemote, Journal) {
    let journal = Journal::new();
    let (connector, remote) = FakeConnector::with_journal(journal.clone());
    (connector, remote, journal)
}

fn start(
    connector: FakeConnector,
    remote: FakeRemote,
    journal: Journal,
    settings: SessionSettings,
) -> Harness {
    let (channel, client) = MemoryChannel::new(journal.clone());
    let id = channel.id().clone();
    let registry = SessionRegistry::new();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let bridge = SessionBridge::new(
        channel,
        "127.0.0.1:50000".parse().unwrap(),
        settings,
        registry.clone(),
        shutdown_rx,
    );
    let task = tokio::spawn(bridge.run(connector));
    Harness {
        client,
        remote,
        journal,
        registry,
        shutdown,
        id,
        task,
    }
}

fn start_default() -> Harness {
    let (connector, remote, journal) = fake();
    start(connector, remote, journal, SessionSettings::default())
}

fn config() -> ConnectionConfig {
    ConnectionConfig::new("10.0.0.5", 22, "root", "hunter2")
}

async fn recv(client: &mut MemoryClient) -> ServerMessage {
    timeout(WAIT, client.rx.recv())
        .await
        .expect("timed out waiting for a server message")
        .expect("server side dropped the channel")
}

async fn finish(task: JoinHandle<SessionState>) -> SessionState {
    timeout(WAIT, task)
        .await
        .expect("session did not end")
        .expect("session task panicked")
}

async fn eventually(mut check: impl FnMut() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !check() {
        assert!(Instant::now() < deadline, "condition not met in time");
        sleep(Duration::from_millis(5)).await;
    }
}

/// Send `init` and wait for the connected status.
async fn ready(h: &mut Harness) {
    h.client.send(ClientMessage::Init(config()));
    assert_eq!(recv(&mut h.client).await, ServerMessage::status(CONNECTED_STATUS));
}

#[tokio::test]
async fn status_precedes_first_output() {
    let mut h = start_default();
    h.client.send(ClientMessage::Init(config()));
    h.remote.emit(b"$ ");

    assert_eq!(recv(&mut h.client).await, ServerMessage::status(CONNECTED_STATUS));
    assert_eq!(recv(&mut h.client).await, ServerMessage::output("$ "));
    assert_eq!(h.remote.connect_configs(), vec![config()]);
}

#[tokio::test]
async fn each_input_is_one_write_in_order() {
    let mut h = start_default();
    ready(&mut h).await;

    h.client.send(ClientMessage::Input { data: "ls\n".into() });
    h.client.send(ClientMessage::Input { data: "pwd\n".into() });
    h.client.send(ClientMessage::Input { data: "\x03".into() });

    let remote = h.remote.clone();
    eventually(|| remote.writes().len() == 3).await;
    assert_eq!(
        h.remote.writes(),
        vec![b"ls\n".to_vec(), b"pwd\n".to_vec(), b"\x03".to_vec()]
    );
}

#[tokio::test]
async fn shell_close_closes_channel_before_release() {
    let mut h = start_default();
    ready(&mut h).await;

    h.remote.close_shell(Some(0));
    assert_eq!(finish(h.task).await, SessionState::Closed);

    let channel_close = h.journal.position("channel_close").unwrap();
    let release = h.journal.position("release").unwrap();
    assert!(channel_close < release, "journal: {:?}", h.journal.entries());
    assert!(h.remote.is_shell_closed());
    assert_eq!(h.client.rx.recv().await, None);
}

#[tokio::test]
async fn channel_close_releases_remote() {
    let mut h = start_default();
    ready(&mut h).await;

    let _rx = h.client.hang_up();
    assert_eq!(finish(h.task).await, SessionState::Closed);
    assert!(h.remote.is_shell_closed());
    assert!(h.remote.is_released());
}

#[tokio::test]
async fn no_output_after_channel_close() {
    let mut h = start_default();
    ready(&mut h).await;

    let _rx = h.client.hang_up();
    h.remote.emit(b"too late");
    finish(h.task).await;

    let entries = h.journal.entries();
    let closed_at = h.journal.position("channel_closed_by_client").unwrap();
    assert!(
        !entries[closed_at..].iter().any(|e| e.starts_with("send")),
        "journal: {entries:?}"
    );
}

#[tokio::test]
async fn resize_sets_window_and_last_one_wins() {
    let mut h = start_default();
    ready(&mut h).await;

    h.client.send(ClientMessage::Resize { rows: 40, cols: 120 });
    let remote = h.remote.clone();
    eventually(|| remote.resizes().len() == 1).await;
    assert_eq!(h.remote.resizes(), vec![WindowSize::new(40, 120)]);

    h.client.send(ClientMessage::Resize { rows: 50, cols: 200 });
    eventually(|| remote.resizes().len() == 2).await;
    assert_eq!(h.remote.resizes().last(), Some(&WindowSize::new(50, 200)));
}

#[tokio::test]
async fn resize_before_init_sizes_the_pty() {
    let mut h = start_default();
    h.client.send(ClientMessage::Resize { rows: 30, cols: 100 });
    h.client.send(ClientMessage::Resize { rows: 35, cols: 110 });
    ready(&mut h).await;

    assert_eq!(h.remote.opened_size(), Some(WindowSize::new(35, 110)));
    assert!(h.remote.resizes().is_empty());
}

#[tokio::test]
async fn default_size_without_resize() {
    let (connector, remote, journal) = fake();
    let settings = SessionSettings {
        default_size: WindowSize::new(30, 90),
        ..SessionSettings::default()
    };
    let mut h = start(connector, remote, journal, settings);
    ready(&mut h).await;

    assert_eq!(h.remote.opened_size(), Some(WindowSize::new(30, 90)));
}

#[tokio::test]
async fn auth_failure_reports_once_and_keeps_channel() {
    let (connector, remote, journal) = fake();
    let connector = connector.fail_connect(ConnectError::AuthFailed {
        username: "root".into(),
        methods: "publickey".into(),
    });
    let mut h = start(connector, remote, journal, SessionSettings::default());
    h.client.send(ClientMessage::Init(config()));

    assert_eq!(
        recv(&mut h.client).await,
        ServerMessage::output(
            "\r\n*** SSH Connection Error: auth failed for user \"root\" (server allows: publickey) ***\r\n"
        )
    );
    assert!(h.remote.is_released());

    // Failed sessions stay attached until the client leaves.
    h.client.send(ClientMessage::Input { data: "ls\n".into() });
    sleep(Duration::from_millis(50)).await;
    assert!(!h.task.is_finished());
    assert!(h.client.drain().is_empty());
    assert!(h.remote.writes().is_empty());

    let _rx = h.client.hang_up();
    assert_eq!(finish(h.task).await, SessionState::Failed);
}

#[tokio::test]
async fn shell_open_failure_reports_shell_error() {
    let (connector, remote, journal) = fake();
    let connector = connector.fail_shell(ShellError::Pty("denied".into()));
    let mut h = start(connector, remote, journal, SessionSettings::default());
    h.client.send(ClientMessage::Init(config()));

    assert_eq!(
        recv(&mut h.client).await,
        ServerMessage::output("\r\n*** SSH Shell Error: PTY request failed: denied ***\r\n")
    );
    assert!(h.remote.is_released());
    assert_eq!(h.registry.get(&h.id).await.unwrap().state, SessionState::Failed);

    let _rx = h.client.hang_up();
    assert_eq!(finish(h.task).await, SessionState::Failed);
}

#[tokio::test]
async fn close_on_failure_closes_channel() {
    let (connector, remote, journal) = fake();
    let connector = connector.fail_connect(ConnectError::Handshake("no kex".into()));
    let settings = SessionSettings {
        close_on_failure: true,
        ..SessionSettings::default()
    };
    let mut h = start(connector, remote, journal, settings);
    h.client.send(ClientMessage::Init(config()));

    assert_eq!(finish(h.task).await, SessionState::Failed);
    assert_eq!(
        h.client.drain(),
        vec![ServerMessage::output(
            "\r\n*** SSH Connection Error: SSH handshake failed: no kex ***\r\n"
        )]
    );
    assert!(h.journal.position("channel_close").is_some());
}

#[tokio::test]
async fn connect_timeout_is_reported() {
    let (connector, remote, journal) = fake();
    let settings = SessionSettings {
        remote_timeout: Some(Duration::from_millis(50)),
        ..SessionSettings::default()
    };
    let mut h = start(connector.hang_connect(), remote, journal, settings);
    h.client.send(ClientMessage::Init(config()));

    match recv(&mut h.client).await {
        ServerMessage::Output { data } => {
            assert!(data.starts_with("\r\n*** SSH Connection Error: timed out"), "{data:?}");
        }
        other => panic!("expected output, got {other:?}"),
    }
}

#[tokio::test]
async fn channel_close_abandons_pending_shell_open() {
    let (connector, remote, journal) = fake();
    let mut h = start(connector.hang_shell(), remote, journal, SessionSettings::default());
    h.client.send(ClientMessage::Init(config()));
    h.client.send(ClientMessage::Input { data: "early\n".into() });

    let journal = h.journal.clone();
    eventually(|| journal.position("open_shell 80x24").is_some()).await;

    let _rx = h.client.hang_up();
    assert_eq!(finish(h.task).await, SessionState::Closed);
    assert!(h.remote.is_released());
    assert!(h.remote.writes().is_empty());
}

#[tokio::test]
async fn input_before_init_is_dropped() {
    let mut h = start_default();
    h.client.send(ClientMessage::Input { data: "ignored\n".into() });
    ready(&mut h).await;
    h.client.send(ClientMessage::Input { data: "kept\n".into() });

    let remote = h.remote.clone();
    eventually(|| !remote.writes().is_empty()).await;
    assert_eq!(h.remote.writes(), vec![b"kept\n".to_vec()]);
}

#[tokio::test]
async fn duplicate_init_is_ignored() {
    let mut h = start_default();
    ready(&mut h).await;
    h.client.send(ClientMessage::Init(ConnectionConfig::new(
        "other", 22, "u", "p",
    )));
    h.client.send(ClientMessage::Input { data: "x".into() });

    let remote = h.remote.clone();
    eventually(|| !remote.writes().is_empty()).await;
    assert_eq!(h.remote.connect_configs(), vec![config()]);
    assert!(h.client.drain().is_empty());
}

#[tokio::test]
async fn channel_close_while_idle() {
    let h = start_default();
    let _rx = h.client.hang_up();
    assert_eq!(finish(h.task).await, SessionState::Closed);
    assert!(h.remote.connect_configs().is_empty());
}

#[tokio::test]
async fn split_multibyte_output_is_joined() {
    let mut h = start_default();
    ready(&mut h).await;

    let bytes = "é".as_bytes();
    h.remote.emit(&bytes[..1]);
    h.remote.emit(&bytes[1..]);
    assert_eq!(recv(&mut h.client).await, ServerMessage::output("é"));
}

#[tokio::test]
async fn shutdown_closes_channel_then_releases() {
    let mut h = start_default();
    ready(&mut h).await;

    h.shutdown.send(true).unwrap();
    assert_eq!(finish(h.task).await, SessionState::Closed);

    let channel_close = h.journal.position("channel_close").unwrap();
    let release = h.journal.position("release").unwrap();
    assert!(channel_close < release);
}

#[tokio::test]
async fn registry_follows_session() {
    let mut h = start_default();
    ready(&mut h).await;

    let entry = h.registry.get(&h.id).await.unwrap();
    assert_eq!(entry.state, SessionState::Ready);
    assert_eq!(entry.target.as_deref(), Some("10.0.0.5:22"));

    h.remote.close_shell(None);
    finish(h.task).await;
    assert_eq!(h.registry.count().await, 0);
}
