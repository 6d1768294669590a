//! Terminal client state machine.
//!
//! Single-threaded and event driven: the host feeds channel events,
//! keystrokes and viewport changes in, and the client turns them into
//! emulator writes and channel messages.

use tracing::{debug, info};
use webssh_common::{ClientMessage, ConfigValidationError, ConnectionConfig, WindowSize};

use crate::channel::{ChannelEvent, ClientChannel, WsClientChannel};
use crate::emulator::Emulator;
use crate::form::ConnectForm;

/// Written locally once the channel is up, before the server answers.
pub const AUTHENTICATING_LINE: &str = "\r\n*** Connected to server, authenticating... ***\r\n";
/// Written locally when the channel drops on its own.
pub const DISCONNECTED_LINE: &str = "\r\n*** Disconnected ***\r\n";

/// Creates the channel and emulator for each connection attempt.
pub trait ClientBackend {
    type Channel: ClientChannel;
    type Emulator: Emulator;

    fn open_channel(&mut self, endpoint: &str) -> Self::Channel;
    fn create_emulator(&mut self) -> Self::Emulator;
}

/// Opens a [`WsClientChannel`] per connection; emulators come from
/// `make_emulator`. Needs a tokio runtime.
pub struct WsBackend<F> {
    make_emulator: F,
}

impl<F> WsBackend<F> {
    pub fn new(make_emulator: F) -> Self {
        Self { make_emulator }
    }
}

impl<F, E> ClientBackend for WsBackend<F>
where
    F: FnMut() -> E,
    E: Emulator,
{
    type Channel = WsClientChannel;
    type Emulator = E;

    fn open_channel(&mut self, endpoint: &str) -> WsClientChannel {
        WsClientChannel::connect(endpoint)
    }

    fn create_emulator(&mut self) -> E {
        (self.make_emulator)()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    ConfigForm,
    Terminal,
}

struct ActiveSession<C, E> {
    config: ConnectionConfig,
    channel: C,
    emulator: E,
    size: WindowSize,
    connected: bool,
}

pub struct TerminalClient<B: ClientBackend> {
    backend: B,
    endpoint: String,
    form: ConnectForm,
    view: View,
    session: Option<ActiveSession<B::Channel, B::Emulator>>,
}

impl<B: ClientBackend> TerminalClient<B> {
    pub fn new(backend: B, endpoint: impl Into<String>) -> Self {
        Self {
            backend,
            endpoint: endpoint.into(),
            form: ConnectForm::default(),
            view: View::ConfigForm,
            session: None,
        }
    }

    pub fn form(&self) -> &ConnectForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ConnectForm {
        &mut self.form
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.connected)
    }

    /// Validate the form and start a session.
    ///
    /// On a validation error nothing is opened and the view does not change.
    pub fn connect(&mut self) -> Result<(), ConfigValidationError> {
        let config = self.form.validate()?;

        // A previous terminal is replaced, not stacked.
        self.teardown();

        info!(target_host = %config.address(), user = %config.username, "Connecting");
        let channel = self.backend.open_channel(&self.endpoint);
        let mut emulator = self.backend.create_emulator();
        let size = emulator.fit();

        self.session = Some(ActiveSession {
            config,
            channel,
            emulator,
            size,
            connected: false,
        });
        self.view = View::Terminal;
        Ok(())
    }

    /// Drain and handle every pending channel event. Returns how many were
    /// handled.
    pub fn poll(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self
            .session
            .as_mut()
            .and_then(|s| s.channel.try_next_event())
        {
            self.handle_channel_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        let Some(session) = self.session.as_mut() else {
            debug!(?event, "Channel event without a session");
            return;
        };

        match event {
            ChannelEvent::Connected => {
                session.connected = true;
                session.emulator.write(AUTHENTICATING_LINE);
                send(
                    &mut session.channel,
                    ClientMessage::Init(session.config.clone()),
                );
                send(&mut session.channel, ClientMessage::resize(session.size));
            }
            ChannelEvent::Message(message) => {
                session.emulator.write(message.text());
            }
            ChannelEvent::Closed => {
                info!("Channel closed");
                session.connected = false;
                session.emulator.write(DISCONNECTED_LINE);
            }
        }
    }

    /// Raw keystroke text from the emulator.
    pub fn handle_keystroke(&mut self, data: &str) {
        if let Some(session) = self.session.as_mut().filter(|s| s.connected) {
            send(
                &mut session.channel,
                ClientMessage::Input {
                    data: data.to_string(),
                },
            );
        }
    }

    /// The emulator's viewport changed size.
    pub fn handle_viewport_change(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.size = session.emulator.fit();
        if session.connected {
            send(&mut session.channel, ClientMessage::resize(session.size));
        }
    }

    /// User-initiated disconnect: back to the form.
    pub fn disconnect(&mut self) {
        self.teardown();
        self.view = View::ConfigForm;
    }

    fn teardown(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.channel.close();
            session.emulator.dispose();
        }
    }
}

fn send<C: ClientChannel>(channel: &mut C, message: ClientMessage) {
    let kind = message.kind();
    if let Err(e) = channel.send(message) {
        debug!(kind, error = %e, "Send failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;
    use webssh_common::{ServerMessage, TransportError};

    #[derive(Default)]
    struct Log {
        sent: Vec<ClientMessage>,
        events: VecDeque<ChannelEvent>,
        written: String,
        size: Option<WindowSize>,
        fits: usize,
        channels_opened: usize,
        channels_closed: usize,
        disposed: usize,
    }

    type Shared = Rc<RefCell<Log>>;

    struct MockChannel {
        log: Shared,
        connected: bool,
    }

    impl ClientChannel for MockChannel {
        fn send(&mut self, message: ClientMessage) -> Result<(), TransportError> {
            self.log.borrow_mut().sent.push(message);
            Ok(())
        }

        fn try_next_event(&mut self) -> Option<ChannelEvent> {
            let event = self.log.borrow_mut().events.pop_front()?;
            match event {
                ChannelEvent::Connected => self.connected = true,
                ChannelEvent::Closed => self.connected = false,
                ChannelEvent::Message(_) => {}
            }
            Some(event)
        }

        fn close(&mut self) {
            self.log.borrow_mut().channels_closed += 1;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    struct MockEmulator {
        log: Shared,
    }

    impl Emulator for MockEmulator {
        fn write(&mut self, text: &str) {
            self.log.borrow_mut().written.push_str(text);
        }

        fn fit(&mut self) -> WindowSize {
            let mut log = self.log.borrow_mut();
            log.fits += 1;
            log.size.unwrap_or_default()
        }

        fn dispose(&mut self) {
            self.log.borrow_mut().disposed += 1;
        }
    }

    struct MockBackend {
        log: Shared,
    }

    impl ClientBackend for MockBackend {
        type Channel = MockChannel;
        type Emulator = MockEmulator;

        fn open_channel(&mut self, endpoint: &str) -> MockChannel {
            assert_eq!(endpoint, "ws://localhost:4000/ws");
            self.log.borrow_mut().channels_opened += 1;
            MockChannel {
                log: Rc::clone(&self.log),
                connected: false,
            }
        }

        fn create_emulator(&mut self) -> MockEmulator {
            MockEmulator {
                log: Rc::clone(&self.log),
            }
        }
    }

    fn client() -> (TerminalClient<MockBackend>, Shared) {
        let log = Shared::default();
        let backend = MockBackend {
            log: Rc::clone(&log),
        };
        let mut client = TerminalClient::new(backend, "ws://localhost:4000/ws");
        let form = client.form_mut();
        form.host = "10.0.0.5".into();
        form.username = "root".into();
        form.credential = "hunter2".into();
        (client, log)
    }

    fn push(log: &Shared, event: ChannelEvent) {
        log.borrow_mut().events.push_back(event);
    }

    fn connected() -> (TerminalClient<MockBackend>, Shared) {
        let (mut client, log) = client();
        client.connect().unwrap();
        push(&log, ChannelEvent::Connected);
        client.poll();
        log.borrow_mut().sent.clear();
        (client, log)
    }

    #[test]
    fn invalid_form_opens_nothing() {
        let (mut client, log) = client();
        client.form_mut().username.clear();

        assert_eq!(client.connect(), Err(ConfigValidationError::MissingUsername));
        assert_eq!(client.view(), View::ConfigForm);
        assert_eq!(log.borrow().channels_opened, 0);
        assert!(log.borrow().sent.is_empty());
    }

    #[test]
    fn connect_sends_init_then_resize() {
        let (mut client, log) = client();
        log.borrow_mut().size = Some(WindowSize::new(40, 120));

        client.connect().unwrap();
        assert_eq!(client.view(), View::Terminal);
        assert_eq!(log.borrow().fits, 1);
        assert!(log.borrow().sent.is_empty());

        push(&log, ChannelEvent::Connected);
        assert_eq!(client.poll(), 1);

        let log = log.borrow();
        assert_eq!(log.written, AUTHENTICATING_LINE);
        assert_eq!(
            log.sent,
            vec![
                ClientMessage::Init(ConnectionConfig::new("10.0.0.5", 22, "root", "hunter2")),
                ClientMessage::Resize { rows: 40, cols: 120 },
            ]
        );
    }

    #[test]
    fn server_text_is_written_untransformed() {
        let (mut client, log) = connected();
        log.borrow_mut().written.clear();

        push(&log, ChannelEvent::Message(ServerMessage::status("SSH connection established\r\n")));
        push(&log, ChannelEvent::Message(ServerMessage::output("\x1b[32m$ \x1b[0m")));
        client.poll();

        assert_eq!(
            log.borrow().written,
            "SSH connection established\r\n\x1b[32m$ \x1b[0m"
        );
    }

    #[test]
    fn keystrokes_only_while_connected() {
        let (mut client, log) = client();
        client.connect().unwrap();
        client.handle_keystroke("ls\n");
        assert!(log.borrow().sent.is_empty());

        push(&log, ChannelEvent::Connected);
        client.poll();
        log.borrow_mut().sent.clear();

        client.handle_keystroke("ls\n");
        assert_eq!(
            log.borrow().sent,
            vec![ClientMessage::Input { data: "ls\n".into() }]
        );
    }

    #[test]
    fn viewport_change_refits_and_resizes() {
        let (mut client, log) = connected();
        log.borrow_mut().size = Some(WindowSize::new(50, 200));

        client.handle_viewport_change();
        client.handle_viewport_change();
        // no debouncing
        assert_eq!(
            log.borrow().sent,
            vec![
                ClientMessage::Resize { rows: 50, cols: 200 },
                ClientMessage::Resize { rows: 50, cols: 200 },
            ]
        );
    }

    #[test]
    fn unexpected_close_stays_in_terminal() {
        let (mut client, log) = connected();
        push(&log, ChannelEvent::Closed);
        client.poll();

        assert_eq!(client.view(), View::Terminal);
        assert!(!client.is_connected());
        assert!(log.borrow().written.ends_with(DISCONNECTED_LINE));

        client.handle_keystroke("x");
        client.handle_viewport_change();
        assert!(log.borrow().sent.is_empty());
    }

    #[test]
    fn manual_disconnect_tears_down() {
        let (mut client, log) = connected();
        client.disconnect();

        assert_eq!(client.view(), View::ConfigForm);
        assert!(!client.is_connected());
        assert_eq!(log.borrow().channels_closed, 1);
        assert_eq!(log.borrow().disposed, 1);

        // the resize listener is gone with the session
        let fits = log.borrow().fits;
        client.handle_viewport_change();
        assert_eq!(log.borrow().fits, fits);
        assert!(log.borrow().sent.is_empty());
    }

    #[test]
    fn reconnect_replaces_previous_terminal() {
        let (mut client, log) = connected();
        client.connect().unwrap();

        let log = log.borrow();
        assert_eq!(log.channels_opened, 2);
        assert_eq!(log.channels_closed, 1);
        assert_eq!(log.disposed, 1);
    }
}
