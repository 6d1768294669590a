use webssh_common::WindowSize;

/// A terminal emulator the client renders into.
///
/// Implementations own rendering and keystroke capture. Keystrokes and
/// viewport changes are fed back through
/// [`TerminalClient::handle_keystroke`](crate::TerminalClient::handle_keystroke)
/// and
/// [`TerminalClient::handle_viewport_change`](crate::TerminalClient::handle_viewport_change).
pub trait Emulator {
    /// Render text exactly as received, escape sequences included.
    fn write(&mut self, text: &str);

    /// Fit the emulator to its viewport and return the resulting size.
    fn fit(&mut self) -> WindowSize;

    fn dispose(&mut self);
}
