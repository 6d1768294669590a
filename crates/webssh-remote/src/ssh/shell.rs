use async_trait::async_trait;
use russh::client::Msg;
use russh::{Channel, ChannelMsg};
use tracing::{debug, trace};
use webssh_common::WindowSize;

use crate::error::ShellError;
use crate::{ShellEvent, ShellStream};

/// What one channel message means for the shell stream.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Output(Vec<u8>),
    Exit(u32),
    End,
    Skip,
}

/// `Eof` only half-closes the channel: the exit status and `Close` usually
/// follow it, so the stream ends on `Close` or when the channel is gone.
fn classify(msg: Option<ChannelMsg>) -> Step {
    match msg {
        Some(ChannelMsg::Data { data }) => Step::Output(data.to_vec()),
        // stderr shares the terminal with stdout
        Some(ChannelMsg::ExtendedData { data, .. }) => Step::Output(data.to_vec()),
        Some(ChannelMsg::ExitStatus { exit_status }) => Step::Exit(exit_status),
        Some(ChannelMsg::Eof) => {
            trace!("remote sent EOF");
            Step::Skip
        }
        Some(ChannelMsg::Close) | None => Step::End,
        Some(other) => {
            trace!(message = ?other, "ignoring channel message");
            Step::Skip
        }
    }
}

/// Interactive shell on an SSH session channel.
pub struct SshShell {
    channel: Channel<Msg>,
    exit_status: Option<u32>,
    closed: bool,
}

impl SshShell {
    pub(super) fn new(channel: Channel<Msg>) -> Self {
        Self {
            channel,
            exit_status: None,
            closed: false,
        }
    }
}

#[async_trait]
impl ShellStream for SshShell {
    async fn write(&mut self, data: &[u8]) -> Result<(), ShellError> {
        if self.closed {
            return Err(ShellError::Closed);
        }
        self.channel
            .data(data)
            .await
            .map_err(|e| ShellError::Write(e.to_string()))
    }

    async fn set_window_size(&mut self, size: WindowSize) -> Result<(), ShellError> {
        if self.closed {
            return Err(ShellError::Closed);
        }
        self.channel
            .window_change(size.cols.into(), size.rows.into(), 0, 0)
            .await
            .map_err(|e| ShellError::Resize(e.to_string()))
    }

    async fn next_event(&mut self) -> ShellEvent {
        while !self.closed {
            match classify(self.channel.wait().await) {
                Step::Output(data) => return ShellEvent::Data(data),
                Step::Exit(exit_status) => {
                    debug!(exit_status, "remote shell exited");
                    self.exit_status = Some(exit_status);
                }
                Step::End => self.closed = true,
                Step::Skip => {}
            }
        }

        ShellEvent::Closed {
            exit_status: self.exit_status,
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        let _ = self.channel.eof().await;
        let _ = self.channel.close().await;
    }
}
