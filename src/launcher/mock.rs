use crate::command::{CommandSink, LauncherCommand};
use crate::error::CommandError;
use crossbeam::channel::{self, Receiver, Sender};

/// Sink that forwards every command to a channel, for tests and tooling.
///
/// A failing sink still forwards the attempted command and then reports a
/// write error, so callers can check how failures are handled.
pub struct ChannelSink {
    sender: Sender<LauncherCommand>,
    fail_writes: bool,
}

impl ChannelSink {
    pub fn new() -> (Self, Receiver<LauncherCommand>) {
        let (sender, receiver) = channel::unbounded();
        (
            Self {
                sender,
                fail_writes: false,
            },
            receiver,
        )
    }

    pub fn failing() -> (Self, Receiver<LauncherCommand>) {
        let (mut sink, receiver) = Self::new();
        sink.fail_writes = true;
        (sink, receiver)
    }
}

impl CommandSink for ChannelSink {
    fn send(&mut self, command: LauncherCommand) -> Result<(), CommandError> {
        self.sender
            .send(command)
            .map_err(|_| CommandError::Disconnected { command })?;

        if self.fail_writes {
            return Err(CommandError::Write {
                command,
                source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "simulated failure"),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "channel"
    }
}
