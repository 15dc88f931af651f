use super::protocol::{self, REPORT_LEN};
use crate::command::{CommandSink, LauncherCommand};
use crate::error::CommandError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Launcher attached through a Linux hidraw node.
///
/// Writing to hidraw sends an output report with SET_REPORT. The launcher
/// does not use numbered reports, so each write is report id 0 followed by
/// the 8-byte command.
pub struct HidrawLauncher {
    device: String,
    file: File,
}

impl HidrawLauncher {
    pub fn open<P: AsRef<Path>>(device: P) -> Result<Self, CommandError> {
        let device = device.as_ref().to_string_lossy().into_owned();
        let file = OpenOptions::new()
            .write(true)
            .open(&device)
            .map_err(|e| CommandError::DeviceOpen {
                device: device.clone(),
                source: e,
            })?;

        info!("Launcher device opened: {}", device);
        Ok(Self { device, file })
    }

    pub(crate) fn frame(command: LauncherCommand) -> [u8; REPORT_LEN + 1] {
        let mut frame = [0u8; REPORT_LEN + 1];
        frame[1..].copy_from_slice(&protocol::encode(command));
        frame
    }
}

impl CommandSink for HidrawLauncher {
    fn send(&mut self, command: LauncherCommand) -> Result<(), CommandError> {
        let frame = Self::frame(command);
        let written = self
            .file
            .write(&frame)
            .map_err(|e| CommandError::Write { command, source: e })?;

        if written != frame.len() {
            return Err(CommandError::ShortWrite {
                command,
                written,
                expected: frame.len(),
            });
        }

        debug!("Wrote {} to {}", command, self.device);
        Ok(())
    }

    fn name(&self) -> &str {
        "hidraw"
    }
}
