//! Command sinks for the launcher hardware

mod hidraw;
mod mock;
pub mod protocol;

pub use hidraw::HidrawLauncher;
pub use mock::ChannelSink;

use crate::command::{CommandSink, LauncherCommand};
use crate::config::{LauncherConfig, SINK_HIDRAW, SINK_LOG};
use crate::error::{CommandError, Result, SentryError};
use tracing::info;

/// Dry-run sink that only logs what would be sent
#[derive(Debug, Default)]
pub struct LoggingSink;

impl CommandSink for LoggingSink {
    fn send(&mut self, command: LauncherCommand) -> std::result::Result<(), CommandError> {
        info!("launcher (dry run) <- {}", command);
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Build the sink selected by configuration
pub fn create_sink(config: &LauncherConfig, dry_run: bool) -> Result<Box<dyn CommandSink>> {
    if dry_run {
        return Ok(Box::new(LoggingSink));
    }

    match config.sink.as_str() {
        SINK_HIDRAW => Ok(Box::new(HidrawLauncher::open(&config.device)?)),
        SINK_LOG => Ok(Box::new(LoggingSink)),
        other => Err(SentryError::component(
            "launcher".to_string(),
            format!("unknown sink kind '{}'", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentryConfig;

    #[test]
    fn test_dry_run_always_logs() {
        let mut config = SentryConfig::default().launcher;
        config.device = "/nonexistent/hidraw".to_string();

        let sink = create_sink(&config, true).unwrap();
        assert_eq!(sink.name(), "log");
        assert!(create_sink(&config, false).is_err());
    }

    #[test]
    fn test_unknown_sink_is_rejected() {
        let mut config = SentryConfig::default().launcher;
        config.sink = "serial".to_string();
        assert!(create_sink(&config, false).is_err());
    }

    #[test]
    fn test_channel_sink_reports_failure_after_forwarding() {
        let (mut sink, receiver) = ChannelSink::failing();
        assert!(sink.send(LauncherCommand::Stop).is_err());
        assert_eq!(receiver.try_recv().unwrap(), LauncherCommand::Stop);

        drop(receiver);
        let (mut sink, receiver) = ChannelSink::new();
        drop(receiver);
        assert!(matches!(
            sink.send(LauncherCommand::Up),
            Err(CommandError::Disconnected { .. })
        ));
    }
}
