use crate::error::CommandError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The complete vocabulary understood by the launcher hardware
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LauncherCommand {
    Up,
    Down,
    Left,
    Right,
    Fire,
    Stop,
    IndicatorOn,
    IndicatorOff,
}

impl LauncherCommand {
    pub const ALL: [LauncherCommand; 8] = [
        LauncherCommand::Up,
        LauncherCommand::Down,
        LauncherCommand::Left,
        LauncherCommand::Right,
        LauncherCommand::Fire,
        LauncherCommand::Stop,
        LauncherCommand::IndicatorOn,
        LauncherCommand::IndicatorOff,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LauncherCommand::Up => "up",
            LauncherCommand::Down => "down",
            LauncherCommand::Left => "left",
            LauncherCommand::Right => "right",
            LauncherCommand::Fire => "fire",
            LauncherCommand::Stop => "stop",
            LauncherCommand::IndicatorOn => "ledon",
            LauncherCommand::IndicatorOff => "ledoff",
        }
    }
}

impl fmt::Display for LauncherCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LauncherCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LauncherCommand::ALL
            .iter()
            .copied()
            .find(|command| command.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown launcher command: {}", s.trim()))
    }
}

/// A serialized channel to the launcher.
///
/// Implementations perform one blocking write per call. The core only calls
/// `send` while holding its state lock, so implementations never see
/// concurrent calls and never need to order commands themselves.
pub trait CommandSink: Send {
    /// Write a single command to the device
    fn send(&mut self, command: LauncherCommand) -> Result<(), CommandError>;

    /// Human-readable sink name for logs
    fn name(&self) -> &str;
}

impl CommandSink for Box<dyn CommandSink> {
    fn send(&mut self, command: LauncherCommand) -> Result<(), CommandError> {
        (**self).send(command)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_parse_is_case_insensitive() {
        assert_eq!(" LedOn ".parse::<LauncherCommand>(), Ok(LauncherCommand::IndicatorOn));
        assert!("sideways".parse::<LauncherCommand>().is_err());
    }
}
