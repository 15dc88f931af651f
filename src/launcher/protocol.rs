//! Output report layout of the launcher.
//!
//! Every command is an 8-byte HID output report delivered with a class
//! SET_REPORT control transfer (request type 0x21, request 0x09). Byte 0
//! selects the channel (0x02 motors and trigger, 0x03 indicator light),
//! byte 1 the action, the rest is padding.

use crate::command::LauncherCommand;

pub const REPORT_LEN: usize = 8;

const CHANNEL_MOTION: u8 = 0x02;
const CHANNEL_INDICATOR: u8 = 0x03;

pub fn encode(command: LauncherCommand) -> [u8; REPORT_LEN] {
    let (channel, action) = match command {
        LauncherCommand::Down => (CHANNEL_MOTION, 0x01),
        LauncherCommand::Up => (CHANNEL_MOTION, 0x02),
        LauncherCommand::Left => (CHANNEL_MOTION, 0x04),
        LauncherCommand::Right => (CHANNEL_MOTION, 0x08),
        LauncherCommand::Fire => (CHANNEL_MOTION, 0x10),
        LauncherCommand::Stop => (CHANNEL_MOTION, 0x20),
        LauncherCommand::IndicatorOn => (CHANNEL_INDICATOR, 0x01),
        LauncherCommand::IndicatorOff => (CHANNEL_INDICATOR, 0x00),
    };

    let mut report = [0u8; REPORT_LEN];
    report[0] = channel;
    report[1] = action;
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_motion_reports() {
        assert_eq!(encode(LauncherCommand::Down), [0x02, 0x01, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(LauncherCommand::Fire), [0x02, 0x10, 0, 0, 0, 0, 0, 0]);
        assert_eq!(encode(LauncherCommand::Stop), [0x02, 0x20, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_indicator_reports_use_their_own_channel() {
        assert_eq!(encode(LauncherCommand::IndicatorOn)[..2], [0x03, 0x01]);
        assert_eq!(encode(LauncherCommand::IndicatorOff)[..2], [0x03, 0x00]);
    }

    #[test]
    fn test_every_command_has_a_distinct_report() {
        let mut reports: Vec<_> = LauncherCommand::ALL.iter().map(|c| encode(*c)).collect();
        reports.sort();
        reports.dedup();
        assert_eq!(reports.len(), LauncherCommand::ALL.len());
    }
}
