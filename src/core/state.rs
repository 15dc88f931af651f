use crate::command::LauncherCommand;
use crate::events::Movement;
use serde::{Deserialize, Serialize};

/// Whether automated tracking acts and whether centering fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SentryMode {
    #[default]
    Off,
    Passive,
    Armed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum IndicatorMode {
    #[default]
    Off,
    On,
    BlinkSlow,
    BlinkFast,
}

impl IndicatorMode {
    /// Next mode in the manual toggle cycle
    pub fn next(self) -> Self {
        match self {
            IndicatorMode::Off => IndicatorMode::On,
            IndicatorMode::On => IndicatorMode::BlinkSlow,
            IndicatorMode::BlinkSlow => IndicatorMode::BlinkFast,
            IndicatorMode::BlinkFast => IndicatorMode::Off,
        }
    }

    pub fn is_blinking(self) -> bool {
        matches!(self, IndicatorMode::BlinkSlow | IndicatorMode::BlinkFast)
    }
}

impl Movement {
    /// Command that realizes this movement; `None` stops the motors
    pub fn command(self) -> LauncherCommand {
        match self {
            Movement::Up => LauncherCommand::Up,
            Movement::Down => LauncherCommand::Down,
            Movement::Left => LauncherCommand::Left,
            Movement::Right => LauncherCommand::Right,
            Movement::None => LauncherCommand::Stop,
        }
    }
}

/// The single authoritative device state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoreState {
    pub sentry_mode: SentryMode,
    pub indicator_mode: IndicatorMode,
    /// Physical phase of a blinking indicator
    pub indicator_on: bool,
    /// Movement the fire/move worker realizes once it is free
    pub desired_movement: Movement,
    pub continue_firing: bool,
    pub remaining_shots: u8,
    pub tracking_face: bool,
    /// A non-None movement command is outstanding
    pub moving: bool,
    /// Set by the dispatcher, cleared by the fire/move worker
    pub(crate) wake_pending: bool,
}

impl CoreState {
    pub fn new(max_shots: u8) -> Self {
        Self {
            sentry_mode: SentryMode::Off,
            indicator_mode: IndicatorMode::Off,
            indicator_on: false,
            desired_movement: Movement::None,
            continue_firing: false,
            remaining_shots: max_shots,
            tracking_face: false,
            moving: false,
            wake_pending: false,
        }
    }
}
