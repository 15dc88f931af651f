//! Control input adapters. Each one turns device input into [`ControlEvent`]s
//! and hands them to the core.
//!
//! [`ControlEvent`]: crate::events::ControlEvent

pub mod keyboard;

#[cfg(all(feature = "gamepad", target_os = "linux"))]
pub mod gamepad;

pub use keyboard::{map_key, KeyAction, KeyboardInputHandler};

#[cfg(all(feature = "gamepad", target_os = "linux"))]
pub use gamepad::{map_input_event, GamepadInputHandler};
