use crate::core::Core;
use crate::error::{InputError, Result, SentryError};
use crate::events::{ControlEvent, Movement};
use evdev::{AbsoluteAxisType, Device, EventType, InputEvent, InputEventKind, Key};
use std::thread;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const MAX_CONSECUTIVE_ERRORS: u32 = 5;

/// Translate one evdev event from the pad into a control event
pub fn map_input_event(event: &InputEvent) -> Option<ControlEvent> {
    match event.kind() {
        InputEventKind::Key(key) => {
            let pressed = event.value() == 1;
            let released = event.value() == 0;
            match key {
                Key::BTN_SOUTH if pressed => Some(ControlEvent::FireBegin),
                Key::BTN_SOUTH if released => Some(ControlEvent::FireEnd),
                Key::BTN_WEST if pressed => Some(ControlEvent::IndicatorToggle),
                Key::BTN_NORTH if pressed => Some(ControlEvent::ModeToggle),
                Key::BTN_EAST if pressed => Some(ControlEvent::SentryModeToggle),
                Key::BTN_TR if pressed => Some(ControlEvent::Reload),
                _ => None,
            }
        }
        InputEventKind::AbsAxis(axis) => {
            let movement = match (axis, event.value().signum()) {
                (AbsoluteAxisType::ABS_HAT0X, -1) => Movement::Left,
                (AbsoluteAxisType::ABS_HAT0X, 1) => Movement::Right,
                (AbsoluteAxisType::ABS_HAT0Y, -1) => Movement::Up,
                (AbsoluteAxisType::ABS_HAT0Y, 1) => Movement::Down,
                (AbsoluteAxisType::ABS_HAT0X | AbsoluteAxisType::ABS_HAT0Y, _) => Movement::None,
                _ => return None,
            };
            Some(ControlEvent::Move(movement))
        }
        _ => None,
    }
}

/// Gamepad control read from an evdev node, reopened with backoff on failure
pub struct GamepadInputHandler {
    pub(crate) device_path: String,
    core: Core,
    max_retries: u32,
    retry_delay: Duration,
    cancellation_token: CancellationToken,
}

impl GamepadInputHandler {
    pub fn new(device_path: impl Into<String>, core: Core) -> Self {
        Self {
            device_path: device_path.into(),
            core,
            max_retries: 10,
            retry_delay: Duration::from_secs(1),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start reading the pad on a blocking thread
    pub async fn start(&self) -> Result<()> {
        info!("Starting gamepad input handler for device: {}", self.device_path);

        let device_path = self.device_path.clone();
        let core = self.core.clone();
        let max_retries = self.max_retries;
        let retry_delay = self.retry_delay;
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            let mut retry_count = 0;

            while !cancellation_token.is_cancelled() {
                match Self::monitor_device(&device_path, &core, &cancellation_token) {
                    Ok(()) => {
                        info!("Gamepad monitoring ended normally");
                        break;
                    }
                    Err(e) => {
                        error!("Gamepad error: {}", e);
                        retry_count += 1;

                        if retry_count >= max_retries {
                            error!(
                                "Gamepad input handler failed after {} attempts, giving up",
                                max_retries
                            );
                            break;
                        }

                        let delay = retry_delay * 2_u32.pow(retry_count.min(5));
                        warn!(
                            "Retrying gamepad connection in {:?} (attempt {}/{})",
                            delay, retry_count, max_retries
                        );
                        thread::sleep(delay);
                    }
                }
            }
        });

        Ok(())
    }

    /// The reader notices cancellation after its next batch of events
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping gamepad input handler");
        self.cancellation_token.cancel();
        Ok(())
    }

    fn open_device(device_path: &str) -> Result<Device> {
        Device::open(device_path).map_err(|e| {
            let input_error = match e.kind() {
                std::io::ErrorKind::NotFound => InputError::DeviceNotFound(device_path.to_string()),
                std::io::ErrorKind::PermissionDenied => {
                    InputError::PermissionDenied(device_path.to_string())
                }
                _ => InputError::DeviceOpen {
                    device: device_path.to_string(),
                    details: e.to_string(),
                },
            };
            SentryError::from(input_error)
        })
    }

    fn monitor_device(
        device_path: &str,
        core: &Core,
        cancellation_token: &CancellationToken,
    ) -> Result<()> {
        let mut device = Self::open_device(device_path)?;
        info!(
            "Gamepad opened: {} ({})",
            device_path,
            device.name().unwrap_or("Unknown")
        );
        Self::validate_device(&device, device_path)?;

        let mut consecutive_errors = 0;

        while !cancellation_token.is_cancelled() {
            match device.fetch_events() {
                Ok(events) => {
                    consecutive_errors = 0;
                    for event in events {
                        if let Some(control) = map_input_event(&event) {
                            debug!("Gamepad {:?} -> {}", event.kind(), control.name());
                            core.dispatch(control);
                        }
                    }
                }
                Err(e) => {
                    consecutive_errors += 1;
                    if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                        return Err(InputError::DeviceRead {
                            details: format!("too many consecutive errors: {}", e),
                        }
                        .into());
                    }
                    warn!(
                        "Error reading from gamepad (attempt {}): {}",
                        consecutive_errors, e
                    );
                    thread::sleep(Duration::from_millis(100));
                }
            }
        }

        Ok(())
    }

    fn validate_device(device: &Device, device_path: &str) -> Result<()> {
        let supported_events = device.supported_events();
        if !supported_events.contains(EventType::KEY) {
            return Err(InputError::UnsupportedDevice(format!(
                "{} does not support key events",
                device_path
            ))
            .into());
        }

        if !supported_events.contains(EventType::ABSOLUTE) {
            warn!("Gamepad {} has no absolute axes, the d-pad will not move the turret", device_path);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(key: Key, value: i32) -> InputEvent {
        InputEvent::new(EventType::KEY, key.code(), value)
    }

    fn hat(axis: AbsoluteAxisType, value: i32) -> InputEvent {
        InputEvent::new(EventType::ABSOLUTE, axis.0, value)
    }

    #[test]
    fn test_trigger_button_fires_while_held() {
        assert_eq!(
            map_input_event(&key(Key::BTN_SOUTH, 1)),
            Some(ControlEvent::FireBegin)
        );
        assert_eq!(
            map_input_event(&key(Key::BTN_SOUTH, 0)),
            Some(ControlEvent::FireEnd)
        );
        // Autorepeat is not a new press
        assert_eq!(map_input_event(&key(Key::BTN_SOUTH, 2)), None);
    }

    #[test]
    fn test_face_buttons_act_on_press_only() {
        assert_eq!(
            map_input_event(&key(Key::BTN_NORTH, 1)),
            Some(ControlEvent::ModeToggle)
        );
        assert_eq!(
            map_input_event(&key(Key::BTN_EAST, 1)),
            Some(ControlEvent::SentryModeToggle)
        );
        assert_eq!(
            map_input_event(&key(Key::BTN_WEST, 1)),
            Some(ControlEvent::IndicatorToggle)
        );
        assert_eq!(
            map_input_event(&key(Key::BTN_TR, 1)),
            Some(ControlEvent::Reload)
        );
        assert_eq!(map_input_event(&key(Key::BTN_NORTH, 0)), None);
        assert_eq!(map_input_event(&key(Key::BTN_START, 1)), None);
    }

    #[test]
    fn test_dpad_moves_and_centers() {
        assert_eq!(
            map_input_event(&hat(AbsoluteAxisType::ABS_HAT0X, -1)),
            Some(ControlEvent::Move(Movement::Left))
        );
        assert_eq!(
            map_input_event(&hat(AbsoluteAxisType::ABS_HAT0Y, 1)),
            Some(ControlEvent::Move(Movement::Down))
        );
        assert_eq!(
            map_input_event(&hat(AbsoluteAxisType::ABS_HAT0Y, 0)),
            Some(ControlEvent::Move(Movement::None))
        );
        assert_eq!(map_input_event(&hat(AbsoluteAxisType::ABS_X, 100)), None);
    }
}
