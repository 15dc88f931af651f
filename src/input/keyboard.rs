use crate::core::Core;
use crate::error::Result;
use crate::events::{ControlEvent, Movement};
use crate::feedback::{FeedbackBus, SentryNotification};
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement};
use std::io::stdout;
use std::time::Duration;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What a key does to the sentry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Control(ControlEvent),
    Quit,
}

/// Map a terminal key to a control event.
///
/// Releases are only reported by terminals with keyboard enhancement; `x`
/// ends firing everywhere else.
pub fn map_key(code: KeyCode, kind: KeyEventKind) -> Option<KeyAction> {
    if kind == KeyEventKind::Release {
        return match code {
            KeyCode::Char(' ') => Some(KeyAction::Control(ControlEvent::FireEnd)),
            _ => None,
        };
    }
    if kind == KeyEventKind::Repeat {
        return None;
    }

    let control = match code {
        KeyCode::Up => ControlEvent::Move(Movement::Up),
        KeyCode::Down => ControlEvent::Move(Movement::Down),
        KeyCode::Left => ControlEvent::Move(Movement::Left),
        KeyCode::Right => ControlEvent::Move(Movement::Right),
        KeyCode::Char(c) => match c.to_ascii_lowercase() {
            's' => ControlEvent::Move(Movement::None),
            ' ' => ControlEvent::FireBegin,
            'x' => ControlEvent::FireEnd,
            'm' => ControlEvent::ModeToggle,
            'a' => ControlEvent::SentryModeToggle,
            'r' => ControlEvent::Reload,
            'l' => ControlEvent::IndicatorToggle,
            'q' => return Some(KeyAction::Quit),
            _ => return None,
        },
        KeyCode::Esc => return Some(KeyAction::Quit),
        _ => return None,
    };
    Some(KeyAction::Control(control))
}

/// Terminal keyboard control for driving the launcher by hand
pub struct KeyboardInputHandler {
    core: Core,
    feedback: FeedbackBus,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    pub fn new(core: Core, feedback: FeedbackBus) -> Self {
        Self {
            core,
            feedback,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard control: arrows move, SPACE fires, m/a toggle modes, q quits");

        let core = self.core.clone();
        let feedback = self.feedback.clone();
        let cancellation_token = self.cancellation_token.clone();

        task::spawn_blocking(move || {
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            let enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
            if enhanced {
                let flags = KeyboardEnhancementFlags::REPORT_EVENT_TYPES;
                if let Err(e) = execute!(stdout(), PushKeyboardEnhancementFlags(flags)) {
                    warn!("Key release reporting unavailable: {}", e);
                }
            }
            debug!("Raw mode enabled, key releases reported: {}", enhanced);

            while !cancellation_token.is_cancelled() {
                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        match map_key(key_event.code, key_event.kind) {
                            Some(KeyAction::Control(control)) => {
                                debug!("Key {:?} -> {}", key_event.code, control.name());
                                core.dispatch(control);
                            }
                            Some(KeyAction::Quit) => {
                                info!("Quit key pressed - requesting shutdown");
                                feedback.publish(SentryNotification::shutdown_requested(
                                    "User requested via keyboard",
                                ));
                                break;
                            }
                            None => debug!("Unmapped key: {:?}", key_event.code),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => warn!("Error polling for keyboard events: {}", e),
                }
            }

            if enhanced {
                let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
            }
            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            }
            debug!("Keyboard input task exited");
        });

        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Let the task leave raw mode itself before forcing it
        tokio::time::sleep(Duration::from_millis(200)).await;
        let _ = disable_raw_mode();

        Ok(())
    }
}
