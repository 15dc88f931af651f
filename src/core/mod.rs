//! Control core: one lock, one state record, two workers.
//!
//! Every read or write of [`CoreState`] and every write to the launcher
//! happens while holding the same mutex. The command sink lives inside that
//! mutex, so a command can only reach the hardware from a thread that holds
//! the lock. This totally orders hardware writes across the input threads and
//! the workers.

mod dispatcher;
mod fire_worker;
mod indicator;
mod state;
pub mod targeting;

#[cfg(test)]
mod tests;

pub use state::{CoreState, IndicatorMode, SentryMode};
pub use targeting::{Decision, TargetingSettings, Tracking};

use crate::command::{CommandSink, LauncherCommand};
use crate::config::SentryConfig;
use crate::error::{Result, SentryError};
use crate::events::Event;
use crate::feedback::{FeedbackBus, SentryNotification};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Fixed timing and capacity constants, taken from configuration at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreSettings {
    pub targeting: TargetingSettings,
    pub max_shots: u8,
    pub burst_duration: Duration,
    pub slow_blink: Duration,
    pub fast_blink: Duration,
    pub idle_poll: Duration,
}

impl CoreSettings {
    /// Sleep before the indicator worker's next look at the mode
    pub fn blink_interval(&self, mode: IndicatorMode) -> Duration {
        match mode {
            IndicatorMode::BlinkSlow => self.slow_blink,
            IndicatorMode::BlinkFast => self.fast_blink,
            IndicatorMode::Off | IndicatorMode::On => self.idle_poll,
        }
    }
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            targeting: TargetingSettings::default(),
            max_shots: 4,
            burst_duration: Duration::from_millis(3300),
            slow_blink: Duration::from_millis(500),
            fast_blink: Duration::from_millis(100),
            idle_poll: Duration::from_millis(500),
        }
    }
}

impl From<&SentryConfig> for CoreSettings {
    fn from(config: &SentryConfig) -> Self {
        Self {
            targeting: TargetingSettings {
                frame_width: pixels(config.camera.resolution.0),
                frame_height: pixels(config.camera.resolution.1),
                deadzone_radius: pixels(config.targeting.deadzone_radius),
                horizontal_bias: pixels(config.targeting.horizontal_bias),
            },
            max_shots: config.launcher.max_shots.min(u8::MAX as u32) as u8,
            burst_duration: Duration::from_millis(config.launcher.burst_duration_ms),
            slow_blink: Duration::from_millis(config.indicator.slow_blink_ms),
            fast_blink: Duration::from_millis(config.indicator.fast_blink_ms),
            idle_poll: Duration::from_millis(config.indicator.idle_poll_ms),
        }
    }
}

/// Saturates instead of wrapping for values `validate` would have rejected
fn pixels(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Everything guarded by the core lock
pub(crate) struct Inner {
    pub(crate) state: CoreState,
    sink: Box<dyn CommandSink>,
    feedback: FeedbackBus,
    pub(crate) shutdown: bool,
}

impl Inner {
    /// Write one command to the launcher. Failures are reported, never retried.
    pub(crate) fn write(&mut self, command: LauncherCommand) {
        debug!("launcher <- {}", command);
        if let Err(e) = self.sink.send(command) {
            warn!("Launcher write via {} failed: {}", self.sink.name(), e);
            self.feedback
                .publish(SentryNotification::command_failed(command, e.to_string()));
        }
    }

    pub(crate) fn notify(&self, notification: SentryNotification) {
        self.feedback.publish(notification);
    }

    /// Ask the fire/move worker to re-evaluate the state
    pub(crate) fn request_work(&mut self) {
        self.state.wake_pending = true;
    }
}

pub(crate) struct Shared {
    pub(crate) inner: Mutex<Inner>,
    pub(crate) wake: Condvar,
    pub(crate) settings: CoreSettings,
}

/// Cloneable handle to the single core instance
#[derive(Clone)]
pub struct Core {
    pub(crate) shared: Arc<Shared>,
}

impl Core {
    pub fn new<S>(settings: CoreSettings, sink: S, feedback: FeedbackBus) -> Self
    where
        S: CommandSink + 'static,
    {
        info!("Creating launcher core with sink {}", sink.name());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: CoreState::new(settings.max_shots),
                    sink: Box::new(sink),
                    feedback,
                    shutdown: false,
                }),
                wake: Condvar::new(),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.shared.settings
    }

    /// Handle one event atomically. Safe to call from any number of threads.
    pub fn dispatch(&self, event: impl Into<Event>) {
        let event = event.into();
        let mut inner = self.shared.inner.lock();

        if inner.shutdown {
            debug!("Core is shut down, dropping {}", event.description());
            return;
        }

        debug!(
            "Dispatching {} event at {}: {}",
            event.event_type(),
            event.when_occurred,
            event.description()
        );

        dispatcher::handle_event(&mut inner, &self.shared.settings, event);

        if inner.state.wake_pending {
            self.shared.wake.notify_one();
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> CoreState {
        self.shared.inner.lock().state.clone()
    }

    /// Start the fire/move and indicator workers
    pub fn spawn_workers(&self) -> Result<Workers> {
        let fire_shared = Arc::clone(&self.shared);
        let fire_move = thread::Builder::new()
            .name("fire-move-worker".to_string())
            .spawn(move || fire_worker::run(fire_shared))
            .map_err(SentryError::from)?;

        let indicator_shared = Arc::clone(&self.shared);
        let indicator = thread::Builder::new()
            .name("indicator-worker".to_string())
            .spawn(move || indicator::run(indicator_shared))
            .map_err(SentryError::from)?;

        info!("Launcher core workers started");
        Ok(Workers {
            fire_move,
            indicator,
        })
    }

    /// Stop the motors, darken the indicator, and let the workers exit.
    ///
    /// A burst already in its sleep finishes before the fire/move worker
    /// notices.
    pub fn shutdown(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.shutdown {
            return;
        }
        info!("Shutting down launcher core");

        inner.shutdown = true;
        inner.state.continue_firing = false;
        inner.state.desired_movement = crate::events::Movement::None;
        inner.state.moving = false;
        inner.state.indicator_mode = IndicatorMode::Off;
        inner.state.indicator_on = false;
        inner.write(LauncherCommand::Stop);
        inner.write(LauncherCommand::IndicatorOff);

        self.shared.wake.notify_all();
    }
}

/// Join handles of the core's background threads
pub struct Workers {
    fire_move: JoinHandle<()>,
    indicator: JoinHandle<()>,
}

impl Workers {
    /// Wait for both workers. Only returns after [`Core::shutdown`].
    pub fn join(self) -> Result<()> {
        for (name, handle) in [("fire-move", self.fire_move), ("indicator", self.indicator)] {
            handle
                .join()
                .map_err(|_| SentryError::component(name, "worker thread panicked"))?;
        }
        Ok(())
    }
}
