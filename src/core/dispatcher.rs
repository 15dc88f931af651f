use super::targeting::{self, Decision, Tracking};
use super::{CoreSettings, IndicatorMode, Inner, SentryMode};
use crate::command::LauncherCommand;
use crate::events::{ControlEvent, Event, EventKind, FaceEvent, Movement};
use crate::feedback::SentryNotification;
use tracing::{debug, info, warn};

/// Apply one event to the locked state
pub(super) fn handle_event(inner: &mut Inner, settings: &CoreSettings, event: Event) {
    match event.kind {
        EventKind::Control(control) => handle_control(inner, settings, control),
        EventKind::Face(face) => handle_face(inner, settings, &face),
    }
}

fn handle_control(inner: &mut Inner, settings: &CoreSettings, control: ControlEvent) {
    match control {
        ControlEvent::ModeToggle => toggle_mode(inner),
        ControlEvent::SentryModeToggle => toggle_sentry_mode(inner),
        ControlEvent::Reload => reload(inner, settings),
        ControlEvent::IndicatorToggle => {
            let next = inner.state.indicator_mode.next();
            set_indicator(inner, next);
        }
        ControlEvent::FireBegin => fire_begin(inner),
        ControlEvent::FireEnd => fire_end(inner),
        ControlEvent::Move(movement) => command_movement(inner, movement),
    }
}

fn toggle_mode(inner: &mut Inner) {
    let from = inner.state.sentry_mode;
    let to = match from {
        SentryMode::Off => SentryMode::Passive,
        SentryMode::Passive | SentryMode::Armed => SentryMode::Off,
    };

    inner.state.sentry_mode = to;
    inner.state.tracking_face = false;
    if inner.state.moving {
        command_movement(inner, Movement::None);
    }

    if to == SentryMode::Off {
        fire_end(inner);
        set_indicator(inner, IndicatorMode::Off);
    } else {
        set_indicator(inner, IndicatorMode::BlinkSlow);
    }

    info!("Sentry mode {:?} -> {:?}", from, to);
    inner.notify(SentryNotification::sentry_mode_changed(from, to));
}

fn toggle_sentry_mode(inner: &mut Inner) {
    let from = inner.state.sentry_mode;
    let to = match from {
        SentryMode::Off => {
            warn!("Ignoring sentry-mode-toggle: sentry mode is off");
            return;
        }
        SentryMode::Passive => SentryMode::Armed,
        SentryMode::Armed => {
            fire_end(inner);
            SentryMode::Passive
        }
    };

    inner.state.sentry_mode = to;
    info!("Sentry mode {:?} -> {:?}", from, to);
    inner.notify(SentryNotification::sentry_mode_changed(from, to));
}

fn reload(inner: &mut Inner, settings: &CoreSettings) {
    inner.state.remaining_shots = settings.max_shots;
    inner.request_work();
    info!("Reloaded, {} shots ready", settings.max_shots);
    inner.notify(SentryNotification::reloaded(settings.max_shots));
}

fn fire_begin(inner: &mut Inner) {
    inner.state.continue_firing = true;
    inner.request_work();
}

/// The worker re-checks the flag before every burst, so no wake is needed
fn fire_end(inner: &mut Inner) {
    inner.state.continue_firing = false;
}

/// Record the movement for the fire/move worker to realize
fn command_movement(inner: &mut Inner, movement: Movement) {
    inner.state.desired_movement = movement;
    inner.state.moving = movement != Movement::None;
    inner.request_work();
}

/// Solid states are written immediately; blinking belongs to the indicator worker
fn set_indicator(inner: &mut Inner, mode: IndicatorMode) {
    if inner.state.indicator_mode == mode {
        return;
    }
    debug!("Indicator {:?} -> {:?}", inner.state.indicator_mode, mode);
    inner.state.indicator_mode = mode;

    match mode {
        IndicatorMode::On => {
            inner.state.indicator_on = true;
            inner.write(LauncherCommand::IndicatorOn);
        }
        IndicatorMode::Off => {
            inner.state.indicator_on = false;
            inner.write(LauncherCommand::IndicatorOff);
        }
        IndicatorMode::BlinkSlow | IndicatorMode::BlinkFast => {}
    }
}

fn handle_face(inner: &mut Inner, settings: &CoreSettings, face: &FaceEvent) {
    if inner.state.sentry_mode == SentryMode::Off {
        return;
    }

    let tracking = Tracking {
        tracking_face: inner.state.tracking_face,
        moving: inner.state.moving,
    };

    match targeting::decide(&face.faces, tracking, &settings.targeting) {
        Decision::NoTarget { stop } => {
            set_indicator(inner, IndicatorMode::BlinkSlow);
            if stop {
                debug!("Target lost");
                command_movement(inner, Movement::None);
                inner.state.tracking_face = false;
                inner.state.moving = false;
            }
        }
        Decision::Centered { target, stop } => {
            set_indicator(inner, IndicatorMode::On);
            if stop {
                debug!("Target centered at {:?}", target.center());
                command_movement(inner, Movement::None);
                if inner.state.sentry_mode == SentryMode::Armed {
                    fire_begin(inner);
                }
            }
        }
        Decision::OffCenter { target, direction } => {
            fire_end(inner);
            if !inner.state.moving || inner.state.desired_movement != direction {
                debug!("Tracking target at {:?}, moving {}", target.center(), direction);
                command_movement(inner, direction);
            }
            set_indicator(inner, IndicatorMode::BlinkFast);
        }
    }

    if !face.faces.is_empty() {
        inner.state.tracking_face = true;
    }
}
