use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Requested turret movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
    #[default]
    None,
}

impl Movement {
    pub fn name(&self) -> &'static str {
        match self {
            Movement::Up => "up",
            Movement::Down => "down",
            Movement::Left => "left",
            Movement::Right => "right",
            Movement::None => "none",
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Abstract control decoded from a physical input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlEvent {
    /// Enter or leave sentry mode
    ModeToggle,
    /// Magazine was refilled
    Reload,
    /// Cycle the indicator light mode
    IndicatorToggle,
    /// Trigger pressed
    FireBegin,
    /// Trigger released
    FireEnd,
    /// Directional control
    Move(Movement),
    /// Switch between passive and armed sentry
    SentryModeToggle,
}

impl ControlEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ControlEvent::ModeToggle => "mode-toggle",
            ControlEvent::Reload => "reload",
            ControlEvent::IndicatorToggle => "indicator-toggle",
            ControlEvent::FireBegin => "fire-begin",
            ControlEvent::FireEnd => "fire-end",
            ControlEvent::Move(_) => "move",
            ControlEvent::SentryModeToggle => "sentry-mode-toggle",
        }
    }
}

/// Face bounding box in camera pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl FaceBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Center point of the box. Computed in `i64` so detector output near
    /// the `i32` limits cannot overflow.
    pub fn center(&self) -> (i64, i64) {
        (
            self.x as i64 + self.width as i64 / 2,
            self.y as i64 + self.height as i64 / 2,
        )
    }

    /// True when the point lies strictly inside the box
    pub fn strictly_contains(&self, (px, py): (i64, i64)) -> bool {
        let (x, y) = (self.x as i64, self.y as i64);
        px > x && px < x + self.width as i64 && py > y && py < y + self.height as i64
    }

    /// A box with a negative extent cannot come from a real detection
    pub fn has_valid_size(&self) -> bool {
        self.width >= 0 && self.height >= 0
    }
}

/// All faces found in a single camera frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FaceEvent {
    pub faces: Vec<FaceBox>,
}

impl FaceEvent {
    pub fn new(faces: Vec<FaceBox>) -> Self {
        Self { faces }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Control(ControlEvent),
    Face(FaceEvent),
}

/// Input delivered to the core by a producer thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub when_occurred: DateTime<Utc>,
    pub kind: EventKind,
}

impl Event {
    pub fn control(control: ControlEvent) -> Self {
        Self {
            when_occurred: Utc::now(),
            kind: EventKind::Control(control),
        }
    }

    pub fn face(face: FaceEvent) -> Self {
        Self {
            when_occurred: Utc::now(),
            kind: EventKind::Face(face),
        }
    }

    /// Get the event type as a string for logging
    pub fn event_type(&self) -> &'static str {
        match &self.kind {
            EventKind::Control(_) => "control",
            EventKind::Face(_) => "face",
        }
    }

    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match &self.kind {
            EventKind::Control(ControlEvent::Move(movement)) => {
                format!("control move {}", movement)
            }
            EventKind::Control(control) => format!("control {}", control.name()),
            EventKind::Face(face) => format!("{} face(s)", face.faces.len()),
        }
    }
}

impl From<ControlEvent> for Event {
    fn from(control: ControlEvent) -> Self {
        Event::control(control)
    }
}

impl From<FaceEvent> for Event {
    fn from(face: FaceEvent) -> Self {
        Event::face(face)
    }
}
