//! Face-box targeting: picks a face and decides whether to turn, stop, or fire.
//!
//! Pure functions only. The dispatcher calls [`decide`] with its lock held and
//! applies the returned [`Decision`] to the core state.

use crate::events::{FaceBox, Movement};

/// Frame geometry and tolerances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetingSettings {
    pub frame_width: i32,
    pub frame_height: i32,
    pub deadzone_radius: i32,
    pub horizontal_bias: i32,
}

impl TargetingSettings {
    pub fn frame_center(&self) -> (i64, i64) {
        (self.frame_width as i64 / 2, self.frame_height as i64 / 2)
    }
}

impl Default for TargetingSettings {
    fn default() -> Self {
        Self {
            frame_width: 320,
            frame_height: 240,
            deadzone_radius: 30,
            horizontal_bias: 20,
        }
    }
}

/// Tracking flags the decision depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tracking {
    pub tracking_face: bool,
    pub moving: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// No faces in the frame. `stop` is set when a face was being tracked.
    NoTarget { stop: bool },
    /// Target is on the frame center. `stop` is set when the turret was moving.
    Centered { target: FaceBox, stop: bool },
    /// Target is off center and the turret should turn toward it
    OffCenter { target: FaceBox, direction: Movement },
}

/// Widest face wins; the first one seen wins a tie
pub fn select_target(faces: &[FaceBox]) -> Option<FaceBox> {
    faces.iter().copied().fold(None, |best, face| match best {
        Some(current) if face.width <= current.width => Some(current),
        _ => Some(face),
    })
}

/// Centered when inside the deadzone circle, or when the frame center falls
/// strictly inside a (close, large) face box.
pub fn is_centered(target: &FaceBox, settings: &TargetingSettings) -> bool {
    let (cx, cy) = target.center();
    let (fx, fy) = settings.frame_center();

    // Squares of offsets near the i32 limits exceed i64
    let dx = (cx - fx) as i128;
    let dy = (cy - fy) as i128;
    let radius = settings.deadzone_radius as i128;

    dx * dx + dy * dy <= radius * radius || target.strictly_contains((fx, fy))
}

/// Direction that brings the target toward the frame center.
///
/// Horizontal correction wins whenever the horizontal offset exceeds the bias
/// or the vertical offset.
pub fn correction(target: &FaceBox, settings: &TargetingSettings) -> Movement {
    let (cx, cy) = target.center();
    let (fx, fy) = settings.frame_center();

    let dx = (cx - fx).abs();
    let dy = (cy - fy).abs();

    if dx > settings.horizontal_bias as i64 || dx > dy {
        if cx < fx {
            Movement::Left
        } else {
            Movement::Right
        }
    } else if cy < fy {
        Movement::Up
    } else {
        Movement::Down
    }
}

pub fn decide(faces: &[FaceBox], tracking: Tracking, settings: &TargetingSettings) -> Decision {
    let target = match select_target(faces) {
        Some(target) => target,
        None => {
            return Decision::NoTarget {
                stop: tracking.tracking_face,
            }
        }
    };

    if is_centered(&target, settings) {
        Decision::Centered {
            target,
            stop: tracking.moving,
        }
    } else {
        Decision::OffCenter {
            target,
            direction: correction(&target, settings),
        }
    }
}
