use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SentryConfig {
    pub camera: CameraConfig,
    pub targeting: TargetingConfig,
    pub launcher: LauncherConfig,
    pub indicator: IndicatorConfig,
    pub input: InputConfig,
    pub vision: VisionConfig,
    pub feedback: FeedbackConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CameraConfig {
    /// Frame size the face boxes are reported in (width, height)
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TargetingConfig {
    /// Radius of the centered-target circle around the frame center, in pixels
    #[serde(default = "default_deadzone_radius")]
    pub deadzone_radius: u32,

    /// Horizontal offset above which the turret always corrects sideways first
    #[serde(default = "default_horizontal_bias")]
    pub horizontal_bias: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LauncherConfig {
    /// Command sink: "hidraw" for hardware, "log" to only log commands
    #[serde(default = "default_launcher_sink")]
    pub sink: String,

    /// hidraw node the launcher is attached to
    #[serde(default = "default_launcher_device")]
    pub device: String,

    /// Magazine capacity
    #[serde(default = "default_max_shots")]
    pub max_shots: u32,

    /// Time the launcher needs to complete one fire cycle
    #[serde(default = "default_burst_duration_ms")]
    pub burst_duration_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct IndicatorConfig {
    #[serde(default = "default_slow_blink_ms")]
    pub slow_blink_ms: u64,

    #[serde(default = "default_fast_blink_ms")]
    pub fast_blink_ms: u64,

    /// Poll interval while the indicator is solid on or off
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct InputConfig {
    /// Accept control keys from the terminal
    #[serde(default = "default_keyboard")]
    pub keyboard: bool,

    /// evdev node of the gamepad, if one is attached
    #[serde(default)]
    pub gamepad_device: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct VisionConfig {
    /// Face box feed: "-" for stdin, otherwise a file or FIFO path
    #[serde(default)]
    pub source: Option<String>,

    /// Faces beyond this count in a single frame are dropped
    #[serde(default = "default_max_faces")]
    pub max_faces: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeedbackConfig {
    /// Notification channel capacity
    #[serde(default = "default_feedback_capacity")]
    pub capacity: usize,
}

pub const SINK_HIDRAW: &str = "hidraw";
pub const SINK_LOG: &str = "log";

/// Largest frame side, deadzone radius, or bias accepted in pixels
pub const MAX_FRAME_DIMENSION: u32 = 16384;

impl SentryConfig {
    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("targeting.deadzone_radius", default_deadzone_radius())?
            .set_default("targeting.horizontal_bias", default_horizontal_bias())?
            .set_default("launcher.sink", default_launcher_sink())?
            .set_default("launcher.device", default_launcher_device())?
            .set_default("launcher.max_shots", default_max_shots())?
            .set_default("launcher.burst_duration_ms", default_burst_duration_ms())?
            .set_default("indicator.slow_blink_ms", default_slow_blink_ms())?
            .set_default("indicator.fast_blink_ms", default_fast_blink_ms())?
            .set_default("indicator.idle_poll_ms", default_idle_poll_ms())?
            .set_default("input.keyboard", default_keyboard())?
            .set_default("vision.max_faces", default_max_faces() as i64)?
            .set_default("feedback.capacity", default_feedback_capacity() as i64)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // SENTRY_LAUNCHER__MAX_SHOTS=2 overrides launcher.max_shots
            .add_source(
                Environment::with_prefix("SENTRY")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: SentryConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Parse a complete TOML document
    pub fn from_toml_str(contents: &str) -> crate::error::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Render the configuration as TOML
    pub fn to_toml_string(&self) -> crate::error::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if self.camera.resolution.0 > MAX_FRAME_DIMENSION
            || self.camera.resolution.1 > MAX_FRAME_DIMENSION
        {
            return Err(ConfigError::Message(format!(
                "Camera resolution must not exceed {} pixels per side",
                MAX_FRAME_DIMENSION
            )));
        }

        if self.targeting.deadzone_radius == 0 {
            return Err(ConfigError::Message(
                "Targeting deadzone_radius must be greater than 0".to_string(),
            ));
        }

        if self.targeting.deadzone_radius > MAX_FRAME_DIMENSION
            || self.targeting.horizontal_bias > MAX_FRAME_DIMENSION
        {
            return Err(ConfigError::Message(format!(
                "Targeting deadzone_radius and horizontal_bias must not exceed {}",
                MAX_FRAME_DIMENSION
            )));
        }

        if self.launcher.sink != SINK_HIDRAW && self.launcher.sink != SINK_LOG {
            return Err(ConfigError::Message(format!(
                "Unknown launcher sink '{}', expected '{}' or '{}'",
                self.launcher.sink, SINK_HIDRAW, SINK_LOG
            )));
        }

        if self.launcher.max_shots == 0 || self.launcher.max_shots > u8::MAX as u32 {
            return Err(ConfigError::Message(format!(
                "Launcher max_shots must be between 1 and {}",
                u8::MAX
            )));
        }

        if self.launcher.burst_duration_ms == 0 {
            return Err(ConfigError::Message(
                "Launcher burst_duration_ms must be greater than 0".to_string(),
            ));
        }

        if self.indicator.slow_blink_ms == 0
            || self.indicator.fast_blink_ms == 0
            || self.indicator.idle_poll_ms == 0
        {
            return Err(ConfigError::Message(
                "Indicator intervals must be greater than 0".to_string(),
            ));
        }

        if self.vision.max_faces == 0 {
            return Err(ConfigError::Message(
                "Vision max_faces must be greater than 0".to_string(),
            ));
        }

        if self.feedback.capacity == 0 {
            return Err(ConfigError::Message(
                "Feedback capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig {
                resolution: default_camera_resolution(),
            },
            targeting: TargetingConfig {
                deadzone_radius: default_deadzone_radius(),
                horizontal_bias: default_horizontal_bias(),
            },
            launcher: LauncherConfig {
                sink: default_launcher_sink(),
                device: default_launcher_device(),
                max_shots: default_max_shots(),
                burst_duration_ms: default_burst_duration_ms(),
            },
            indicator: IndicatorConfig {
                slow_blink_ms: default_slow_blink_ms(),
                fast_blink_ms: default_fast_blink_ms(),
                idle_poll_ms: default_idle_poll_ms(),
            },
            input: InputConfig {
                keyboard: default_keyboard(),
                gamepad_device: None,
            },
            vision: VisionConfig {
                source: None,
                max_faces: default_max_faces(),
            },
            feedback: FeedbackConfig {
                capacity: default_feedback_capacity(),
            },
        }
    }
}

// Default value functions
fn default_camera_resolution() -> (u32, u32) {
    (320, 240)
}

fn default_deadzone_radius() -> u32 {
    30
}
fn default_horizontal_bias() -> u32 {
    20
}

fn default_launcher_sink() -> String {
    SINK_HIDRAW.to_string()
}
fn default_launcher_device() -> String {
    "/dev/hidraw0".to_string()
}
fn default_max_shots() -> u32 {
    4
}
fn default_burst_duration_ms() -> u64 {
    3300
}

fn default_slow_blink_ms() -> u64 {
    500
}
fn default_fast_blink_ms() -> u64 {
    100
}
fn default_idle_poll_ms() -> u64 {
    500
}

fn default_keyboard() -> bool {
    false
}

fn default_max_faces() -> usize {
    10
}

fn default_feedback_capacity() -> usize {
    64
}
