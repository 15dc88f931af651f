pub mod app;
pub mod command;
pub mod config;
pub mod core;
pub mod error;
pub mod events;
pub mod feedback;
pub mod input;
pub mod launcher;
pub mod vision;

pub use app::{ComponentState, SentryOrchestrator, ShutdownReason};
pub use command::{CommandSink, LauncherCommand};
pub use config::SentryConfig;
pub use crate::core::{Core, CoreSettings, CoreState, IndicatorMode, SentryMode, Workers};
pub use error::{CommandError, InputError, Result, SentryError};
pub use events::{ControlEvent, Event, FaceBox, FaceEvent, Movement};
pub use feedback::{FeedbackBus, FeedbackHandler, LoggingHandler, SentryNotification};
pub use launcher::{create_sink, ChannelSink, HidrawLauncher, LoggingSink};
pub use vision::FaceFeed;
