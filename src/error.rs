use crate::command::LauncherCommand;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentryError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Launcher error: {0}")]
    Command(#[from] CommandError),

    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("System error: {message}")]
    System { message: String },

    #[error("Component error in {component}: {message}")]
    Component { component: String, message: String },
}

impl SentryError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn component<S: Into<String>>(component: S, message: S) -> Self {
        Self::Component {
            component: component.into(),
            message: message.into(),
        }
    }
}

/// Failures reported by a command sink
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to open launcher device {device}: {source}")]
    DeviceOpen {
        device: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {command} to launcher: {source}")]
    Write {
        command: LauncherCommand,
        #[source]
        source: std::io::Error,
    },

    #[error("Short write for {command}: {written} of {expected} bytes")]
    ShortWrite {
        command: LauncherCommand,
        written: usize,
        expected: usize,
    },

    #[error("Command channel disconnected while sending {command}")]
    Disconnected { command: LauncherCommand },
}

/// Failures reported by the control and vision input adapters
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to open input device {device}: {details}")]
    DeviceOpen { device: String, details: String },

    #[error("Failed to read input device: {details}")]
    DeviceRead { details: String },

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Permission denied for input device: {0}")]
    PermissionDenied(String),

    #[error("Unsupported input device: {0}")]
    UnsupportedDevice(String),

    #[error("Failed to parse input: {details}")]
    Parse { details: String },
}

#[derive(Error, Debug)]
pub enum EventBusError {
    #[error("Feedback channel closed")]
    ChannelClosed,
}

pub type Result<T> = std::result::Result<T, SentryError>;
