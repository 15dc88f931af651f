use std::fmt;

/// Lifecycle of a sentry component (core workers, feedback, adapters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentState {
    Stopped,
    Starting,
    Running,
    Stopping,
    Failed,
}

impl ComponentState {
    /// Started and not yet stopped
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            ComponentState::Starting | ComponentState::Running | ComponentState::Stopping
        )
    }
}

/// Why `run` ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// SIGINT or SIGTERM
    Signal(String),
    /// A component stopped on an unrecoverable error
    Error(String),
    /// An operator pressed quit on an input adapter
    UserRequest(String),
}

impl ShutdownReason {
    /// Exit status implied by the reason alone
    pub fn exit_code(&self) -> i32 {
        match self {
            ShutdownReason::Error(_) => 1,
            ShutdownReason::Signal(_) | ShutdownReason::UserRequest(_) => 0,
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownReason::Signal(signal) => write!(f, "received {}", signal),
            ShutdownReason::Error(details) => write!(f, "component failure: {}", details),
            ShutdownReason::UserRequest(source) => write!(f, "requested from {}", source),
        }
    }
}
