use crate::command::LauncherCommand;
use crate::core::SentryMode;
use crate::error::EventBusError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Best-effort notifications for audio cues and telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SentryNotification {
    /// Magazine refilled
    Reloaded {
        remaining_shots: u8,
        timestamp: DateTime<Utc>,
    },
    /// Trigger held with an empty magazine
    OutOfAmmo { timestamp: DateTime<Utc> },
    /// One burst cycle completed
    ShotFired {
        remaining_shots: u8,
        timestamp: DateTime<Utc>,
    },
    /// Sentry mode transition
    SentryModeChanged {
        from: SentryMode,
        to: SentryMode,
        timestamp: DateTime<Utc>,
    },
    /// The launcher rejected a command
    CommandFailed {
        command: LauncherCommand,
        error: String,
        timestamp: DateTime<Utc>,
    },
    /// An operator asked the process to stop
    ShutdownRequested {
        reason: String,
        timestamp: DateTime<Utc>,
    },
    /// A producer stopped on an unrecoverable error
    ComponentFailed {
        component: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl SentryNotification {
    pub fn reloaded(remaining_shots: u8) -> Self {
        Self::Reloaded {
            remaining_shots,
            timestamp: Utc::now(),
        }
    }

    pub fn out_of_ammo() -> Self {
        Self::OutOfAmmo {
            timestamp: Utc::now(),
        }
    }

    pub fn shot_fired(remaining_shots: u8) -> Self {
        Self::ShotFired {
            remaining_shots,
            timestamp: Utc::now(),
        }
    }

    pub fn sentry_mode_changed(from: SentryMode, to: SentryMode) -> Self {
        Self::SentryModeChanged {
            from,
            to,
            timestamp: Utc::now(),
        }
    }

    pub fn command_failed(command: LauncherCommand, error: String) -> Self {
        Self::CommandFailed {
            command,
            error,
            timestamp: Utc::now(),
        }
    }

    pub fn shutdown_requested<S: Into<String>>(reason: S) -> Self {
        Self::ShutdownRequested {
            reason: reason.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn component_failed<S: Into<String>>(component: S, error: String) -> Self {
        Self::ComponentFailed {
            component: component.into(),
            error,
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            SentryNotification::Reloaded { timestamp, .. }
            | SentryNotification::OutOfAmmo { timestamp }
            | SentryNotification::ShotFired { timestamp, .. }
            | SentryNotification::SentryModeChanged { timestamp, .. }
            | SentryNotification::CommandFailed { timestamp, .. }
            | SentryNotification::ShutdownRequested { timestamp, .. }
            | SentryNotification::ComponentFailed { timestamp, .. } => *timestamp,
        }
    }

    /// Get a human-readable description of the notification
    pub fn description(&self) -> String {
        match self {
            SentryNotification::Reloaded {
                remaining_shots, ..
            } => format!("Reloaded, {} shots ready", remaining_shots),
            SentryNotification::OutOfAmmo { .. } => "Out of ammo".to_string(),
            SentryNotification::ShotFired {
                remaining_shots, ..
            } => format!("Shot fired, {} remaining", remaining_shots),
            SentryNotification::SentryModeChanged { from, to, .. } => {
                format!("Sentry mode {:?} -> {:?}", from, to)
            }
            SentryNotification::CommandFailed { command, error, .. } => {
                format!("Command {} failed: {}", command, error)
            }
            SentryNotification::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
            SentryNotification::ComponentFailed {
                component, error, ..
            } => format!("Component {} failed: {}", component, error),
        }
    }

    /// Get the notification type as a string for filtering
    pub fn notification_type(&self) -> &'static str {
        match self {
            SentryNotification::Reloaded { .. } => "reloaded",
            SentryNotification::OutOfAmmo { .. } => "out_of_ammo",
            SentryNotification::ShotFired { .. } => "shot_fired",
            SentryNotification::SentryModeChanged { .. } => "sentry_mode_changed",
            SentryNotification::CommandFailed { .. } => "command_failed",
            SentryNotification::ShutdownRequested { .. } => "shutdown_requested",
            SentryNotification::ComponentFailed { .. } => "component_failed",
        }
    }
}

/// Fire-and-forget broadcast channel for notifications.
///
/// Publishing never blocks and never fails because nobody is listening, so
/// the core can publish while holding its state lock.
#[derive(Clone)]
pub struct FeedbackBus {
    sender: broadcast::Sender<SentryNotification>,
}

impl FeedbackBus {
    /// Create a new bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to notifications and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<SentryNotification> {
        self.sender.subscribe()
    }

    /// Publish a notification, returning how many subscribers saw it
    pub fn publish(&self, notification: SentryNotification) -> usize {
        debug!("Publishing notification: {}", notification.description());
        // Err only means there are no receivers right now
        self.sender.send(notification).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for FeedbackBus {
    fn default() -> Self {
        Self::new(64)
    }
}

/// Notification filter for selective handling
#[derive(Debug, Clone)]
pub enum NotificationFilter {
    All,
    Types(Vec<&'static str>),
}

impl NotificationFilter {
    pub fn matches(&self, notification: &SentryNotification) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::Types(types) => types.contains(&notification.notification_type()),
        }
    }
}

/// Receiver that skips notifications rejected by its filter
pub struct NotificationReceiver {
    receiver: broadcast::Receiver<SentryNotification>,
    filter: NotificationFilter,
    name: String,
}

impl NotificationReceiver {
    pub fn new(
        receiver: broadcast::Receiver<SentryNotification>,
        filter: NotificationFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next matching notification.
    ///
    /// A lagged receiver logs the gap and keeps going; notifications are
    /// best-effort.
    pub async fn recv(&mut self) -> Result<SentryNotification, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(notification) => {
                    if self.filter.matches(&notification) {
                        return Ok(notification);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} notifications", self.name, n);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Feedback bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive a matching notification without blocking
    pub fn try_recv(&mut self) -> Result<Option<SentryNotification>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(notification) => {
                    if self.filter.matches(&notification) {
                        return Ok(Some(notification));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} notifications", self.name, n);
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }
}

/// Consumer of feedback notifications (audio, logging, telemetry)
#[async_trait::async_trait]
pub trait FeedbackHandler: Send {
    async fn handle(&mut self, notification: SentryNotification) -> Result<(), EventBusError>;

    fn handler_name(&self) -> &str;

    fn filter(&self) -> NotificationFilter {
        NotificationFilter::All
    }
}

/// Writes every notification to the log
pub struct LoggingHandler {
    name: String,
}

impl LoggingHandler {
    pub fn new(name: String) -> Self {
        Self { name }
    }
}

#[async_trait::async_trait]
impl FeedbackHandler for LoggingHandler {
    async fn handle(&mut self, notification: SentryNotification) -> Result<(), EventBusError> {
        match &notification {
            SentryNotification::OutOfAmmo { .. } | SentryNotification::CommandFailed { .. } => {
                warn!("[{}] {}", self.name, notification.description());
            }
            SentryNotification::ComponentFailed { .. } => {
                error!("[{}] {}", self.name, notification.description());
            }
            _ => info!("[{}] {}", self.name, notification.description()),
        }
        Ok(())
    }

    fn handler_name(&self) -> &str {
        &self.name
    }
}

/// Drive a handler from the bus until cancelled or the bus closes
pub fn spawn_handler<H>(
    bus: &FeedbackBus,
    mut handler: H,
    cancellation_token: CancellationToken,
) -> JoinHandle<()>
where
    H: FeedbackHandler + 'static,
{
    let mut receiver = NotificationReceiver::new(
        bus.subscribe(),
        handler.filter(),
        handler.handler_name().to_string(),
    );

    tokio::spawn(async move {
        loop {
            let notification = tokio::select! {
                _ = cancellation_token.cancelled() => break,
                received = receiver.recv() => match received {
                    Ok(notification) => notification,
                    Err(_) => break,
                },
            };
            if let Err(e) = handler.handle(notification).await {
                warn!("Feedback handler '{}' failed: {}", handler.handler_name(), e);
            }
        }
        debug!("Feedback handler '{}' stopped", handler.handler_name());
    })
}
