use super::{SentryOrchestrator, ShutdownReason};
use crate::error::{Result, SentryError};
use crate::feedback::{NotificationFilter, NotificationReceiver, SentryNotification};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

type SharedSender = Arc<Mutex<Option<oneshot::Sender<ShutdownReason>>>>;

impl SentryOrchestrator {
    /// Run until a signal or a shutdown request arrives, then shut down
    pub async fn run(&mut self) -> Result<i32> {
        info!("Sentry is running");

        let shutdown_sender = self
            .shutdown_sender
            .take()
            .ok_or_else(|| SentryError::system("Shutdown sender already taken"))?;

        let shutdown_receiver = self
            .shutdown_receiver
            .take()
            .ok_or_else(|| SentryError::system("Shutdown receiver already taken"))?;

        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));
        self.setup_signal_handlers(&shutdown_sender);
        self.watch_shutdown_requests(&shutdown_sender);

        // A producer that failed before the watcher subscribed is only visible in its state
        let failed = self.failed_components().await;
        if !failed.is_empty() {
            send_reason(
                &shutdown_sender,
                ShutdownReason::Error(format!("{} failed", failed.join(", "))),
            )
            .await;
        }

        let shutdown_reason = shutdown_receiver
            .await
            .map_err(|_| SentryError::system("Shutdown channel closed unexpectedly"))?;

        info!("Shutdown initiated: {}", shutdown_reason);

        let exit_code = self.shutdown().await?.max(shutdown_reason.exit_code());

        info!("Sentry shutdown complete");
        Ok(exit_code)
    }

    fn setup_signal_handlers(&self, shutdown_sender: &SharedSender) {
        // SIGTERM (systemd stop) - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            error!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };
                if sigterm.recv().await.is_some() {
                    info!("Received SIGTERM signal");
                    send_reason(&shutdown_sender_sigterm, ShutdownReason::Signal("SIGTERM".to_string()))
                        .await;
                }
            });
        }

        let shutdown_sender_sigint = Arc::clone(shutdown_sender);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                send_reason(&shutdown_sender_sigint, ShutdownReason::Signal("SIGINT".to_string()))
                    .await;
            }
        });
    }

    /// Input adapters ask for shutdown, and failed producers report, through the feedback bus
    fn watch_shutdown_requests(&self, shutdown_sender: &SharedSender) {
        let mut receiver = NotificationReceiver::new(
            self.feedback.subscribe(),
            NotificationFilter::Types(vec!["shutdown_requested", "component_failed"]),
            "shutdown-watch".to_string(),
        );
        let shutdown_sender = Arc::clone(shutdown_sender);

        tokio::spawn(async move {
            let reason = match receiver.recv().await {
                Ok(SentryNotification::ShutdownRequested { reason, .. }) => {
                    info!("Shutdown requested: {}", reason);
                    ShutdownReason::UserRequest(reason)
                }
                Ok(SentryNotification::ComponentFailed {
                    component, error, ..
                }) => {
                    error!("Component {} failed, shutting down", component);
                    ShutdownReason::Error(format!("{}: {}", component, error))
                }
                Ok(_) | Err(_) => return,
            };
            send_reason(&shutdown_sender, reason).await;
        });
    }
}

async fn send_reason(shutdown_sender: &SharedSender, reason: ShutdownReason) {
    if let Some(sender) = shutdown_sender.lock().await.take() {
        let _ = sender.send(reason);
    }
}
