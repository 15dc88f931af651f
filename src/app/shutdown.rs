use super::{ComponentState, SentryOrchestrator};
use crate::error::{Result, SentryError};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{error, info, warn};

/// Long enough for a burst already in progress to finish
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(10);

impl SentryOrchestrator {
    /// Stop the adapters, halt the launcher, and wait for the core workers
    pub async fn shutdown(&mut self) -> Result<i32> {
        info!(
            "Beginning graceful shutdown of {:?}",
            self.active_components().await
        );

        self.cancellation_token.cancel();

        // Stopping a component clears its state, so collect earlier failures first
        let failed = self.failed_components().await;
        let mut exit_code = 0;
        if !failed.is_empty() {
            warn!("Shutting down with failed components: {:?}", failed);
            exit_code = 1;
        }

        // Producers first, so nothing dispatches into a stopped core
        if self.keyboard_enabled {
            if let Err(e) = self.stop_component("keyboard").await {
                error!("Error stopping keyboard: {}", e);
                exit_code = 1;
            }
        }

        #[cfg(all(feature = "gamepad", target_os = "linux"))]
        {
            if self.gamepad_handler.is_some() {
                if let Err(e) = self.stop_component("gamepad").await {
                    error!("Error stopping gamepad: {}", e);
                    exit_code = 1;
                }
            }
        }

        if self.vision_task.is_some() {
            if let Err(e) = self.stop_component("vision").await {
                error!("Error stopping vision: {}", e);
                exit_code = 1;
            }
        }

        if let Err(e) = self.stop_component("core").await {
            error!("Error stopping core: {}", e);
            exit_code = 1;
        }

        if let Err(e) = self.stop_component("feedback").await {
            error!("Error stopping feedback: {}", e);
            exit_code = 1;
        }

        info!("Graceful shutdown completed with exit code: {}", exit_code);
        Ok(exit_code)
    }

    async fn stop_component(&mut self, component: &str) -> Result<()> {
        info!("Stopping {} component", component);
        self.set_component_state(component, ComponentState::Stopping)
            .await;

        let result = match component {
            "keyboard" => match &self.keyboard_handler {
                Some(keyboard_handler) => keyboard_handler.stop().await,
                None => Ok(()),
            },
            #[cfg(all(feature = "gamepad", target_os = "linux"))]
            "gamepad" => match &self.gamepad_handler {
                Some(gamepad_handler) => gamepad_handler.stop().await,
                None => Ok(()),
            },
            "vision" => {
                // A reader blocked on stdin cannot be interrupted; leave it detached
                if let Some(task) = self.vision_task.take() {
                    if !task.is_finished() {
                        warn!("Face feed still blocked on input, detaching it");
                    }
                }
                Ok(())
            }
            "core" => self.stop_core().await,
            "feedback" => {
                if let Some(task) = self.feedback_task.take() {
                    let _ = timeout(Duration::from_secs(1), task).await;
                }
                Ok(())
            }
            _ => Ok(()),
        };

        match &result {
            Ok(()) => {
                self.set_component_state(component, ComponentState::Stopped)
                    .await;
                info!("{} component stopped", component);
            }
            Err(e) => {
                self.set_component_state(component, ComponentState::Failed)
                    .await;
                error!("Error stopping {} component: {}", component, e);
            }
        }
        result
    }

    async fn stop_core(&mut self) -> Result<()> {
        self.core.shutdown();

        let Some(workers) = self.workers.take() else {
            return Ok(());
        };

        let joined = tokio::task::spawn_blocking(move || workers.join());
        match timeout(WORKER_JOIN_TIMEOUT, joined).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(SentryError::component("core".to_string(), e.to_string())),
            Err(_) => Err(SentryError::component(
                "core".to_string(),
                "worker join timeout".to_string(),
            )),
        }
    }
}
