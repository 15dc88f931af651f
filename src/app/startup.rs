use super::{ComponentState, SentryOrchestrator};
use crate::error::Result;
use crate::feedback::{self, LoggingHandler, SentryNotification};
use crate::vision::FaceFeed;
use std::sync::Arc;
use tracing::{error, info};

impl SentryOrchestrator {
    /// Register every component this configuration will run
    pub async fn initialize(&mut self) -> Result<()> {
        info!("Initializing sentry components");

        let mut states = self.component_states.lock().await;
        states.insert("core".to_string(), ComponentState::Stopped);
        states.insert("feedback".to_string(), ComponentState::Stopped);

        if self.config.vision.source.is_some() {
            states.insert("vision".to_string(), ComponentState::Stopped);
        }

        if self.keyboard_enabled {
            states.insert("keyboard".to_string(), ComponentState::Stopped);
        }

        #[cfg(all(feature = "gamepad", target_os = "linux"))]
        {
            if self.gamepad_handler.is_some() {
                states.insert("gamepad".to_string(), ComponentState::Stopped);
            }
        }

        drop(states);

        info!("All components initialized successfully");
        Ok(())
    }

    /// Start the core workers, then the adapters that feed them
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting sentry");

        self.set_component_state("feedback", ComponentState::Starting)
            .await;
        self.feedback_task = Some(feedback::spawn_handler(
            &self.feedback,
            LoggingHandler::new("feedback".to_string()),
            self.cancellation_token.clone(),
        ));
        self.set_component_state("feedback", ComponentState::Running)
            .await;

        self.set_component_state("core", ComponentState::Starting)
            .await;
        match self.core.spawn_workers() {
            Ok(workers) => self.workers = Some(workers),
            Err(e) => {
                error!("Failed to start core workers: {}", e);
                self.set_component_state("core", ComponentState::Failed)
                    .await;
                return Err(e);
            }
        }
        self.set_component_state("core", ComponentState::Running)
            .await;

        if let Some(source) = self.config.vision.source.clone() {
            self.start_vision(&source).await?;
        }

        if self.keyboard_enabled {
            if let Some(keyboard_handler) = &self.keyboard_handler {
                self.set_component_state("keyboard", ComponentState::Starting)
                    .await;

                keyboard_handler.start().await.map_err(|e| {
                    error!("Failed to start keyboard handler: {}", e);
                    e
                })?;

                self.set_component_state("keyboard", ComponentState::Running)
                    .await;
            }
        }

        #[cfg(all(feature = "gamepad", target_os = "linux"))]
        {
            if let Some(gamepad_handler) = &self.gamepad_handler {
                self.set_component_state("gamepad", ComponentState::Starting)
                    .await;

                gamepad_handler.start().await.map_err(|e| {
                    error!("Failed to start gamepad handler: {}", e);
                    e
                })?;

                self.set_component_state("gamepad", ComponentState::Running)
                    .await;
            }
        }

        info!("Sentry started successfully");
        Ok(())
    }

    async fn start_vision(&mut self, source: &str) -> Result<()> {
        self.set_component_state("vision", ComponentState::Starting)
            .await;

        let feed = match FaceFeed::open(source, self.config.vision.max_faces) {
            Ok(feed) => feed,
            Err(e) => {
                error!("Failed to open face feed {}: {}", source, e);
                self.set_component_state("vision", ComponentState::Failed)
                    .await;
                return Err(e);
            }
        };

        // Running before the reader exists, so an early failure is not overwritten
        self.set_component_state("vision", ComponentState::Running)
            .await;

        let core = self.core.clone();
        let feedback = self.feedback.clone();
        let component_states = Arc::clone(&self.component_states);
        let cancellation_token = self.cancellation_token.clone();
        self.vision_task = Some(tokio::task::spawn_blocking(move || {
            match feed.run(&core, &cancellation_token) {
                Ok(count) => info!("Face feed finished after {} events", count),
                Err(e) => {
                    error!("Face feed stopped: {}", e);
                    component_states
                        .blocking_lock()
                        .insert("vision".to_string(), ComponentState::Failed);
                    feedback.publish(SentryNotification::component_failed("vision", e.to_string()));
                }
            }
        }));

        Ok(())
    }
}
