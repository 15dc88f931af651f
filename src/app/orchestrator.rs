use super::types::{ComponentState, ShutdownReason};
use crate::command::CommandSink;
use crate::config::SentryConfig;
use crate::core::{Core, CoreSettings, Workers};
use crate::error::Result;
use crate::feedback::FeedbackBus;
#[cfg(all(feature = "gamepad", target_os = "linux"))]
use crate::input::GamepadInputHandler;
use crate::input::KeyboardInputHandler;
use crate::launcher;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Main application coordinator that owns the core and its input adapters
pub struct SentryOrchestrator {
    pub(super) config: SentryConfig,
    pub(super) feedback: FeedbackBus,
    pub(super) core: Core,
    pub(super) workers: Option<Workers>,

    // Components
    pub(super) keyboard_handler: Option<KeyboardInputHandler>,
    pub(super) keyboard_enabled: bool,
    #[cfg(all(feature = "gamepad", target_os = "linux"))]
    pub(super) gamepad_handler: Option<GamepadInputHandler>,
    pub(super) vision_task: Option<JoinHandle<()>>,
    pub(super) feedback_task: Option<JoinHandle<()>>,

    // Lifecycle management
    pub(super) component_states: Arc<Mutex<HashMap<String, ComponentState>>>,
    pub(super) shutdown_sender: Option<oneshot::Sender<ShutdownReason>>,
    pub(super) shutdown_receiver: Option<oneshot::Receiver<ShutdownReason>>,
    pub(super) cancellation_token: CancellationToken,
}

impl SentryOrchestrator {
    /// Create an orchestrator driving the launcher named in the configuration
    pub async fn new(config: SentryConfig) -> Result<Self> {
        let sink = launcher::create_sink(&config.launcher, false)?;
        Ok(Self::with_sink(config, sink))
    }

    /// Create an orchestrator around an already opened command sink
    pub fn with_sink(config: SentryConfig, sink: Box<dyn CommandSink>) -> Self {
        let feedback = FeedbackBus::new(config.feedback.capacity);
        let core = Core::new(CoreSettings::from(&config), sink, feedback.clone());
        let (shutdown_sender, shutdown_receiver) = oneshot::channel();

        let keyboard_handler = Some(KeyboardInputHandler::new(core.clone(), feedback.clone()));

        #[cfg(all(feature = "gamepad", target_os = "linux"))]
        let gamepad_handler = config
            .input
            .gamepad_device
            .as_ref()
            .map(|device| GamepadInputHandler::new(device.clone(), core.clone()));

        info!(
            "Sentry configured for {}x{} frames, {} shots",
            config.camera.resolution.0, config.camera.resolution.1, config.launcher.max_shots
        );

        Self {
            keyboard_enabled: config.input.keyboard,
            config,
            feedback,
            core,
            workers: None,
            keyboard_handler,
            #[cfg(all(feature = "gamepad", target_os = "linux"))]
            gamepad_handler,
            vision_task: None,
            feedback_task: None,
            component_states: Arc::new(Mutex::new(HashMap::new())),
            shutdown_sender: Some(shutdown_sender),
            shutdown_receiver: Some(shutdown_receiver),
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Enable or disable the keyboard input handler
    pub fn set_keyboard_enabled(&mut self, enabled: bool) {
        self.keyboard_enabled = enabled;
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn feedback(&self) -> &FeedbackBus {
        &self.feedback
    }
}
