use super::{ComponentState, SentryOrchestrator};
use std::collections::HashMap;
use tracing::{debug, warn};

impl SentryOrchestrator {
    pub async fn set_component_state(&self, component: &str, state: ComponentState) {
        let mut states = self.component_states.lock().await;
        let previous = states.insert(component.to_string(), state);
        if state == ComponentState::Failed {
            warn!("Component '{}' failed (was {:?})", component, previous);
        } else {
            debug!("Component '{}': {:?} -> {:?}", component, previous, state);
        }
    }

    pub async fn get_component_state(&self, component: &str) -> Option<ComponentState> {
        self.component_states.lock().await.get(component).copied()
    }

    pub async fn get_all_component_states(&self) -> HashMap<String, ComponentState> {
        self.component_states.lock().await.clone()
    }

    /// Names of components that were started and not yet stopped, sorted
    pub async fn active_components(&self) -> Vec<String> {
        let states = self.component_states.lock().await;
        let mut active: Vec<String> = states
            .iter()
            .filter(|(_, state)| state.is_active())
            .map(|(name, _)| name.clone())
            .collect();
        active.sort();
        active
    }

    /// Names of components in the `Failed` state, sorted
    pub async fn failed_components(&self) -> Vec<String> {
        let states = self.component_states.lock().await;
        let mut failed: Vec<String> = states
            .iter()
            .filter(|(_, state)| **state == ComponentState::Failed)
            .map(|(name, _)| name.clone())
            .collect();
        failed.sort();
        failed
    }
}
