mod orchestrator;
mod runtime;
mod shutdown;
mod startup;
mod state;
mod types;


pub use orchestrator::SentryOrchestrator;
pub use types::{ComponentState, ShutdownReason};
