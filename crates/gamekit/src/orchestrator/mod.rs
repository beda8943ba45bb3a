mod error;
mod lifecycle;
mod runtime;
mod state;

#[cfg(test)]
mod test_support;

pub use error::{LifecycleError, NativeApiAlreadyInitialized, ProvisionError};
pub use lifecycle::{ContentOrchestrator, OrchestratorWiring};
pub use runtime::{CommandOutcome, ContentRuntime, HostCommandError};
pub use state::LifecycleState;
