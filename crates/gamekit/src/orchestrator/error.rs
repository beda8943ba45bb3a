use thiserror::Error;

use crate::content::{BundleError, ContentError, SceneError};
use crate::game::GameError;

use super::state::LifecycleState;

/// Raised when a second native API is bound to the same orchestrator.
/// This is a setup bug and is never handled by the pipeline.
#[derive(Debug, Error)]
#[error("native API has been assigned already; reassigning is not supported")]
pub struct NativeApiAlreadyInitialized;

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("content provisioning rejected while orchestrator is {state:?}")]
    Rejected { state: LifecycleState },
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Bundle(#[from] BundleError),
    #[error("a bundle is already resident; unload content before provisioning again")]
    BundleAlreadyResident,
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("no game instance is registered")]
    NoActiveGame,
    #[error("start hook failed: {0}")]
    StartHook(#[source] GameError),
    #[error("game failed during {step}: {source}")]
    Game {
        step: &'static str,
        #[source]
        source: GameError,
    },
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("{operation} rejected while orchestrator is {state:?}")]
    Rejected {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("no game instance is registered")]
    NoActiveGame,
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Scene(#[from] SceneError),
}
