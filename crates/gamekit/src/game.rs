use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::content::{Definition, SaveFileError};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    SaveData(#[from] SaveFileError),
    #[error("{0}")]
    Failed(String),
}

#[async_trait(?Send)]
pub trait Startable {
    /// `definition` is `None` when definition files are disabled.
    async fn start_game(
        &self,
        content_folder: &Path,
        definition: Option<&Definition>,
    ) -> Result<(), GameError>;
}

#[async_trait(?Send)]
pub trait LanguageAware {
    async fn set_language(&self, locale: &str) -> Result<(), GameError>;
}

#[async_trait(?Send)]
pub trait Saveable {
    async fn save(&self, save_folder: &Path) -> Result<(), GameError>;
    async fn load(&self, save_folder: &Path) -> Result<(), GameError>;
}

/// A game declares which lifecycle capabilities it supports; the
/// orchestrator skips the ones it lacks.
pub trait Game {
    fn name(&self) -> &str;

    fn as_startable(&self) -> Option<&dyn Startable> {
        None
    }

    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        None
    }

    fn as_saveable(&self) -> Option<&dyn Saveable> {
        None
    }
}

/// Runs before the game is located, so the composition root can spawn or
/// configure the game for this content.
#[async_trait(?Send)]
pub trait StartHook {
    async fn on_start_game(
        &self,
        content_folder: &Path,
        definition: Option<&Definition>,
        save_data_folder: Option<&Path>,
    ) -> Result<(), GameError>;
}

/// Single-slot lookup the game registers itself with when it is created.
#[derive(Clone, Default)]
pub struct GameRegistry {
    slot: Rc<RefCell<Option<Rc<dyn Game>>>>,
}

impl GameRegistry {
    pub fn register(&self, game: Rc<dyn Game>) {
        let previous = self.slot.borrow_mut().replace(game.clone());
        match previous {
            Some(previous) => warn!(
                replaced = previous.name(),
                game = game.name(),
                "game_registration_replaced"
            ),
            None => info!(game = game.name(), "game_registered"),
        }
    }

    pub fn active(&self) -> Option<Rc<dyn Game>> {
        self.slot.borrow().clone()
    }
}

impl std::fmt::Debug for GameRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameRegistry")
            .field("active", &self.active().map(|game| game.name().to_string()))
            .finish()
    }
}
