use std::cell::RefCell;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use gamekit::{
    Definition, Game, GameError, LanguageAware, SaveFile, Saveable, StartHook, Startable,
};
use serde::{Deserialize, Serialize};
use tracing::info;

const DEFAULT_BOARD_SIZE: u32 = 8;

/// Game-specific fields read from the definition file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DemoDefinition {
    #[serde(default)]
    title: Option<String>,
    #[serde(default = "default_board_size")]
    board_size: u32,
}

fn default_board_size() -> u32 {
    DEFAULT_BOARD_SIZE
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct DemoSave {
    sessions_played: u32,
    last_locale: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct DemoState {
    pub(crate) title: Option<String>,
    pub(crate) board_size: u32,
    pub(crate) locale: Option<String>,
    pub(crate) content_folder: Option<PathBuf>,
    pub(crate) sessions_played: u32,
}

/// Minimal game exercising every lifecycle capability.
pub(crate) struct DemoGame {
    save_file: SaveFile<DemoSave>,
    state: RefCell<DemoState>,
}

impl DemoGame {
    pub(crate) fn new() -> Self {
        Self {
            save_file: SaveFile::new("demo_game.json"),
            state: RefCell::new(DemoState {
                board_size: DEFAULT_BOARD_SIZE,
                ..DemoState::default()
            }),
        }
    }

    pub(crate) fn state(&self) -> DemoState {
        self.state.borrow().clone()
    }
}

impl Game for DemoGame {
    fn name(&self) -> &str {
        "demo"
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        Some(self)
    }

    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        Some(self)
    }

    fn as_saveable(&self) -> Option<&dyn Saveable> {
        Some(self)
    }
}

#[async_trait(?Send)]
impl Startable for DemoGame {
    async fn start_game(
        &self,
        content_folder: &Path,
        definition: Option<&Definition>,
    ) -> Result<(), GameError> {
        let parsed = match definition {
            Some(definition) => definition
                .decode::<DemoDefinition>()
                .map_err(|error| GameError::Failed(format!("invalid demo definition: {error}")))?,
            None => DemoDefinition {
                title: None,
                board_size: DEFAULT_BOARD_SIZE,
            },
        };
        if parsed.board_size == 0 {
            return Err(GameError::Failed("board size must be positive".to_string()));
        }

        let mut state = self.state.borrow_mut();
        state.title = parsed.title;
        state.board_size = parsed.board_size;
        state.content_folder = Some(content_folder.to_path_buf());
        state.sessions_played += 1;
        info!(
            title = ?state.title,
            board_size = state.board_size,
            sessions_played = state.sessions_played,
            "demo_game_started"
        );
        Ok(())
    }
}

#[async_trait(?Send)]
impl LanguageAware for DemoGame {
    async fn set_language(&self, locale: &str) -> Result<(), GameError> {
        self.state.borrow_mut().locale = Some(locale.to_string());
        info!(locale, "demo_game_language_set");
        Ok(())
    }
}

#[async_trait(?Send)]
impl Saveable for DemoGame {
    async fn save(&self, save_folder: &Path) -> Result<(), GameError> {
        let save = {
            let state = self.state.borrow();
            DemoSave {
                sessions_played: state.sessions_played,
                last_locale: state.locale.clone(),
            }
        };
        let path = self.save_file.write(save_folder, &save)?;
        info!(path = %path.display(), "demo_game_saved");
        Ok(())
    }

    async fn load(&self, save_folder: &Path) -> Result<(), GameError> {
        let Some(save) = self.save_file.read(save_folder)? else {
            info!(folder = %save_folder.display(), "demo_game_save_missing");
            return Ok(());
        };
        let mut state = self.state.borrow_mut();
        state.sessions_played = save.sessions_played;
        if state.locale.is_none() {
            state.locale = save.last_locale;
        }
        info!(sessions_played = state.sessions_played, "demo_game_save_loaded");
        Ok(())
    }
}

/// Logs each start so simulation runs show which content and save folder
/// a session was built from.
pub(crate) struct AnnounceStart;

#[async_trait(?Send)]
impl StartHook for AnnounceStart {
    async fn on_start_game(
        &self,
        content_folder: &Path,
        definition: Option<&Definition>,
        save_data_folder: Option<&Path>,
    ) -> Result<(), GameError> {
        info!(
            content_folder = %content_folder.display(),
            has_definition = definition.is_some(),
            save_data_folder = ?save_data_folder,
            "start_game_requested"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn start_reads_game_fields_from_definition() {
        let game = DemoGame::new();
        let definition = Definition::from_value(json!({"title": "Tiles", "boardSize": 5}));

        block_on(game.start_game(Path::new("games/tiles"), Some(&definition))).expect("start");

        let state = game.state();
        assert_eq!(state.title.as_deref(), Some("Tiles"));
        assert_eq!(state.board_size, 5);
        assert_eq!(state.sessions_played, 1);
    }

    #[test]
    fn zero_board_size_fails_start() {
        let game = DemoGame::new();
        let definition = Definition::from_value(json!({"boardSize": 0}));

        let error =
            block_on(game.start_game(Path::new("games/tiles"), Some(&definition))).expect_err("zero");
        assert!(matches!(error, GameError::Failed(_)));
    }

    #[test]
    fn save_then_load_restores_progress() {
        let dir = TempDir::new().expect("temp dir");
        let first = DemoGame::new();
        block_on(first.set_language("de")).expect("language");
        block_on(first.start_game(Path::new("games/tiles"), None)).expect("start");
        block_on(first.save(dir.path())).expect("save");

        let second = DemoGame::new();
        block_on(second.load(dir.path())).expect("load");

        let state = second.state();
        assert_eq!(state.sessions_played, 1);
        assert_eq!(state.locale.as_deref(), Some("de"));
    }

    #[test]
    fn loading_without_save_keeps_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let game = DemoGame::new();
        block_on(game.load(dir.path())).expect("load");
        assert_eq!(game.state().sessions_played, 0);
    }
}
