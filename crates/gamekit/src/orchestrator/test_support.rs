use std::cell::{Cell, RefCell};
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::task::{Poll, Waker};

use async_trait::async_trait;
use serde_json::Value;

use crate::content::{
    BundleError, BundleLoader, ContentBundle, Definition, SceneDirector, SceneError,
    SceneLoadMode,
};
use crate::game::{Game, GameError, GameRegistry, LanguageAware, Saveable, StartHook, Startable};
use crate::host::NativeApi;
use crate::settings::OrchestratorSettings;

use super::{ContentOrchestrator, OrchestratorWiring};

/// One ordered log shared by every double, so tests can assert on the
/// interleaving of host, bundle, scene and game calls.
#[derive(Clone, Default)]
pub(super) struct EventLog(Rc<RefCell<Vec<String>>>);

impl EventLog {
    pub(super) fn push(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub(super) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(super) fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.as_str() == entry).count()
    }

    pub(super) fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e.as_str() == entry)
    }

    pub(super) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

fn leaf(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(super) struct RecordingApi {
    pub(super) tag: &'static str,
    pub(super) log: EventLog,
}

impl NativeApi for RecordingApi {
    fn initialize_api(&self, identifier: &str) {
        self.log.push(format!("{}:initialize:{identifier}", self.tag));
    }

    fn on_loading_succeeded(&self) {
        self.log.push(format!("{}:loading_succeeded", self.tag));
    }

    fn on_loading_failed(&self) {
        self.log.push(format!("{}:loading_failed", self.tag));
    }

    fn on_save_data_written(&self) {
        self.log.push(format!("{}:save_data_written", self.tag));
    }

    fn on_unloading_succeeded(&self) {
        self.log.push(format!("{}:unloading_succeeded", self.tag));
    }
}

pub(super) struct RecordingBundles {
    pub(super) log: EventLog,
    pub(super) scenes: Vec<String>,
    pub(super) fail: bool,
}

struct RecordedBundle {
    name: String,
    scenes: Vec<String>,
    log: EventLog,
}

impl ContentBundle for RecordedBundle {
    fn name(&self) -> &str {
        &self.name
    }

    fn scene_names(&self) -> Vec<String> {
        self.scenes.clone()
    }

    fn release(self: Box<Self>) {
        self.log.push(format!("bundle:release:{}", self.name));
    }
}

#[async_trait(?Send)]
impl BundleLoader for RecordingBundles {
    async fn load_bundle(&self, path: &Path) -> Result<Box<dyn ContentBundle>, BundleError> {
        let name = leaf(path);
        self.log.push(format!("bundle:load:{name}"));
        if self.fail {
            return Err(BundleError::LoadFailure {
                path: path.to_path_buf(),
                message: "corrupt".to_string(),
            });
        }
        Ok(Box::new(RecordedBundle {
            name,
            scenes: self.scenes.clone(),
            log: self.log.clone(),
        }))
    }
}

/// Holds scene loads pending until opened.
#[derive(Clone, Default)]
pub(super) struct Gate {
    open: Rc<Cell<bool>>,
    waker: Rc<RefCell<Option<Waker>>>,
}

impl Gate {
    pub(super) fn open(&self) {
        self.open.set(true);
        if let Some(waker) = self.waker.borrow_mut().take() {
            waker.wake();
        }
    }

    fn wait(&self) -> impl Future<Output = ()> + '_ {
        std::future::poll_fn(move |cx| {
            if self.open.get() {
                Poll::Ready(())
            } else {
                *self.waker.borrow_mut() = Some(cx.waker().clone());
                Poll::Pending
            }
        })
    }
}

#[derive(Default)]
pub(super) struct RecordingScenes {
    pub(super) log: EventLog,
    pub(super) fail_on: Option<String>,
    pub(super) gate: Option<Gate>,
}

#[async_trait(?Send)]
impl SceneDirector for RecordingScenes {
    async fn load_scene(&self, scene: &str, mode: SceneLoadMode) -> Result<(), SceneError> {
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        let mode = match mode {
            SceneLoadMode::Single => "single",
            SceneLoadMode::Additive => "additive",
        };
        self.log.push(format!("scene:{mode}:{scene}"));
        if self.fail_on.as_deref() == Some(scene) {
            return Err(SceneError::LoadFailed {
                scene: scene.to_string(),
                message: "missing from build".to_string(),
            });
        }
        Ok(())
    }

    async fn release_unused_resources(&self) -> Result<(), SceneError> {
        self.log.push("scene:release_unused");
        Ok(())
    }
}

pub(super) struct RecordingGame {
    pub(super) log: EventLog,
    pub(super) startable: bool,
    pub(super) fail_start: bool,
    pub(super) fail_load: bool,
    pub(super) fail_language: bool,
}

impl RecordingGame {
    pub(super) fn new(log: &EventLog) -> Self {
        Self {
            log: log.clone(),
            startable: true,
            fail_start: false,
            fail_load: false,
            fail_language: false,
        }
    }
}

impl Game for RecordingGame {
    fn name(&self) -> &str {
        "recording"
    }

    fn as_startable(&self) -> Option<&dyn Startable> {
        self.startable.then_some(self as &dyn Startable)
    }

    fn as_language_aware(&self) -> Option<&dyn LanguageAware> {
        Some(self)
    }

    fn as_saveable(&self) -> Option<&dyn Saveable> {
        Some(self)
    }
}

#[async_trait(?Send)]
impl Startable for RecordingGame {
    async fn start_game(
        &self,
        content_folder: &Path,
        definition: Option<&Definition>,
    ) -> Result<(), GameError> {
        let definition = if definition.is_some() { "definition" } else { "bare" };
        self.log
            .push(format!("game:start:{}:{definition}", leaf(content_folder)));
        if self.fail_start {
            return Err(GameError::Failed("board did not build".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl LanguageAware for RecordingGame {
    async fn set_language(&self, locale: &str) -> Result<(), GameError> {
        self.log.push(format!("game:language:{locale}"));
        if self.fail_language {
            return Err(GameError::Failed(format!("no translations for {locale}")));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Saveable for RecordingGame {
    async fn save(&self, save_folder: &Path) -> Result<(), GameError> {
        self.log.push(format!("game:save:{}", leaf(save_folder)));
        Ok(())
    }

    async fn load(&self, save_folder: &Path) -> Result<(), GameError> {
        self.log.push(format!("game:load:{}", leaf(save_folder)));
        if self.fail_load {
            return Err(GameError::Failed("save slot is corrupt".to_string()));
        }
        Ok(())
    }
}

pub(super) struct RecordingHook {
    pub(super) log: EventLog,
    pub(super) fail: bool,
}

#[async_trait(?Send)]
impl StartHook for RecordingHook {
    async fn on_start_game(
        &self,
        content_folder: &Path,
        _definition: Option<&Definition>,
        save_data_folder: Option<&Path>,
    ) -> Result<(), GameError> {
        let save = save_data_folder.map(leaf).unwrap_or_else(|| "none".to_string());
        self.log
            .push(format!("hook:start:{}:{save}", leaf(content_folder)));
        if self.fail {
            return Err(GameError::Failed("host refused to start".to_string()));
        }
        Ok(())
    }
}

/// Everything a test needs around one orchestrator.
pub(super) struct Fixture {
    pub(super) log: EventLog,
    pub(super) games: GameRegistry,
    pub(super) orchestrator: ContentOrchestrator,
}

pub(super) struct FixtureOptions {
    pub(super) settings: OrchestratorSettings,
    pub(super) bundle_scenes: Vec<String>,
    pub(super) fail_bundle: bool,
    pub(super) fail_scene: Option<String>,
    pub(super) gate: Option<Gate>,
    pub(super) with_hook: bool,
    pub(super) fail_hook: bool,
    pub(super) bind_api: bool,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            settings: OrchestratorSettings::default(),
            bundle_scenes: vec!["A".to_string(), "B".to_string(), "C".to_string()],
            fail_bundle: false,
            fail_scene: None,
            gate: None,
            with_hook: false,
            fail_hook: false,
            bind_api: true,
        }
    }
}

impl Fixture {
    pub(super) fn new(options: FixtureOptions) -> Self {
        let log = EventLog::default();
        let games = GameRegistry::default();
        let start_hook: Option<Rc<dyn StartHook>> = if options.with_hook {
            Some(Rc::new(RecordingHook {
                log: log.clone(),
                fail: options.fail_hook,
            }))
        } else {
            None
        };
        let orchestrator = ContentOrchestrator::new(OrchestratorWiring {
            settings: options.settings,
            bundle_loader: Rc::new(RecordingBundles {
                log: log.clone(),
                scenes: options.bundle_scenes,
                fail: options.fail_bundle,
            }),
            scene_director: Rc::new(RecordingScenes {
                log: log.clone(),
                fail_on: options.fail_scene,
                gate: options.gate,
            }),
            games: games.clone(),
            start_hook,
        });
        if options.bind_api {
            orchestrator
                .set_native_api(Rc::new(RecordingApi {
                    tag: "api",
                    log: log.clone(),
                }))
                .expect("first binding");
        }
        Self {
            log,
            games,
            orchestrator,
        }
    }

    pub(super) fn register_game(&self) {
        self.register(RecordingGame::new(&self.log));
    }

    pub(super) fn register(&self, game: RecordingGame) {
        self.games.register(Rc::new(game));
    }
}

/// Creates `root/content/index.json` holding `definition`.
pub(super) fn write_content(root: &Path, definition: &Value) -> PathBuf {
    let folder = root.join("content");
    fs::create_dir_all(&folder).expect("create content folder");
    fs::write(
        folder.join("index.json"),
        serde_json::to_string(definition).expect("encode definition"),
    )
    .expect("write definition");
    folder
}
