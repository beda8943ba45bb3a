use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, error, info, warn};

use crate::content::{
    load_content_scenes, load_definition, normalize_content_folder, BundleCapability,
    BundleLoader, ContentBundle, Definition, SceneDirector, SceneError, SceneLoadMode,
};
use crate::game::{Game, GameRegistry, StartHook};
use crate::host::NativeApi;
use crate::settings::OrchestratorSettings;

use super::error::{LifecycleError, NativeApiAlreadyInitialized, ProvisionError};
use super::state::LifecycleState;

pub struct OrchestratorWiring {
    pub settings: OrchestratorSettings,
    pub bundle_loader: Rc<dyn BundleLoader>,
    pub scene_director: Rc<dyn SceneDirector>,
    pub games: GameRegistry,
    pub start_hook: Option<Rc<dyn StartHook>>,
}

/// Sequences content provisioning and owns everything it provisions: the
/// resident bundle, the located game and the host binding.
///
/// Cloning yields another handle to the same orchestrator. All handles must
/// stay on the thread that created them; host calls from elsewhere go through
/// [`crate::HostSender`].
#[derive(Clone)]
pub struct ContentOrchestrator {
    shared: Rc<Shared>,
}

struct Shared {
    settings: OrchestratorSettings,
    bundle_loader: Rc<dyn BundleLoader>,
    scene_director: Rc<dyn SceneDirector>,
    games: GameRegistry,
    start_hook: Option<Rc<dyn StartHook>>,
    native_api: RefCell<Option<Rc<dyn NativeApi>>>,
    state: Cell<LifecycleState>,
    language: RefCell<Option<String>>,
    save_data_folder: RefCell<Option<PathBuf>>,
    content_folder: RefCell<Option<PathBuf>>,
    loaded_bundle: RefCell<Option<Box<dyn ContentBundle>>>,
    active_game: RefCell<Option<Rc<dyn Game>>>,
}

impl ContentOrchestrator {
    pub fn new(wiring: OrchestratorWiring) -> Self {
        Self {
            shared: Rc::new(Shared {
                settings: wiring.settings,
                bundle_loader: wiring.bundle_loader,
                scene_director: wiring.scene_director,
                games: wiring.games,
                start_hook: wiring.start_hook,
                native_api: RefCell::new(None),
                state: Cell::new(LifecycleState::Idle),
                language: RefCell::new(None),
                save_data_folder: RefCell::new(None),
                content_folder: RefCell::new(None),
                loaded_bundle: RefCell::new(None),
                active_game: RefCell::new(None),
            }),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.shared.settings
    }

    pub fn state(&self) -> LifecycleState {
        self.shared.state.get()
    }

    /// Normalized folder of the content provisioned last, if any.
    pub fn content_folder(&self) -> Option<PathBuf> {
        self.shared.content_folder.borrow().clone()
    }

    pub fn language(&self) -> Option<String> {
        self.shared.language.borrow().clone()
    }

    pub fn save_data_folder(&self) -> Option<PathBuf> {
        self.shared.save_data_folder.borrow().clone()
    }

    pub fn is_bundle_resident(&self) -> bool {
        self.shared.loaded_bundle.borrow().is_some()
    }

    pub fn has_native_api(&self) -> bool {
        self.shared.native_api.borrow().is_some()
    }

    /// Binds the host. Only the first binding is accepted; it is then told
    /// its identifier via [`NativeApi::initialize_api`].
    pub fn set_native_api(&self, api: Rc<dyn NativeApi>) -> Result<(), NativeApiAlreadyInitialized> {
        {
            let mut slot = self.shared.native_api.borrow_mut();
            if slot.is_some() {
                error!("native_api_already_initialized");
                return Err(NativeApiAlreadyInitialized);
            }
            *slot = Some(api.clone());
        }
        info!(
            identifier = %self.shared.settings.host_identifier,
            "native_api_bound"
        );
        api.initialize_api(&self.shared.settings.host_identifier);
        Ok(())
    }

    /// Runs the whole provisioning pipeline for `content_folder`.
    ///
    /// Every call ends in exactly one of `on_loading_succeeded` /
    /// `on_loading_failed` on the host, including calls rejected because
    /// another run is in flight or content is already running.
    pub async fn provision_content(
        &self,
        content_folder: impl Into<PathBuf>,
    ) -> Result<(), ProvisionError> {
        let requested = content_folder.into();
        let report = LoadingReport::new(self.native_api());
        let state = self.state();
        if state != LifecycleState::Idle {
            warn!(
                requested = %requested.display(),
                state = ?state,
                "provision_rejected"
            );
            report.failed();
            return Err(ProvisionError::Rejected { state });
        }

        info!(requested = %requested.display(), "provision_started");
        match self.run_pipeline(&requested, &report).await {
            Ok(()) => {
                self.transition(LifecycleState::Running);
                report.succeeded();
                Ok(())
            }
            Err(error) => {
                error!(
                    requested = %requested.display(),
                    failed_state = ?self.state(),
                    error = %error,
                    "content_loading_failed"
                );
                self.transition(LifecycleState::Failed);
                self.roll_back_partial_load().await;
                self.shared.content_folder.borrow_mut().take();
                report.failed();
                self.transition(LifecycleState::Idle);
                Err(error)
            }
        }
    }

    async fn run_pipeline(
        &self,
        requested: &Path,
        report: &LoadingReport,
    ) -> Result<(), ProvisionError> {
        let settings = &self.shared.settings;

        self.transition(LifecycleState::NormalizingPath);
        let folder = normalize_content_folder(requested, &settings.ignorable_system_files)?;
        *self.shared.content_folder.borrow_mut() = Some(folder.clone());

        self.transition(LifecycleState::LoadingDefinition);
        let definition = if settings.use_definition_file {
            Some(load_definition(&folder, &settings.definition_file_name)?)
        } else {
            debug!("definition_file_disabled");
            None
        };

        if let Some(capability) = definition.as_ref().and_then(Definition::bundle) {
            self.transition(LifecycleState::LoadingBundle);
            let bundle_scenes = self.load_bundle(&folder, capability, report).await?;

            self.transition(LifecycleState::LoadingScenes);
            load_content_scenes(
                self.shared.scene_director.as_ref(),
                definition.as_ref().and_then(Definition::scene),
                &bundle_scenes,
            )
            .await?;
        }

        self.transition(LifecycleState::StartingGame);
        self.start_game(&folder, definition.as_ref()).await
    }

    async fn load_bundle(
        &self,
        folder: &Path,
        capability: &BundleCapability,
        report: &LoadingReport,
    ) -> Result<Vec<String>, ProvisionError> {
        if self.is_bundle_resident() {
            return Err(ProvisionError::BundleAlreadyResident);
        }
        let path = folder.join(&capability.bundle_file_name);
        let bundle = match self.shared.bundle_loader.load_bundle(&path).await {
            Ok(bundle) => bundle,
            Err(error) => {
                // The host must hear about this before the error unwinds.
                report.failed();
                return Err(error.into());
            }
        };
        let scene_names = bundle.scene_names();
        info!(
            bundle = bundle.name(),
            scene_count = scene_names.len(),
            "bundle_resident"
        );
        *self.shared.loaded_bundle.borrow_mut() = Some(bundle);
        Ok(scene_names)
    }

    async fn start_game(
        &self,
        folder: &Path,
        definition: Option<&Definition>,
    ) -> Result<(), ProvisionError> {
        let save_folder = self.save_data_folder();
        if let Some(hook) = &self.shared.start_hook {
            hook.on_start_game(folder, definition, save_folder.as_deref())
                .await
                .map_err(ProvisionError::StartHook)?;
        }

        let game = self
            .shared
            .games
            .active()
            .ok_or(ProvisionError::NoActiveGame)?;
        *self.shared.active_game.borrow_mut() = Some(game.clone());
        info!(game = game.name(), "game_located");

        if let (Some(saveable), Some(save_folder)) = (game.as_saveable(), save_folder.as_deref()) {
            saveable
                .load(save_folder)
                .await
                .map_err(|source| ProvisionError::Game {
                    step: "load",
                    source,
                })?;
        }
        let language = self.language();
        if let (Some(aware), Some(locale)) = (game.as_language_aware(), language.as_deref()) {
            aware
                .set_language(locale)
                .await
                .map_err(|source| ProvisionError::Game {
                    step: "set_language",
                    source,
                })?;
        }
        match game.as_startable() {
            Some(startable) => startable
                .start_game(folder, definition)
                .await
                .map_err(|source| ProvisionError::Game {
                    step: "start_game",
                    source,
                })?,
            None => debug!(game = game.name(), "game_not_startable"),
        }
        Ok(())
    }

    async fn roll_back_partial_load(&self) {
        self.shared.active_game.borrow_mut().take();
        if !self.is_bundle_resident() {
            return;
        }
        let start_scene = &self.shared.settings.start_scene_name;
        if let Err(error) = self
            .shared
            .scene_director
            .load_scene(start_scene, SceneLoadMode::Single)
            .await
        {
            warn!(
                scene = %start_scene,
                error = %error,
                "rollback_scene_switch_failed"
            );
        }
        self.release_bundle();
    }

    pub async fn set_language(&self, locale: &str) -> Result<(), LifecycleError> {
        *self.shared.language.borrow_mut() = Some(locale.to_string());
        info!(locale, "content_language_set");
        let Some(game) = self.locate_game() else {
            debug!(locale, "language_stored_without_game");
            return Ok(());
        };
        if let Some(aware) = game.as_language_aware() {
            aware.set_language(locale).await?;
        }
        Ok(())
    }

    /// Stores the save folder and immediately loads from it if a game exists.
    pub async fn set_save_data_folder(
        &self,
        folder: impl Into<PathBuf>,
    ) -> Result<(), LifecycleError> {
        let folder = folder.into();
        *self.shared.save_data_folder.borrow_mut() = Some(folder.clone());
        info!(folder = %folder.display(), "save_data_folder_set");
        let Some(game) = self.locate_game() else {
            return Ok(());
        };
        if let Some(saveable) = game.as_saveable() {
            saveable.load(&folder).await?;
        }
        Ok(())
    }

    pub async fn persist_save_data(&self, folder: impl Into<PathBuf>) -> Result<(), LifecycleError> {
        let folder = folder.into();
        let Some(game) = self.locate_game() else {
            warn!(folder = %folder.display(), "persist_save_data_without_game");
            return Err(LifecycleError::NoActiveGame);
        };
        match game.as_saveable() {
            Some(saveable) => saveable.save(&folder).await?,
            None => debug!(game = game.name(), "game_not_saveable"),
        }
        info!(game = game.name(), folder = %folder.display(), "save_data_written");
        self.notify_host("on_save_data_written", |api| api.on_save_data_written());
        Ok(())
    }

    /// Returns to the start scene, then releases the bundle and unused
    /// resources. The scene switch always completes before the bundle goes.
    pub async fn unload_content(&self) -> Result<(), LifecycleError> {
        let state = self.state();
        if state.is_in_flight() || state == LifecycleState::Failed {
            warn!(state = ?state, "unload_rejected");
            return Err(LifecycleError::Rejected {
                operation: "unload_content",
                state,
            });
        }

        self.transition(LifecycleState::Unloading);
        let result = self.tear_down().await;
        self.shared.active_game.borrow_mut().take();
        self.shared.content_folder.borrow_mut().take();
        if let Err(error) = result {
            error!(error = %error, "content_unloading_failed");
            self.transition(LifecycleState::Failed);
            self.release_bundle();
            self.transition(LifecycleState::Idle);
            return Err(error.into());
        }

        self.transition(LifecycleState::Idle);
        self.notify_host("on_unloading_succeeded", |api| api.on_unloading_succeeded());
        Ok(())
    }

    async fn tear_down(&self) -> Result<(), SceneError> {
        let director = &self.shared.scene_director;
        director
            .load_scene(&self.shared.settings.start_scene_name, SceneLoadMode::Single)
            .await?;
        self.release_bundle();
        director.release_unused_resources().await
    }

    fn release_bundle(&self) {
        let bundle = self.shared.loaded_bundle.borrow_mut().take();
        if let Some(bundle) = bundle {
            info!(bundle = bundle.name(), "bundle_release_requested");
            bundle.release();
        }
    }

    fn locate_game(&self) -> Option<Rc<dyn Game>> {
        let pinned = self.shared.active_game.borrow().clone();
        pinned.or_else(|| self.shared.games.active())
    }

    fn native_api(&self) -> Option<Rc<dyn NativeApi>> {
        self.shared.native_api.borrow().clone()
    }

    fn notify_host(&self, callback: &'static str, call: impl FnOnce(&dyn NativeApi)) {
        match self.native_api() {
            Some(api) => {
                debug!(callback, "host_notified");
                call(api.as_ref());
            }
            None => warn!(callback, "native_api_missing"),
        }
    }

    fn transition(&self, next: LifecycleState) {
        let current = self.shared.state.get();
        if current.can_transition_to(next) {
            info!(from = ?current, to = ?next, "lifecycle_transition");
        } else {
            warn!(from = ?current, to = ?next, "lifecycle_transition_unexpected");
        }
        self.shared.state.set(next);
    }
}

/// Guarantees a provisioning attempt reports to the host at most once, so an
/// early failure notification is never followed by a second one.
struct LoadingReport {
    api: Option<Rc<dyn NativeApi>>,
    reported: Cell<bool>,
}

impl LoadingReport {
    fn new(api: Option<Rc<dyn NativeApi>>) -> Self {
        Self {
            api,
            reported: Cell::new(false),
        }
    }

    fn succeeded(&self) {
        if self.reported.replace(true) {
            return;
        }
        match &self.api {
            Some(api) => {
                info!("host_notified_loading_succeeded");
                api.on_loading_succeeded();
            }
            None => warn!(callback = "on_loading_succeeded", "native_api_missing"),
        }
    }

    fn failed(&self) {
        if self.reported.replace(true) {
            return;
        }
        match &self.api {
            Some(api) => {
                info!("host_notified_loading_failed");
                api.on_loading_failed();
            }
            None => warn!(callback = "on_loading_failed", "native_api_missing"),
        }
    }
}
