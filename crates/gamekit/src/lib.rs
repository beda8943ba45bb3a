pub mod content;
pub mod game;
pub mod host;
pub mod orchestrator;
pub mod settings;
pub mod simulation;

pub use content::{
    load_content_scenes, load_definition, normalize_content_folder, read_bundle_pack,
    write_bundle_pack, BundleCapability, BundleError, BundleLoader, BundlePackError,
    ContentBundle, ContentError, Definition, PackBundleLoader, PackedBundle, SaveFile,
    SaveFileError, SceneCapability, SceneDirector, SceneError, SceneLoadMode, SceneStack,
    BUNDLE_PACK_FORMAT_VERSION,
};
pub use game::{Game, GameError, GameRegistry, LanguageAware, Saveable, StartHook, Startable};
pub use host::{host_channel, HostChannelClosed, HostCommand, HostInbox, HostSender, NativeApi};
pub use orchestrator::{
    CommandOutcome, ContentOrchestrator, ContentRuntime, HostCommandError, LifecycleError,
    LifecycleState, NativeApiAlreadyInitialized, OrchestratorWiring, ProvisionError,
};
pub use settings::{load_settings, OrchestratorSettings, SettingsError};
pub use simulation::{
    HostEvent, JsonFilePreferences, MemoryPreferences, PreferenceError, PreferenceStore,
    SessionEvent, SimulationDriver, SimulationError, SimulationHost, SimulationOptions,
    SimulationSession, AUTO_SIMULATE_PREF_KEY, CONTENT_FOLDER_PREF_KEY,
};
