use std::env;
use std::path::PathBuf;

use gamekit::{load_settings, OrchestratorSettings, SettingsError, SimulationOptions};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::loop_runner::LoopConfig;

const SETTINGS_FILE_ENV_VAR: &str = "GAMEKIT_SETTINGS_FILE";
const PREFS_FILE_ENV_VAR: &str = "GAMEKIT_PREFS_FILE";
const CONTENT_FOLDER_ENV_VAR: &str = "GAMEKIT_CONTENT_FOLDER";
const SAVE_FOLDER_ENV_VAR: &str = "GAMEKIT_SAVE_FOLDER";
const LANGUAGE_ENV_VAR: &str = "GAMEKIT_LANGUAGE";
const MAX_FRAMES_ENV_VAR: &str = "GAMEKIT_MAX_FRAMES";
const TARGET_TPS_ENV_VAR: &str = "GAMEKIT_TARGET_TPS";

const DEFAULT_SETTINGS_FILE: &str = "gamekit.settings.json";
const DEFAULT_PREFS_FILE: &str = ".gamekit/simulation.json";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

pub(crate) struct AppWiring {
    pub(crate) settings: OrchestratorSettings,
    pub(crate) loop_config: LoopConfig,
    pub(crate) prefs_file: PathBuf,
    /// Overrides the content folder remembered in preferences.
    pub(crate) content_folder: Option<PathBuf>,
    pub(crate) options: SimulationOptions,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== GameKit Simulation Host ===");

    let settings_file =
        env_path(SETTINGS_FILE_ENV_VAR).unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
    let settings = load_settings(&settings_file)?;
    let defaults = LoopConfig::default();
    let loop_config = LoopConfig {
        target_tps: parse_positive(TARGET_TPS_ENV_VAR, env_value(TARGET_TPS_ENV_VAR))?
            .unwrap_or(defaults.target_tps),
        max_frames: parse_positive(MAX_FRAMES_ENV_VAR, env_value(MAX_FRAMES_ENV_VAR))?
            .unwrap_or(defaults.max_frames),
    };

    let wiring = AppWiring {
        settings,
        loop_config,
        prefs_file: env_path(PREFS_FILE_ENV_VAR)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFS_FILE)),
        content_folder: env_path(CONTENT_FOLDER_ENV_VAR),
        options: SimulationOptions {
            language: env_value(LANGUAGE_ENV_VAR),
            save_data_folder: env_path(SAVE_FOLDER_ENV_VAR),
        },
    };
    info!(
        settings_file = %settings_file.display(),
        prefs_file = %wiring.prefs_file.display(),
        target_tps = wiring.loop_config.target_tps,
        max_frames = wiring.loop_config.max_frames,
        "bootstrap_complete"
    );
    Ok(wiring)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn env_value(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_path(var: &str) -> Option<PathBuf> {
    env_value(var).map(PathBuf::from)
}

fn parse_positive(var: &'static str, raw: Option<String>) -> Result<Option<u32>, BootstrapError> {
    let Some(value) = raw else {
        return Ok(None);
    };
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(Some(parsed)),
        _ => Err(BootstrapError::InvalidNumber { var, value }),
    }
}
