use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// When false the definition step is skipped and games start without one.
    pub use_definition_file: bool,
    pub definition_file_name: String,
    /// Empty scene activated on unload, before the bundle is released.
    pub start_scene_name: String,
    /// Files that may sit next to a wrongly nested content folder.
    pub ignorable_system_files: Vec<String>,
    /// Passed to the host when the native API is bound.
    pub host_identifier: String,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            use_definition_file: true,
            definition_file_name: "index.json".to_string(),
            start_scene_name: "StartScene".to_string(),
            ignorable_system_files: vec![".DS_Store".to_string()],
            host_identifier: "GameManager".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("settings file {path} is invalid at {json_path}: {message}")]
    Decode {
        path: PathBuf,
        json_path: String,
        message: String,
    },
}

/// Reads settings from a JSON file. A missing file yields the defaults.
pub fn load_settings(path: &Path) -> Result<OrchestratorSettings, SettingsError> {
    if !path.exists() {
        info!(path = %path.display(), "settings_file_missing_using_defaults");
        return Ok(OrchestratorSettings::default());
    }
    let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| SettingsError::Decode {
        path: path.to_path_buf(),
        json_path: error.path().to_string(),
        message: error.into_inner().to_string(),
    })
}
