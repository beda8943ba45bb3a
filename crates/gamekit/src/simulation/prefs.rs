use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::content::write_text_atomic;

#[derive(Debug, Error)]
pub enum PreferenceError {
    #[error("failed to encode preferences: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("failed to read preferences file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("preferences file {path} is not a JSON object: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write preferences file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Persistent key/value store for tooling preferences.
pub trait PreferenceStore {
    fn get_bool(&self, key: &str) -> Option<bool>;
    fn get_string(&self, key: &str) -> Option<String>;
    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError>;
    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryPreferences {
    values: BTreeMap<String, Value>,
    writes: usize,
}

impl MemoryPreferences {
    /// Number of `set_*` calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes
    }
}

impl PreferenceStore for MemoryPreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .map(ToString::to_string)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.writes += 1;
        self.values.insert(key.to_string(), Value::Bool(value));
        Ok(())
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.writes += 1;
        self.values
            .insert(key.to_string(), Value::String(value.to_string()));
        Ok(())
    }
}

/// Preferences kept in a flat JSON object on disk, rewritten on every set.
#[derive(Debug)]
pub struct JsonFilePreferences {
    path: PathBuf,
    values: MemoryPreferences,
}

impl JsonFilePreferences {
    /// Opens the store. An unreadable or corrupt file starts empty; it is
    /// replaced on the next write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match read_values(&path) {
            Ok(values) => values,
            Err(error) => {
                warn!(error = %error, "preferences_unreadable");
                BTreeMap::new()
            }
        };
        debug!(path = %path.display(), count = values.len(), "preferences_opened");
        Self {
            path,
            values: MemoryPreferences { values, writes: 0 },
        }
    }

    fn persist(&self) -> Result<(), PreferenceError> {
        let text =
            serde_json::to_string_pretty(&self.values.values).map_err(PreferenceError::Encode)?;
        write_text_atomic(&self.path, &text).map_err(|source| PreferenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

fn read_values(path: &Path) -> Result<BTreeMap<String, Value>, PreferenceError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(source) => {
            return Err(PreferenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&text).map_err(|source| PreferenceError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

impl PreferenceStore for JsonFilePreferences {
    fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get_bool(key)
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.values.get_string(key)
    }

    fn set_bool(&mut self, key: &str, value: bool) -> Result<(), PreferenceError> {
        self.values.set_bool(key, value)?;
        self.persist()
    }

    fn set_string(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.set_string(key, value)?;
        self.persist()
    }
}
