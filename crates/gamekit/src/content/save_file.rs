use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use super::atomic_io::write_text_atomic;

#[derive(Debug, Error)]
pub enum SaveFileError {
    #[error("failed to read/write save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode save data for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("save file {path} is invalid at {json_path}: {message}")]
    Decode {
        path: PathBuf,
        json_path: String,
        message: String,
    },
}

/// One JSON save file per game, named by the game and stored under the
/// host-supplied save folder.
#[derive(Debug, Clone)]
pub struct SaveFile<T> {
    file_name: String,
    _data: PhantomData<fn() -> T>,
}

impl<T> SaveFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            _data: PhantomData,
        }
    }

    pub fn path_in(&self, folder: &Path) -> PathBuf {
        folder.join(&self.file_name)
    }

    pub fn write(&self, folder: &Path, data: &T) -> Result<PathBuf, SaveFileError> {
        let path = self.path_in(folder);
        let text = serde_json::to_string_pretty(data).map_err(|source| SaveFileError::Encode {
            path: path.clone(),
            source,
        })?;
        write_text_atomic(&path, &text).map_err(|source| SaveFileError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Returns `None` when no save exists yet.
    pub fn read(&self, folder: &Path) -> Result<Option<T>, SaveFileError> {
        let path = self.path_in(folder);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|source| SaveFileError::Io {
            path: path.clone(),
            source,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        serde_path_to_error::deserialize(&mut deserializer)
            .map(Some)
            .map_err(|error| SaveFileError::Decode {
                path,
                json_path: error.path().to_string(),
                message: error.into_inner().to_string(),
            })
    }
}
