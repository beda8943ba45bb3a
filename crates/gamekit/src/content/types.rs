use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content folder {path} provided by the host does not exist")]
    MissingDirectory { path: PathBuf },
    #[error("content folder {path} does not have a valid directory name")]
    InvalidDirectoryName { path: PathBuf },
    #[error("failed to resolve directory {path}: {source}")]
    ResolveDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no {file_name} found in content folder {folder}")]
    MissingDefinitionFile { folder: PathBuf, file_name: String },
    #[error("failed to read definition file {path}: {source}")]
    ReadDefinition {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("definition file {path} is invalid at {json_path}: {message}")]
    DecodeDefinition {
        path: PathBuf,
        json_path: String,
        message: String,
    },
}
