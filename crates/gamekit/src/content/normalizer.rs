use std::collections::HashSet;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::types::ContentError;

/// Corrects content archives that were zipped together with their own
/// top-level folder, so files land at `GameA/GameA/index.json` instead of
/// `GameA/index.json`.
///
/// The returned path is a fixed point: normalizing it again returns it
/// unchanged. A chain of same-named folders that loops back onto itself
/// (through a symlink) is not a packaging defect, so the input is returned
/// as is.
pub fn normalize_content_folder(
    path: &Path,
    ignorable_files: &[String],
) -> Result<PathBuf, ContentError> {
    if !path.is_dir() {
        return Err(ContentError::MissingDirectory {
            path: path.to_path_buf(),
        });
    }
    let folder_name = path
        .file_name()
        .map(OsStr::to_os_string)
        .ok_or_else(|| ContentError::InvalidDirectoryName {
            path: path.to_path_buf(),
        })?;

    let mut visited = HashSet::from([resolve(path)?]);
    let mut current = path.to_path_buf();
    while list_folder(&current)?.is_wrongly_nested(&folder_name, ignorable_files) {
        let next = current.join(&folder_name);
        if !visited.insert(resolve(&next)?) {
            warn!(path = %path.display(), "content_folder_nesting_loops");
            return Ok(path.to_path_buf());
        }
        current = next;
    }

    if current != path {
        info!(
            requested = %path.display(),
            normalized = %current.display(),
            "content_folder_unnested"
        );
    }
    Ok(current)
}

fn resolve(path: &Path) -> Result<PathBuf, ContentError> {
    fs::canonicalize(path).map_err(|source| ContentError::ResolveDirectory {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default)]
struct FolderListing {
    directories: Vec<OsString>,
    files: Vec<OsString>,
}

impl FolderListing {
    fn is_wrongly_nested(&self, folder_name: &OsStr, ignorable_files: &[String]) -> bool {
        let single_matching_dir =
            self.directories.len() == 1 && self.directories[0].as_os_str() == folder_name;
        single_matching_dir
            && self.files.iter().all(|file| {
                file.to_str()
                    .is_some_and(|name| ignorable_files.iter().any(|ignored| ignored == name))
            })
    }
}

fn list_folder(path: &Path) -> Result<FolderListing, ContentError> {
    let entries = fs::read_dir(path).map_err(|source| ContentError::ReadDir {
        path: path.to_path_buf(),
        source,
    })?;

    let mut listing = FolderListing::default();
    for entry in entries {
        let entry = entry.map_err(|source| ContentError::ReadDirEntry {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            listing.directories.push(entry.file_name());
        } else {
            listing.files.push(entry.file_name());
        }
    }
    Ok(listing)
}
