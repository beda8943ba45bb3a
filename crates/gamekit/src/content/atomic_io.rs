use std::ffi::{OsStr, OsString};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Stages `bytes` beside `path` and renames the staged file over it, so
/// readers never observe a half-written file.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent(path)?;
    let staging_path = staging_path_for(path);
    let result = stage(&staging_path, bytes).and_then(|()| publish(&staging_path, path));
    if result.is_err() {
        let _ = fs::remove_file(&staging_path);
    }
    result
}

pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    write_bytes_atomic(path, text.as_bytes())
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn stage(staging_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(staging_path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn publish(staging_path: &Path, final_path: &Path) -> io::Result<()> {
    // rename does not replace an existing file on every platform
    match fs::remove_file(final_path) {
        Ok(()) => {}
        Err(error) if error.kind() == io::ErrorKind::NotFound => {}
        Err(error) => return Err(error),
    }
    fs::rename(staging_path, final_path)
}

fn staging_path_for(path: &Path) -> PathBuf {
    let mut staging_name = path
        .file_name()
        .map(OsStr::to_os_string)
        .unwrap_or_else(|| OsString::from("gamekit.out"));
    staging_name.push(".partial");
    path.with_file_name(staging_name)
}
