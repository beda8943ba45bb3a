use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error(
        "no bundle found at {path}; either the definition names the wrong bundle or the bundle \
was not placed in the content folder"
    )]
    MissingBundleFile { path: PathBuf },
    #[error("failed to load bundle at {path}: {message}")]
    LoadFailure { path: PathBuf, message: String },
}

/// A loaded bundle. Dropping the box without calling `release` leaks nothing,
/// but only `release` tells the backing store to drop every object loaded
/// from the bundle.
pub trait ContentBundle {
    fn name(&self) -> &str;
    /// Scene identifiers in bundle order.
    fn scene_names(&self) -> Vec<String>;
    fn release(self: Box<Self>);
}

#[async_trait(?Send)]
pub trait BundleLoader {
    async fn load_bundle(&self, path: &Path) -> Result<Box<dyn ContentBundle>, BundleError>;
}
