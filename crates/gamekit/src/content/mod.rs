mod atomic_io;
mod bundle;
mod definition;
mod normalizer;
mod pack;
mod save_file;
mod scenes;
mod types;

pub(crate) use atomic_io::write_text_atomic;
pub use bundle::{BundleError, BundleLoader, ContentBundle};
pub use definition::{load_definition, BundleCapability, Definition, SceneCapability};
pub use normalizer::normalize_content_folder;
pub use pack::{
    read_bundle_pack, write_bundle_pack, BundlePackError, PackBundleLoader, PackedBundle,
    BUNDLE_PACK_FORMAT_VERSION,
};
pub use save_file::{SaveFile, SaveFileError};
pub use scenes::{load_content_scenes, SceneDirector, SceneError, SceneLoadMode, SceneStack};
pub use types::ContentError;
