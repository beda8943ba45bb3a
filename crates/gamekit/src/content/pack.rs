use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

use super::atomic_io::write_bytes_atomic;
use super::bundle::{BundleError, BundleLoader, ContentBundle};

const MAGIC: &[u8; 4] = b"GKBP";
pub const BUNDLE_PACK_FORMAT_VERSION: u16 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackedBundle {
    pub name: String,
    pub scene_names: Vec<String>,
    pub resources: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Error)]
pub enum BundlePackError {
    #[error("bundle pack i/o failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bundle pack at {path} has invalid format: {message}")]
    InvalidFormat { path: PathBuf, message: String },
}

pub fn write_bundle_pack(path: &Path, bundle: &PackedBundle) -> Result<(), BundlePackError> {
    let mut payload = PackWriter::new(path);
    for (name, data) in &bundle.resources {
        payload.text(name)?;
        payload.length(data.len())?;
        payload.raw(data);
    }
    let payload = payload.finish();

    let mut header = PackWriter::new(path);
    header.raw(MAGIC);
    header.raw(&BUNDLE_PACK_FORMAT_VERSION.to_le_bytes());
    header.text(&bundle.name)?;
    header.length(bundle.scene_names.len())?;
    for scene in &bundle.scene_names {
        header.text(scene)?;
    }
    header.length(bundle.resources.len())?;
    header.length(payload.len())?;
    header.raw(&Sha256::digest(&payload));
    header.raw(&payload);

    write_bytes_atomic(path, &header.finish()).map_err(|source| BundlePackError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_bundle_pack(path: &Path) -> Result<PackedBundle, BundlePackError> {
    let bytes = fs::read(path).map_err(|source| BundlePackError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = PackReader::new(&bytes, path);

    if reader.take(MAGIC.len())? != MAGIC {
        return Err(reader.invalid("not a bundle pack"));
    }
    let format_version = u16::from_le_bytes(reader.array()?);
    if format_version != BUNDLE_PACK_FORMAT_VERSION {
        return Err(reader.invalid(&format!(
            "format version {format_version} is not supported"
        )));
    }

    let name = reader.text()?;
    let scene_count = reader.length()?;
    let scene_names = (0..scene_count)
        .map(|_| reader.text())
        .collect::<Result<Vec<_>, _>>()?;
    let resource_count = reader.length()?;
    let payload_len = reader.length()?;
    let stored_hash: [u8; 32] = reader.array()?;
    let payload = reader.take(payload_len)?;
    if !reader.is_exhausted() {
        return Err(reader.invalid("bytes follow the payload"));
    }
    if Sha256::digest(payload).as_slice() != stored_hash.as_slice() {
        return Err(reader.invalid("payload checksum does not match"));
    }

    let mut payload_reader = PackReader::new(payload, path);
    let mut resources = BTreeMap::new();
    for _ in 0..resource_count {
        let resource = payload_reader.text()?;
        let len = payload_reader.length()?;
        let data = payload_reader.take(len)?.to_vec();
        if resources.insert(resource, data).is_some() {
            return Err(payload_reader.invalid("resource names must be unique"));
        }
    }
    if !payload_reader.is_exhausted() {
        return Err(payload_reader.invalid("payload holds more than the declared resources"));
    }

    Ok(PackedBundle {
        name,
        scene_names,
        resources,
    })
}

/// Loads bundles stored in the pack format from the content folder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackBundleLoader;

#[async_trait(?Send)]
impl BundleLoader for PackBundleLoader {
    async fn load_bundle(&self, path: &Path) -> Result<Box<dyn ContentBundle>, BundleError> {
        if !path.is_file() {
            return Err(BundleError::MissingBundleFile {
                path: path.to_path_buf(),
            });
        }
        let packed = read_bundle_pack(path).map_err(|error| BundleError::LoadFailure {
            path: path.to_path_buf(),
            message: error.to_string(),
        })?;
        info!(
            path = %path.display(),
            bundle = %packed.name,
            scene_count = packed.scene_names.len(),
            resource_count = packed.resources.len(),
            "bundle_loaded"
        );
        Ok(Box::new(LoadedPack { packed }))
    }
}

#[derive(Debug)]
struct LoadedPack {
    packed: PackedBundle,
}

impl ContentBundle for LoadedPack {
    fn name(&self) -> &str {
        &self.packed.name
    }

    fn scene_names(&self) -> Vec<String> {
        self.packed.scene_names.clone()
    }

    fn release(self: Box<Self>) {
        info!(
            bundle = %self.packed.name,
            resource_count = self.packed.resources.len(),
            "bundle_released"
        );
    }
}

/// Little-endian encoder; strings carry a u16 length, counts a u32.
struct PackWriter<'p> {
    bytes: Vec<u8>,
    path: &'p Path,
}

impl<'p> PackWriter<'p> {
    fn new(path: &'p Path) -> Self {
        Self {
            bytes: Vec::new(),
            path,
        }
    }

    fn raw(&mut self, data: &[u8]) {
        self.bytes.extend_from_slice(data);
    }

    fn length(&mut self, len: usize) -> Result<(), BundlePackError> {
        let len = u32::try_from(len).map_err(|_| invalid_format(self.path, "length exceeds u32"))?;
        self.raw(&len.to_le_bytes());
        Ok(())
    }

    fn text(&mut self, value: &str) -> Result<(), BundlePackError> {
        let len = u16::try_from(value.len())
            .map_err(|_| invalid_format(self.path, "name longer than u16::MAX bytes"))?;
        self.raw(&len.to_le_bytes());
        self.raw(value.as_bytes());
        Ok(())
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

struct PackReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    path: &'a Path,
}

impl<'a> PackReader<'a> {
    fn new(bytes: &'a [u8], path: &'a Path) -> Self {
        Self {
            bytes,
            cursor: 0,
            path,
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], BundlePackError> {
        let bytes = self.bytes;
        let remaining = &bytes[self.cursor..];
        if len > remaining.len() {
            return Err(self.invalid("truncated pack"));
        }
        self.cursor += len;
        Ok(&remaining[..len])
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], BundlePackError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn length(&mut self) -> Result<usize, BundlePackError> {
        Ok(u32::from_le_bytes(self.array()?) as usize)
    }

    fn text(&mut self) -> Result<String, BundlePackError> {
        let len = u16::from_le_bytes(self.array()?) as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| self.invalid("name is not UTF-8"))
    }

    fn is_exhausted(&self) -> bool {
        self.cursor == self.bytes.len()
    }

    fn invalid(&self, message: &str) -> BundlePackError {
        invalid_format(self.path, &format!("{message} (offset {})", self.cursor))
    }
}

fn invalid_format(path: &Path, message: &str) -> BundlePackError {
    BundlePackError::InvalidFormat {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}
