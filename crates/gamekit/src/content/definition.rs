use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use super::types::ContentError;

/// Content ships as a packaged bundle stored next to the definition file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleCapability {
    pub bundle_file_name: String,
}

/// Content names the single scene to load instead of every scene in the bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneCapability {
    pub scene_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    bundle: Option<BundleCapability>,
    scene: Option<SceneCapability>,
    raw: Value,
}

const BUNDLE_NAME_KEY: &str = "bundleName";
const SCENE_NAME_KEY: &str = "sceneName";

impl Definition {
    pub fn from_value(raw: Value) -> Self {
        let bundle = non_empty_string(&raw, BUNDLE_NAME_KEY).map(|bundle_file_name| {
            BundleCapability { bundle_file_name }
        });
        let scene =
            non_empty_string(&raw, SCENE_NAME_KEY).map(|scene_name| SceneCapability { scene_name });
        Self { bundle, scene, raw }
    }

    pub fn bundle(&self) -> Option<&BundleCapability> {
        self.bundle.as_ref()
    }

    pub fn scene(&self) -> Option<&SceneCapability> {
        self.scene.as_ref()
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    /// Decodes the definition into a game-specific shape.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.raw)
    }
}

fn non_empty_string(raw: &Value, key: &str) -> Option<String> {
    raw.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

pub fn load_definition(folder: &Path, file_name: &str) -> Result<Definition, ContentError> {
    let path = folder.join(file_name);
    if !path.is_file() {
        return Err(ContentError::MissingDefinitionFile {
            folder: folder.to_path_buf(),
            file_name: file_name.to_string(),
        });
    }

    let text = fs::read_to_string(&path).map_err(|source| ContentError::ReadDefinition {
        path: path.clone(),
        source,
    })?;
    let mut deserializer = serde_json::Deserializer::from_str(&text);
    let raw: Value = serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        ContentError::DecodeDefinition {
            path: path.clone(),
            json_path: error.path().to_string(),
            message: error.into_inner().to_string(),
        }
    })?;
    if !raw.is_object() {
        return Err(ContentError::DecodeDefinition {
            path,
            json_path: ".".to_string(),
            message: "expected a JSON object".to_string(),
        });
    }

    let definition = Definition::from_value(raw);
    info!(
        path = %path.display(),
        bundle = ?definition.bundle().map(|bundle| bundle.bundle_file_name.as_str()),
        scene = ?definition.scene().map(|scene| scene.scene_name.as_str()),
        "definition_loaded"
    );
    Ok(definition)
}
