use std::cell::RefCell;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use super::definition::SceneCapability;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneLoadMode {
    /// Replaces every active scene.
    Single,
    Additive,
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene name cannot be empty")]
    EmptySceneName,
    #[error("failed to load scene {scene}: {message}")]
    LoadFailed { scene: String, message: String },
    #[error("failed to release unused resources: {message}")]
    ReleaseFailed { message: String },
}

/// Activates scenes on behalf of the orchestrator. Each call resolves only
/// once the scene is active.
#[async_trait(?Send)]
pub trait SceneDirector {
    async fn load_scene(&self, scene: &str, mode: SceneLoadMode) -> Result<(), SceneError>;

    async fn release_unused_resources(&self) -> Result<(), SceneError> {
        Ok(())
    }
}

/// Loads the scenes a definition asks for.
///
/// A scene capability wins over the bundle's own list. Otherwise the first
/// bundle scene replaces whatever is active and the rest load additively in
/// bundle order. Returns the scenes in the order they were activated.
pub async fn load_content_scenes(
    director: &dyn SceneDirector,
    scene_capability: Option<&SceneCapability>,
    bundle_scenes: &[String],
) -> Result<Vec<String>, SceneError> {
    if let Some(capability) = scene_capability {
        director
            .load_scene(&capability.scene_name, SceneLoadMode::Single)
            .await?;
        info!(scene = %capability.scene_name, "definition_scene_loaded");
        return Ok(vec![capability.scene_name.clone()]);
    }

    let Some((primary, additive)) = bundle_scenes.split_first() else {
        debug!("bundle_has_no_scenes");
        return Ok(Vec::new());
    };

    director.load_scene(primary, SceneLoadMode::Single).await?;
    for scene in additive {
        director.load_scene(scene, SceneLoadMode::Additive).await?;
    }
    info!(
        primary = %primary,
        additive_count = additive.len(),
        "bundle_scenes_loaded"
    );
    Ok(bundle_scenes.to_vec())
}

/// In-memory scene director: tracks which scenes are active, primary first.
#[derive(Debug)]
pub struct SceneStack {
    active: RefCell<Vec<String>>,
}

impl SceneStack {
    pub fn new(start_scene: &str) -> Self {
        Self {
            active: RefCell::new(vec![start_scene.to_string()]),
        }
    }

    pub fn active_scenes(&self) -> Vec<String> {
        self.active.borrow().clone()
    }
}

#[async_trait(?Send)]
impl SceneDirector for SceneStack {
    async fn load_scene(&self, scene: &str, mode: SceneLoadMode) -> Result<(), SceneError> {
        if scene.trim().is_empty() {
            return Err(SceneError::EmptySceneName);
        }
        let mut active = self.active.borrow_mut();
        if mode == SceneLoadMode::Single {
            active.clear();
        }
        active.push(scene.to_string());
        debug!(scene, mode = ?mode, active_count = active.len(), "scene_activated");
        Ok(())
    }
}
