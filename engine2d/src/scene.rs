// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Scene persistence
//!
//! A scene is a versioned JSON document listing live entities with their
//! string ID, render layer and built-in components. Every field of every
//! component has a default, so hand-written scenes may leave fields out.
//!
//! ```json
//! {
//!   "format_version": "1.0.0",
//!   "entities": [
//!     { "id": "player", "layer": 1,
//!       "transform": { "position": [0.0, 4.0] },
//!       "rigid_body": { "mass": 2.0 } },
//!     { "transform": { "scale": [20.0, 2.0] }, "rigid_body": { "mass": 0.0 }, "platform": true }
//!   ]
//! }
//! ```

use crate::ecs::components::{Platform, RigidBody, Transform};
use crate::ecs::{Coordinator, Entity};
use crate::error::EcsError;
use log::{debug, warn};
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Format version written by [`save`]
pub const SCENE_FORMAT_VERSION: &str = "1.0.0";

/// Errors produced while reading or writing scenes
#[derive(Error, Debug)]
pub enum SceneError {
    /// The document could not be parsed or written
    #[error("malformed scene document: {0}")]
    Json(#[from] serde_json::Error),

    /// Populating the coordinator failed
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// The format version is not valid semver
    #[error("invalid scene format version '{0}'")]
    InvalidVersion(String),

    /// The document was written by an incompatible format version
    #[error("scene format {found} is not compatible with {supported}")]
    IncompatibleVersion {
        /// Version found in the document
        found: String,
        /// Version this build reads
        supported: &'static str,
    },
}

/// One persisted entity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityRecord {
    /// String ID, unique among the scene's entities
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Render layer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<u32>,
    /// Transform component
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,
    /// RigidBody component
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rigid_body: Option<RigidBody>,
    /// Whether the entity carries the Platform marker
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub platform: bool,
}

/// A saved scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDocument {
    /// Format version the document was written with
    pub format_version: String,
    /// Persisted entities, in ascending handle order when saved
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Layers hidden at save time
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hidden_layers: Vec<u32>,
}

impl SceneDocument {
    /// Parse a document and check its format version
    pub fn from_json(json: &str) -> Result<Self, SceneError> {
        let document: SceneDocument = serde_json::from_str(json)?;
        check_version(&document.format_version)?;
        Ok(document)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String, SceneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        SceneDocument {
            format_version: SCENE_FORMAT_VERSION.to_string(),
            entities: Vec::new(),
            hidden_layers: Vec::new(),
        }
    }
}

/// Check if a scene format version can be read by this build
///
/// Uses semantic versioning rules:
/// - Major version must match
/// - For major version 0, minor versions must match
/// - Otherwise the document's minor version must not be newer
/// - Patch version is ignored
pub fn is_version_compatible(document_version: &str, supported_version: &str) -> bool {
    let (Ok(document), Ok(supported)) = (
        Version::parse(document_version),
        Version::parse(supported_version),
    ) else {
        return false;
    };

    if document.major != supported.major {
        return false;
    }
    if document.major != 0 {
        document.minor <= supported.minor
    } else {
        document.minor == supported.minor
    }
}

fn check_version(version: &str) -> Result<(), SceneError> {
    if Version::parse(version).is_err() {
        return Err(SceneError::InvalidVersion(version.to_string()));
    }
    if !is_version_compatible(version, SCENE_FORMAT_VERSION) {
        return Err(SceneError::IncompatibleVersion {
            found: version.to_string(),
            supported: SCENE_FORMAT_VERSION,
        });
    }
    Ok(())
}

/// Capture every live entity's built-in components
///
/// Component types that were never registered are simply absent from the
/// records.
pub fn save(coordinator: &Coordinator) -> SceneDocument {
    let entities: Vec<EntityRecord> = coordinator
        .live_entities()
        .into_iter()
        .map(|entity| EntityRecord {
            id: coordinator.entity_id(entity).map(str::to_string),
            layer: coordinator.layers().layer_of(entity),
            transform: coordinator.get_component::<Transform>(entity).ok().copied(),
            rigid_body: coordinator.get_component::<RigidBody>(entity).ok().copied(),
            platform: coordinator.has_component::<Platform>(entity),
        })
        .collect();

    let hidden_layers = coordinator.layers().hidden_layers().collect();

    debug!("saved scene with {} entities", entities.len());
    SceneDocument {
        format_version: SCENE_FORMAT_VERSION.to_string(),
        entities,
        hidden_layers,
    }
}

/// Create one entity per record, returning the new handles in record order
///
/// The built-in component types must be registered. A record whose string
/// ID is already taken is loaded without its ID. If any record fails, every
/// entity created by this call is destroyed again before the error is
/// returned, leaving the coordinator as it was.
pub fn load(coordinator: &mut Coordinator, document: &SceneDocument) -> Result<Vec<Entity>, SceneError> {
    check_version(&document.format_version)?;

    let mut created = Vec::with_capacity(document.entities.len());
    for record in &document.entities {
        if let Err(err) = load_record(coordinator, record, &mut created) {
            warn!(
                "Scene load failed after {} entities, rolling back: {}",
                created.len(),
                err
            );
            for entity in created.drain(..) {
                if let Err(cleanup) = coordinator.destroy_entity(entity) {
                    warn!("Could not roll back {}: {}", entity, cleanup);
                }
            }
            return Err(err);
        }
    }

    for layer in &document.hidden_layers {
        coordinator.layers_mut().set_visible(*layer, false);
    }

    debug!("loaded scene with {} entities", created.len());
    Ok(created)
}

fn load_record(
    coordinator: &mut Coordinator,
    record: &EntityRecord,
    created: &mut Vec<Entity>,
) -> Result<(), SceneError> {
    let entity = coordinator.create_entity()?;
    created.push(entity);

    if let Some(transform) = record.transform {
        coordinator.add_component(entity, transform)?;
    }
    if let Some(body) = record.rigid_body {
        coordinator.add_component(entity, body)?;
    }
    if record.platform {
        coordinator.add_component(entity, Platform)?;
    }
    if let Some(layer) = record.layer {
        coordinator.assign_layer(entity, layer)?;
    }
    if let Some(id) = &record.id {
        match coordinator.set_entity_id(entity, id) {
            Ok(()) => {}
            Err(EcsError::DuplicateEntityId(_)) => {
                warn!("Scene id '{}' is already in use; {} loaded without it", id, entity);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}
