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
//! Engine and physics configuration
//!
//! Both configs have sensible defaults, builder-style setters, and can be
//! read from JSON where every missing field falls back to its default.

use crate::ecs::MAX_ENTITIES;
use crate::error::{EcsError, EcsResult};
use serde::Deserialize;

/// Configuration for the ECS coordinator
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Size of the entity pool
    pub max_entities: usize,
    /// Slots preallocated by each component handler
    pub initial_component_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_entities: MAX_ENTITIES,
            initial_component_capacity: 64,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with a custom entity pool size
    pub fn new(max_entities: usize) -> Self {
        EngineConfig {
            max_entities,
            ..Self::default()
        }
    }

    /// Set how many slots each component handler preallocates
    pub fn with_component_capacity(mut self, capacity: usize) -> Self {
        self.initial_component_capacity = capacity;
        self
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> EcsResult<Self> {
        let config: EngineConfig =
            serde_json::from_str(json).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_entities == 0 {
            return Err(EcsError::InvalidConfig("max_entities must be positive".to_string()));
        }
        if self.max_entities > u32::MAX as usize {
            return Err(EcsError::InvalidConfig(format!(
                "max_entities {} does not fit an entity handle",
                self.max_entities
            )));
        }
        Ok(())
    }
}

/// Tunables for the physics system
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Velocity multiplier applied every frame (implicit drag)
    pub damping: f32,
    /// Upper bound on the magnitude of one entity's summed applied forces
    pub max_force_magnitude: f32,
    /// Tolerance when comparing a contact normal to a movement direction
    pub direction_epsilon: f32,
    /// Whether to log warnings for entities skipped due to missing components
    pub warn_on_missing_components: bool,
    /// Whether to log warnings for non-finite applied forces and clamped totals
    pub warn_on_invalid_forces: bool,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        PhysicsConfig {
            damping: 0.9,
            max_force_magnitude: 1e6,
            direction_epsilon: 1e-4,
            warn_on_missing_components: true,
            warn_on_invalid_forces: true,
        }
    }
}

impl PhysicsConfig {
    /// Set the per-frame velocity damping factor
    ///
    /// # Panics
    ///
    /// Panics if `damping` is outside `[0, 1]`.
    pub fn with_damping(mut self, damping: f32) -> Self {
        assert!((0.0..=1.0).contains(&damping), "Damping must be within [0, 1]");
        self.damping = damping;
        self
    }

    /// Set the applied-force magnitude limit
    pub fn with_max_force(mut self, max_force_magnitude: f32) -> Self {
        self.max_force_magnitude = max_force_magnitude;
        self
    }

    /// Disable warnings for skipped entities
    pub fn quiet(mut self) -> Self {
        self.warn_on_missing_components = false;
        self
    }

    /// Disable warnings for invalid or clamped applied forces
    pub fn without_force_warnings(mut self) -> Self {
        self.warn_on_invalid_forces = false;
        self
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> EcsResult<Self> {
        let config: PhysicsConfig =
            serde_json::from_str(json).map_err(|e| EcsError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for unusable values
    pub fn validate(&self) -> EcsResult<()> {
        if !(0.0..=1.0).contains(&self.damping) {
            return Err(EcsError::InvalidConfig(format!(
                "damping {} must be within [0, 1]",
                self.damping
            )));
        }
        if !(self.max_force_magnitude > 0.0) {
            return Err(EcsError::InvalidConfig(
                "max_force_magnitude must be positive".to_string(),
            ));
        }
        if !(self.direction_epsilon >= 0.0) {
            return Err(EcsError::InvalidConfig(
                "direction_epsilon must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
