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
//! Built-in 2D components
//!
//! Plain data records consumed by the physics system, renderers and
//! gameplay code. Every field has a default, so persistence code can build
//! a component from defaults and overwrite fields one at a time.

use crate::ecs::{Component, Coordinator};
use crate::error::EcsResult;
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Position, size and rotation of an entity
///
/// # Examples
///
/// ```
/// use engine2d::ecs::components::Transform;
/// use glam::Vec2;
///
/// let t = Transform::new(Vec2::new(0.0, 15.0), Vec2::new(40.0, 10.0), 0.0);
/// assert_eq!(t.half_extents(), Vec2::new(20.0, 5.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// World-space center
    pub position: Vec2,
    /// Full width and height
    pub scale: Vec2,
    /// Rotation in degrees, counter-clockwise
    pub orientation: f32,
}

impl Transform {
    /// Create a transform
    pub fn new(position: Vec2, scale: Vec2, orientation: f32) -> Self {
        Transform {
            position,
            scale,
            orientation,
        }
    }

    /// Half of the absolute scale
    pub fn half_extents(&self) -> Vec2 {
        self.scale.abs() * 0.5
    }

    /// Radius of the circle collider implied by the transform's width
    pub fn radius(&self) -> f32 {
        self.scale.x.abs() * 0.5
    }

    /// Check if all fields are finite
    pub fn is_valid(&self) -> bool {
        self.position.is_finite() && self.scale.is_finite() && self.orientation.is_finite()
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::new(Vec2::ZERO, Vec2::ONE, 0.0)
    }
}

impl Component for Transform {}

/// Dynamic state of a physics-driven entity
///
/// A mass of zero or less marks the body as immovable: its inverse mass is
/// zero and the physics system never integrates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigidBody {
    /// Current velocity
    pub velocity: Vec2,
    /// Acceleration computed in the last step
    pub acceleration: Vec2,
    /// Forces summed during the current frame
    pub accumulated_force: Vec2,
    /// Unit direction of travel used for contact response
    pub direction: Vec2,
    /// Mass; non-positive means immovable
    pub mass: f32,
    /// Gravity vector applied to this body
    pub gravity_scale: Vec2,
    /// Per-axis speed limit
    pub max_velocity: f32,
    /// Magnitude limit on the accumulated force
    pub max_accumulated_force: f32,
}

impl RigidBody {
    /// Default per-axis speed limit
    pub const DEFAULT_MAX_VELOCITY: f32 = 500.0;

    /// Default limit on accumulated force magnitude
    pub const DEFAULT_MAX_ACCUMULATED_FORCE: f32 = 1000.0;

    /// Create a body with the given mass and default everything else
    pub fn with_mass(mass: f32) -> Self {
        RigidBody {
            mass,
            ..Self::default()
        }
    }

    /// Create an immovable body
    pub fn immovable() -> Self {
        Self::with_mass(0.0)
    }

    /// Check if this body never moves
    pub fn is_immovable(&self) -> bool {
        !(self.mass > 0.0) || !self.mass.is_finite()
    }

    /// Get the inverse mass, zero for immovable bodies
    pub fn inverse_mass(&self) -> f32 {
        if self.is_immovable() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Add a force to this frame's accumulator
    pub fn apply_force(&mut self, force: Vec2) {
        self.accumulated_force += force;
    }

    /// Check if the dynamic state is finite
    pub fn is_valid(&self) -> bool {
        self.velocity.is_finite()
            && self.acceleration.is_finite()
            && self.accumulated_force.is_finite()
    }
}

impl Default for RigidBody {
    fn default() -> Self {
        RigidBody {
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            accumulated_force: Vec2::ZERO,
            direction: Vec2::new(0.0, -1.0),
            mass: 1.0,
            gravity_scale: Vec2::new(0.0, -9.81),
            max_velocity: Self::DEFAULT_MAX_VELOCITY,
            max_accumulated_force: Self::DEFAULT_MAX_ACCUMULATED_FORCE,
        }
    }
}

impl Component for RigidBody {}

/// Marks an entity as a static collidable surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Platform;

impl Component for Platform {}

/// Register every built-in component type with the coordinator
pub fn register_builtin_components(coordinator: &mut Coordinator) -> EcsResult<()> {
    coordinator.register_component::<Transform>()?;
    coordinator.register_component::<RigidBody>()?;
    coordinator.register_component::<Platform>()?;
    Ok(())
}
