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
//! Error types for ECS bookkeeping
//!
//! Structural errors (bad entity handles, exhausted capacity, double
//! registration) are surfaced to callers through [`EcsResult`]. Geometric
//! degeneracies in the physics code are never errors; they resolve to
//! documented fallback values instead.

use crate::ecs::Entity;
use thiserror::Error;

/// Errors produced by the entity, component and system managers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// The entity pool is exhausted
    #[error("entity capacity exceeded: all {capacity} entities are live")]
    CapacityExceeded {
        /// Configured maximum number of live entities
        capacity: usize,
    },

    /// The handle is out of range or refers to a destroyed entity
    #[error("invalid entity {0}")]
    InvalidEntity(Entity),

    /// A component type or system type was registered twice
    #[error("{0} is already registered")]
    DuplicateRegistration(&'static str),

    /// The entity already owns a component of this type
    #[error("{entity} already has a {component} component")]
    DuplicateComponent {
        /// Entity that was targeted
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// The entity does not own a component of this type
    #[error("{entity} has no {component} component")]
    ComponentNotFound {
        /// Entity that was targeted
        entity: Entity,
        /// Component type name
        component: &'static str,
    },

    /// A component type was used before being registered
    #[error("component type {0} has not been registered")]
    ComponentNotRegistered(&'static str),

    /// Every signature bit is already assigned to a component type
    #[error("cannot register more than {max} component types")]
    TooManyComponentTypes {
        /// Width of the signature bitset
        max: usize,
    },

    /// The requested system was never registered
    #[error("system {0} is not registered")]
    SystemNotFound(&'static str),

    /// The requested system is currently running its update
    #[error("system {0} is running and cannot be borrowed")]
    SystemBusy(&'static str),

    /// Another live entity already uses this string ID
    #[error("entity id '{0}' is already in use")]
    DuplicateEntityId(String),

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for ECS operations
pub type EcsResult<T> = Result<T, EcsError>;
