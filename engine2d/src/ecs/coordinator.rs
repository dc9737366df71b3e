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
//! ECS coordinator
//!
//! The [`Coordinator`] is the single owner of all ECS state and the only
//! surface gameplay, editor and persistence code use. Every structural change
//! goes through it so that component storage, entity signatures and system
//! membership never disagree.
//!
//! # Examples
//!
//! ```
//! use engine2d::ecs::Coordinator;
//! use engine2d::ecs::components::{register_builtin_components, Transform};
//!
//! let mut coordinator = Coordinator::new();
//! register_builtin_components(&mut coordinator).unwrap();
//!
//! let entity = coordinator.create_entity().unwrap();
//! coordinator.add_component(entity, Transform::default()).unwrap();
//! assert!(coordinator.has_component::<Transform>(entity));
//! ```

use crate::config::EngineConfig;
use crate::ecs::component::{Component, ComponentManager, ComponentType};
use crate::ecs::entity::{Entity, EntityManager, Signature};
use crate::ecs::layers::LayerManager;
use crate::ecs::system::{System, SystemManager};
use crate::error::{EcsError, EcsResult};
use log::{debug, trace};

/// Facade over the entity, component and system managers
pub struct Coordinator {
    entities: EntityManager,
    components: ComponentManager,
    systems: SystemManager,
    layers: LayerManager,
}

impl Coordinator {
    /// Create a coordinator with the default configuration
    pub fn new() -> Self {
        Self::build(&EngineConfig::default())
    }

    /// Create a coordinator from a validated configuration
    pub fn with_config(config: EngineConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::build(&config))
    }

    fn build(config: &EngineConfig) -> Self {
        Coordinator {
            entities: EntityManager::with_capacity(config.max_entities),
            components: ComponentManager::with_capacity(config.initial_component_capacity),
            systems: SystemManager::new(),
            layers: LayerManager::new(),
        }
    }

    // ----- entities -----

    /// Create an entity with an empty signature
    ///
    /// Systems whose required signature is empty pick it up immediately.
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        let entity = self.entities.create_entity()?;
        self.systems.entity_sig_change(entity, Signature::EMPTY);
        Ok(entity)
    }

    /// Destroy an entity and everything that refers to it
    ///
    /// Components, system membership, layer membership and the string ID are
    /// all dropped before the handle returns to the pool.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.check_alive(entity)?;
        self.components.entity_removed(entity);
        self.systems.entity_removed(entity);
        self.layers.remove(entity);
        self.entities.destroy_entity(entity)
    }

    /// Create a new entity carrying copies of every component of `source`
    ///
    /// Layer membership is copied too. String IDs are not, since they must
    /// stay unique.
    pub fn clone_entity(&mut self, source: Entity) -> EcsResult<Entity> {
        self.check_alive(source)?;
        let clone = self.entities.create_entity()?;
        let copied = match self.components.clone_components(source, clone) {
            Ok(signature) => signature,
            Err(err) => {
                self.components.entity_removed(clone);
                self.entities.destroy_entity(clone)?;
                return Err(err);
            }
        };
        let signature = self.entities.set_signature(clone, copied)?;
        self.systems.entity_sig_change(clone, signature);
        if let Some(layer) = self.layers.layer_of(source) {
            self.layers.assign(clone, layer);
        }
        trace!("cloned {} into {}", source, clone);
        Ok(clone)
    }

    /// Check whether a handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities
    pub fn entity_count(&self) -> usize {
        self.entities.live_count()
    }

    /// Size of the entity pool
    pub fn entity_capacity(&self) -> usize {
        self.entities.capacity()
    }

    /// All live entities in ascending handle order
    pub fn live_entities(&self) -> Vec<Entity> {
        self.entities.live_entities()
    }

    /// Current signature of a live entity
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.entities.signature(entity)
    }

    /// Give a live entity a unique human-readable ID
    pub fn set_entity_id(&mut self, entity: Entity, id: &str) -> EcsResult<()> {
        self.entities.set_entity_id(entity, id)
    }

    /// Look up an entity by its human-readable ID
    pub fn entity_from_id(&self, id: &str) -> Option<Entity> {
        self.entities.entity_from_id(id)
    }

    /// Human-readable ID of an entity
    pub fn entity_id(&self, entity: Entity) -> Option<&str> {
        self.entities.entity_id(entity)
    }

    // ----- layers -----

    /// Put a live entity on a render layer
    pub fn assign_layer(&mut self, entity: Entity, layer: u32) -> EcsResult<()> {
        self.check_alive(entity)?;
        self.layers.assign(entity, layer);
        Ok(())
    }

    /// Layer table
    pub fn layers(&self) -> &LayerManager {
        &self.layers
    }

    /// Mutable layer table, for visibility toggles
    pub fn layers_mut(&mut self) -> &mut LayerManager {
        &mut self.layers
    }

    // ----- components -----

    /// Register a component type, assigning it the next signature bit
    pub fn register_component<T: Component>(&mut self) -> EcsResult<ComponentType> {
        self.components.register_component_handler::<T>()
    }

    /// Signature bit of a registered component type
    pub fn component_type<T: Component>(&self) -> EcsResult<ComponentType> {
        self.components.component_type::<T>()
    }

    /// Attach a component, then update the signature and system membership
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.check_alive(entity)?;
        let component_type = self.components.component_type::<T>()?;
        self.components.add_component(entity, component)?;
        let signature = self
            .entities
            .set_signature(entity, component_type.signature())?;
        self.systems.entity_sig_change(entity, signature);
        Ok(())
    }

    /// Detach and return a component, then update signature and membership
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.check_alive(entity)?;
        let component_type = self.components.component_type::<T>()?;
        let component = self.components.remove_component::<T>(entity)?;
        let signature = self
            .entities
            .rmv_signature(entity, component_type.signature())?;
        self.systems.entity_sig_change(entity, signature);
        Ok(component)
    }

    /// Borrow a component
    ///
    /// The reference points into packed storage; it cannot outlive the next
    /// mutation of the coordinator, which the borrow checker enforces.
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.check_alive(entity)?;
        self.components.get_component::<T>(entity)
    }

    /// Mutably borrow a component
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.check_alive(entity)?;
        self.components.get_component_mut::<T>(entity)
    }

    /// Check whether a live entity has a component
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.is_alive(entity) && self.components.has_component::<T>(entity)
    }

    /// Read-only access to the component manager
    pub fn components(&self) -> &ComponentManager {
        &self.components
    }

    // ----- systems -----

    /// Register a system; systems update in registration order
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<usize> {
        self.systems.register_system(system)
    }

    /// Set the component signature a system requires
    ///
    /// Existing live entities are matched against it immediately.
    pub fn set_system_signature<S: System>(&mut self, signature: Signature) -> EcsResult<()> {
        let live: Vec<(Entity, Signature)> = self
            .entities
            .live_entities()
            .into_iter()
            .map(|entity| self.entities.signature(entity).map(|sig| (entity, sig)))
            .collect::<EcsResult<_>>()?;
        self.systems.set_system_signature::<S, _>(signature, live)
    }

    /// Borrow a registered system
    pub fn get_specific_system<S: System>(&self) -> EcsResult<&S> {
        self.systems.get::<S>()
    }

    /// Mutably borrow a registered system
    pub fn get_specific_system_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        self.systems.get_mut::<S>()
    }

    /// Entities currently matching a system, in handle order
    pub fn system_entities<S: System>(&self) -> EcsResult<Vec<Entity>> {
        Ok(self.systems.entities_of::<S>()?.iter().copied().collect())
    }

    /// Read-only access to the system manager
    pub fn systems(&self) -> &SystemManager {
        &self.systems
    }

    /// Run one frame: every system updates once, in registration order
    ///
    /// Stops at the first system that returns an error; that system and the
    /// ones before it keep the effects of this frame.
    pub fn update(&mut self, dt: f32) -> EcsResult<()> {
        let mut position = 0;
        while position < self.systems.system_count() {
            if let Some((mut system, entities)) = self.systems.checkout(position) {
                let result = system.update(self, &entities, dt);
                self.systems.checkin(position, system);
                if let Err(err) = result {
                    debug!("system at position {} failed: {}", position, err);
                    return Err(err);
                }
            }
            position += 1;
        }
        Ok(())
    }

    fn check_alive(&self, entity: Entity) -> EcsResult<()> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}
