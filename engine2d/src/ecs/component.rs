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
//! Component storage and management
//!
//! Components are plain data attached to entities. Each component type gets
//! one [`ComponentHandler`], a packed array with entity-to-slot and
//! slot-to-entity maps. The [`ComponentManager`] owns every handler behind the
//! type-erased [`ComponentStore`] trait and assigns each type its signature bit.
//!
//! # Removal policy
//!
//! Handlers stay packed: removing a component moves the last slot into the
//! freed one and updates both index maps for the moved entity in the same
//! call. Slot indices, and any reference into the array, are therefore only
//! valid until the next add or remove of the same component type.

use crate::ecs::entity::{Entity, Signature, MAX_COMPONENTS};
use crate::error::{EcsError, EcsResult};
use log::debug;
use std::any::{Any, TypeId};
use std::collections::HashMap;

/// Trait that all components must implement
///
/// Components are plain data. `Default` gives every type a well-defined
/// empty value for loaders that fill fields one at a time, and `Clone`
/// backs entity cloning.
pub trait Component: 'static + Clone + Default {}

/// Signature bit assigned to a component type at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentType(u8);

impl ComponentType {
    /// Get the bit index in a [`Signature`]
    pub fn bit(&self) -> u8 {
        self.0
    }

    /// Signature with only this component's bit set
    pub fn signature(&self) -> Signature {
        Signature::EMPTY.with(self.0)
    }
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Dense storage for a single component type
pub struct ComponentHandler<T: Component> {
    entity_to_index: HashMap<Entity, usize>,
    index_to_entity: Vec<Entity>,
    components: Vec<T>,
}

impl<T: Component> ComponentHandler<T> {
    /// Create an empty handler
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a handler with room for `capacity` components
    pub fn with_capacity(capacity: usize) -> Self {
        ComponentHandler {
            entity_to_index: HashMap::with_capacity(capacity),
            index_to_entity: Vec::with_capacity(capacity),
            components: Vec::with_capacity(capacity),
        }
    }

    /// Number of stored components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when no component is stored
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Store `component` for `entity` in the next free slot
    pub fn add(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        if self.entity_to_index.contains_key(&entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: short_type_name::<T>(),
            });
        }

        let index = self.components.len();
        self.components.push(component);
        self.entity_to_index.insert(entity, index);
        self.index_to_entity.push(entity);

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());
        Ok(())
    }

    /// Remove and return the entity's component
    pub fn remove(&mut self, entity: Entity) -> EcsResult<T> {
        let index = self
            .entity_to_index
            .remove(&entity)
            .ok_or_else(|| Self::not_found(entity))?;

        let last_index = self.components.len() - 1;
        if index != last_index {
            let moved = self.index_to_entity[last_index];
            self.entity_to_index.insert(moved, index);
        }
        self.index_to_entity.swap_remove(index);
        let component = self.components.swap_remove(index);

        debug_assert_eq!(self.entity_to_index.len(), self.index_to_entity.len());
        debug_assert_eq!(self.entity_to_index.len(), self.components.len());
        Ok(component)
    }

    /// Borrow the entity's component
    pub fn get(&self, entity: Entity) -> EcsResult<&T> {
        let index = self.index_of(entity)?;
        Ok(&self.components[index])
    }

    /// Mutably borrow the entity's component
    pub fn get_mut(&mut self, entity: Entity) -> EcsResult<&mut T> {
        let index = self.index_of(entity)?;
        Ok(&mut self.components[index])
    }

    /// Check whether the entity has a component here
    pub fn has(&self, entity: Entity) -> bool {
        self.entity_to_index.contains_key(&entity)
    }

    /// Entities in slot order
    pub fn entities(&self) -> &[Entity] {
        &self.index_to_entity
    }

    /// The packed component array, in the same order as [`Self::entities`]
    pub fn components(&self) -> &[T] {
        &self.components
    }

    /// Mutable access to the packed component array
    pub fn components_mut(&mut self) -> &mut [T] {
        &mut self.components
    }

    /// Slot currently holding the entity's component
    pub fn index_of(&self, entity: Entity) -> EcsResult<usize> {
        self.entity_to_index
            .get(&entity)
            .copied()
            .ok_or_else(|| Self::not_found(entity))
    }

    fn not_found(entity: Entity) -> EcsError {
        EcsError::ComponentNotFound {
            entity,
            component: short_type_name::<T>(),
        }
    }
}

impl<T: Component> Default for ComponentHandler<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a [`ComponentHandler`]
///
/// Lets the manager broadcast entity-level operations to every handler
/// without knowing the component types.
pub trait ComponentStore: Any {
    /// Short name of the stored component type
    fn component_name(&self) -> &'static str;

    /// Drop the entity's component if present; returns whether one was dropped
    fn entity_removed(&mut self, entity: Entity) -> bool;

    /// Check whether the entity has a component here
    fn has_entity(&self, entity: Entity) -> bool;

    /// Copy `source`'s component to `target`
    fn clone_component(&mut self, source: Entity, target: Entity) -> EcsResult<()>;

    /// Number of stored components
    fn len(&self) -> usize;

    /// True when no component is stored
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentStore for ComponentHandler<T> {
    fn component_name(&self) -> &'static str {
        short_type_name::<T>()
    }

    fn entity_removed(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_ok()
    }

    fn has_entity(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn clone_component(&mut self, source: Entity, target: Entity) -> EcsResult<()> {
        let component = self.get(source)?.clone();
        self.add(target, component)
    }

    fn len(&self) -> usize {
        ComponentHandler::len(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Registry of component handlers, indexed by [`ComponentType`]
pub struct ComponentManager {
    types: HashMap<TypeId, ComponentType>,
    stores: Vec<Box<dyn ComponentStore>>,
    initial_capacity: usize,
}

impl ComponentManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a manager whose handlers preallocate `capacity` slots
    pub fn with_capacity(capacity: usize) -> Self {
        ComponentManager {
            types: HashMap::new(),
            stores: Vec::new(),
            initial_capacity: capacity,
        }
    }

    /// Register a component type and create its handler
    pub fn register_component_handler<T: Component>(&mut self) -> EcsResult<ComponentType> {
        let type_id = TypeId::of::<T>();
        if self.types.contains_key(&type_id) {
            return Err(EcsError::DuplicateRegistration(short_type_name::<T>()));
        }
        if self.stores.len() >= MAX_COMPONENTS {
            return Err(EcsError::TooManyComponentTypes {
                max: MAX_COMPONENTS,
            });
        }

        let component_type = ComponentType(self.stores.len() as u8);
        self.stores
            .push(Box::new(ComponentHandler::<T>::with_capacity(self.initial_capacity)));
        self.types.insert(type_id, component_type);
        debug!(
            "registered component {} as type {}",
            short_type_name::<T>(),
            component_type.bit()
        );
        Ok(component_type)
    }

    /// Number of registered component types
    pub fn registered_count(&self) -> usize {
        self.stores.len()
    }

    /// Signature bit assigned to `T`
    pub fn component_type<T: Component>(&self) -> EcsResult<ComponentType> {
        self.types
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::ComponentNotRegistered(short_type_name::<T>()))
    }

    /// Typed access to `T`'s handler
    pub fn handler<T: Component>(&self) -> EcsResult<&ComponentHandler<T>> {
        let component_type = self.component_type::<T>()?;
        self.stores[component_type.0 as usize]
            .as_any()
            .downcast_ref::<ComponentHandler<T>>()
            .ok_or(EcsError::ComponentNotRegistered(short_type_name::<T>()))
    }

    /// Typed mutable access to `T`'s handler
    pub fn handler_mut<T: Component>(&mut self) -> EcsResult<&mut ComponentHandler<T>> {
        let component_type = self.component_type::<T>()?;
        self.stores[component_type.0 as usize]
            .as_any_mut()
            .downcast_mut::<ComponentHandler<T>>()
            .ok_or(EcsError::ComponentNotRegistered(short_type_name::<T>()))
    }

    /// Add `component` to `entity`
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) -> EcsResult<()> {
        self.handler_mut::<T>()?.add(entity, component)
    }

    /// Remove and return the entity's `T`
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> EcsResult<T> {
        self.handler_mut::<T>()?.remove(entity)
    }

    /// Borrow the entity's `T`
    pub fn get_component<T: Component>(&self, entity: Entity) -> EcsResult<&T> {
        self.handler::<T>()?.get(entity)
    }

    /// Mutably borrow the entity's `T`
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> EcsResult<&mut T> {
        self.handler_mut::<T>()?.get_mut(entity)
    }

    /// Check whether the entity has a `T`; unregistered types report false
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.handler::<T>().map_or(false, |handler| handler.has(entity))
    }

    /// Drop every component the entity owns
    pub fn entity_removed(&mut self, entity: Entity) {
        for store in &mut self.stores {
            store.entity_removed(entity);
        }
    }

    /// Copy every component `source` owns onto `target`
    ///
    /// Returns the signature of the copied component set.
    pub fn clone_components(&mut self, source: Entity, target: Entity) -> EcsResult<Signature> {
        let mut signature = Signature::EMPTY;
        for (bit, store) in self.stores.iter_mut().enumerate() {
            if store.has_entity(source) {
                store.clone_component(source, target)?;
                signature.set(bit as u8);
            }
        }
        Ok(signature)
    }

    /// Rebuild an entity's signature from actual handler membership
    pub fn signature_of(&self, entity: Entity) -> Signature {
        let mut signature = Signature::EMPTY;
        for (bit, store) in self.stores.iter().enumerate() {
            if store.has_entity(entity) {
                signature.set(bit as u8);
            }
        }
        signature
    }

    /// Names of registered component types in bit order
    pub fn component_names(&self) -> Vec<&'static str> {
        self.stores.iter().map(|store| store.component_name()).collect()
    }
}

impl Default for ComponentManager {
    fn default() -> Self {
        Self::new()
    }
}
