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
//! System registration and signature-based entity routing
//!
//! Systems hold logic and declare the component [`Signature`] an entity
//! must carry to be handed to them. The [`SystemManager`] keeps every
//! system's matching entity set current by re-evaluating membership on each
//! signature change, so no per-frame scan is ever needed.
//!
//! Systems run in registration order. Dependencies between systems (physics
//! writing transforms before a renderer reads them) are expressed purely by
//! registering them in that order.

use crate::ecs::component::short_type_name;
use crate::ecs::entity::{Entity, Signature};
use crate::ecs::Coordinator;
use crate::error::{EcsError, EcsResult};
use log::debug;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};

/// Downcast support for systems, implemented for every [`System`]
pub trait SystemAny {
    /// Borrow as `Any`
    fn as_any(&self) -> &dyn Any;

    /// Mutably borrow as `Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: System> SystemAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-frame logic operating on the entities that match its signature
pub trait System: SystemAny + 'static {
    /// Run one frame
    ///
    /// `entities` is the system's matching set as of the start of the call,
    /// in ascending handle order. The coordinator may be mutated freely;
    /// membership changes take effect for the next frame.
    fn update(&mut self, coordinator: &mut Coordinator, entities: &[Entity], dt: f32)
        -> EcsResult<()>;

    /// Called when an entity is destroyed so the system can purge side data
    fn entity_destroyed(&mut self, _entity: Entity) {}

    /// Get the name of this system for debugging
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

struct SystemSlot {
    name: &'static str,
    system: Option<Box<dyn System>>,
    // None until set; an unset system matches nothing
    signature: Option<Signature>,
    entities: BTreeSet<Entity>,
    // Entities destroyed while the system was checked out
    missed_destroys: Vec<Entity>,
}

/// Registry of systems and their matching entity sets
pub struct SystemManager {
    index: HashMap<TypeId, usize>,
    slots: Vec<SystemSlot>,
}

impl SystemManager {
    /// Create an empty manager
    pub fn new() -> Self {
        SystemManager {
            index: HashMap::new(),
            slots: Vec::new(),
        }
    }

    /// Register a system; it runs after every system registered before it
    ///
    /// The system matches nothing until its signature is set.
    pub fn register_system<S: System>(&mut self, system: S) -> EcsResult<usize> {
        let type_id = TypeId::of::<S>();
        let name = short_type_name::<S>();
        if self.index.contains_key(&type_id) {
            return Err(EcsError::DuplicateRegistration(name));
        }

        let slot = self.slots.len();
        self.slots.push(SystemSlot {
            name,
            system: Some(Box::new(system)),
            signature: None,
            entities: BTreeSet::new(),
            missed_destroys: Vec::new(),
        });
        self.index.insert(type_id, slot);
        debug!("registered system {} at position {}", name, slot);
        Ok(slot)
    }

    /// Set the required signature of `S` and rebuild its entity set
    ///
    /// `live` supplies the current signature of every live entity. An empty
    /// requirement matches every live entity, including component-less ones.
    pub fn set_system_signature<S: System, I>(&mut self, signature: Signature, live: I) -> EcsResult<()>
    where
        I: IntoIterator<Item = (Entity, Signature)>,
    {
        let slot = self.slot_index::<S>()?;
        let slot = &mut self.slots[slot];
        slot.signature = Some(signature);
        slot.entities = live
            .into_iter()
            .filter(|(_, entity_sig)| entity_sig.contains(signature))
            .map(|(entity, _)| entity)
            .collect();
        Ok(())
    }

    /// Required signature of `S`, `None` while unset
    pub fn system_signature<S: System>(&self) -> EcsResult<Option<Signature>> {
        Ok(self.slots[self.slot_index::<S>()?].signature)
    }

    /// Re-evaluate the entity's membership in every system
    pub fn entity_sig_change(&mut self, entity: Entity, signature: Signature) {
        for slot in &mut self.slots {
            let Some(required) = slot.signature else {
                continue;
            };
            if signature.contains(required) {
                slot.entities.insert(entity);
            } else {
                slot.entities.remove(&entity);
            }
        }
    }

    /// Drop the entity from every system and let systems purge side data
    pub fn entity_removed(&mut self, entity: Entity) {
        for slot in &mut self.slots {
            slot.entities.remove(&entity);
            match slot.system.as_mut() {
                Some(system) => system.entity_destroyed(entity),
                None => slot.missed_destroys.push(entity),
            }
        }
    }

    /// Entities currently matching `S`
    pub fn entities_of<S: System>(&self) -> EcsResult<&BTreeSet<Entity>> {
        Ok(&self.slots[self.slot_index::<S>()?].entities)
    }

    /// Borrow the registered `S`
    pub fn get<S: System>(&self) -> EcsResult<&S> {
        let slot = &self.slots[self.slot_index::<S>()?];
        slot.system
            .as_ref()
            .ok_or(EcsError::SystemBusy(slot.name))?
            .as_any()
            .downcast_ref::<S>()
            .ok_or(EcsError::SystemNotFound(slot.name))
    }

    /// Mutably borrow the registered `S`
    pub fn get_mut<S: System>(&mut self) -> EcsResult<&mut S> {
        let index = self.slot_index::<S>()?;
        let slot = &mut self.slots[index];
        let name = slot.name;
        slot.system
            .as_mut()
            .ok_or(EcsError::SystemBusy(name))?
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or(EcsError::SystemNotFound(name))
    }

    /// Number of registered systems
    pub fn system_count(&self) -> usize {
        self.slots.len()
    }

    /// System names in execution order
    pub fn system_names(&self) -> Vec<&'static str> {
        self.slots.iter().map(|slot| slot.name).collect()
    }

    /// Take the system at `position` out of its slot for an update
    ///
    /// The slot keeps its signature and entity set, so membership stays
    /// current while the system runs.
    pub(crate) fn checkout(&mut self, position: usize) -> Option<(Box<dyn System>, Vec<Entity>)> {
        let slot = self.slots.get_mut(position)?;
        let system = slot.system.take()?;
        Some((system, slot.entities.iter().copied().collect()))
    }

    /// Put a system taken by [`Self::checkout`] back
    ///
    /// Destroy notifications that arrived while it was out are delivered now.
    pub(crate) fn checkin(&mut self, position: usize, mut system: Box<dyn System>) {
        if let Some(slot) = self.slots.get_mut(position) {
            for entity in slot.missed_destroys.drain(..) {
                system.entity_destroyed(entity);
            }
            slot.system = Some(system);
        }
    }

    fn slot_index<S: System>(&self) -> EcsResult<usize> {
        self.index
            .get(&TypeId::of::<S>())
            .copied()
            .ok_or(EcsError::SystemNotFound(short_type_name::<S>()))
    }
}

impl Default for SystemManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestSystem {
        run_count: usize,
        destroyed: Vec<Entity>,
    }

    impl TestSystem {
        fn new() -> Self {
            TestSystem {
                run_count: 0,
                destroyed: Vec::new(),
            }
        }
    }

    impl System for TestSystem {
        fn update(&mut self, _coordinator: &mut Coordinator, _entities: &[Entity], _dt: f32) -> EcsResult<()> {
            self.run_count += 1;
            Ok(())
        }

        fn entity_destroyed(&mut self, entity: Entity) {
            self.destroyed.push(entity);
        }
    }

    struct OtherSystem;

    impl System for OtherSystem {
        fn update(&mut self, _coordinator: &mut Coordinator, _entities: &[Entity], _dt: f32) -> EcsResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_register_system() {
        let mut manager = SystemManager::new();
        assert_eq!(manager.register_system(TestSystem::new()).unwrap(), 0);
        assert_eq!(manager.register_system(OtherSystem).unwrap(), 1);
        assert_eq!(manager.system_count(), 2);
        assert_eq!(manager.system_names(), vec!["TestSystem", "OtherSystem"]);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut manager = SystemManager::new();
        manager.register_system(OtherSystem).unwrap();
        assert_eq!(
            manager.register_system(OtherSystem),
            Err(EcsError::DuplicateRegistration("OtherSystem"))
        );
    }

    #[test]
    fn test_unregistered_system() {
        let manager = SystemManager::new();
        assert!(matches!(
            manager.get::<OtherSystem>(),
            Err(EcsError::SystemNotFound("OtherSystem"))
        ));
    }

    #[test]
    fn test_signature_membership() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();
        let required = Signature::EMPTY.with(0).with(2);
        manager
            .set_system_signature::<TestSystem, _>(required, Vec::new())
            .unwrap();

        let e = Entity::new(4);
        manager.entity_sig_change(e, Signature::EMPTY.with(0));
        assert!(manager.entities_of::<TestSystem>().unwrap().is_empty());

        manager.entity_sig_change(e, Signature::EMPTY.with(0).with(1).with(2));
        assert!(manager.entities_of::<TestSystem>().unwrap().contains(&e));

        manager.entity_sig_change(e, Signature::EMPTY.with(2));
        assert!(!manager.entities_of::<TestSystem>().unwrap().contains(&e));
    }

    #[test]
    fn test_unset_signature_matches_nothing() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();
        assert_eq!(manager.system_signature::<TestSystem>().unwrap(), None);

        manager.entity_sig_change(Entity::new(3), Signature::EMPTY.with(0));
        manager.entity_sig_change(Entity::new(4), Signature::EMPTY);
        assert!(manager.entities_of::<TestSystem>().unwrap().is_empty());
    }

    #[test]
    fn test_empty_signature_matches_everything() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();
        let live = vec![(Entity::new(0), Signature::EMPTY)];
        manager
            .set_system_signature::<TestSystem, _>(Signature::EMPTY, live)
            .unwrap();
        assert_eq!(
            manager.system_signature::<TestSystem>().unwrap(),
            Some(Signature::EMPTY)
        );

        manager.entity_sig_change(Entity::new(1), Signature::EMPTY);
        manager.entity_sig_change(Entity::new(2), Signature::EMPTY.with(5));
        let entities: Vec<Entity> = manager.entities_of::<TestSystem>().unwrap().iter().copied().collect();
        assert_eq!(entities, vec![Entity::new(0), Entity::new(1), Entity::new(2)]);
    }

    #[test]
    fn test_set_signature_rebuilds_from_live_entities() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();

        let live = vec![
            (Entity::new(0), Signature::EMPTY.with(1)),
            (Entity::new(1), Signature::EMPTY.with(0)),
            (Entity::new(2), Signature::EMPTY.with(0).with(1)),
        ];
        manager
            .set_system_signature::<TestSystem, _>(Signature::EMPTY.with(1), live)
            .unwrap();

        let entities: Vec<Entity> = manager.entities_of::<TestSystem>().unwrap().iter().copied().collect();
        assert_eq!(entities, vec![Entity::new(0), Entity::new(2)]);
    }

    #[test]
    fn test_entity_removed_notifies_systems() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();
        manager
            .set_system_signature::<TestSystem, _>(Signature::EMPTY, Vec::new())
            .unwrap();
        let e = Entity::new(1);
        manager.entity_sig_change(e, Signature::EMPTY.with(0));
        assert!(manager.entities_of::<TestSystem>().unwrap().contains(&e));

        manager.entity_removed(e);
        assert!(manager.entities_of::<TestSystem>().unwrap().is_empty());
        assert_eq!(manager.get::<TestSystem>().unwrap().destroyed, vec![e]);
    }

    #[test]
    fn test_checked_out_system_is_busy() {
        let mut manager = SystemManager::new();
        manager.register_system(TestSystem::new()).unwrap();
        manager
            .set_system_signature::<TestSystem, _>(Signature::EMPTY.with(0), Vec::new())
            .unwrap();

        let (system, _) = manager.checkout(0).unwrap();
        assert!(matches!(manager.get::<TestSystem>(), Err(EcsError::SystemBusy(_))));

        // Membership is still tracked while checked out
        manager.entity_sig_change(Entity::new(3), Signature::EMPTY.with(0));
        assert_eq!(manager.entities_of::<TestSystem>().unwrap().len(), 1);

        manager.checkin(0, system);
        assert_eq!(manager.get::<TestSystem>().unwrap().run_count, 0);
    }
}
