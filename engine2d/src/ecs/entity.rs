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
//! Entity management
//!
//! Entities are plain integer handles drawn from a fixed-size pool. The
//! [`EntityManager`] recycles handles through a free queue and stores one
//! component [`Signature`] per handle.

use crate::error::{EcsError, EcsResult};
use log::trace;
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// Default size of the entity pool
pub const MAX_ENTITIES: usize = 5000;

/// Number of distinct component types a signature can describe
pub const MAX_COMPONENTS: usize = 64;

/// Opaque entity handle
///
/// Identity only: the value is an index into the entity pool and may be
/// reused after the entity is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// Create an entity handle from a raw pool index
    pub fn new(id: u32) -> Self {
        Entity(id)
    }

    /// Get the raw pool index
    pub fn raw(&self) -> u32 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Component-presence bitset
///
/// Bit `i` is set when the entity owns the component registered as
/// component type `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Signature(u64);

impl Signature {
    /// The empty signature
    pub const EMPTY: Signature = Signature(0);

    /// Create a signature from raw bits
    pub fn from_bits(bits: u64) -> Self {
        Signature(bits)
    }

    /// Get the raw bits
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Set the bit for a component type
    pub fn set(&mut self, bit: u8) {
        debug_assert!((bit as usize) < MAX_COMPONENTS);
        self.0 |= 1u64 << bit;
    }

    /// Clear the bit for a component type
    pub fn clear(&mut self, bit: u8) {
        debug_assert!((bit as usize) < MAX_COMPONENTS);
        self.0 &= !(1u64 << bit);
    }

    /// Check whether the bit for a component type is set
    pub fn test(&self, bit: u8) -> bool {
        (bit as usize) < MAX_COMPONENTS && self.0 & (1u64 << bit) != 0
    }

    /// Builder-style variant of [`Signature::set`]
    pub fn with(mut self, bit: u8) -> Self {
        self.set(bit);
        self
    }

    /// True when every bit of `required` is also set in `self`
    pub fn contains(&self, required: Signature) -> bool {
        self.0 & required.0 == required.0
    }

    /// True when no bit is set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Issues and recycles entity handles and stores their signatures
///
/// Liveness is tracked explicitly, so a freshly created entity with no
/// components is live and destroying an already destroyed entity is
/// rejected rather than pushing a duplicate handle onto the free queue.
pub struct EntityManager {
    available: VecDeque<Entity>,
    signatures: Vec<Signature>,
    alive: Vec<bool>,
    live_count: usize,
    ids: HashMap<String, Entity>,
    names: HashMap<Entity, String>,
}

impl EntityManager {
    /// Create a manager with the default pool size
    pub fn new() -> Self {
        Self::with_capacity(MAX_ENTITIES)
    }

    /// Create a manager whose pool holds `capacity` entities
    pub fn with_capacity(capacity: usize) -> Self {
        EntityManager {
            available: (0..capacity as u32).map(Entity::new).collect(),
            signatures: vec![Signature::EMPTY; capacity],
            alive: vec![false; capacity],
            live_count: 0,
            ids: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Size of the entity pool
    pub fn capacity(&self) -> usize {
        self.signatures.len()
    }

    /// Number of live entities
    pub fn live_count(&self) -> usize {
        self.live_count
    }

    /// Number of handles still available
    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    /// Take a handle from the free queue
    pub fn create_entity(&mut self) -> EcsResult<Entity> {
        if self.live_count >= self.capacity() {
            return Err(EcsError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        let entity = self.available.pop_front().ok_or(EcsError::CapacityExceeded {
            capacity: self.capacity(),
        })?;
        self.alive[entity.index()] = true;
        self.live_count += 1;
        trace!("created {}", entity);
        Ok(entity)
    }

    /// Clear the entity's signature and return its handle to the pool
    ///
    /// Components are not touched here; the coordinator cascades the
    /// removal to component and system managers.
    pub fn destroy_entity(&mut self, entity: Entity) -> EcsResult<()> {
        self.check_alive(entity)?;
        self.signatures[entity.index()] = Signature::EMPTY;
        self.alive[entity.index()] = false;
        if let Some(id) = self.names.remove(&entity) {
            self.ids.remove(&id);
        }
        self.available.push_back(entity);
        self.live_count -= 1;
        trace!("destroyed {}", entity);
        Ok(())
    }

    /// Check whether a handle refers to a live entity
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.get(entity.index()).copied().unwrap_or(false)
    }

    /// Get the signature of a live entity
    pub fn signature(&self, entity: Entity) -> EcsResult<Signature> {
        self.check_alive(entity)?;
        Ok(self.signatures[entity.index()])
    }

    /// OR `bits` into the entity's signature, returning the result
    pub fn set_signature(&mut self, entity: Entity, bits: Signature) -> EcsResult<Signature> {
        self.check_alive(entity)?;
        let signature = &mut self.signatures[entity.index()];
        signature.0 |= bits.0;
        Ok(*signature)
    }

    /// Clear `bits` from the entity's signature, returning the result
    pub fn rmv_signature(&mut self, entity: Entity, bits: Signature) -> EcsResult<Signature> {
        self.check_alive(entity)?;
        let signature = &mut self.signatures[entity.index()];
        signature.0 &= !bits.0;
        Ok(*signature)
    }

    /// All live entities in ascending handle order
    ///
    /// Linear in the pool size, which is fixed and small.
    pub fn live_entities(&self) -> Vec<Entity> {
        self.alive
            .iter()
            .enumerate()
            .filter(|(_, alive)| **alive)
            .map(|(index, _)| Entity::new(index as u32))
            .collect()
    }

    /// Associate a human-readable ID with a live entity
    ///
    /// Replaces any ID the entity had before. Fails if another live entity
    /// already uses `id`.
    pub fn set_entity_id(&mut self, entity: Entity, id: &str) -> EcsResult<()> {
        self.check_alive(entity)?;
        match self.ids.get(id) {
            Some(owner) if *owner != entity => {
                return Err(EcsError::DuplicateEntityId(id.to_string()));
            }
            Some(_) => return Ok(()),
            None => {}
        }
        if let Some(previous) = self.names.insert(entity, id.to_string()) {
            self.ids.remove(&previous);
        }
        self.ids.insert(id.to_string(), entity);
        Ok(())
    }

    /// Look up an entity by its human-readable ID
    pub fn entity_from_id(&self, id: &str) -> Option<Entity> {
        self.ids.get(id).copied()
    }

    /// Get the human-readable ID of an entity, if it has one
    pub fn entity_id(&self, entity: Entity) -> Option<&str> {
        self.names.get(&entity).map(String::as_str)
    }

    fn check_alive(&self, entity: Entity) -> EcsResult<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::InvalidEntity(entity))
        }
    }
}

impl Default for EntityManager {
    fn default() -> Self {
        Self::new()
    }
}
