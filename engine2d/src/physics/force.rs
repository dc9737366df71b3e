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
//! Applied forces
//!
//! Gameplay code registers forces against entities here; the physics system
//! drains them once per frame through [`ForceManager::accumulate`].
//!
//! # Logging
//!
//! Invalid forces and clamped totals are reported through `log::warn!` when
//! `warn_on_invalid` is set.

use crate::ecs::Entity;
use glam::Vec2;
use log::warn;
use std::collections::HashMap;

/// How long a force stays registered
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ForceKind {
    /// Applied every frame until removed
    Constant,
    /// Applied every active frame until `lifetime` seconds have elapsed
    Timed {
        /// Total active time in seconds
        lifetime: f32,
    },
    /// Applied once, on the next frame it is active
    Impulse,
}

/// A force vector registered against one entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Force {
    /// Force vector
    pub vector: Vec2,
    /// Expiry policy
    pub kind: ForceKind,
    /// Inactive forces are kept but not applied
    pub active: bool,
    age: f32,
}

impl Force {
    /// Create an active force
    pub fn new(vector: Vec2, kind: ForceKind) -> Self {
        Force {
            vector,
            kind,
            active: true,
            age: 0.0,
        }
    }

    /// Force applied until removed
    pub fn constant(vector: Vec2) -> Self {
        Self::new(vector, ForceKind::Constant)
    }

    /// Force applied for `lifetime` seconds
    pub fn timed(vector: Vec2, lifetime: f32) -> Self {
        Self::new(vector, ForceKind::Timed { lifetime })
    }

    /// Force applied for a single frame
    pub fn impulse(vector: Vec2) -> Self {
        Self::new(vector, ForceKind::Impulse)
    }

    /// Check if the force is valid (all components finite)
    pub fn is_valid(&self) -> bool {
        self.vector.is_finite()
    }

    /// Active time elapsed so far
    pub fn age(&self) -> f32 {
        self.age
    }

    /// Advance the force's clock, returning false once it has expired
    fn tick(&mut self, dt: f32) -> bool {
        match self.kind {
            ForceKind::Constant => true,
            ForceKind::Impulse => false,
            ForceKind::Timed { lifetime } => {
                self.age += dt;
                self.age < lifetime
            }
        }
    }
}

/// Handle to a registered force
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ForceId(u64);

/// Per-entity registry of applied forces
pub struct ForceManager {
    forces: HashMap<Entity, Vec<(ForceId, Force)>>,
    next_id: u64,
    /// Limit on the magnitude of one entity's summed forces
    pub max_force_magnitude: f32,
    /// Whether to log warnings for skipped or clamped forces
    pub warn_on_invalid: bool,
}

impl ForceManager {
    /// Create an empty manager
    pub fn new() -> Self {
        ForceManager {
            forces: HashMap::new(),
            next_id: 0,
            max_force_magnitude: 1e6,
            warn_on_invalid: true,
        }
    }

    /// Register a force against an entity
    pub fn add_force(&mut self, entity: Entity, force: Force) -> ForceId {
        let id = ForceId(self.next_id);
        self.next_id += 1;
        self.forces.entry(entity).or_default().push((id, force));
        id
    }

    /// Remove a force, returning it if it was still registered
    pub fn remove_force(&mut self, entity: Entity, id: ForceId) -> Option<Force> {
        let forces = self.forces.get_mut(&entity)?;
        let position = forces.iter().position(|(fid, _)| *fid == id)?;
        let (_, force) = forces.remove(position);
        if forces.is_empty() {
            self.forces.remove(&entity);
        }
        Some(force)
    }

    /// Toggle a force; returns false if it is no longer registered
    pub fn set_active(&mut self, entity: Entity, id: ForceId, active: bool) -> bool {
        match self.force_mut(entity, id) {
            Some(force) => {
                force.active = active;
                true
            }
            None => false,
        }
    }

    /// Look up a registered force
    pub fn force(&self, entity: Entity, id: ForceId) -> Option<&Force> {
        self.forces
            .get(&entity)?
            .iter()
            .find(|(fid, _)| *fid == id)
            .map(|(_, force)| force)
    }

    fn force_mut(&mut self, entity: Entity, id: ForceId) -> Option<&mut Force> {
        self.forces
            .get_mut(&entity)?
            .iter_mut()
            .find(|(fid, _)| *fid == id)
            .map(|(_, force)| force)
    }

    /// Drop every force registered against an entity
    pub fn clear_entity(&mut self, entity: Entity) {
        self.forces.remove(&entity);
    }

    /// Drop every force
    pub fn clear(&mut self) {
        self.forces.clear();
    }

    /// Number of forces registered against an entity
    pub fn force_count(&self, entity: Entity) -> usize {
        self.forces.get(&entity).map_or(0, Vec::len)
    }

    /// Age the forces of every entity not in `applied`, without applying them
    ///
    /// `applied` must be sorted. Impulses and timed forces past their
    /// lifetime are dropped so they cannot fire in a later frame.
    pub fn expire_unapplied(&mut self, applied: &[Entity], dt: f32) {
        self.forces.retain(|entity, forces| {
            if applied.binary_search(entity).is_ok() {
                return true;
            }
            forces.retain_mut(|(_, force)| !force.active || force.tick(dt));
            !forces.is_empty()
        });
    }

    /// Sum the entity's active forces for one frame
    ///
    /// Invalid forces are skipped. Active forces then age by `dt`: impulses
    /// and timed forces past their lifetime are dropped. The sum is clamped to
    /// `max_force_magnitude`.
    pub fn accumulate(&mut self, entity: Entity, dt: f32) -> Vec2 {
        let Some(forces) = self.forces.get_mut(&entity) else {
            return Vec2::ZERO;
        };

        let mut total = Vec2::ZERO;
        let warn_on_invalid = self.warn_on_invalid;
        forces.retain_mut(|(_, force)| {
            if !force.active {
                return true;
            }
            if force.is_valid() {
                total += force.vector;
            } else if warn_on_invalid {
                warn!("Skipping invalid force (NaN/Inf) for {:?}", entity);
            }
            force.tick(dt)
        });
        if forces.is_empty() {
            self.forces.remove(&entity);
        }

        let magnitude = total.length();
        if magnitude > self.max_force_magnitude {
            if self.warn_on_invalid {
                warn!(
                    "Total force magnitude {:.2e} exceeds limit {:.2e} for {:?}",
                    magnitude, self.max_force_magnitude, entity
                );
            }
            total *= self.max_force_magnitude / magnitude;
        }
        total
    }
}

impl Default for ForceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_forces_sum() {
        let mut manager = ForceManager::new();
        let e = Entity::new(1);
        manager.add_force(e, Force::constant(Vec2::new(1.0, 0.0)));
        manager.add_force(e, Force::constant(Vec2::new(0.0, 2.0)));

        assert_eq!(manager.accumulate(e, 0.1), Vec2::new(1.0, 2.0));
        assert_eq!(manager.accumulate(e, 0.1), Vec2::new(1.0, 2.0));
        assert_eq!(manager.force_count(e), 2);
    }

    #[test]
    fn test_unknown_entity_has_no_force() {
        let mut manager = ForceManager::new();
        assert_eq!(manager.accumulate(Entity::new(3), 0.1), Vec2::ZERO);
    }

    #[test]
    fn test_impulse_applies_once() {
        let mut manager = ForceManager::new();
        let e = Entity::new(0);
        manager.add_force(e, Force::impulse(Vec2::new(5.0, 0.0)));

        assert_eq!(manager.accumulate(e, 0.1), Vec2::new(5.0, 0.0));
        assert_eq!(manager.accumulate(e, 0.1), Vec2::ZERO);
        assert_eq!(manager.force_count(e), 0);
    }

    #[test]
    fn test_timed_force_expires() {
        let mut manager = ForceManager::new();
        let e = Entity::new(0);
        let id = manager.add_force(e, Force::timed(Vec2::X, 0.25));

        assert_eq!(manager.accumulate(e, 0.1), Vec2::X);
        assert_eq!(manager.accumulate(e, 0.1), Vec2::X);
        assert!((manager.force(e, id).unwrap().age() - 0.2).abs() < 1e-6);
        assert_eq!(manager.accumulate(e, 0.1), Vec2::X);
        assert!(manager.force(e, id).is_none());
        assert_eq!(manager.accumulate(e, 0.1), Vec2::ZERO);
    }

    #[test]
    fn test_inactive_force_is_kept_but_not_applied() {
        let mut manager = ForceManager::new();
        let e = Entity::new(0);
        let id = manager.add_force(e, Force::impulse(Vec2::Y));
        assert!(manager.set_active(e, id, false));

        assert_eq!(manager.accumulate(e, 0.1), Vec2::ZERO);
        assert_eq!(manager.force_count(e), 1);

        manager.set_active(e, id, true);
        assert_eq!(manager.accumulate(e, 0.1), Vec2::Y);
        assert!(!manager.set_active(e, id, true));
    }

    #[test]
    fn test_invalid_force_skipped() {
        let mut manager = ForceManager::new();
        manager.warn_on_invalid = false;
        let e = Entity::new(0);
        manager.add_force(e, Force::constant(Vec2::new(f32::NAN, 0.0)));
        manager.add_force(e, Force::constant(Vec2::new(2.0, 0.0)));

        assert_eq!(manager.accumulate(e, 0.1), Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_total_is_clamped() {
        let mut manager = ForceManager::new();
        manager.max_force_magnitude = 10.0;
        manager.warn_on_invalid = false;
        let e = Entity::new(0);
        manager.add_force(e, Force::constant(Vec2::new(30.0, 40.0)));

        let total = manager.accumulate(e, 0.1);
        assert!((total.length() - 10.0).abs() < 1e-4);
        assert!((total.x - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut manager = ForceManager::new();
        let a = Entity::new(0);
        let b = Entity::new(1);
        let id = manager.add_force(a, Force::constant(Vec2::X));
        manager.add_force(b, Force::constant(Vec2::Y));

        assert_eq!(manager.remove_force(a, id), Some(Force::constant(Vec2::X)));
        assert_eq!(manager.remove_force(a, id), None);
        assert_eq!(manager.force_count(a), 0);

        manager.clear_entity(b);
        assert_eq!(manager.force_count(b), 0);
    }

    #[test]
    fn test_expire_unapplied_skips_applied_entities() {
        let mut manager = ForceManager::new();
        let stepped = Entity::new(1);
        let skipped = Entity::new(2);
        manager.add_force(stepped, Force::impulse(Vec2::X));
        manager.add_force(skipped, Force::impulse(Vec2::X));
        manager.add_force(skipped, Force::constant(Vec2::Y));
        let paused = manager.add_force(skipped, Force::impulse(Vec2::Y));
        manager.set_active(skipped, paused, false);

        manager.expire_unapplied(&[stepped], 0.1);

        assert_eq!(manager.force_count(stepped), 1);
        assert_eq!(manager.force_count(skipped), 2);
        assert!(manager.force(skipped, paused).is_some());
        assert_eq!(manager.accumulate(stepped, 0.1), Vec2::X);
    }

    #[test]
    fn test_ids_are_unique_across_entities() {
        let mut manager = ForceManager::new();
        let a = manager.add_force(Entity::new(0), Force::constant(Vec2::X));
        let b = manager.add_force(Entity::new(1), Force::constant(Vec2::X));
        assert_ne!(a, b);
        assert!(manager.force(Entity::new(1), a).is_none());
    }
}
