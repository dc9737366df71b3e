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
//! Render layer bookkeeping
//!
//! Layer membership is a side relation keyed by entity handle, never stored
//! inside components, so destroying an entity only requires purging the
//! handle from here.

use crate::ecs::Entity;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maps entities to numbered layers and tracks per-layer visibility
#[derive(Debug, Default, Clone)]
pub struct LayerManager {
    layers: BTreeMap<u32, BTreeSet<Entity>>,
    membership: HashMap<Entity, u32>,
    hidden: BTreeSet<u32>,
}

impl LayerManager {
    /// Create an empty layer table
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `entity` on `layer`, moving it off any previous layer
    pub fn assign(&mut self, entity: Entity, layer: u32) {
        if let Some(previous) = self.membership.insert(entity, layer) {
            self.detach(entity, previous);
        }
        self.layers.entry(layer).or_default().insert(entity);
    }

    /// Take `entity` off its layer; returns the layer it was on
    pub fn remove(&mut self, entity: Entity) -> Option<u32> {
        let layer = self.membership.remove(&entity)?;
        self.detach(entity, layer);
        Some(layer)
    }

    /// Layer the entity is on
    pub fn layer_of(&self, entity: Entity) -> Option<u32> {
        self.membership.get(&entity).copied()
    }

    /// Entities on `layer`, in handle order
    pub fn entities_on(&self, layer: u32) -> impl Iterator<Item = Entity> + '_ {
        self.layers.get(&layer).into_iter().flatten().copied()
    }

    /// Layers that currently have members, in ascending order
    pub fn layers(&self) -> impl Iterator<Item = u32> + '_ {
        self.layers.keys().copied()
    }

    /// Show or hide a layer
    pub fn set_visible(&mut self, layer: u32, visible: bool) {
        if visible {
            self.hidden.remove(&layer);
        } else {
            self.hidden.insert(layer);
        }
    }

    /// Layers are visible unless hidden explicitly
    pub fn is_visible(&self, layer: u32) -> bool {
        !self.hidden.contains(&layer)
    }

    /// Hidden layers in ascending order, whether or not they have members
    pub fn hidden_layers(&self) -> impl Iterator<Item = u32> + '_ {
        self.hidden.iter().copied()
    }

    /// Entities on visible layers, back to front
    pub fn visible_entities(&self) -> Vec<Entity> {
        self.layers
            .iter()
            .filter(|(layer, _)| self.is_visible(**layer))
            .flat_map(|(_, members)| members.iter().copied())
            .collect()
    }

    fn detach(&mut self, entity: Entity, layer: u32) {
        if let Some(members) = self.layers.get_mut(&layer) {
            members.remove(&entity);
            if members.is_empty() {
                self.layers.remove(&layer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_and_move() {
        let mut layers = LayerManager::new();
        let e = Entity::new(1);

        layers.assign(e, 2);
        assert_eq!(layers.layer_of(e), Some(2));
        assert_eq!(layers.entities_on(2).collect::<Vec<_>>(), vec![e]);

        layers.assign(e, 5);
        assert_eq!(layers.layer_of(e), Some(5));
        assert_eq!(layers.entities_on(2).count(), 0);
        assert_eq!(layers.layers().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_remove() {
        let mut layers = LayerManager::new();
        let e = Entity::new(1);
        layers.assign(e, 0);
        assert_eq!(layers.remove(e), Some(0));
        assert_eq!(layers.remove(e), None);
        assert_eq!(layers.layer_of(e), None);
    }

    #[test]
    fn test_visibility() {
        let mut layers = LayerManager::new();
        let background = Entity::new(1);
        let foreground = Entity::new(2);
        layers.assign(background, 0);
        layers.assign(foreground, 1);

        assert_eq!(layers.visible_entities(), vec![background, foreground]);

        layers.set_visible(0, false);
        assert!(!layers.is_visible(0));
        assert_eq!(layers.visible_entities(), vec![foreground]);

        layers.set_visible(0, true);
        assert_eq!(layers.visible_entities().len(), 2);
    }

    #[test]
    fn test_hidden_layers_include_empty_ones() {
        let mut layers = LayerManager::new();
        layers.assign(Entity::new(0), 1);
        layers.set_visible(4, false);
        layers.set_visible(1, false);

        assert_eq!(layers.layers().collect::<Vec<_>>(), vec![1]);
        assert_eq!(layers.hidden_layers().collect::<Vec<_>>(), vec![1, 4]);
    }
}
