//! Entity Component System (ECS) core implementation
//!
//! This module provides the bookkeeping half of the engine:
//! - Entity handles drawn from a fixed pool, with bitset signatures
//! - Packed per-type component storage
//! - Systems that receive exactly the entities matching their signature
//! - The [`Coordinator`] facade that keeps all three consistent

mod component;
mod coordinator;
mod entity;
mod layers;
mod system;

/// Built-in 2D components
pub mod components;

pub use component::{Component, ComponentHandler, ComponentManager, ComponentStore, ComponentType};
pub use coordinator::Coordinator;
pub use entity::{Entity, EntityManager, Signature, MAX_COMPONENTS, MAX_ENTITIES};
pub use layers::LayerManager;
pub use system::{System, SystemAny, SystemManager};
