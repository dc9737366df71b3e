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
//! # engine2d
//!
//! The core of a small 2D game engine: an Entity Component System with
//! signature-based system routing, plus oriented-box collision and a
//! frame-stepped rigid body system built on top of it.
//!
//! ## Features
//!
//! - **ECS**: packed component storage, bitset signatures, systems that
//!   receive exactly the entities matching their signature
//! - **Collision**: circle-vs-OBB, OBB-vs-OBB (separating axes) and swept AABB
//! - **Physics**: force accumulation, nearest-platform contact response,
//!   damped integration
//! - **Scenes**: versioned JSON save/load of live entities
//!
//! Everything runs single-threaded. Systems update once per frame in the
//! order they were registered.
//!
//! ## Example
//!
//! ```rust
//! use engine2d::config::PhysicsConfig;
//! use engine2d::ecs::components::{register_builtin_components, RigidBody, Transform};
//! use engine2d::physics::PhysicsSystem;
//! use engine2d::Coordinator;
//! use glam::Vec2;
//!
//! let mut coordinator = Coordinator::new();
//! register_builtin_components(&mut coordinator).unwrap();
//! PhysicsSystem::register(&mut coordinator, PhysicsConfig::default()).unwrap();
//!
//! let ball = coordinator.create_entity().unwrap();
//! coordinator.add_component(ball, Transform::new(Vec2::new(0.0, 10.0), Vec2::ONE, 0.0)).unwrap();
//! coordinator.add_component(ball, RigidBody::default()).unwrap();
//!
//! coordinator.update(1.0 / 60.0).unwrap();
//! assert!(coordinator.get_component::<Transform>(ball).unwrap().position.y < 10.0);
//! ```

#![warn(missing_docs)]

/// Engine and physics configuration
pub mod config;

/// Entity Component System implementation
pub mod ecs;

/// Error types
pub mod error;

/// Small 2D vector helpers
pub mod math;

/// Collision detection and rigid body physics
pub mod physics;

/// Scene save/load
pub mod scene;

pub use ecs::{Coordinator, Entity};
pub use error::{EcsError, EcsResult};
