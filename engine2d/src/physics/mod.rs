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
//! 2D collision and rigid body physics
//!
//! - [`collision`]: OBB, circle-vs-OBB, SAT and swept AABB tests
//! - [`force`]: forces applied by gameplay code
//! - [`system`]: the per-frame [`PhysicsSystem`]

pub mod collision;
pub mod force;
pub mod system;

pub use collision::{Aabb, Contact, Obb};
pub use force::{Force, ForceId, ForceKind, ForceManager};
pub use system::{ContactResponse, PhysicsSystem};
