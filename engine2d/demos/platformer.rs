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
//! Platformer demo
//!
//! Loads a small level from JSON, pushes the player to the right, and steps
//! the world for three seconds, printing what a renderer would draw.
//!
//! Run with `RUST_LOG=debug cargo run --example platformer` to see engine logs.

use engine2d::config::PhysicsConfig;
use engine2d::ecs::components::{register_builtin_components, Transform};
use engine2d::ecs::{Coordinator, Entity, Signature, System};
use engine2d::physics::{Force, PhysicsSystem};
use engine2d::scene::{self, SceneDocument};
use engine2d::EcsResult;

const LEVEL: &str = r#"{
    "format_version": "1.0.0",
    "entities": [
        { "id": "floor", "layer": 0,
          "transform": { "position": [0.0, 0.0], "scale": [40.0, 2.0] },
          "platform": true },
        { "id": "ramp", "layer": 0,
          "transform": { "position": [28.0, 4.0], "scale": [16.0, 1.0], "orientation": 20.0 },
          "platform": true },
        { "id": "player", "layer": 1,
          "transform": { "position": [-10.0, 1.5] },
          "rigid_body": { "mass": 1.0 } },
        { "id": "crate", "layer": 1,
          "transform": { "position": [5.0, 12.0], "scale": [2.0, 2.0] },
          "rigid_body": { "mass": 4.0 } }
    ],
    "hidden_layers": []
}"#;

// Prints the transforms of every visible entity
struct ConsoleRenderer {
    frame: u64,
}

impl System for ConsoleRenderer {
    fn update(&mut self, coordinator: &mut Coordinator, entities: &[Entity], _dt: f32) -> EcsResult<()> {
        self.frame += 1;
        if self.frame % 30 != 0 {
            return Ok(());
        }

        println!("frame {}", self.frame);
        let visible = coordinator.layers().visible_entities();
        for &entity in entities.iter().filter(|entity| visible.contains(entity)) {
            let transform = coordinator.get_component::<Transform>(entity)?;
            println!(
                "  {:<8} at ({:7.2}, {:7.2})",
                coordinator.entity_id(entity).unwrap_or("?"),
                transform.position.x,
                transform.position.y
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ConsoleRenderer"
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("engine2d - Platformer Demo");
    println!("==========================\n");

    let mut coordinator = Coordinator::new();
    register_builtin_components(&mut coordinator)?;

    // Physics first so the renderer sees this frame's positions
    PhysicsSystem::register(&mut coordinator, PhysicsConfig::default())?;
    coordinator.register_system(ConsoleRenderer { frame: 0 })?;
    let transform_bit = coordinator.component_type::<Transform>()?.bit();
    coordinator.set_system_signature::<ConsoleRenderer>(Signature::EMPTY.with(transform_bit))?;

    let document = SceneDocument::from_json(LEVEL)?;
    let created = scene::load(&mut coordinator, &document)?;
    println!("Loaded {} entities", created.len());

    // Floor and ramp are static; hide them from the console output
    coordinator.layers_mut().set_visible(0, false);

    let player = coordinator
        .entity_from_id("player")
        .ok_or("level has no player")?;
    coordinator
        .get_specific_system_mut::<PhysicsSystem>()?
        .forces_mut()
        .add_force(player, Force::timed(glam::Vec2::new(600.0, 0.0), 1.0));

    for _ in 0..180 {
        coordinator.update(1.0 / 60.0)?;
    }

    println!("\nFinal scene:");
    println!("{}", scene::save(&coordinator).to_json()?);
    Ok(())
}
