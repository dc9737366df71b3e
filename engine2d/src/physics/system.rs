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
//! Per-frame rigid body simulation
//!
//! Each frame, for every entity carrying a [`Transform`] and a [`RigidBody`]
//! (platforms excluded):
//!
//! 1. gravity (`mass * gravity_scale * dt`) and applied forces (`F * dt`) are
//!    summed into the body's accumulated force;
//! 2. the platform whose center is nearest to the body is selected, the
//!    first one found winning ties;
//! 3. the body, as a circle of radius `scale.x / 2`, is tested against that
//!    platform's OBB and the contact is resolved;
//! 4. the body is integrated and its accumulated force reset.
//!
//! Only one platform is considered per body per frame. A body touching two
//! platforms at once resolves against the nearer one only.
//!
//! Entities that are not stepped in a frame (no `RigidBody`, platforms,
//! non-finite state) still age their applied forces: impulses and expired
//! timed forces are dropped without being applied. Constant forces stay.

use crate::config::PhysicsConfig;
use crate::ecs::components::{Platform, RigidBody, Transform};
use crate::ecs::{Coordinator, Entity, Signature, System};
use crate::error::EcsResult;
use crate::math::{approx_eq, UP};
use crate::physics::collision::{check_circle_obb_collision, Contact, Obb};
use crate::physics::force::ForceManager;
use glam::Vec2;
use log::{trace, warn};

/// Outcome of resolving a contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactResponse {
    /// The body pushed straight into the surface; its force was cancelled
    Flush,
    /// The body met the surface at an angle and its force now runs along it
    Slope {
        /// Angle in radians between the body's direction and the inverted normal
        angle: f32,
        /// Magnitude of the redirected force
        resultant: f32,
    },
}

/// Force accumulation, platform contact and integration
pub struct PhysicsSystem {
    config: PhysicsConfig,
    forces: ForceManager,
}

impl PhysicsSystem {
    /// Create a physics system
    pub fn new(config: PhysicsConfig) -> Self {
        let mut forces = ForceManager::new();
        forces.max_force_magnitude = config.max_force_magnitude;
        forces.warn_on_invalid = config.warn_on_invalid_forces;
        PhysicsSystem { config, forces }
    }

    /// Register a physics system matching every `Transform + RigidBody` entity
    ///
    /// Both component types must already be registered.
    pub fn register(coordinator: &mut Coordinator, config: PhysicsConfig) -> EcsResult<()> {
        let signature = Signature::EMPTY
            .with(coordinator.component_type::<Transform>()?.bit())
            .with(coordinator.component_type::<RigidBody>()?.bit());
        coordinator.register_system(PhysicsSystem::new(config))?;
        coordinator.set_system_signature::<PhysicsSystem>(signature)
    }

    /// Active configuration
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Forces applied by gameplay code
    pub fn forces(&self) -> &ForceManager {
        &self.forces
    }

    /// Mutable access to applied forces
    pub fn forces_mut(&mut self) -> &mut ForceManager {
        &mut self.forces
    }

    fn step_body(
        &mut self,
        entity: Entity,
        transform: &mut Transform,
        body: &mut RigidBody,
        platforms: &[(Entity, Transform)],
        dt: f32,
    ) {
        let applied = self.forces.accumulate(entity, dt);
        body.accumulated_force += body.gravity_scale * body.mass * dt + applied * dt;
        body.accumulated_force = body
            .accumulated_force
            .clamp_length_max(body.max_accumulated_force.abs());

        if let Some((platform, platform_transform)) = closest_platform(transform.position, platforms) {
            let obb = Obb::from_transform(platform_transform);
            if let Some(contact) =
                check_circle_obb_collision(transform.position, transform.radius(), &obb)
            {
                let response =
                    respond_to_contact(body, transform, &contact, self.config.direction_epsilon);
                trace!("{} contacts {}: {:?}", entity, platform, response);
            }
        }

        integrate(body, transform, self.config.damping, dt);
    }
}

impl System for PhysicsSystem {
    fn update(&mut self, coordinator: &mut Coordinator, entities: &[Entity], dt: f32) -> EcsResult<()> {
        let platforms: Vec<(Entity, Transform)> = match coordinator.components().handler::<Platform>() {
            Ok(handler) => handler
                .entities()
                .iter()
                .filter_map(|&platform| {
                    coordinator
                        .get_component::<Transform>(platform)
                        .ok()
                        .map(|transform| (platform, *transform))
                })
                .collect(),
            Err(_) => Vec::new(),
        };

        let mut stepped = Vec::with_capacity(entities.len());
        for &entity in entities {
            if coordinator.has_component::<Platform>(entity) {
                continue;
            }

            let (mut transform, mut body) = match (
                coordinator.get_component::<Transform>(entity),
                coordinator.get_component::<RigidBody>(entity),
            ) {
                (Ok(transform), Ok(body)) => (*transform, *body),
                _ => {
                    if self.config.warn_on_missing_components {
                        warn!("{} is missing Transform or RigidBody, skipping", entity);
                    }
                    continue;
                }
            };

            if !transform.is_valid() || !body.is_valid() {
                if self.config.warn_on_missing_components {
                    warn!("{} has non-finite physics state, skipping", entity);
                }
                continue;
            }

            self.step_body(entity, &mut transform, &mut body, &platforms, dt);

            *coordinator.get_component_mut::<Transform>(entity)? = transform;
            *coordinator.get_component_mut::<RigidBody>(entity)? = body;
            stepped.push(entity);
        }

        // `entities` is ascending, so `stepped` is too
        self.forces.expire_unapplied(&stepped, dt);
        Ok(())
    }

    fn entity_destroyed(&mut self, entity: Entity) {
        self.forces.clear_entity(entity);
    }

    fn name(&self) -> &str {
        "PhysicsSystem"
    }
}

/// Platform whose center is nearest to `position`
///
/// Linear scan; on equal distances the earliest candidate wins.
pub fn closest_platform(
    position: Vec2,
    platforms: &[(Entity, Transform)],
) -> Option<(Entity, &Transform)> {
    let mut best: Option<(Entity, &Transform, f32)> = None;
    for (entity, transform) in platforms {
        let distance = position.distance_squared(transform.position);
        if best.map_or(true, |(_, _, nearest)| distance < nearest) {
            best = Some((*entity, transform, distance));
        }
    }
    best.map(|(entity, transform, _)| (entity, transform))
}

/// Resolve a body's contact with a surface
///
/// If the body's direction is the inverted contact normal, the accumulated
/// force is cancelled. Otherwise the force is replaced by
/// `max_accumulated_force * sin(angle)` along the surface tangent, on the
/// side the body is heading. In both cases the body is pushed out along the
/// normal by the penetration depth and keeps only the tangential part of its
/// velocity.
pub fn respond_to_contact(
    body: &mut RigidBody,
    transform: &mut Transform,
    contact: &Contact,
    epsilon: f32,
) -> ContactResponse {
    let direction = body.direction.try_normalize().unwrap_or(-UP);
    let into_surface = -contact.normal;
    let tangent = contact.normal.perp();

    let response = if approx_eq(into_surface, direction, epsilon) {
        body.accumulated_force = Vec2::ZERO;
        ContactResponse::Flush
    } else {
        let angle = direction.dot(into_surface).clamp(-1.0, 1.0).acos();
        let resultant = body.max_accumulated_force * angle.sin();
        let along = if tangent.dot(direction) < 0.0 { -tangent } else { tangent };
        body.accumulated_force = along * resultant;
        ContactResponse::Slope { angle, resultant }
    };

    transform.position += contact.normal * contact.penetration;
    body.velocity = tangent * body.velocity.dot(tangent);
    response
}

/// Advance a body by one frame and reset its accumulated force
///
/// Both acceleration terms already carry `dt`: the accumulated force is a
/// per-frame impulse and gravity is added as `gravity_scale * dt`.
/// Immovable bodies only have their force reset.
pub fn integrate(body: &mut RigidBody, transform: &mut Transform, damping: f32, dt: f32) {
    if body.is_immovable() {
        body.accumulated_force = Vec2::ZERO;
        return;
    }

    let acceleration = body.accumulated_force * body.inverse_mass() + body.gravity_scale * dt;
    let limit = Vec2::splat(body.max_velocity.abs());

    body.acceleration = acceleration;
    body.velocity = ((body.velocity + acceleration) * damping).clamp(-limit, limit);
    transform.position += body.velocity * dt;
    body.accumulated_force = Vec2::ZERO;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::register_builtin_components;
    use crate::physics::force::Force;

    const DT: f32 = 1.0 / 60.0;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn world() -> Coordinator {
        let mut coordinator = Coordinator::new();
        register_builtin_components(&mut coordinator).unwrap();
        PhysicsSystem::register(&mut coordinator, PhysicsConfig::default().quiet()).unwrap();
        coordinator
    }

    fn spawn_body(coordinator: &mut Coordinator, position: Vec2) -> Entity {
        let e = coordinator.create_entity().unwrap();
        coordinator
            .add_component(e, Transform::new(position, Vec2::ONE, 0.0))
            .unwrap();
        coordinator.add_component(e, RigidBody::default()).unwrap();
        e
    }

    fn spawn_platform(coordinator: &mut Coordinator, position: Vec2, scale: Vec2, orientation: f32) -> Entity {
        let e = coordinator.create_entity().unwrap();
        coordinator
            .add_component(e, Transform::new(position, scale, orientation))
            .unwrap();
        coordinator.add_component(e, RigidBody::immovable()).unwrap();
        coordinator.add_component(e, Platform).unwrap();
        e
    }

    #[test]
    fn test_flush_contact_zeroes_force() {
        let mut body = RigidBody::default();
        body.accumulated_force = Vec2::new(0.0, -50.0);
        body.velocity = Vec2::new(3.0, -4.0);
        let mut transform = Transform::new(Vec2::new(0.0, 0.9), Vec2::ONE, 0.0);
        let contact = Contact {
            normal: Vec2::new(0.0, 1.0),
            penetration: 0.1,
        };

        let response = respond_to_contact(&mut body, &mut transform, &contact, 1e-4);
        assert_eq!(response, ContactResponse::Flush);
        assert_eq!(body.accumulated_force, Vec2::ZERO);
        assert!(close(transform.position.y, 1.0));
        // Only the tangential velocity survives
        assert!(close(body.velocity.x, 3.0) && close(body.velocity.y, 0.0));
    }

    #[test]
    fn test_slope_contact_redirects_force() {
        let mut body = RigidBody::default();
        body.max_accumulated_force = 10.0;
        body.accumulated_force = Vec2::new(0.0, -10.0);
        let mut transform = Transform::default();
        let normal = Vec2::new(-1.0, 1.0).normalize();
        let contact = Contact {
            normal,
            penetration: 0.0,
        };

        let response = respond_to_contact(&mut body, &mut transform, &contact, 1e-4);
        match response {
            ContactResponse::Slope { angle, resultant } => {
                assert!(close(angle, std::f32::consts::FRAC_PI_4));
                assert!(close(resultant, 10.0 * std::f32::consts::FRAC_1_SQRT_2));
            }
            ContactResponse::Flush => panic!("expected a slope response"),
        }
        // Down the slope, toward negative x
        assert!(close(body.accumulated_force.x, -5.0));
        assert!(close(body.accumulated_force.y, -5.0));
    }

    #[test]
    fn test_zero_direction_falls_back_to_down() {
        let mut body = RigidBody::default();
        body.direction = Vec2::ZERO;
        body.accumulated_force = Vec2::new(0.0, -1.0);
        let mut transform = Transform::default();
        let contact = Contact {
            normal: UP,
            penetration: 0.0,
        };
        assert_eq!(
            respond_to_contact(&mut body, &mut transform, &contact, 1e-4),
            ContactResponse::Flush
        );
    }

    #[test]
    fn test_integrate_clamps_velocity_per_axis() {
        let mut body = RigidBody::default();
        body.gravity_scale = Vec2::ZERO;
        body.velocity = Vec2::new(1000.0, -1000.0);
        let mut transform = Transform::default();

        integrate(&mut body, &mut transform, 0.9, 0.5);
        assert_eq!(body.velocity, Vec2::new(500.0, -500.0));
        assert_eq!(transform.position, Vec2::new(250.0, -250.0));
    }

    #[test]
    fn test_integrate_skips_immovable() {
        let mut body = RigidBody::immovable();
        body.accumulated_force = Vec2::new(10.0, 10.0);
        let mut transform = Transform::default();

        integrate(&mut body, &mut transform, 0.9, DT);
        assert_eq!(transform.position, Vec2::ZERO);
        assert_eq!(body.velocity, Vec2::ZERO);
        assert_eq!(body.accumulated_force, Vec2::ZERO);
    }

    #[test]
    fn test_closest_platform_first_minimum_wins() {
        let a = (Entity::new(4), Transform::new(Vec2::new(-2.0, 0.0), Vec2::ONE, 0.0));
        let b = (Entity::new(2), Transform::new(Vec2::new(2.0, 0.0), Vec2::ONE, 0.0));
        let c = (Entity::new(9), Transform::new(Vec2::new(0.0, 5.0), Vec2::ONE, 0.0));
        let platforms = [c, a, b];

        let (nearest, _) = closest_platform(Vec2::ZERO, &platforms).unwrap();
        assert_eq!(nearest, Entity::new(4));
        assert!(closest_platform(Vec2::ZERO, &[]).is_none());
    }

    #[test]
    fn test_free_fall_step() {
        let mut coordinator = world();
        let body = spawn_body(&mut coordinator, Vec2::new(0.0, 10.0));

        coordinator.update(DT).unwrap();

        let rb = *coordinator.get_component::<RigidBody>(body).unwrap();
        let t = *coordinator.get_component::<Transform>(body).unwrap();
        let expected_velocity = (-9.81 * DT * 2.0) * 0.9;
        assert!(close(rb.velocity.y, expected_velocity));
        assert!(close(t.position.y, 10.0 + expected_velocity * DT));
        assert_eq!(rb.accumulated_force, Vec2::ZERO);
    }

    #[test]
    fn test_body_rests_on_flat_platform() {
        let mut coordinator = world();
        let platform = spawn_platform(&mut coordinator, Vec2::ZERO, Vec2::new(20.0, 2.0), 0.0);
        let body = spawn_body(&mut coordinator, Vec2::new(0.0, 1.5));

        for _ in 0..120 {
            coordinator.update(DT).unwrap();
        }

        let y = coordinator.get_component::<Transform>(body).unwrap().position.y;
        assert!(y > 1.49 && y <= 1.5 + 1e-4, "body sank or bounced: y = {}", y);
        assert_eq!(
            coordinator.get_component::<Transform>(platform).unwrap().position,
            Vec2::ZERO
        );
    }

    #[test]
    fn test_applied_force_moves_body() {
        let mut coordinator = world();
        let body = spawn_body(&mut coordinator, Vec2::ZERO);
        {
            let rb = coordinator.get_component_mut::<RigidBody>(body).unwrap();
            rb.gravity_scale = Vec2::ZERO;
        }
        coordinator
            .get_specific_system_mut::<PhysicsSystem>()
            .unwrap()
            .forces_mut()
            .add_force(body, Force::impulse(Vec2::new(60.0, 0.0)));

        coordinator.update(DT).unwrap();
        let vx = coordinator.get_component::<RigidBody>(body).unwrap().velocity.x;
        assert!(close(vx, 0.9));

        // The impulse is gone; only damping acts now
        coordinator.update(DT).unwrap();
        let vx = coordinator.get_component::<RigidBody>(body).unwrap().velocity.x;
        assert!(close(vx, 0.81));
    }

    #[test]
    fn test_destroyed_entity_forces_are_purged() {
        let mut coordinator = world();
        let body = spawn_body(&mut coordinator, Vec2::ZERO);
        coordinator
            .get_specific_system_mut::<PhysicsSystem>()
            .unwrap()
            .forces_mut()
            .add_force(body, Force::constant(Vec2::X));

        coordinator.destroy_entity(body).unwrap();
        let physics = coordinator.get_specific_system::<PhysicsSystem>().unwrap();
        assert_eq!(physics.forces().force_count(body), 0);
    }

    #[test]
    fn test_force_warnings_have_their_own_switch() {
        let quiet = PhysicsSystem::new(PhysicsConfig::default().quiet());
        assert!(quiet.forces().warn_on_invalid);
        assert!(!quiet.config().warn_on_missing_components);

        let silent = PhysicsSystem::new(PhysicsConfig::default().without_force_warnings());
        assert!(!silent.forces().warn_on_invalid);
        assert!(silent.config().warn_on_missing_components);
    }

    #[test]
    fn test_skipped_body_drops_pending_impulse() {
        let mut coordinator = world();
        let body = spawn_body(&mut coordinator, Vec2::ZERO);
        {
            let rb = coordinator.get_component_mut::<RigidBody>(body).unwrap();
            rb.gravity_scale = Vec2::ZERO;
            rb.velocity = Vec2::new(f32::NAN, 0.0);
        }
        let forces = coordinator
            .get_specific_system_mut::<PhysicsSystem>()
            .unwrap()
            .forces_mut();
        forces.add_force(body, Force::impulse(Vec2::new(60.0, 0.0)));
        forces.add_force(body, Force::constant(Vec2::new(0.0, 6.0)));

        coordinator.update(DT).unwrap();
        let physics = coordinator.get_specific_system::<PhysicsSystem>().unwrap();
        assert_eq!(physics.forces().force_count(body), 1);

        // Once simulable again, the stale impulse does not fire
        coordinator.get_component_mut::<RigidBody>(body).unwrap().velocity = Vec2::ZERO;
        coordinator.update(DT).unwrap();
        let velocity = coordinator.get_component::<RigidBody>(body).unwrap().velocity;
        assert_eq!(velocity.x, 0.0);
        assert!(close(velocity.y, 0.09));
    }

    #[test]
    fn test_forces_on_non_physics_entity_expire() {
        let mut coordinator = world();
        let marker = coordinator.create_entity().unwrap();
        coordinator.add_component(marker, Transform::default()).unwrap();
        coordinator
            .get_specific_system_mut::<PhysicsSystem>()
            .unwrap()
            .forces_mut()
            .add_force(marker, Force::timed(Vec2::X, 1.5 * DT));

        coordinator.update(DT).unwrap();
        assert_eq!(
            coordinator.get_specific_system::<PhysicsSystem>().unwrap().forces().force_count(marker),
            1
        );
        coordinator.update(DT).unwrap();
        assert_eq!(
            coordinator.get_specific_system::<PhysicsSystem>().unwrap().forces().force_count(marker),
            0
        );
    }

    #[test]
    fn test_non_finite_body_is_skipped() {
        let mut coordinator = world();
        let body = spawn_body(&mut coordinator, Vec2::new(1.0, 1.0));
        coordinator.get_component_mut::<RigidBody>(body).unwrap().velocity = Vec2::new(f32::NAN, 0.0);

        coordinator.update(DT).unwrap();
        assert_eq!(
            coordinator.get_component::<Transform>(body).unwrap().position,
            Vec2::new(1.0, 1.0)
        );
    }
}
