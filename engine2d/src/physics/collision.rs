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
//! Collision detection
//!
//! Stateless geometry: oriented boxes built from transforms, the closed-form
//! circle-vs-OBB test, a separating-axis OBB-vs-OBB test, and the swept
//! rect-vs-rect time-of-impact test. Degenerate inputs resolve to fallback
//! values (an "up" normal) instead of NaN.

use crate::ecs::components::Transform;
use crate::ecs::{Coordinator, Entity};
use crate::error::EcsResult;
use crate::math::{axes_from_degrees, UP};
use glam::Vec2;

/// Oriented bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb {
    /// World-space center
    pub center: Vec2,
    /// Half width and half height
    pub half_extents: Vec2,
    /// Local right and up unit axes in world space
    pub axes: [Vec2; 2],
}

impl Obb {
    /// Build a box rotated by `orientation` degrees
    pub fn new(center: Vec2, half_extents: Vec2, orientation: f32) -> Self {
        Obb {
            center,
            half_extents: half_extents.abs(),
            axes: axes_from_degrees(orientation),
        }
    }

    /// Build the box described by a transform
    pub fn from_transform(transform: &Transform) -> Self {
        Obb::new(
            transform.position,
            transform.half_extents(),
            transform.orientation,
        )
    }

    /// Corners in counter-clockwise order starting bottom-left
    pub fn vertices(&self) -> [Vec2; 4] {
        let right = self.axes[0] * self.half_extents.x;
        let up = self.axes[1] * self.half_extents.y;
        [
            self.center - right - up,
            self.center + right - up,
            self.center + right + up,
            self.center - right + up,
        ]
    }

    /// Interval covered by the box's corners projected onto `axis`
    pub fn project(&self, axis: Vec2) -> (f32, f32) {
        self.vertices()
            .iter()
            .map(|vertex| vertex.dot(axis))
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
                (min.min(p), max.max(p))
            })
    }

    /// Express a world point in the box's local frame
    pub fn to_local(&self, point: Vec2) -> Vec2 {
        let offset = point - self.center;
        Vec2::new(offset.dot(self.axes[0]), offset.dot(self.axes[1]))
    }

    /// Express a local point in world space
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.center + self.axes[0] * local.x + self.axes[1] * local.y
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Create a box from its corners
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Aabb { min, max }
    }

    /// Create a box from its center and half extents
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        let half = half_extents.abs();
        Aabb::new(center - half, center + half)
    }

    /// Check whether the boxes overlap or touch
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.x < other.min.x
            || self.min.x > other.max.x
            || self.max.y < other.min.y
            || self.min.y > other.max.y)
    }
}

/// Collision normal and overlap depth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit normal
    pub normal: Vec2,
    /// Depth of overlap along the normal
    pub penetration: f32,
}

/// Build the OBB of an entity from its [`Transform`]
pub fn create_obb_from_entity(coordinator: &Coordinator, entity: Entity) -> EcsResult<Obb> {
    Ok(Obb::from_transform(coordinator.get_component::<Transform>(entity)?))
}

/// Circle against oriented box
///
/// The circle center is moved into the box's frame, clamped to the half
/// extents to find the closest point of the box, and moved back. The normal
/// points from that closest point to the circle center. A center lying
/// exactly on or inside the box gives a zero-length offset; the normal then
/// falls back to up.
///
/// # Examples
///
/// ```
/// use engine2d::physics::collision::{check_circle_obb_collision, Obb};
/// use glam::Vec2;
///
/// let platform = Obb::new(Vec2::new(0.0, 15.0), Vec2::new(20.0, 5.0), 0.0);
/// let contact = check_circle_obb_collision(Vec2::new(0.0, 5.0), 10.0, &platform).unwrap();
/// assert!((contact.penetration - 5.0).abs() < 1e-5);
/// assert!((contact.normal - Vec2::new(0.0, -1.0)).length() < 1e-5);
/// ```
pub fn check_circle_obb_collision(center: Vec2, radius: f32, obb: &Obb) -> Option<Contact> {
    let local = obb.to_local(center);
    let clamped = local.clamp(-obb.half_extents, obb.half_extents);
    let closest = obb.to_world(clamped);

    let offset = center - closest;
    let distance = offset.length();
    if distance > radius {
        return None;
    }

    let normal = if distance > 0.0 { offset / distance } else { UP };
    Some(Contact {
        normal,
        penetration: radius - distance,
    })
}

/// Oriented box against oriented box using the separating axis theorem
///
/// Tests the two edge normals of each box. Returns `None` on the first axis
/// whose projections do not overlap. On collision the contact carries the
/// axis with the smallest overlap, oriented from `a` toward `b`, and that
/// overlap as penetration.
pub fn check_obb_collision_sat(a: &Obb, b: &Obb) -> Option<Contact> {
    let axes = [a.axes[0], a.axes[1], b.axes[0], b.axes[1]];
    let mut best: Option<Contact> = None;

    for axis in axes {
        let (min_a, max_a) = a.project(axis);
        let (min_b, max_b) = b.project(axis);
        if max_a < min_b || max_b < min_a {
            return None;
        }

        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if best.map_or(true, |contact| overlap < contact.penetration) {
            best = Some(Contact {
                normal: axis,
                penetration: overlap,
            });
        }
    }

    best.map(|mut contact| {
        if (b.center - a.center).dot(contact.normal) < 0.0 {
            contact.normal = -contact.normal;
        }
        contact
    })
}

/// Swept test between two moving axis-aligned boxes
///
/// Works in `a`'s frame with `b` moving at the relative velocity. For each
/// axis the entry and exit times are narrowed into `[t_first, t_last]`,
/// starting from `[0, dt]`; any axis proving separation ends the test. Boxes
/// that already overlap collide at time zero.
///
/// Returns the first time of collision.
///
/// # Examples
///
/// ```
/// use engine2d::physics::collision::{collision_intersection_rect_rect, Aabb};
/// use glam::Vec2;
///
/// let mover = Aabb::new(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
/// let wall = Aabb::new(Vec2::new(3.0, 0.0), Vec2::new(4.0, 1.0));
/// let t = collision_intersection_rect_rect(&mover, Vec2::new(2.0, 0.0), &wall, Vec2::ZERO, 1.0);
/// assert_eq!(t, Some(1.0));
/// ```
pub fn collision_intersection_rect_rect(
    a: &Aabb,
    velocity_a: Vec2,
    b: &Aabb,
    velocity_b: Vec2,
    dt: f32,
) -> Option<f32> {
    if a.overlaps(b) {
        return Some(0.0);
    }

    let relative = velocity_b - velocity_a;
    let mut t_first = 0.0_f32;
    let mut t_last = dt;

    for (a_min, a_max, b_min, b_max, v) in [
        (a.min.x, a.max.x, b.min.x, b.max.x, relative.x),
        (a.min.y, a.max.y, b.min.y, b.max.y, relative.y),
    ] {
        if v < 0.0 {
            // b moving toward lower coordinates
            if a_min > b_max {
                return None;
            }
            if a_max < b_min {
                t_first = t_first.max((a_max - b_min) / v);
            }
            if a_min < b_max {
                t_last = t_last.min((a_min - b_max) / v);
            }
        } else if v > 0.0 {
            if a_min > b_max {
                t_first = t_first.max((a_min - b_max) / v);
            }
            if a_max > b_min {
                t_last = t_last.min((a_max - b_min) / v);
            }
            if a_max < b_min {
                return None;
            }
        } else if a_max < b_min || a_min > b_max {
            return None;
        }

        if t_first > t_last {
            return None;
        }
    }

    Some(t_first)
}
