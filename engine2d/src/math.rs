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
//! 2D vector helpers shared by the collision and physics code

use glam::Vec2;

/// Fallback direction for degenerate normals
pub const UP: Vec2 = Vec2::new(0.0, 1.0);

/// Normalize `v`, falling back to [`UP`] when its length is zero or not finite
pub fn normalize_or_up(v: Vec2) -> Vec2 {
    let length = v.length();
    if length > f32::EPSILON && length.is_finite() {
        v / length
    } else {
        UP
    }
}

/// Local right and up unit axes of a box rotated by `degrees`
pub fn axes_from_degrees(degrees: f32) -> [Vec2; 2] {
    let (sin, cos) = degrees.to_radians().sin_cos();
    [Vec2::new(cos, sin), Vec2::new(-sin, cos)]
}

/// Component-wise approximate equality
pub fn approx_eq(a: Vec2, b: Vec2, epsilon: f32) -> bool {
    (a.x - b.x).abs() <= epsilon && (a.y - b.y).abs() <= epsilon
}
