//! # Collision Detection
//!
//! Exact overlap tests between boxes and circles.
//!
//! Every test takes the first body, then the second, and reports a normal
//! pointing from the first towards the second. Shapes that only touch are
//! not colliding: a detected collision always has `penetration > 0`.

use ember_core::Vec2;

use crate::aabb::Aabb;

/// Outcome of a narrow-phase test.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CollisionResult {
    /// True when the shapes overlap.
    pub is_detected: bool,
    /// Overlap depth along `normal`.
    pub penetration: f32,
    /// Unit separation direction from the first shape to the second.
    pub normal: Vec2,
}

impl CollisionResult {
    /// No collision.
    pub const NONE: Self = Self {
        is_detected: false,
        penetration: 0.0,
        normal: Vec2::ZERO,
    };

    fn hit(penetration: f32, normal: Vec2) -> Self {
        Self {
            is_detected: true,
            penetration,
            normal,
        }
    }

    /// Same contact seen from the other body.
    #[must_use]
    pub fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

#[inline]
fn sign(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

/// Box against box.
#[must_use]
pub fn check_aabb_collision(
    center_a: Vec2,
    half_a: Vec2,
    center_b: Vec2,
    half_b: Vec2,
) -> CollisionResult {
    let a = Aabb::from_center(center_a, half_a);
    let b = Aabb::from_center(center_b, half_b);
    if !a.intersects(&b) {
        return CollisionResult::NONE;
    }

    let overlap = a.overlap(&b);
    let delta = center_b - center_a;
    if overlap.x < overlap.y {
        CollisionResult::hit(overlap.x, Vec2::new(sign(delta.x), 0.0))
    } else {
        CollisionResult::hit(overlap.y, Vec2::new(0.0, sign(delta.y)))
    }
}

/// Circle against circle.
#[must_use]
pub fn check_circle_collision(
    center_a: Vec2,
    radius_a: f32,
    center_b: Vec2,
    radius_b: f32,
) -> CollisionResult {
    let delta = center_b - center_a;
    let reach = radius_a + radius_b;
    let distance_sq = delta.length_squared();
    if distance_sq >= reach * reach {
        return CollisionResult::NONE;
    }

    let distance = distance_sq.sqrt();
    // Concentric circles get an arbitrary but stable axis.
    let normal = delta.try_normalize().unwrap_or(Vec2::X);
    CollisionResult::hit(reach - distance, normal)
}

/// Box against circle.
#[must_use]
pub fn check_aabb_circle_collision(
    box_center: Vec2,
    half: Vec2,
    circle_center: Vec2,
    radius: f32,
) -> CollisionResult {
    let local = circle_center - box_center;
    let closest = local.clamp(-half, half);
    let outside = local - closest;
    let outside_sq = outside.length_squared();

    if outside_sq > 0.0 {
        if outside_sq >= radius * radius {
            return CollisionResult::NONE;
        }
        let distance = outside_sq.sqrt();
        let normal = outside.try_normalize().unwrap_or(Vec2::X);
        return CollisionResult::hit(radius - distance, normal);
    }

    // Centre inside the box: push out through the nearest face.
    let face = half - local.abs();
    if face.x < face.y {
        CollisionResult::hit(face.x + radius, Vec2::new(sign(local.x), 0.0))
    } else {
        CollisionResult::hit(face.y + radius, Vec2::new(0.0, sign(local.y)))
    }
}

/// Circle against box.
#[must_use]
pub fn check_circle_aabb_collision(
    circle_center: Vec2,
    radius: f32,
    box_center: Vec2,
    half: Vec2,
) -> CollisionResult {
    check_aabb_circle_collision(box_center, half, circle_center, radius).flipped()
}
