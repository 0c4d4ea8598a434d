//! # Collision Response
//!
//! Separates overlapping bodies and reflects their velocities along the
//! contact normal. Works on plain positions and velocities; the caller
//! copies results back into components.
//!
//! ```text
//!   correction    = n * penetration, split by inverse mass
//!   v_rel         = v2 - v1
//!   j             = -(1 + e) * (v_rel . n) / (1/m1 + 1/m2)
//!   v1 -= n * j / m1      v2 += n * j / m2
//! ```
//!
//! No impulse is applied when the bodies already move apart.

use ember_core::Vec2;

/// Mutable state of a moving body taking part in a collision.
#[derive(Debug)]
pub struct BodyState<'a> {
    /// Centre position.
    pub position: &'a mut Vec2,
    /// Linear velocity.
    pub velocity: &'a mut Vec2,
    /// Mass; must be positive.
    pub mass: f32,
    /// Coefficient of restitution.
    pub restitution: f32,
}

/// Resolves a contact between two moving bodies.
///
/// `normal` points from `a` to `b`.
pub fn solid_collision_dynamic(a: BodyState<'_>, b: BodyState<'_>, normal: Vec2, penetration: f32) {
    let inv_a = inverse_mass(a.mass);
    let inv_b = inverse_mass(b.mass);
    let inv_total = inv_a + inv_b;
    if inv_total <= 0.0 {
        return;
    }

    let correction = normal * (penetration / inv_total);
    *a.position -= correction * inv_a;
    *b.position += correction * inv_b;

    let approach = (*b.velocity - *a.velocity).dot(normal);
    if approach > 0.0 {
        return;
    }

    let restitution = a.restitution.min(b.restitution);
    let j = -(1.0 + restitution) * approach / inv_total;
    let impulse = normal * j;
    *a.velocity -= impulse * inv_a;
    *b.velocity += impulse * inv_b;
}

/// Resolves a contact between a moving body and an immovable one.
///
/// `normal` points from the moving body to the static one; only the moving
/// body is corrected.
pub fn solid_collision_static(body: BodyState<'_>, normal: Vec2, penetration: f32) {
    *body.position -= normal * penetration;

    let approach = body.velocity.dot(normal);
    if approach <= 0.0 {
        return;
    }
    *body.velocity -= normal * ((1.0 + body.restitution) * approach);
}

#[inline]
fn inverse_mass(mass: f32) -> f32 {
    if mass > 0.0 {
        1.0 / mass
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn test_equal_masses_swap_velocities() {
        let (mut p1, mut v1) = (Vec2::ZERO, Vec2::new(1.0, 0.0));
        let (mut p2, mut v2) = (Vec2::new(0.9, 0.0), Vec2::new(-1.0, 0.0));

        solid_collision_dynamic(
            BodyState { position: &mut p1, velocity: &mut v1, mass: 1.0, restitution: 1.0 },
            BodyState { position: &mut p2, velocity: &mut v2, mass: 1.0, restitution: 1.0 },
            Vec2::X,
            0.1,
        );

        assert!(close(p1, Vec2::new(-0.05, 0.0)));
        assert!(close(p2, Vec2::new(0.95, 0.0)));
        assert!(close(v1, Vec2::new(-1.0, 0.0)));
        assert!(close(v2, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_heavier_body_moves_less() {
        let (mut p1, mut v1) = (Vec2::ZERO, Vec2::ZERO);
        let (mut p2, mut v2) = (Vec2::new(1.0, 0.0), Vec2::new(-2.0, 0.0));

        solid_collision_dynamic(
            BodyState { position: &mut p1, velocity: &mut v1, mass: 3.0, restitution: 0.0 },
            BodyState { position: &mut p2, velocity: &mut v2, mass: 1.0, restitution: 0.0 },
            Vec2::X,
            0.4,
        );

        assert!(close(p1, Vec2::new(-0.1, 0.0)));
        assert!(close(p2, Vec2::new(1.3, 0.0)));
        // Perfectly inelastic: common velocity, momentum conserved.
        assert!(close(v1, v2));
        assert!(close(v1 * 3.0 + v2, Vec2::new(-2.0, 0.0)));
    }

    #[test]
    fn test_separating_bodies_keep_velocity() {
        let (mut p1, mut v1) = (Vec2::ZERO, Vec2::new(-1.0, 0.0));
        let (mut p2, mut v2) = (Vec2::new(0.5, 0.0), Vec2::new(1.0, 0.0));

        solid_collision_dynamic(
            BodyState { position: &mut p1, velocity: &mut v1, mass: 1.0, restitution: 1.0 },
            BodyState { position: &mut p2, velocity: &mut v2, mass: 1.0, restitution: 1.0 },
            Vec2::X,
            0.5,
        );

        assert_eq!(v1, Vec2::new(-1.0, 0.0));
        assert_eq!(v2, Vec2::new(1.0, 0.0));
        assert!(close(p2 - p1, Vec2::new(1.0, 0.0)));
    }

    #[test]
    fn test_static_bounce() {
        let (mut p, mut v) = (Vec2::new(0.0, 0.2), Vec2::new(1.0, -3.0));

        // Body above the floor: normal from body to floor points down.
        solid_collision_static(
            BodyState { position: &mut p, velocity: &mut v, mass: 1.0, restitution: 0.5 },
            Vec2::new(0.0, -1.0),
            0.2,
        );

        assert!(close(p, Vec2::new(0.0, 0.4)));
        assert!(close(v, Vec2::new(1.0, 1.5)));
    }
}
