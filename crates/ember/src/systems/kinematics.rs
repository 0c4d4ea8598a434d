//! Velocity integration.

use ember_core::ecs::components::{StaticBody, Transform2d, Transform3d, Velocity2d, Velocity3d};
use ember_core::ArcheRegistry;

/// Moves every transform by its velocity. Static bodies never move.
///
/// Returns the number of entities moved.
pub fn integrate(registry: &mut ArcheRegistry, dt: f32) -> usize {
    let mut moved = 0;

    for chunk in registry.query_without::<(&mut Transform2d, &Velocity2d), StaticBody>() {
        moved += chunk.len();
        for (transform, velocity) in chunk {
            transform.position += velocity.linear * dt;
        }
    }

    for chunk in registry.query::<(&mut Transform3d, &Velocity3d)>() {
        moved += chunk.len();
        for (transform, velocity) in chunk {
            transform.position += velocity.linear * dt;
        }
    }

    moved
}

#[cfg(test)]
mod tests {
    use ember_core::{Vec2, Vec3};

    use super::*;

    #[test]
    fn test_integrates_2d_and_3d() {
        let mut registry = ArcheRegistry::new();
        let ball = registry.create_entity();
        let cube = registry.create_entity();
        let wall = registry.create_entity();
        registry.create_components(ball, (Transform2d::default(), Velocity2d::new(2.0, -4.0)));
        registry.create_components(
            cube,
            (
                Transform3d::default(),
                Velocity3d {
                    linear: Vec3::new(1.0, 0.0, -1.0),
                },
            ),
        );
        registry.create_components(
            wall,
            (Transform2d::default(), Velocity2d::new(5.0, 5.0), StaticBody),
        );

        assert_eq!(integrate(&mut registry, 0.5), 2);
        assert_eq!(registry.get_component::<Transform2d>(ball).position, Vec2::new(1.0, -2.0));
        assert_eq!(
            registry.get_component::<Transform3d>(cube).position,
            Vec3::new(0.5, 0.0, -0.5)
        );
        assert_eq!(registry.get_component::<Transform2d>(wall).position, Vec2::ZERO);
    }
}
