//! Render systems: read components, submit draws.

use ember_core::ecs::components::{CubeMesh, Rotation, Sprite, Transform2d, Transform3d};
use ember_core::ArcheRegistry;

use crate::renderer::{CubeDraw, QuadDraw, Renderer};

/// Draws every `Transform2d + Sprite` entity. Returns the number of quads.
pub fn draw_sprites(registry: &mut ArcheRegistry, renderer: &mut dyn Renderer) -> usize {
    let mut drawn = 0;

    for chunk in registry.query_without::<(&Transform2d, &Sprite), Rotation>() {
        drawn += chunk.len();
        for (transform, sprite) in chunk {
            renderer.draw_quad(quad(transform, sprite, 0.0));
        }
    }

    for chunk in registry.query::<(&Transform2d, &Sprite, &Rotation)>() {
        drawn += chunk.len();
        for (transform, sprite, rotation) in chunk {
            renderer.draw_quad(quad(transform, sprite, rotation.radians));
        }
    }

    drawn
}

/// Draws every `Transform3d + CubeMesh` entity. Returns the number of cubes.
pub fn draw_cubes(registry: &mut ArcheRegistry, renderer: &mut dyn Renderer) -> usize {
    let mut drawn = 0;
    for chunk in registry.query::<(&Transform3d, &CubeMesh)>() {
        drawn += chunk.len();
        for (transform, mesh) in chunk {
            renderer.draw_cube(CubeDraw {
                position: transform.position,
                size: transform.scale,
                color: mesh.color,
            });
        }
    }
    drawn
}

fn quad(transform: &Transform2d, sprite: &Sprite, rotation: f32) -> QuadDraw {
    QuadDraw {
        position: transform.position,
        size: transform.scale,
        rotation,
        color: sprite.color,
        texture: sprite.texture,
    }
}
