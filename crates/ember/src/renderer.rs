//! # Renderer Seam
//!
//! Render systems talk to a [`Renderer`]; the GPU backend lives outside
//! this crate. [`QuadBatch`] is the CPU side of an instanced backend: it
//! packs every draw into a `Pod` record ready for a single buffer upload.
//!
//! ```text
//! sprite system ──draw_quad──▶ QuadBatch.quads ──as_bytes──▶ instance buffer
//! cube system   ──draw_cube──▶ QuadBatch.cubes ──as_bytes──▶ instance buffer
//! ```

// `Pod` derives expand to unsafe impls.
#![allow(unsafe_code)]

use bytemuck::{Pod, Zeroable};
use ember_core::ecs::components::TextureHandle;
use ember_core::{Vec2, Vec3};

/// One 2D quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadDraw {
    /// Centre in world space.
    pub position: Vec2,
    /// Width and height.
    pub size: Vec2,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
    /// RGBA tint.
    pub color: [f32; 4],
    /// Texture, or flat colour.
    pub texture: Option<TextureHandle>,
}

/// One flat-coloured cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeDraw {
    /// Centre in world space.
    pub position: Vec3,
    /// Size along each axis.
    pub size: Vec3,
    /// RGBA colour.
    pub color: [f32; 4],
}

/// Draw-call sink used by render systems.
pub trait Renderer {
    /// Starts a frame.
    fn begin_frame(&mut self);
    /// Queues a quad.
    fn draw_quad(&mut self, quad: QuadDraw);
    /// Queues a cube.
    fn draw_cube(&mut self, cube: CubeDraw);
    /// Finishes the frame.
    fn end_frame(&mut self);
}

/// Per-instance quad data.
///
/// Layout is three vec4s.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// Position (x, y) + size (w, h).
    pub position_size: [f32; 4],
    /// RGBA tint.
    pub color: [f32; 4],
    /// Rotation, texture slot (-1 = none), padding.
    pub rotation_texture: [f32; 4],
}

impl QuadInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Texture slot of an untextured quad.
    pub const NO_TEXTURE: f32 = -1.0;

    /// Packs a quad draw.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_draw(quad: &QuadDraw) -> Self {
        let texture = quad
            .texture
            .map_or(Self::NO_TEXTURE, |handle| handle.0 as f32);
        Self {
            position_size: [quad.position.x, quad.position.y, quad.size.x, quad.size.y],
            color: quad.color,
            rotation_texture: [quad.rotation, texture, 0.0, 0.0],
        }
    }
}

/// Per-instance cube data.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct CubeInstance {
    /// Position (x, y, z) + padding.
    pub position: [f32; 4],
    /// Size (x, y, z) + padding.
    pub size: [f32; 4],
    /// RGBA colour.
    pub color: [f32; 4],
}

impl CubeInstance {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Packs a cube draw.
    #[must_use]
    pub fn from_draw(cube: &CubeDraw) -> Self {
        let [x, y, z] = cube.position.to_array();
        let [w, h, d] = cube.size.to_array();
        Self {
            position: [x, y, z, 1.0],
            size: [w, h, d, 0.0],
            color: cube.color,
        }
    }
}

/// Collects one frame of instances.
#[derive(Debug, Default)]
pub struct QuadBatch {
    quads: Vec<QuadInstance>,
    cubes: Vec<CubeInstance>,
    in_frame: bool,
    frames: u64,
}

impl QuadBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a batch with room for `quads` quads before growing.
    #[must_use]
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            quads: Vec::with_capacity(quads),
            ..Self::default()
        }
    }

    /// Quads of the current or last frame.
    #[must_use]
    pub fn quads(&self) -> &[QuadInstance] {
        &self.quads
    }

    /// Cubes of the current or last frame.
    #[must_use]
    pub fn cubes(&self) -> &[CubeInstance] {
        &self.cubes
    }

    /// Quad instances as raw bytes for upload.
    #[must_use]
    pub fn quad_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.quads)
    }

    /// Cube instances as raw bytes for upload.
    #[must_use]
    pub fn cube_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cubes)
    }

    /// Frames completed.
    #[must_use]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// True between `begin_frame` and `end_frame`.
    #[must_use]
    pub const fn in_frame(&self) -> bool {
        self.in_frame
    }
}

impl Renderer for QuadBatch {
    fn begin_frame(&mut self) {
        self.quads.clear();
        self.cubes.clear();
        self.in_frame = true;
    }

    fn draw_quad(&mut self, quad: QuadDraw) {
        debug_assert!(self.in_frame, "draw_quad outside begin_frame/end_frame");
        self.quads.push(QuadInstance::from_draw(&quad));
    }

    fn draw_cube(&mut self, cube: CubeDraw) {
        debug_assert!(self.in_frame, "draw_cube outside begin_frame/end_frame");
        self.cubes.push(CubeInstance::from_draw(&cube));
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_sizes() {
        assert_eq!(QuadInstance::SIZE, 48);
        assert_eq!(CubeInstance::SIZE, 48);
        assert_eq!(std::mem::align_of::<QuadInstance>(), 4);
    }

    #[test]
    fn test_batch_packs_instances() {
        let mut batch = QuadBatch::with_capacity(4);
        batch.begin_frame();
        batch.draw_quad(QuadDraw {
            position: Vec2::new(1.0, 2.0),
            size: Vec2::new(3.0, 4.0),
            rotation: 0.5,
            color: [1.0, 0.0, 0.0, 1.0],
            texture: Some(TextureHandle(7)),
        });
        batch.draw_cube(CubeDraw {
            position: Vec3::new(0.0, 1.0, 2.0),
            size: Vec3::ONE,
            color: [0.0; 4],
        });
        batch.end_frame();

        assert_eq!(batch.frames(), 1);
        assert_eq!(batch.quads()[0].position_size, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(batch.quads()[0].rotation_texture, [0.5, 7.0, 0.0, 0.0]);
        assert_eq!(batch.quad_bytes().len(), QuadInstance::SIZE);
        assert_eq!(batch.cube_bytes().len(), CubeInstance::SIZE);

        let restored: &[QuadInstance] = bytemuck::cast_slice(batch.quad_bytes());
        assert_eq!(restored, batch.quads());
    }

    #[test]
    fn test_begin_frame_clears_previous() {
        let mut batch = QuadBatch::new();
        batch.begin_frame();
        batch.draw_quad(QuadDraw {
            position: Vec2::ZERO,
            size: Vec2::ONE,
            rotation: 0.0,
            color: [1.0; 4],
            texture: None,
        });
        batch.end_frame();
        assert_eq!(batch.quads()[0].rotation_texture[1], QuadInstance::NO_TEXTURE);

        batch.begin_frame();
        assert!(batch.in_frame());
        assert!(batch.quads().is_empty());
    }
}
