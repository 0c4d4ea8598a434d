//! # Engine Components
//!
//! Components are plain data. Behaviour lives in systems.
//!
//! The list at the bottom of this file assigns every component its bit.
//! Adding a component means adding its type here and one line to the list.

use crate::math::{Vec2, Vec3};
use crate::script::NativeScript;

use super::component::declare_components;

/// 2D placement: position of the centre and size of the rendered quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2d {
    /// Centre in world space.
    pub position: Vec2,
    /// Rendered width and height.
    pub scale: Vec2,
}

impl Transform2d {
    /// Unit-sized transform at `position`.
    #[must_use]
    pub const fn at(position: Vec2) -> Self {
        Self {
            position,
            scale: Vec2::ONE,
        }
    }

    /// Transform with an explicit size.
    #[must_use]
    pub const fn new(position: Vec2, scale: Vec2) -> Self {
        Self { position, scale }
    }
}

impl Default for Transform2d {
    fn default() -> Self {
        Self::at(Vec2::ZERO)
    }
}

/// 3D placement of a cube or mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform3d {
    /// Centre in world space.
    pub position: Vec3,
    /// Size along each axis.
    pub scale: Vec3,
}

impl Transform3d {
    /// Unit-sized transform at `position`.
    #[must_use]
    pub const fn at(position: Vec3) -> Self {
        Self {
            position,
            scale: Vec3::ONE,
        }
    }
}

impl Default for Transform3d {
    fn default() -> Self {
        Self::at(Vec3::ZERO)
    }
}

/// Rotation around the view axis, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotation {
    /// Counter-clockwise angle.
    pub radians: f32,
}

/// Linear velocity in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity2d {
    /// Units per second.
    pub linear: Vec2,
}

impl Velocity2d {
    /// Creates a velocity.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self {
            linear: Vec2::new(x, y),
        }
    }
}

/// Linear 3D velocity in world units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity3d {
    /// Units per second.
    pub linear: Vec3,
}

/// Opaque reference to a texture owned by a texture cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub u32);

/// Flat-coloured or textured quad.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// RGBA tint.
    pub color: [f32; 4],
    /// Texture, if any.
    pub texture: Option<TextureHandle>,
}

impl Sprite {
    /// Untextured sprite.
    #[must_use]
    pub const fn colored(color: [f32; 4]) -> Self {
        Self {
            color,
            texture: None,
        }
    }
}

impl Default for Sprite {
    fn default() -> Self {
        Self::colored([1.0; 4])
    }
}

/// Flat-coloured cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeMesh {
    /// RGBA colour.
    pub color: [f32; 4],
}

/// Axis-aligned box shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AabbShape {
    /// Half width and half height.
    pub half_size: Vec2,
}

/// Circle shape.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleShape {
    /// Radius.
    pub radius: f32,
}

/// Collision shape, centred on the entity's `Transform2d` position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape2d {
    /// Axis-aligned box.
    Aabb(AabbShape),
    /// Circle.
    Circle(CircleShape),
}

impl Shape2d {
    /// Box from its half extents.
    #[must_use]
    pub const fn aabb(half_width: f32, half_height: f32) -> Self {
        Self::Aabb(AabbShape {
            half_size: Vec2::new(half_width, half_height),
        })
    }

    /// Circle from its radius.
    #[must_use]
    pub const fn circle(radius: f32) -> Self {
        Self::Circle(CircleShape { radius })
    }

    /// Half extents of the tightest axis-aligned box around the shape.
    #[must_use]
    pub const fn half_extents(&self) -> Vec2 {
        match self {
            Self::Aabb(shape) => shape.half_size,
            Self::Circle(shape) => Vec2::new(shape.radius, shape.radius),
        }
    }
}

/// Participates in collision detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Collider2d {
    /// Geometry.
    pub shape: Shape2d,
    /// Triggers report overlaps but are never pushed apart.
    pub is_trigger: bool,
}

impl Collider2d {
    /// Solid collider.
    #[must_use]
    pub const fn solid(shape: Shape2d) -> Self {
        Self {
            shape,
            is_trigger: false,
        }
    }

    /// Trigger collider.
    #[must_use]
    pub const fn trigger(shape: Shape2d) -> Self {
        Self {
            shape,
            is_trigger: true,
        }
    }
}

/// Mass properties used by collision response.
///
/// Dynamic colliders without this component behave as unit mass with
/// fully elastic response.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RigidBody2d {
    /// Mass; must be positive.
    pub mass: f32,
    /// Coefficient of restitution in `[0, 1]`.
    pub restitution: f32,
}

impl Default for RigidBody2d {
    fn default() -> Self {
        Self {
            mass: 1.0,
            restitution: 1.0,
        }
    }
}

/// Marks a collider that never moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StaticBody;

/// Debug name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tag {
    /// Name shown in logs.
    pub name: String,
}

impl Tag {
    /// Creates a tag.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

declare_components! {
    Transform2d = 0,
    Transform3d = 1,
    Rotation = 2,
    Velocity2d = 3,
    Velocity3d = 4,
    Sprite = 5,
    CubeMesh = 6,
    Collider2d = 7,
    RigidBody2d = 8,
    StaticBody = 9,
    Tag = 10,
    NativeScript = 11,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Component;

    #[test]
    fn test_ids_are_unique_and_dense() {
        for (index, (id, _)) in COMPONENT_NAMES.iter().enumerate() {
            assert_eq!(*id as usize, index);
        }
        assert_eq!(Collider2d::ID, 7);
        assert_eq!(NativeScript::NAME, "NativeScript");
    }

    #[test]
    fn test_column_dispatch() {
        let mut column = ColumnStorage::empty(Velocity2d::ID);
        assert_eq!(column.component_id(), Velocity2d::ID);
        assert!(Transform2d::column(&column).is_none());

        Velocity2d::column_mut(&mut column)
            .unwrap()
            .extend([Velocity2d::new(1.0, 0.0), Velocity2d::new(2.0, 0.0)]);
        assert_eq!(column.len(), 2);

        let mut target = ColumnStorage::empty(Velocity2d::ID);
        column.move_row(0, &mut target);
        assert_eq!(Velocity2d::column(&column).unwrap()[0], Velocity2d::new(2.0, 0.0));
        assert_eq!(Velocity2d::column(&target).unwrap()[0], Velocity2d::new(1.0, 0.0));
    }

    #[test]
    fn test_circle_bound_is_tight() {
        let half = Shape2d::circle(2.0).half_extents();
        assert_eq!(half, Vec2::new(2.0, 2.0));
    }
}
