//! # EMBER Physics
//!
//! 2D collision for the EMBER ECS:
//! - [`aabb`] / [`collision`]: exact box and circle tests, ECS-free
//! - [`reaction`]: positional correction and impulse response
//! - [`sap`]: sweep-and-prune broad phase that drives both
//!
//! ## Example
//!
//! ```rust
//! use ember_core::ecs::components::{Collider2d, Shape2d, Transform2d, Velocity2d};
//! use ember_core::{ArcheRegistry, Vec2};
//! use ember_physics::SweepAndPrune;
//!
//! let mut registry = ArcheRegistry::new();
//! for x in [0.0, 1.5] {
//!     let entity = registry.create_entity();
//!     registry.create_components(
//!         entity,
//!         (
//!             Transform2d::at(Vec2::new(x, 0.0)),
//!             Collider2d::trigger(Shape2d::aabb(1.0, 1.0)),
//!             Velocity2d::default(),
//!         ),
//!     );
//! }
//!
//! let mut sap = SweepAndPrune::new();
//! assert_eq!(sap.on_update(&mut registry).len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod aabb;
pub mod collision;
pub mod reaction;
pub mod sap;

pub use aabb::Aabb;
pub use collision::{
    check_aabb_circle_collision, check_aabb_collision, check_circle_aabb_collision,
    check_circle_collision, CollisionResult,
};
pub use reaction::{solid_collision_dynamic, solid_collision_static, BodyState};
pub use sap::{
    Axis, ColliderKey, ColliderSet, Contact, ContactKind, Endpoint, EndpointKey, SapStats,
    SweepAndPrune,
};
