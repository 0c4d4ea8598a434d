//! # Scene Systems
//!
//! Plain functions (and one stateful collision system) over the registry.
//! The scene runs them in a fixed order:
//!
//! ```text
//! on_update: kinematics → scripts.update → collision → scripts.on_event
//! on_render: render sprites/cubes → scripts.render
//! ```

pub mod collision;
pub mod kinematics;
pub mod render;
pub mod scripts;

pub use collision::CollisionSystem;
