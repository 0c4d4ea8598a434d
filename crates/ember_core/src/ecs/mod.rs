//! # Entity Component System
//!
//! Archetype storage: every distinct set of components gets its own
//! columnar block, and systems iterate those blocks as typed chunks.
//!
//! ## Design Philosophy
//!
//! - Component ids are assigned at compile time; a [`Bitmask`] of them is an
//!   archetype signature
//! - Each archetype stores one contiguous `Vec<T>` per component
//! - Entity IDs are indices with generation counters
//! - Queries hand out slices, so iteration has no per-row dispatch
//!
//! ```text
//! Archetype {Transform2d, Velocity2d}:
//!   entities:   [e4, e9, e2]
//!   Transform2d [t4, t9, t2]
//!   Velocity2d  [v4, v9, v2]
//! ```

mod archetype;
mod bundle;
mod component;
pub mod components;
mod entity;
mod query;
mod registry;

pub use archetype::{Archetype, Removal};
pub use bundle::{Bundle, ComponentSet};
pub use component::{Bitmask, Component, MAX_COMPONENTS};
pub use entity::{Column, EntityAllocator, EntityId, Record};
pub use query::{Chunk, ColumnPicker, Fetch, TupleIter};
pub use registry::ArcheRegistry;
