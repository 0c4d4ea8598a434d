//! # EMBER Core Engine
//!
//! Archetype Entity Component System plus the plumbing every system shares:
//! - Columnar archetype storage keyed by compile-time component bitmasks
//! - Typed chunk queries with include/exclude filters
//! - Native script components with declared hook sets
//! - Bounded event channels and a main-thread callback queue
//!
//! ## Architecture Rules
//!
//! 1. **Single writer** - ECS storage is mutated on the main thread only
//! 2. **Data-oriented design** - one contiguous array per component per archetype
//! 3. **Misuse is fatal** - structural errors log and panic instead of corrupting columns
//!
//! ## Example
//!
//! ```rust
//! use ember_core::ecs::components::{Sprite, Transform2d};
//! use ember_core::ArcheRegistry;
//!
//! let mut registry = ArcheRegistry::new();
//! let entity = registry.create_entity();
//! registry.create_components(entity, (Transform2d::default(), Sprite::default()));
//!
//! let rows: usize = registry.query::<(&Transform2d, &Sprite)>().iter().map(|c| c.len()).sum();
//! assert_eq!(rows, 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod ecs;
pub mod error;
pub mod events;
pub mod math;
pub mod script;
pub mod sync;

pub use ecs::{
    ArcheRegistry, Archetype, Bitmask, Bundle, Chunk, Column, Component, ComponentSet, EntityId,
    Fetch, Record,
};
pub use error::{EcsError, EcsResult, ScriptError, ScriptResult};
pub use events::{EventBus, EventReceiver, EventSender, InputEvent, SceneEvent};
pub use math::{Vec2, Vec3};
pub use script::{NativeScript, Script, ScriptContext, ScriptHooks};
pub use sync::{MainThreadHandle, MainThreadQueue, WorkerPool};
