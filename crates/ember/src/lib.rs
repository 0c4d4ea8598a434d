//! # EMBER
//!
//! The engine crate: a scene that ties the ECS, scripting and collision
//! together, driven by a fixed-timestep loop.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              EMBER ENGINE                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐   │
//! │  │   ember_core    │     │  ember_physics  │     │   Renderer      │   │
//! │  │                 │────>│                 │     │   (backend)     │   │
//! │  │  • Archetypes   │     │  • Sweep/Prune  │     │  • QuadBatch    │   │
//! │  │  • Scripts      │     │  • Narrow phase │     │  • Instances    │   │
//! │  │  • Events       │     │  • Response     │     │                 │   │
//! │  └────────┬────────┘     └────────┬────────┘     └────────▲────────┘   │
//! │           │                       │                       │            │
//! │           │              ┌────────▼────────┐              │            │
//! │           └─────────────>│     Scene       │──────────────┘            │
//! │                          │  • systems      │                           │
//! │                          │  • GameLoop     │                           │
//! │                          │  • config       │                           │
//! │                          └─────────────────┘                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML engine configuration
//! - `game_loop`: fixed-timestep frame orchestration and timing
//! - `scene`: composition root
//! - `systems`: kinematics, scripts, collision, render
//! - `renderer`: backend seam and instance batching
//! - `resources`: shared texture cache

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod game_loop;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod systems;

pub use ember_core as core;
pub use ember_physics as physics;

pub use config::{ConfigError, ConfigResult, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop};
pub use renderer::{CubeDraw, QuadBatch, QuadDraw, Renderer};
pub use resources::{TextureCache, TextureInfo};
pub use scene::{Scene, SceneStats};
