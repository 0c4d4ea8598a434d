//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file) is a valid configuration.
//!
//! ```toml
//! [loop]
//! update_hz = 60
//! max_updates_per_frame = 5
//!
//! [events]
//! capacity = 1024
//!
//! [workers]
//! threads = 2
//!
//! [physics]
//! enabled = true
//! default_restitution = 1.0
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted field path.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Fixed-timestep loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoopConfig {
    /// Simulation updates per second.
    pub update_hz: u32,
    /// Updates a frame may run and still render; busier frames skip the render.
    pub max_updates_per_frame: u32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            update_hz: 60,
            max_updates_per_frame: 5,
        }
    }
}

/// Scene event channel settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EventsConfig {
    /// Events in flight before further sends are dropped.
    pub capacity: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Background worker settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkersConfig {
    /// Worker thread count.
    pub threads: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self { threads: 2 }
    }
}

/// Collision settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhysicsConfig {
    /// Run the collision system.
    pub enabled: bool,
    /// Restitution of dynamic colliders without a `RigidBody2d`.
    pub default_restitution: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_restitution: 1.0,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// `[loop]` table.
    #[serde(rename = "loop")]
    pub timing: LoopConfig,
    /// `[events]` table.
    pub events: EventsConfig,
    /// `[workers]` table.
    pub workers: WorkersConfig,
    /// `[physics]` table.
    pub physics: PhysicsConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field.
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |field, reason| Err(ConfigError::Invalid { field, reason });

        if self.timing.update_hz == 0 {
            return invalid("loop.update_hz", "must be at least 1");
        }
        if self.timing.max_updates_per_frame == 0 {
            return invalid("loop.max_updates_per_frame", "must be at least 1");
        }
        if self.events.capacity == 0 {
            return invalid("events.capacity", "must be at least 1");
        }
        if self.workers.threads == 0 {
            return invalid("workers.threads", "must be at least 1");
        }
        let restitution = self.physics.default_restitution;
        if !(0.0..=1.0).contains(&restitution) {
            return invalid("physics.default_restitution", "must be within [0, 1]");
        }
        Ok(())
    }

    /// Duration of one simulation step.
    #[must_use]
    pub fn fixed_step(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.timing.update_hz.max(1)))
    }
}
