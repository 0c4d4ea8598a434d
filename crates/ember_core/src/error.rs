//! # Error Types
//!
//! Two failure classes exist in the core:
//!
//! - **Structural misuse** (asking an archetype for a component it does not
//!   store, duplicate component types, desynchronised columns). These are
//!   programming errors; [`fatal!`](crate::fatal) logs them and panics.
//! - **Recoverable conditions** reported through [`EcsError`] and
//!   [`ScriptError`] by the `try_*` accessors and script hooks.

use thiserror::Error;

use crate::ecs::EntityId;

/// Logs a structural-misuse error at error level, then panics.
///
/// Continuing after such an error would leave parallel columns out of step,
/// so there is no recovery path.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)+) => {{
        ::tracing::error!($($arg)+);
        panic!($($arg)+)
    }};
}

/// Non-fatal ECS access failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// The entity was destroyed or the id is stale.
    #[error("entity {0} is not alive")]
    DeadEntity(EntityId),

    /// The entity exists but has no components yet.
    #[error("entity {0} has no components")]
    NoComponents(EntityId),

    /// The entity's archetype does not store the requested component.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// Entity that was queried.
        entity: EntityId,
        /// Name of the missing component.
        component: &'static str,
    },
}

/// Result type for fallible ECS accessors.
pub type EcsResult<T> = Result<T, EcsError>;

/// Failure reported by a native script hook.
///
/// The dispatcher logs it and skips that hook for the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    /// The script needed a component its entity does not have.
    #[error(transparent)]
    Ecs(#[from] EcsError),

    /// Script-defined failure.
    #[error("{0}")]
    Failed(String),
}

impl ScriptError {
    /// Creates a script-defined failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Result type returned by script hooks.
pub type ScriptResult = Result<(), ScriptError>;
