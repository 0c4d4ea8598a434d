//! # Native Scripting
//!
//! Gameplay code implements [`Script`] and is attached to an entity with
//! [`NativeScript::bind`]. Every hook is optional; `HOOKS` declares which
//! ones the type actually implements so dispatch can skip the rest.
//!
//! ```rust,ignore
//! struct Spinner { speed: f32 }
//!
//! impl Script for Spinner {
//!     const HOOKS: ScriptHooks = ScriptHooks::UPDATE;
//!
//!     fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult {
//!         ctx.get_mut::<Rotation>()?.radians += self.speed * dt;
//!         Ok(())
//!     }
//! }
//!
//! registry.create_components(entity, (Rotation::default(), NativeScript::bind(Spinner { speed: 1.0 })));
//! ```
//!
//! While a hook runs, the script object is taken out of its component, so
//! the hook gets full mutable access to the registry (including its own
//! entity). It is put back afterwards if the entity still has the component.

use tracing::error;

use crate::ecs::{ArcheRegistry, Component, EntityId};
use crate::error::{EcsResult, ScriptResult};
use crate::events::{EventSender, SceneEvent};

/// Set of script hooks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScriptHooks(u8);

impl ScriptHooks {
    /// No hooks.
    pub const NONE: Self = Self(0);
    /// `on_create`.
    pub const CREATE: Self = Self(1 << 0);
    /// `on_update`.
    pub const UPDATE: Self = Self(1 << 1);
    /// `on_event`.
    pub const EVENT: Self = Self(1 << 2);
    /// `on_render`.
    pub const RENDER: Self = Self(1 << 3);
    /// `on_destroy`.
    pub const DESTROY: Self = Self(1 << 4);
    /// Every hook.
    pub const ALL: Self = Self(0b1_1111);

    /// Set union.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Checks whether every hook of `other` is in the set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ScriptHooks {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

/// What a running hook may touch.
pub struct ScriptContext<'a> {
    /// The scene's registry.
    pub registry: &'a mut ArcheRegistry,
    /// Entity the script is attached to.
    pub entity: EntityId,
    /// Scene event channel.
    pub events: &'a EventSender<SceneEvent>,
}

impl ScriptContext<'_> {
    /// Borrows a component of the script's entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity lacks `T`.
    pub fn get<T: Component>(&self) -> EcsResult<&T> {
        self.registry.try_get_component(self.entity)
    }

    /// Mutably borrows a component of the script's entity.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity lacks `T`.
    pub fn get_mut<T: Component>(&mut self) -> EcsResult<&mut T> {
        self.registry.try_get_component_mut(self.entity)
    }

    /// Emits a scene event. Returns `false` if it was dropped.
    pub fn emit(&self, event: SceneEvent) -> bool {
        self.events.send(event)
    }
}

/// Native gameplay script.
///
/// All hooks default to doing nothing.
pub trait Script: Send + 'static {
    /// Hooks this type implements. Hooks outside the set are never called.
    const HOOKS: ScriptHooks = ScriptHooks::ALL;

    /// Runs once, before the first update.
    fn on_create(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    /// Runs every fixed update.
    fn on_update(&mut self, _ctx: &mut ScriptContext<'_>, _dt: f32) -> ScriptResult {
        Ok(())
    }

    /// Runs for every scene event.
    fn on_event(&mut self, _ctx: &mut ScriptContext<'_>, _event: &SceneEvent) -> ScriptResult {
        Ok(())
    }

    /// Runs every rendered frame.
    fn on_render(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }

    /// Runs when the entity is destroyed through the scene.
    fn on_destroy(&mut self, _ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Ok(())
    }
}

/// Object-safe form of [`Script`].
pub trait DynScript: Send {
    /// See [`Script::on_create`].
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult;
    /// See [`Script::on_update`].
    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult;
    /// See [`Script::on_event`].
    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &SceneEvent) -> ScriptResult;
    /// See [`Script::on_render`].
    fn on_render(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult;
    /// See [`Script::on_destroy`].
    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult;
}

impl<S: Script> DynScript for S {
    fn on_create(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Script::on_create(self, ctx)
    }

    fn on_update(&mut self, ctx: &mut ScriptContext<'_>, dt: f32) -> ScriptResult {
        Script::on_update(self, ctx, dt)
    }

    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &SceneEvent) -> ScriptResult {
        Script::on_event(self, ctx, event)
    }

    fn on_render(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Script::on_render(self, ctx)
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        Script::on_destroy(self, ctx)
    }
}

/// Component holding a bound script.
pub struct NativeScript {
    script: Option<Box<dyn DynScript>>,
    hooks: ScriptHooks,
    created: bool,
    type_name: &'static str,
}

impl NativeScript {
    /// Binds a script instance.
    #[must_use]
    pub fn bind<S: Script>(script: S) -> Self {
        Self {
            script: Some(Box::new(script)),
            hooks: S::HOOKS,
            created: false,
            type_name: std::any::type_name::<S>(),
        }
    }

    /// Hooks the bound script implements.
    #[must_use]
    pub const fn hooks(&self) -> ScriptHooks {
        self.hooks
    }

    /// True once `on_create` was dispatched.
    #[must_use]
    pub const fn is_created(&self) -> bool {
        self.created
    }

    /// Type name of the bound script.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// True while one of the script's hooks is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.script.is_none()
    }
}

impl std::fmt::Debug for NativeScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeScript")
            .field("type_name", &self.type_name)
            .field("hooks", &self.hooks)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

/// One hook invocation.
#[derive(Clone, Copy, Debug)]
pub enum Hook<'e> {
    /// `on_create`.
    Create,
    /// `on_update` with the fixed step.
    Update(f32),
    /// `on_event`.
    Event(&'e SceneEvent),
    /// `on_render`.
    Render,
    /// `on_destroy`.
    Destroy,
}

impl Hook<'_> {
    /// Flag of this hook in [`ScriptHooks`].
    #[must_use]
    pub const fn flag(self) -> ScriptHooks {
        match self {
            Self::Create => ScriptHooks::CREATE,
            Self::Update(_) => ScriptHooks::UPDATE,
            Self::Event(_) => ScriptHooks::EVENT,
            Self::Render => ScriptHooks::RENDER,
            Self::Destroy => ScriptHooks::DESTROY,
        }
    }

    /// Name used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Create => "on_create",
            Self::Update(_) => "on_update",
            Self::Event(_) => "on_event",
            Self::Render => "on_render",
            Self::Destroy => "on_destroy",
        }
    }
}

/// Runs one hook of the script attached to `entity`.
///
/// Returns `true` if the hook was called. A hook returning an error is
/// logged and otherwise ignored. `Create` marks the script created even
/// when the type does not implement `on_create`.
pub fn dispatch(
    registry: &mut ArcheRegistry,
    events: &EventSender<SceneEvent>,
    entity: EntityId,
    hook: Hook<'_>,
) -> bool {
    let Ok(native) = registry.try_get_component_mut::<NativeScript>(entity) else {
        return false;
    };
    if matches!(hook, Hook::Create) {
        native.created = true;
    }
    if !native.hooks.contains(hook.flag()) {
        return false;
    }
    // Already running further up the stack.
    let Some(mut script) = native.script.take() else {
        return false;
    };
    let type_name = native.type_name;

    let result = {
        let mut ctx = ScriptContext {
            registry: &mut *registry,
            entity,
            events,
        };
        match hook {
            Hook::Create => script.on_create(&mut ctx),
            Hook::Update(dt) => script.on_update(&mut ctx, dt),
            Hook::Event(event) => script.on_event(&mut ctx, event),
            Hook::Render => script.on_render(&mut ctx),
            Hook::Destroy => script.on_destroy(&mut ctx),
        }
    };
    if let Err(err) = result {
        error!(script = type_name, hook = hook.name(), %entity, %err, "script hook failed");
    }

    if let Ok(native) = registry.try_get_component_mut::<NativeScript>(entity) {
        if native.script.is_none() {
            native.script = Some(script);
        }
    }
    true
}
