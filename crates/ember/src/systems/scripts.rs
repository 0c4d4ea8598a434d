//! Native script dispatch.
//!
//! Entities are collected before any hook runs, so scripts may create or
//! destroy entities freely. Entities created during a pass are picked up
//! on the next one.

use ember_core::script::{dispatch, Hook};
use ember_core::{ArcheRegistry, EntityId, EventSender, NativeScript, SceneEvent, ScriptHooks};

fn scripted_entities(registry: &mut ArcheRegistry, hook: ScriptHooks) -> Vec<EntityId> {
    let mut entities = Vec::new();
    for chunk in registry.query::<&NativeScript>() {
        for (entity, script) in chunk.with_entities() {
            if script.hooks().contains(hook) {
                entities.push(entity);
            }
        }
    }
    entities
}

/// Runs `on_create` for every script not created yet. Returns how many ran.
pub fn create_pending(registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>) -> usize {
    let mut pending = Vec::new();
    for chunk in registry.query::<&NativeScript>() {
        for (entity, script) in chunk.with_entities() {
            if !script.is_created() {
                pending.push(entity);
            }
        }
    }

    pending
        .into_iter()
        .filter(|&entity| dispatch(registry, events, entity, Hook::Create))
        .count()
}

/// Runs `on_update` on every script. Returns how many ran.
pub fn update(registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>, dt: f32) -> usize {
    run_all(registry, events, Hook::Update(dt))
}

/// Runs `on_render` on every script. Returns how many ran.
pub fn render(registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>) -> usize {
    run_all(registry, events, Hook::Render)
}

/// Delivers one event.
///
/// Collision and trigger events go to the scripts of the two entities
/// involved; input goes to every script.
pub fn deliver(
    registry: &mut ArcheRegistry,
    events: &EventSender<SceneEvent>,
    event: &SceneEvent,
) -> usize {
    match event.entities() {
        Some((a, b)) => {
            let mut delivered = usize::from(dispatch(registry, events, a, Hook::Event(event)));
            if b != a {
                delivered += usize::from(dispatch(registry, events, b, Hook::Event(event)));
            }
            delivered
        }
        None => run_all(registry, events, Hook::Event(event)),
    }
}

/// Runs `on_destroy` for `entity`, if it has a script.
pub fn destroy(registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>, entity: EntityId) -> bool {
    dispatch(registry, events, entity, Hook::Destroy)
}

fn run_all(registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>, hook: Hook<'_>) -> usize {
    scripted_entities(registry, hook.flag())
        .into_iter()
        // Entities destroyed by an earlier script in this pass are skipped.
        .filter(|&entity| dispatch(registry, events, entity, hook))
        .count()
}
