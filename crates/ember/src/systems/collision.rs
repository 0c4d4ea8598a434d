//! Collision system: runs sweep and prune and turns contacts into events.

use ember_core::ecs::components::RigidBody2d;
use ember_core::{ArcheRegistry, EventSender, SceneEvent};
use ember_physics::{Contact, ContactKind, SapStats, SweepAndPrune};
use tracing::trace;

/// Sweep and prune plus event emission.
#[derive(Debug)]
pub struct CollisionSystem {
    sap: SweepAndPrune,
    enabled: bool,
}

impl CollisionSystem {
    /// Creates the system. `default_body` applies to dynamic colliders
    /// without a [`RigidBody2d`].
    #[must_use]
    pub fn new(enabled: bool, default_body: RigidBody2d) -> Self {
        Self {
            sap: SweepAndPrune::with_default_body(default_body),
            enabled,
        }
    }

    /// Runs one collision pass and emits one event per contact.
    ///
    /// Returns the number of contacts.
    pub fn update(&mut self, registry: &mut ArcheRegistry, events: &EventSender<SceneEvent>) -> usize {
        if !self.enabled {
            return 0;
        }

        let contacts = self.sap.on_update(registry);
        for contact in contacts {
            events.send(contact_event(contact));
        }
        trace!(contacts = contacts.len(), "collision pass");
        contacts.len()
    }

    /// Contacts of the last pass.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        self.sap.contacts()
    }

    /// Counters of the last pass.
    #[must_use]
    pub fn stats(&self) -> SapStats {
        self.sap.last_stats()
    }

    /// The underlying broad phase.
    #[must_use]
    pub fn sweep_and_prune(&self) -> &SweepAndPrune {
        &self.sap
    }

    /// Whether passes run.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turns passes on or off. Tracked colliders are kept.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

fn contact_event(contact: &Contact) -> SceneEvent {
    match contact.kind {
        ContactKind::Trigger => SceneEvent::Trigger {
            a: contact.a,
            b: contact.b,
        },
        ContactKind::Solid => SceneEvent::Collision {
            a: contact.a,
            b: contact.b,
            normal: contact.normal,
            penetration: contact.penetration,
        },
    }
}

#[cfg(test)]
mod tests {
    use ember_core::ecs::components::{Collider2d, Shape2d, Transform2d, Velocity2d};
    use ember_core::{EventBus, Vec2};

    use super::*;

    #[test]
    fn test_contacts_become_events() {
        let mut registry = ArcheRegistry::new();
        let bus = EventBus::new(16);
        let (sender, receiver) = (bus.sender(), bus.receiver());

        let sensor = registry.create_entity();
        let ball = registry.create_entity();
        registry.create_components(
            sensor,
            (
                Transform2d::at(Vec2::ZERO),
                Collider2d::trigger(Shape2d::aabb(2.0, 2.0)),
                Velocity2d::default(),
            ),
        );
        registry.create_components(
            ball,
            (
                Transform2d::at(Vec2::new(1.0, 0.0)),
                Collider2d::solid(Shape2d::circle(0.5)),
                Velocity2d::default(),
            ),
        );

        let mut system = CollisionSystem::new(true, RigidBody2d::default());
        assert_eq!(system.update(&mut registry, &sender), 1);

        let events = receiver.drain();
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], SceneEvent::Trigger { .. }));
        let (a, b) = events[0].entities().unwrap();
        assert!([a, b].contains(&sensor) && [a, b].contains(&ball));
        assert_eq!(system.stats().contacts, 1);

        system.set_enabled(false);
        assert_eq!(system.update(&mut registry, &sender), 0);
        assert!(!receiver.has_events());
    }
}
