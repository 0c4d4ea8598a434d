//! # Archetype Registry
//!
//! Owns every archetype, the entity allocator and the entity records.
//!
//! ## Structural changes
//!
//! | call                   | effect                                             |
//! |------------------------|----------------------------------------------------|
//! | `create_components`    | replace: old row removed, bundle becomes the set   |
//! | `add_components`       | union: old row migrated, bundle values override    |
//! | `remove_components`    | difference: old row migrated without the set       |
//! | `remove` / `remove_entity` | row and record removed, id stays alive         |
//! | `destroy_entity`       | row and record removed, id recycled                |
//!
//! Every removal is swap-and-pop. The entity swapped into the hole gets its
//! record patched before the call returns.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::archetype::{Archetype, Removal};
use super::bundle::{Bundle, ComponentSet};
use super::component::{Bitmask, Component};
use super::entity::{Column, EntityAllocator, EntityId, Record};
use super::query::{Chunk, Fetch};
use crate::error::{EcsError, EcsResult};

/// Archetype ECS storage.
#[derive(Debug, Default)]
pub struct ArcheRegistry {
    /// Archetypes in creation order. Never removed, only emptied.
    archetypes: Vec<Archetype>,
    /// Signature to position in `archetypes`.
    index: HashMap<Bitmask, usize>,
    entities: EntityAllocator,
}

impl ArcheRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Allocates a new entity with no components.
    pub fn create_entity(&mut self) -> EntityId {
        let entity = self.entities.allocate();
        trace!(%entity, "entity created");
        entity
    }

    /// Sets the components of `entity` to exactly `bundle`.
    ///
    /// Any previous row is removed first.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or the bundle repeats a type.
    pub fn create_components<B: Bundle>(&mut self, entity: EntityId, bundle: B) -> Record {
        let mask = B::mask();
        if !self.entities.is_alive(entity) {
            crate::fatal!("cannot attach components to dead entity {}", entity);
        }
        if let Some(old) = self.entities.record(entity) {
            self.remove_row(old);
        }

        let slot = self.archetype_slot(mask);
        let archetype = &mut self.archetypes[slot];
        let column = archetype.push_entity(entity);
        bundle.push_into(archetype);
        debug_assert!(archetype.is_consistent(), "bundle push out of step");

        let record = Record {
            bitmask: mask,
            column,
        };
        self.entities.set_record(entity, Some(record));
        record
    }

    /// Adds `bundle` to the components `entity` already has.
    ///
    /// Components present in both keep the bundle's value.
    ///
    /// # Panics
    ///
    /// Panics if the entity is not alive or the bundle repeats a type.
    pub fn add_components<B: Bundle>(&mut self, entity: EntityId, bundle: B) -> Record {
        let Some(old) = self.entities.record(entity) else {
            return self.create_components(entity, bundle);
        };
        let added = B::mask();
        let target_mask = old.bitmask.union(added);

        if target_mask == old.bitmask {
            let slot = self.archetype_slot(old.bitmask);
            bundle.write_into(&mut self.archetypes[slot], old.column);
            return old;
        }

        let (source, target) = self.archetype_pair(old.bitmask, target_mask);
        let column = target.push_entity(entity);
        let removal = source.migrate_row(old.column, target, added);
        bundle.push_into(target);
        debug_assert!(target.is_consistent(), "migration out of step");

        self.patch_moved(removal, old.column);
        let record = Record {
            bitmask: target_mask,
            column,
        };
        self.entities.set_record(entity, Some(record));
        record
    }

    /// Removes the components in `S` and keeps the rest.
    ///
    /// Returns the new record, or `None` when nothing is left. Components in
    /// `S` the entity does not have are ignored.
    pub fn remove_components<S: ComponentSet>(&mut self, entity: EntityId) -> Option<Record> {
        let old = self.entities.record(entity)?;
        let target_mask = old.bitmask.difference(S::mask());
        if target_mask == old.bitmask {
            return Some(old);
        }
        if target_mask.is_empty() {
            self.remove_row(old);
            self.entities.set_record(entity, None);
            return None;
        }

        let (source, target) = self.archetype_pair(old.bitmask, target_mask);
        let column = target.push_entity(entity);
        let removal = source.migrate_row(old.column, target, Bitmask::EMPTY);
        debug_assert!(target.is_consistent(), "migration out of step");

        self.patch_moved(removal, old.column);
        let record = Record {
            bitmask: target_mask,
            column,
        };
        self.entities.set_record(entity, Some(record));
        Some(record)
    }

    /// Removes the entity's row and record, checking `S` as its signature.
    ///
    /// `S` must be the entity's exact component set. The row is still found
    /// through the entity's record; `S` only has to agree with it. Returns
    /// `false` if the entity had no row.
    ///
    /// # Panics
    ///
    /// Panics if `S` does not match the recorded signature.
    pub fn remove<S: ComponentSet>(&mut self, entity: EntityId) -> bool {
        let Some(record) = self.entities.record(entity) else {
            return false;
        };
        let hint = S::mask();
        if hint != record.bitmask {
            crate::fatal!(
                "removal hint {:#b} does not match entity {} signature {:#b}",
                hint,
                entity,
                record.bitmask
            );
        }
        self.remove_row(Record {
            bitmask: hint,
            column: record.column,
        });
        self.entities.set_record(entity, None)
    }

    /// Removes the entity's row and record via its record.
    ///
    /// Returns `false` if the entity had no row.
    pub fn remove_entity(&mut self, entity: EntityId) -> bool {
        let Some(record) = self.entities.record(entity) else {
            return false;
        };
        self.remove_row(record);
        self.entities.set_record(entity, None)
    }

    /// Removes the entity's row and recycles its id.
    ///
    /// Returns `false` for dead or stale ids.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        match self.entities.free(entity) {
            Some(record) => {
                if let Some(record) = record {
                    self.remove_row(record);
                }
                trace!(%entity, "entity destroyed");
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Component access
    // =========================================================================

    /// Borrows component `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead, has no components, or lacks `T`.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: EntityId) -> &T {
        match self.try_get_component(entity) {
            Ok(component) => component,
            Err(err) => crate::fatal!("{}", err),
        }
    }

    /// Mutably borrows component `T` of `entity`.
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead, has no components, or lacks `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: EntityId) -> &mut T {
        match self.try_get_component_mut(entity) {
            Ok(component) => component,
            Err(err) => crate::fatal!("{}", err),
        }
    }

    /// Borrows several components of `entity` at once.
    ///
    /// ```rust,ignore
    /// let (transform, velocity) =
    ///     registry.get_components::<(&mut Transform2d, &Velocity2d)>(entity);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if the entity is dead, has no components, or lacks one of them.
    pub fn get_components<Q: Fetch>(&mut self, entity: EntityId) -> Q::Item<'_> {
        match self.try_get_components::<Q>(entity) {
            Ok(items) => items,
            Err(err) => crate::fatal!("{}", err),
        }
    }

    /// Borrows component `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead, has no components, or lacks `T`.
    pub fn try_get_component<T: Component>(&self, entity: EntityId) -> EcsResult<&T> {
        let record = self.require_component(entity, Bitmask::of::<T>(), T::NAME)?;
        self.archetypes[self.index[&record.bitmask]]
            .get::<T>(record.column)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Mutably borrows component `T` of `entity`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead, has no components, or lacks `T`.
    pub fn try_get_component_mut<T: Component>(&mut self, entity: EntityId) -> EcsResult<&mut T> {
        let record = self.require_component(entity, Bitmask::of::<T>(), T::NAME)?;
        let slot = self.index[&record.bitmask];
        self.archetypes[slot]
            .get_mut::<T>(record.column)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Borrows several components of `entity` at once.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is dead, has no components, or lacks
    /// one of them.
    pub fn try_get_components<Q: Fetch>(&mut self, entity: EntityId) -> EcsResult<Q::Item<'_>> {
        let record = self.require_component(entity, Q::required(), "requested")?;
        let slot = self.index[&record.bitmask];
        Ok(self.archetypes[slot].extract_column::<Q>(record.column))
    }

    /// Checks whether `entity` is alive and has component `T`.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: EntityId) -> bool {
        self.entities
            .record(entity)
            .is_some_and(|record| record.bitmask.contains_id(T::ID))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// One chunk per non-empty archetype holding every component of `Q`.
    ///
    /// Chunk order is unspecified.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names a component twice.
    pub fn query<Q: Fetch>(&mut self) -> Vec<Chunk<'_, Q>> {
        self.query_without::<Q, ()>()
    }

    /// Like [`query`](Self::query), skipping archetypes that hold any
    /// component of `E`.
    ///
    /// # Panics
    ///
    /// Panics if `Q` names a component twice.
    pub fn query_without<Q: Fetch, E: ComponentSet>(&mut self) -> Vec<Chunk<'_, Q>> {
        let required = Q::required();
        let excluded = E::mask();
        self.archetypes
            .iter_mut()
            .filter(|archetype| {
                !archetype.is_empty() && archetype.bitmask().matches(required, excluded)
            })
            .map(|archetype| archetype.chunk::<Q>())
            .collect()
    }

    /// Number of entities in non-empty archetypes matching a filter.
    #[must_use]
    pub fn count_matching(&self, required: Bitmask, excluded: Bitmask) -> usize {
        self.archetypes
            .iter()
            .filter(|archetype| archetype.bitmask().matches(required, excluded))
            .map(Archetype::len)
            .sum()
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Record of a live entity, if it has components.
    #[inline]
    #[must_use]
    pub fn record(&self, entity: EntityId) -> Option<Record> {
        self.entities.record(entity)
    }

    /// Archetype for a signature, if one was ever created.
    #[must_use]
    pub fn archetype(&self, bitmask: Bitmask) -> Option<&Archetype> {
        self.index.get(&bitmask).map(|&slot| &self.archetypes[slot])
    }

    /// All archetypes, including empty ones.
    pub fn archetypes(&self) -> impl Iterator<Item = &Archetype> {
        self.archetypes.iter()
    }

    /// Number of archetypes ever created.
    #[inline]
    #[must_use]
    pub fn archetype_count(&self) -> usize {
        self.archetypes.len()
    }

    /// Number of live entities, with or without components.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Checks whether `entity` is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.entities.is_alive(entity)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn require_component(
        &self,
        entity: EntityId,
        required: Bitmask,
        component: &'static str,
    ) -> EcsResult<Record> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        let record = self
            .entities
            .record(entity)
            .ok_or(EcsError::NoComponents(entity))?;
        if !record.bitmask.contains(required) {
            return Err(EcsError::MissingComponent { entity, component });
        }
        Ok(record)
    }

    /// Position of the archetype for `bitmask`, creating it on first use.
    fn archetype_slot(&mut self, bitmask: Bitmask) -> usize {
        if let Some(&slot) = self.index.get(&bitmask) {
            return slot;
        }
        let slot = self.archetypes.len();
        self.archetypes.push(Archetype::new(bitmask));
        self.index.insert(bitmask, slot);
        debug!(
            bitmask = format_args!("{bitmask:#b}"),
            components = bitmask.len(),
            "archetype created"
        );
        slot
    }

    /// Mutable borrows of two distinct archetypes.
    fn archetype_pair(&mut self, source: Bitmask, target: Bitmask) -> (&mut Archetype, &mut Archetype) {
        debug_assert_ne!(source, target);
        let target = self.archetype_slot(target);
        let source = self.index[&source];
        if source < target {
            let (head, tail) = self.archetypes.split_at_mut(target);
            (&mut head[source], &mut tail[0])
        } else {
            let (head, tail) = self.archetypes.split_at_mut(source);
            (&mut tail[0], &mut head[target])
        }
    }

    fn remove_row(&mut self, record: Record) {
        let slot = self.index[&record.bitmask];
        let removal = self.archetypes[slot].remove(record.column);
        self.patch_moved(removal, record.column);
    }

    fn patch_moved(&mut self, removal: Removal, column: Column) {
        if let Some(moved) = removal.moved {
            self.entities.patch_column(moved, column);
        }
    }
}
