//! # Archetype Storage
//!
//! One archetype stores every entity that has exactly the same set of
//! components.
//!
//! ```text
//! Archetype {Transform2d, Sprite}   (bitmask 0b10_0001)
//!
//!   row:         0      1      2
//!   entities:  [ e7  | e2  | e11 ]
//!   columns[0]:[ T7  | T2  | T11 ]   Transform2d (id 0)
//!   columns[1]:[ S7  | S2  | S11 ]   Sprite      (id 5)
//! ```
//!
//! Columns are ordered by component id, so the column slot of a component
//! is the rank of its bit in the signature. Rows are removed with
//! swap-and-pop; the caller patches the record of the entity that moved.

use super::component::{Bitmask, Component};
use super::components::ColumnStorage;
use super::entity::{Column, EntityId};
use super::query::{Chunk, ColumnPicker, Fetch};

/// Outcome of removing a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Removal {
    /// Entity that was swapped into the removed row, if any.
    ///
    /// `None` when the removed row was the last one.
    pub moved: Option<EntityId>,
    /// Number of rows left in the archetype.
    pub len: usize,
}

/// Columnar storage for all entities sharing one signature.
#[derive(Debug)]
pub struct Archetype {
    bitmask: Bitmask,
    entities: Vec<EntityId>,
    columns: Vec<ColumnStorage>,
}

impl Archetype {
    /// Creates an empty archetype with one column per id in `bitmask`.
    #[must_use]
    pub fn new(bitmask: Bitmask) -> Self {
        Self {
            bitmask,
            entities: Vec::new(),
            columns: bitmask.ids().map(ColumnStorage::empty).collect(),
        }
    }

    /// Signature of this archetype.
    #[inline]
    #[must_use]
    pub const fn bitmask(&self) -> Bitmask {
        self.bitmask
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True when no entity is stored.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity owning each row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// Checks whether component `T` is stored here.
    #[inline]
    #[must_use]
    pub const fn has<T: Component>(&self) -> bool {
        self.bitmask.contains_id(T::ID)
    }

    /// Appends an entity id and returns its row.
    ///
    /// Must be paired with exactly one [`push_component`](Self::push_component)
    /// per component in the signature.
    pub fn push_entity(&mut self, entity: EntityId) -> Column {
        self.entities.push(entity);
        Column::from_len(self.entities.len() - 1)
    }

    /// Appends a value to `T`'s column and returns its row.
    ///
    /// # Panics
    ///
    /// Panics if `T` is not part of this archetype.
    pub fn push_component<T: Component>(&mut self, value: T) -> Column {
        let column = self.typed_column_mut::<T>();
        column.push(value);
        Column::from_len(column.len() - 1)
    }

    /// `T`'s column as a slice.
    #[inline]
    #[must_use]
    pub fn column<T: Component>(&self) -> Option<&[T]> {
        let slot = self.slot(T::ID)?;
        T::column(&self.columns[slot]).map(Vec::as_slice)
    }

    /// `T`'s column as a mutable slice.
    #[inline]
    pub fn column_mut<T: Component>(&mut self) -> Option<&mut [T]> {
        let slot = self.slot(T::ID)?;
        T::column_mut(&mut self.columns[slot]).map(Vec::as_mut_slice)
    }

    /// Borrows `T` at `column`.
    #[inline]
    #[must_use]
    pub fn get<T: Component>(&self, column: Column) -> Option<&T> {
        self.column::<T>()?.get(column.index())
    }

    /// Mutably borrows `T` at `column`.
    #[inline]
    pub fn get_mut<T: Component>(&mut self, column: Column) -> Option<&mut T> {
        self.column_mut::<T>()?.get_mut(column.index())
    }

    /// Returns a tuple of references into the columns at `column`.
    ///
    /// ```rust,ignore
    /// let (transform, velocity) =
    ///     archetype.extract_column::<(&mut Transform2d, &Velocity2d)>(row);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if a requested component is absent or requested twice.
    pub fn extract_column<Q: Fetch>(&mut self, column: Column) -> Q::Item<'_> {
        let mut picker = ColumnPicker::new(self.bitmask, &mut self.columns);
        Q::row(Q::take(&mut picker), column.index())
    }

    /// Typed view of every row for a query.
    ///
    /// # Panics
    ///
    /// Panics if a requested component is absent or requested twice.
    pub fn chunk<Q: Fetch>(&mut self) -> Chunk<'_, Q> {
        let mut picker = ColumnPicker::new(self.bitmask, &mut self.columns);
        let data = Q::take(&mut picker);
        Chunk::new(&self.entities, data)
    }

    /// Removes a row with swap-and-pop across every column.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of range.
    pub fn remove(&mut self, column: Column) -> Removal {
        let row = self.check_row(column);
        for storage in &mut self.columns {
            storage.swap_remove(row);
        }
        self.finish_removal(row)
    }

    /// Moves a row into `target`.
    ///
    /// Components the target also stores are moved unless their id is in
    /// `skip`; the rest are dropped. The caller pushes the entity id and the
    /// skipped or missing components onto `target` itself.
    ///
    /// # Panics
    ///
    /// Panics if `column` is out of range.
    pub fn migrate_row(&mut self, column: Column, target: &mut Self, skip: Bitmask) -> Removal {
        let row = self.check_row(column);
        let carried = target.bitmask.difference(skip);
        for storage in &mut self.columns {
            let id = storage.component_id();
            if carried.contains_id(id) {
                let slot = target.bitmask.rank(id);
                storage.move_row(row, &mut target.columns[slot]);
            } else {
                storage.swap_remove(row);
            }
        }
        self.finish_removal(row)
    }

    /// Checks that every column has as many rows as `entities`.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.columns.iter().all(|storage| storage.len() == self.entities.len())
    }

    /// Mutable reference that must exist; used by bundle overwrites.
    pub(crate) fn expect_mut<T: Component>(&mut self, column: Column) -> &mut T {
        let row = self.check_row(column);
        &mut self.typed_column_mut::<T>()[row]
    }

    #[inline]
    fn slot(&self, id: u8) -> Option<usize> {
        self.bitmask.contains_id(id).then(|| self.bitmask.rank(id))
    }

    fn typed_column_mut<T: Component>(&mut self) -> &mut Vec<T> {
        let Some(slot) = self.slot(T::ID) else {
            crate::fatal!(
                "archetype {:#b} does not store component {}",
                self.bitmask,
                T::NAME
            );
        };
        match T::column_mut(&mut self.columns[slot]) {
            Some(column) => column,
            None => crate::fatal!("column slot {} does not hold {}", slot, T::NAME),
        }
    }

    fn check_row(&self, column: Column) -> usize {
        let row = column.index();
        if row >= self.entities.len() {
            crate::fatal!(
                "row {} out of range for archetype {:#b} with {} rows",
                row,
                self.bitmask,
                self.entities.len()
            );
        }
        row
    }

    fn finish_removal(&mut self, row: usize) -> Removal {
        self.entities.swap_remove(row);
        debug_assert!(self.is_consistent(), "archetype columns out of step");
        Removal {
            moved: self.entities.get(row).copied(),
            len: self.entities.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Sprite, Transform2d, Velocity2d};
    use crate::math::Vec2;

    fn transform(x: f32) -> Transform2d {
        Transform2d::at(Vec2::new(x, 0.0))
    }

    fn filled(count: u32) -> Archetype {
        let mask = Bitmask::of::<Transform2d>().union(Bitmask::of::<Velocity2d>());
        let mut archetype = Archetype::new(mask);
        for i in 0..count {
            archetype.push_entity(EntityId::new(i, 0));
            archetype.push_component(transform(i as f32));
            archetype.push_component(Velocity2d::new(i as f32, 0.0));
        }
        archetype
    }

    #[test]
    fn test_push_keeps_columns_in_step() {
        let archetype = filled(3);
        assert_eq!(archetype.len(), 3);
        assert!(archetype.is_consistent());
        assert_eq!(archetype.get::<Transform2d>(Column::new(2)), Some(&transform(2.0)));
        assert!(archetype.column::<Sprite>().is_none());
    }

    #[test]
    fn test_remove_middle_swaps_last_row_in() {
        let mut archetype = filled(4);

        let removal = archetype.remove(Column::new(1));
        assert_eq!(removal.moved, Some(EntityId::new(3, 0)));
        assert_eq!(removal.len, 3);
        assert_eq!(archetype.entities()[1], EntityId::new(3, 0));
        assert_eq!(archetype.get::<Transform2d>(Column::new(1)), Some(&transform(3.0)));
        assert_eq!(
            archetype.get::<Velocity2d>(Column::new(1)),
            Some(&Velocity2d::new(3.0, 0.0))
        );
    }

    #[test]
    fn test_remove_last_moves_nothing() {
        let mut archetype = filled(2);
        let removal = archetype.remove(Column::new(1));
        assert_eq!(removal, Removal { moved: None, len: 1 });
    }

    #[test]
    fn test_extract_column_mixed_access() {
        let mut archetype = filled(2);
        let (t, v) = archetype.extract_column::<(&mut Transform2d, &Velocity2d)>(Column::new(1));
        t.position += v.linear;
        assert_eq!(
            archetype.get::<Transform2d>(Column::new(1)).map(|t| t.position),
            Some(Vec2::new(2.0, 0.0))
        );
    }

    #[test]
    #[should_panic(expected = "does not store component Sprite")]
    fn test_extract_absent_component_is_fatal() {
        let mut archetype = filled(1);
        let _ = archetype.extract_column::<&Sprite>(Column::new(0));
    }

    #[test]
    fn test_migrate_row_carries_shared_components() {
        let mut source = filled(2);
        let mut target = Archetype::new(
            Bitmask::of::<Transform2d>().union(Bitmask::of::<Sprite>()),
        );

        let column = target.push_entity(EntityId::new(0, 0));
        let removal = source.migrate_row(Column::new(0), &mut target, Bitmask::EMPTY);
        target.push_component(Sprite::default());

        assert_eq!(removal.moved, Some(EntityId::new(1, 0)));
        assert!(source.is_consistent());
        assert!(target.is_consistent());
        assert_eq!(target.get::<Transform2d>(column), Some(&transform(0.0)));
    }
}
