//! # Entity Management
//!
//! Entities are lightweight identifiers consisting of:
//! - An index into the allocator's slot table
//! - A generation counter for safe reuse
//!
//! An entity owns no data. Its [`Record`] says which archetype and which
//! row of that archetype hold its components.

use super::component::Bitmask;

/// Unique identifier for an entity.
///
/// The ID is split into two parts:
/// - Lower 32 bits: Slot index (recycled after destruction)
/// - Upper 32 bits: Generation counter for detecting stale references
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new entity ID from index and generation.
    #[inline]
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self(((generation as u64) << 32) | (index as u64))
    }

    /// Returns the index portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 as u32
    }

    /// Returns the generation portion of the entity ID.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Returns the raw 64-bit value.
    #[inline]
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        self.0
    }

    /// Null/invalid entity ID.
    pub const NULL: Self = Self(u64::MAX);

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u64::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}v{}", self.index(), self.generation())
    }
}

/// Row index of an entity inside its archetype's parallel arrays.
///
/// Not stable: a swap-and-pop removal moves the last row into the hole.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Column(u32);

impl Column {
    /// Creates a column from a row index.
    #[inline]
    #[must_use]
    pub const fn new(row: u32) -> Self {
        Self(row)
    }

    /// Returns the row index as `usize` for slice indexing.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub(crate) fn from_len(len: usize) -> Self {
        // Archetypes never approach u32::MAX rows; the allocator caps ids at u32 too.
        Self(u32::try_from(len).unwrap_or(u32::MAX))
    }
}

/// Location of an entity's component data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record {
    /// Signature of the archetype holding the entity.
    pub bitmask: Bitmask,
    /// Row inside that archetype.
    pub column: Column,
}

/// One slot of the allocator.
#[derive(Clone, Copy, Debug)]
struct Slot {
    generation: u32,
    alive: bool,
    record: Option<Record>,
}

/// Hands out entity ids and stores their records.
///
/// Destroyed slots go onto a free list and come back with a bumped
/// generation, so a stale id never aliases a new entity.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    slots: Vec<Slot>,
    free_indices: Vec<u32>,
    alive_count: usize,
}

impl EntityAllocator {
    /// Creates an empty allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a new entity id without a record.
    pub fn allocate(&mut self) -> EntityId {
        self.alive_count += 1;

        if let Some(index) = self.free_indices.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.alive = true;
            slot.record = None;
            return EntityId::new(index, slot.generation);
        }

        let Ok(index) = u32::try_from(self.slots.len()) else {
            crate::fatal!("entity index space exhausted");
        };
        self.slots.push(Slot {
            generation: 0,
            alive: true,
            record: None,
        });
        EntityId::new(index, 0)
    }

    /// Frees an entity slot for reuse.
    ///
    /// Returns the record the entity still had, if any. Returns `None`
    /// and does nothing for dead or stale ids.
    pub fn free(&mut self, id: EntityId) -> Option<Option<Record>> {
        let slot = self.live_slot_mut(id)?;
        slot.alive = false;
        let record = slot.record.take();
        self.alive_count -= 1;
        self.free_indices.push(id.index());
        Some(record)
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.live_slot(id).is_some()
    }

    /// Returns the record of a live entity.
    #[inline]
    #[must_use]
    pub fn record(&self, id: EntityId) -> Option<Record> {
        self.live_slot(id).and_then(|slot| slot.record)
    }

    /// Sets (or clears) the record of a live entity.
    ///
    /// Returns `false` if the id is dead or stale.
    #[inline]
    pub fn set_record(&mut self, id: EntityId, record: Option<Record>) -> bool {
        match self.live_slot_mut(id) {
            Some(slot) => {
                slot.record = record;
                true
            }
            None => false,
        }
    }

    /// Patches only the column of an entity that was moved by swap-and-pop.
    #[inline]
    pub fn patch_column(&mut self, id: EntityId, column: Column) {
        if let Some(record) = self.live_slot_mut(id).and_then(|slot| slot.record.as_mut()) {
            record.column = column;
        }
    }

    /// Returns the number of currently alive entities.
    #[inline]
    #[must_use]
    pub const fn alive_count(&self) -> usize {
        self.alive_count
    }

    fn live_slot(&self, id: EntityId) -> Option<&Slot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get(id.index() as usize)
            .filter(|slot| slot.alive && slot.generation == id.generation())
    }

    fn live_slot_mut(&mut self, id: EntityId) -> Option<&mut Slot> {
        if id.is_null() {
            return None;
        }
        self.slots
            .get_mut(id.index() as usize)
            .filter(|slot| slot.alive && slot.generation == id.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_roundtrip() {
        let id = EntityId::new(12345, 67890);
        assert_eq!(id.index(), 12345);
        assert_eq!(id.generation(), 67890);
        assert!(!id.is_null());
        assert!(EntityId::default().is_null());
    }

    #[test]
    fn test_allocate_free_recycles_with_new_generation() {
        let mut alloc = EntityAllocator::new();

        let id1 = alloc.allocate();
        let id2 = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        assert_ne!(id1, id2);

        assert_eq!(alloc.free(id1), Some(None));
        assert!(!alloc.is_alive(id1));
        assert_eq!(alloc.alive_count(), 1);

        // Spawn again - should reuse the slot
        let id3 = alloc.allocate();
        assert_eq!(id3.index(), id1.index());
        assert_ne!(id3.generation(), id1.generation());
        assert!(alloc.is_alive(id3));
        assert!(!alloc.is_alive(id1));

        // Stale frees are ignored
        assert_eq!(alloc.free(id1), None);
        assert_eq!(alloc.alive_count(), 2);
    }

    #[test]
    fn test_record_tracking() {
        let mut alloc = EntityAllocator::new();
        let id = alloc.allocate();
        assert_eq!(alloc.record(id), None);

        let record = Record {
            bitmask: Bitmask::from_bits(0b101),
            column: Column::new(3),
        };
        assert!(alloc.set_record(id, Some(record)));
        alloc.patch_column(id, Column::new(1));
        assert_eq!(alloc.record(id).unwrap().column, Column::new(1));

        assert_eq!(alloc.free(id), Some(Some(Record { column: Column::new(1), ..record })));
    }
}
