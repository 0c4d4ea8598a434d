//! # Typed Queries
//!
//! A query type is `&T`, `&mut T`, or a tuple of those:
//!
//! ```rust,ignore
//! for chunk in registry.query::<(&mut Transform2d, &Velocity2d)>() {
//!     for (transform, velocity) in chunk {
//!         transform.position += velocity.linear * dt;
//!     }
//! }
//! ```
//!
//! Every matching archetype yields one [`Chunk`]: the entity column plus
//! one slice per requested component. Iterating a chunk zips those slices,
//! so the inner loop is plain slice iteration.
//!
//! Borrow splitting is done by [`ColumnPicker`]: it holds one optional
//! mutable borrow per component id and hands each out at most once.

use std::marker::PhantomData;

use super::component::{Bitmask, Component, MAX_COMPONENTS};
use super::components::ColumnStorage;
use super::entity::EntityId;

/// Hands out typed column borrows of one archetype, each at most once.
pub struct ColumnPicker<'a> {
    archetype: Bitmask,
    slots: [Option<&'a mut ColumnStorage>; MAX_COMPONENTS],
}

impl<'a> ColumnPicker<'a> {
    /// Creates a picker over an archetype's columns.
    pub fn new(archetype: Bitmask, columns: &'a mut [ColumnStorage]) -> Self {
        let mut slots: [Option<&'a mut ColumnStorage>; MAX_COMPONENTS] =
            std::array::from_fn(|_| None);
        for storage in columns {
            let id = usize::from(storage.component_id());
            slots[id] = Some(storage);
        }
        Self { archetype, slots }
    }

    /// Takes `T`'s column.
    ///
    /// # Panics
    ///
    /// Panics if `T` is absent from the archetype or was already taken.
    pub fn take<T: Component>(&mut self) -> &'a mut Vec<T> {
        let Some(storage) = self.slots[usize::from(T::ID)].take() else {
            if self.archetype.contains_id(T::ID) {
                crate::fatal!("component {} requested twice in one query", T::NAME);
            }
            crate::fatal!(
                "archetype {:#b} does not store component {}",
                self.archetype,
                T::NAME
            );
        };
        match T::column_mut(storage) {
            Some(column) => column,
            None => crate::fatal!("column for id {} does not hold {}", T::ID, T::NAME),
        }
    }
}

/// Something that can be fetched from an archetype: `&T`, `&mut T`, or a
/// tuple of fetches.
pub trait Fetch {
    /// Borrowed column data for a whole archetype.
    type Slice<'a>;
    /// Data of a single row.
    type Item<'a>;
    /// Row iterator over a [`Slice`](Self::Slice).
    type Iter<'a>: Iterator<Item = Self::Item<'a>>;

    /// Components the fetch needs. Fatal if one repeats.
    fn required() -> Bitmask;

    /// Borrows the columns out of a picker.
    fn take<'a>(picker: &mut ColumnPicker<'a>) -> Self::Slice<'a>;

    /// Narrows a slice to one row.
    fn row<'a>(slice: Self::Slice<'a>, row: usize) -> Self::Item<'a>;

    /// Iterates all rows of a slice.
    fn iter<'a>(slice: Self::Slice<'a>) -> Self::Iter<'a>;
}

impl<T: Component> Fetch for &T {
    type Slice<'a> = &'a [T];
    type Item<'a> = &'a T;
    type Iter<'a> = std::slice::Iter<'a, T>;

    #[inline]
    fn required() -> Bitmask {
        Bitmask::of::<T>()
    }

    #[inline]
    fn take<'a>(picker: &mut ColumnPicker<'a>) -> Self::Slice<'a> {
        picker.take::<T>().as_slice()
    }

    #[inline]
    fn row<'a>(slice: Self::Slice<'a>, row: usize) -> Self::Item<'a> {
        &slice[row]
    }

    #[inline]
    fn iter<'a>(slice: Self::Slice<'a>) -> Self::Iter<'a> {
        slice.iter()
    }
}

impl<T: Component> Fetch for &mut T {
    type Slice<'a> = &'a mut [T];
    type Item<'a> = &'a mut T;
    type Iter<'a> = std::slice::IterMut<'a, T>;

    #[inline]
    fn required() -> Bitmask {
        Bitmask::of::<T>()
    }

    #[inline]
    fn take<'a>(picker: &mut ColumnPicker<'a>) -> Self::Slice<'a> {
        picker.take::<T>().as_mut_slice()
    }

    #[inline]
    fn row<'a>(slice: Self::Slice<'a>, row: usize) -> Self::Item<'a> {
        &mut slice[row]
    }

    #[inline]
    fn iter<'a>(slice: Self::Slice<'a>) -> Self::Iter<'a> {
        slice.iter_mut()
    }
}

/// Lockstep iterator over a tuple of row iterators.
pub struct TupleIter<I>(I);

macro_rules! impl_fetch_tuples {
    ($(($($name:ident),+)),+ $(,)?) => {
        $(
            impl<$($name: Fetch),+> Fetch for ($($name,)+) {
                type Slice<'a> = ($($name::Slice<'a>,)+);
                type Item<'a> = ($($name::Item<'a>,)+);
                type Iter<'a> = TupleIter<($($name::Iter<'a>,)+)>;

                fn required() -> Bitmask {
                    let mut mask = Bitmask::EMPTY;
                    $(
                        let next = $name::required();
                        if mask.intersects(next) {
                            crate::fatal!(
                                "component ids {:#b} requested twice in one query",
                                Bitmask::from_bits(mask.bits() & next.bits())
                            );
                        }
                        mask = mask.union(next);
                    )+
                    mask
                }

                #[allow(non_snake_case)]
                fn take<'a>(picker: &mut ColumnPicker<'a>) -> Self::Slice<'a> {
                    ($($name::take(picker),)+)
                }

                #[allow(non_snake_case)]
                fn row<'a>(slice: Self::Slice<'a>, row: usize) -> Self::Item<'a> {
                    let ($($name,)+) = slice;
                    ($($name::row($name, row),)+)
                }

                #[allow(non_snake_case)]
                fn iter<'a>(slice: Self::Slice<'a>) -> Self::Iter<'a> {
                    let ($($name,)+) = slice;
                    TupleIter(($($name::iter($name),)+))
                }
            }

            impl<$($name: Iterator),+> Iterator for TupleIter<($($name,)+)> {
                type Item = ($($name::Item,)+);

                #[allow(non_snake_case)]
                #[inline]
                fn next(&mut self) -> Option<Self::Item> {
                    let ($($name,)+) = &mut self.0;
                    Some(($($name.next()?,)+))
                }
            }
        )+
    };
}

impl_fetch_tuples! {
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
}

/// Typed view of one archetype for one query.
pub struct Chunk<'a, Q: Fetch> {
    entities: &'a [EntityId],
    data: Q::Slice<'a>,
    _query: PhantomData<fn() -> Q>,
}

impl<'a, Q: Fetch> Chunk<'a, Q> {
    pub(crate) fn new(entities: &'a [EntityId], data: Q::Slice<'a>) -> Self {
        Self {
            entities,
            data,
            _query: PhantomData,
        }
    }

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True for a chunk without rows.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity owning each row.
    #[inline]
    #[must_use]
    pub fn entities(&self) -> &'a [EntityId] {
        self.entities
    }

    /// The component slices, e.g. `(&mut [Transform2d], &[Velocity2d])`.
    #[inline]
    pub fn data(self) -> Q::Slice<'a> {
        self.data
    }

    /// Iterates rows together with their owning entity.
    pub fn with_entities(self) -> impl Iterator<Item = (EntityId, Q::Item<'a>)> {
        self.entities.iter().copied().zip(Q::iter(self.data))
    }
}

impl<'a, Q: Fetch> IntoIterator for Chunk<'a, Q> {
    type Item = Q::Item<'a>;
    type IntoIter = Q::Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Q::iter(self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Sprite, Transform2d, Velocity2d};
    use crate::ecs::Archetype;
    use crate::math::Vec2;

    fn archetype(count: u32) -> Archetype {
        let mut archetype = Archetype::new(
            Bitmask::of::<Transform2d>().union(Bitmask::of::<Velocity2d>()),
        );
        for i in 0..count {
            archetype.push_entity(EntityId::new(i, 0));
            archetype.push_component(Transform2d::default());
            archetype.push_component(Velocity2d::new(1.0, i as f32));
        }
        archetype
    }

    #[test]
    fn test_chunk_zips_columns() {
        let mut archetype = archetype(3);
        let chunk = archetype.chunk::<(&mut Transform2d, &Velocity2d)>();
        assert_eq!(chunk.len(), 3);
        for (transform, velocity) in chunk {
            transform.position += velocity.linear;
        }

        let positions: Vec<Vec2> = archetype
            .column::<Transform2d>()
            .unwrap()
            .iter()
            .map(|t| t.position)
            .collect();
        assert_eq!(
            positions,
            vec![Vec2::new(1.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(1.0, 2.0)]
        );
    }

    #[test]
    fn test_chunk_with_entities() {
        let mut archetype = archetype(2);
        let rows: Vec<(EntityId, f32)> = archetype
            .chunk::<&Velocity2d>()
            .with_entities()
            .map(|(entity, velocity)| (entity, velocity.linear.y))
            .collect();
        assert_eq!(rows, vec![(EntityId::new(0, 0), 0.0), (EntityId::new(1, 0), 1.0)]);
    }

    #[test]
    fn test_required_mask() {
        assert_eq!(
            <(&Transform2d, &mut Sprite)>::required(),
            Bitmask::of::<Transform2d>().union(Bitmask::of::<Sprite>())
        );
    }

    #[test]
    #[should_panic(expected = "requested twice")]
    fn test_duplicate_in_query_is_fatal() {
        let _ = <(&Transform2d, &mut Transform2d)>::required();
    }

    #[test]
    #[should_panic(expected = "requested twice")]
    fn test_picker_refuses_second_borrow() {
        let mut archetype = archetype(1);
        let _ = archetype.chunk::<(&Velocity2d, &Velocity2d)>();
    }
}
