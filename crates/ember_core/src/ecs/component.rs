//! # Component Registry
//!
//! Every component type carries a compile-time bit position (`Component::ID`).
//! A [`Bitmask`] of those bits is an archetype signature.
//!
//! The engine's component list is declared once with [`declare_components!`],
//! which generates [`ColumnStorage`](super::components::ColumnStorage): a
//! tagged enum holding one typed `Vec<T>` per component. Archetype columns
//! are values of that enum, so no `Any`/`TypeId` erasure is involved.

use super::components::ColumnStorage;

/// Maximum number of distinct component types (bits in a [`Bitmask`]).
pub const MAX_COMPONENTS: usize = 64;

/// Marker trait for ECS components.
///
/// Implemented by [`declare_components!`]; never by hand. The associated
/// functions map the component to its variant of the column enum.
pub trait Component: Sized + Send + 'static {
    /// Unique identifier for this component type (0-63).
    ///
    /// This ID is the component's bit in archetype signatures.
    const ID: u8;

    /// Human-readable type name used in diagnostics.
    const NAME: &'static str;

    /// Borrows this component's typed vector out of a column.
    fn column(storage: &ColumnStorage) -> Option<&Vec<Self>>;

    /// Mutably borrows this component's typed vector out of a column.
    fn column_mut(storage: &mut ColumnStorage) -> Option<&mut Vec<Self>>;
}

/// Set of component ids; identifies an archetype.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Bitmask(u64);

impl Bitmask {
    /// Signature with no components.
    pub const EMPTY: Self = Self(0);

    /// Creates a bitmask from raw bits.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Bitmask holding a single component id.
    #[inline]
    #[must_use]
    pub const fn from_id(id: u8) -> Self {
        Self(1u64 << id)
    }

    /// Bitmask holding component `T` only.
    #[inline]
    #[must_use]
    pub const fn of<T: Component>() -> Self {
        Self::from_id(T::ID)
    }

    /// Adds a component id.
    #[inline]
    #[must_use]
    pub const fn with_id(self, id: u8) -> Self {
        Self(self.0 | (1u64 << id))
    }

    /// Checks a single component id.
    #[inline]
    #[must_use]
    pub const fn contains_id(self, id: u8) -> bool {
        self.0 & (1u64 << id) != 0
    }

    /// Checks whether every bit of `other` is set in `self`.
    #[inline]
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Checks whether any bit is shared.
    #[inline]
    #[must_use]
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Set union.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits of `self` not present in `other`.
    #[inline]
    #[must_use]
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Archetype filter: all of `required`, none of `excluded`.
    #[inline]
    #[must_use]
    pub const fn matches(self, required: Self, excluded: Self) -> bool {
        self.contains(required) && !self.intersects(excluded)
    }

    /// Number of component ids in the set.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True for the empty signature.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Position of `id` among the set bits, counting from the lowest.
    ///
    /// Archetypes order their columns by component id, so this is the
    /// column slot of `id` when the id is present.
    #[inline]
    #[must_use]
    pub const fn rank(self, id: u8) -> usize {
        let below = if id == 0 { 0 } else { self.0 & (u64::MAX >> (64 - id as u32)) };
        below.count_ones() as usize
    }

    /// Iterates the component ids in ascending order.
    pub fn ids(self) -> impl Iterator<Item = u8> {
        let mut bits = self.0;
        std::iter::from_fn(move || {
            if bits == 0 {
                return None;
            }
            // trailing_zeros of a non-zero u64 is < 64
            let id = bits.trailing_zeros() as u8;
            bits &= bits - 1;
            Some(id)
        })
    }
}

impl std::fmt::Binary for Bitmask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Binary::fmt(&self.0, f)
    }
}

/// Declares the engine's component list.
///
/// Generates the `ColumnStorage` enum (one variant per component), its
/// type-dispatched row operations, the `Component` impls and
/// `COMPONENT_NAMES`.
macro_rules! declare_components {
    ($($ty:ident = $id:literal),+ $(,)?) => {
        /// One archetype column: a typed vector for exactly one component.
        pub enum ColumnStorage {
            $(
                #[doc = concat!("Column of `", stringify!($ty), "`.")]
                $ty(Vec<$ty>),
            )+
        }

        impl ColumnStorage {
            /// Creates an empty column for a component id.
            ///
            /// # Panics
            ///
            /// Panics for an id that was never declared.
            #[must_use]
            pub fn empty(id: u8) -> Self {
                match id {
                    $($id => Self::$ty(Vec::new()),)+
                    _ => $crate::fatal!("component id {} is not registered", id),
                }
            }

            /// Id of the component stored in this column.
            #[must_use]
            pub fn component_id(&self) -> u8 {
                match self {
                    $(Self::$ty(_) => $id,)+
                }
            }

            /// Name of the component stored in this column.
            #[must_use]
            pub fn component_name(&self) -> &'static str {
                match self {
                    $(Self::$ty(_) => stringify!($ty),)+
                }
            }

            /// Number of rows.
            #[must_use]
            pub fn len(&self) -> usize {
                match self {
                    $(Self::$ty(column) => column.len(),)+
                }
            }

            /// True when the column holds no rows.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            /// Swap-removes a row and drops its value.
            pub fn swap_remove(&mut self, row: usize) {
                match self {
                    $(Self::$ty(column) => { column.swap_remove(row); })+
                }
            }

            /// Swap-removes a row and pushes its value onto `target`.
            ///
            /// # Panics
            ///
            /// Panics when `target` stores a different component.
            pub fn move_row(&mut self, row: usize, target: &mut Self) {
                match (self, target) {
                    $((Self::$ty(source), Self::$ty(target)) => target.push(source.swap_remove(row)),)+
                    #[allow(unreachable_patterns)]
                    (source, target) => $crate::fatal!(
                        "cannot move a {} row into a {} column",
                        source.component_name(),
                        target.component_name()
                    ),
                }
            }
        }

        impl std::fmt::Debug for ColumnStorage {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct("ColumnStorage")
                    .field("component", &self.component_name())
                    .field("len", &self.len())
                    .finish()
            }
        }

        $(
            impl $crate::ecs::Component for $ty {
                const ID: u8 = $id;
                const NAME: &'static str = stringify!($ty);

                #[inline]
                fn column(storage: &ColumnStorage) -> Option<&Vec<Self>> {
                    match storage {
                        ColumnStorage::$ty(column) => Some(column),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }

                #[inline]
                fn column_mut(storage: &mut ColumnStorage) -> Option<&mut Vec<Self>> {
                    match storage {
                        ColumnStorage::$ty(column) => Some(column),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }
        )+

        /// Names of all declared components, indexed by id.
        pub const COMPONENT_NAMES: &[(u8, &str)] = &[$(($id, stringify!($ty)),)+];
    };
}

pub(crate) use declare_components;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Collider2d, Sprite, Transform2d, Velocity2d};

    #[test]
    fn test_bitmask_set_operations() {
        let a = Bitmask::of::<Transform2d>().with_id(Sprite::ID);
        let b = Bitmask::of::<Transform2d>();

        assert!(a.contains(b));
        assert!(!b.contains(a));
        assert!(a.intersects(b));
        assert_eq!(a.len(), 2);
        assert_eq!(a.difference(b), Bitmask::of::<Sprite>());
        assert!(Bitmask::EMPTY.is_empty());
    }

    #[test]
    fn test_bitmask_matches_filter() {
        let archetype = Bitmask::of::<Transform2d>()
            .union(Bitmask::of::<Velocity2d>())
            .union(Bitmask::of::<Collider2d>());

        assert!(archetype.matches(Bitmask::of::<Transform2d>(), Bitmask::EMPTY));
        assert!(!archetype.matches(Bitmask::of::<Transform2d>(), Bitmask::of::<Velocity2d>()));
        assert!(!archetype.matches(Bitmask::of::<Sprite>(), Bitmask::EMPTY));
    }

    #[test]
    fn test_rank_and_ids() {
        let mask = Bitmask::from_bits(0b1011_0010);
        let ids: Vec<u8> = mask.ids().collect();
        assert_eq!(ids, vec![1, 4, 5, 7]);
        assert_eq!(mask.rank(1), 0);
        assert_eq!(mask.rank(4), 1);
        assert_eq!(mask.rank(7), 3);
        assert_eq!(Bitmask::from_bits(u64::MAX).rank(63), 63);
    }
}
