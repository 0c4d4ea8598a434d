//! Component bundles and component sets.
//!
//! A [`Bundle`] is a tuple of component *values* attached in one call.
//! A [`ComponentSet`] is a tuple of component *types*, used where only the
//! signature matters (exclusion filters, removal hints).
//!
//! A single component is both a one-element bundle and a one-element set.

use super::archetype::Archetype;
use super::component::{Bitmask, Component};
use super::entity::Column;

/// Folds component ids into a mask. Repeating an id is fatal.
fn mask_of(ids: &[(u8, &'static str)]) -> Bitmask {
    let mut mask = Bitmask::EMPTY;
    for &(id, name) in ids {
        if mask.contains_id(id) {
            crate::fatal!("component {} appears twice in one component list", name);
        }
        mask = mask.with_id(id);
    }
    mask
}

/// Set of component types.
pub trait ComponentSet {
    /// Signature of the set. Fatal if a type repeats.
    fn mask() -> Bitmask;
}

/// Component values attached to an entity together.
pub trait Bundle: Send + 'static {
    /// Signature of the bundle. Fatal if a type repeats.
    fn mask() -> Bitmask;

    /// Appends one value per component to `archetype`'s columns.
    fn push_into(self, archetype: &mut Archetype);

    /// Overwrites the values at `column` of `archetype`.
    fn write_into(self, archetype: &mut Archetype, column: Column);
}

impl ComponentSet for () {
    fn mask() -> Bitmask {
        Bitmask::EMPTY
    }
}

impl<T: Component> ComponentSet for T {
    #[inline]
    fn mask() -> Bitmask {
        Bitmask::of::<T>()
    }
}

impl<T: Component> Bundle for T {
    #[inline]
    fn mask() -> Bitmask {
        Bitmask::of::<T>()
    }

    #[inline]
    fn push_into(self, archetype: &mut Archetype) {
        archetype.push_component(self);
    }

    #[inline]
    fn write_into(self, archetype: &mut Archetype, column: Column) {
        *archetype.expect_mut::<T>(column) = self;
    }
}

macro_rules! impl_tuples {
    ($(($($name:ident),+)),+ $(,)?) => {
        $(
            impl<$($name: Component),+> ComponentSet for ($($name,)+) {
                fn mask() -> Bitmask {
                    mask_of(&[$(($name::ID, $name::NAME)),+])
                }
            }

            impl<$($name: Component),+> Bundle for ($($name,)+) {
                fn mask() -> Bitmask {
                    mask_of(&[$(($name::ID, $name::NAME)),+])
                }

                #[allow(non_snake_case)]
                fn push_into(self, archetype: &mut Archetype) {
                    let ($($name,)+) = self;
                    $(archetype.push_component($name);)+
                }

                #[allow(non_snake_case)]
                fn write_into(self, archetype: &mut Archetype, column: Column) {
                    let ($($name,)+) = self;
                    $(*archetype.expect_mut::<$name>(column) = $name;)+
                }
            }
        )+
    };
}

impl_tuples! {
    (A),
    (A, B),
    (A, B, C),
    (A, B, C, D),
    (A, B, C, D, E),
    (A, B, C, D, E, F),
    (A, B, C, D, E, F, G),
    (A, B, C, D, E, F, G, H),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::{Sprite, Transform2d, Velocity2d};

    #[test]
    fn test_bundle_mask_is_union_of_ids() {
        let mask = <(Transform2d, Sprite) as Bundle>::mask();
        assert_eq!(
            mask,
            Bitmask::of::<Transform2d>().union(Bitmask::of::<Sprite>())
        );
        assert_eq!(<Velocity2d as ComponentSet>::mask(), Bitmask::of::<Velocity2d>());
        assert!(<() as ComponentSet>::mask().is_empty());
    }

    #[test]
    #[should_panic(expected = "appears twice")]
    fn test_duplicate_component_is_fatal() {
        let _ = <(Transform2d, Sprite, Transform2d) as Bundle>::mask();
    }
}
