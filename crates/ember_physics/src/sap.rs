//! # Sweep and Prune
//!
//! Broad phase over sorted interval endpoints, followed by exact shape
//! tests and collision response.
//!
//! ## Layout
//!
//! ```text
//! dynamic.x: [ min(k0) min(k2) max(k0) min(k1) max(k2) max(k1) ]
//! dynamic.y: [ ... ]
//! dynamic.keys[k]: { entity, min_x, max_x, min_y, max_y }   <- positions above
//! ```
//!
//! Dynamic and static colliders keep separate endpoint sets. Static ones
//! are inserted once and never move.
//!
//! ## Per frame
//!
//! 1. **Sync**: track new colliders, drop dead ones
//! 2. **Update**: write new bounds, settle each moved endpoint by neighbour swaps
//! 3. **Sweep X**: merge-walk both X arrays, pairing each opening endpoint
//!    with every open interval
//! 4. **Confirm Y**: strict interval overlap on Y
//! 5. **Narrow phase**: exact shape test, then trigger report or response
//!
//! Endpoint order is ascending by value; on equal values a closing endpoint
//! comes before an opening one, so touching intervals never pair.

use std::collections::{HashMap, HashSet};

use ember_core::ecs::components::{
    Collider2d, RigidBody2d, Shape2d, StaticBody, Transform2d, Velocity2d,
};
use ember_core::{ArcheRegistry, EntityId, Vec2};
use tracing::{debug, error, trace, warn};

use crate::aabb::Aabb;
use crate::collision::{
    check_aabb_circle_collision, check_aabb_collision, check_circle_aabb_collision,
    check_circle_collision, CollisionResult,
};
use crate::reaction::{solid_collision_dynamic, solid_collision_static, BodyState};

// ============================================================================
// ENDPOINTS
// ============================================================================

/// One end of a collider's interval on one axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Endpoint {
    /// Index into the owning set's key table.
    pub key: u32,
    /// Coordinate on the axis.
    pub value: f32,
    /// Opening (min) or closing (max) end.
    pub is_min: bool,
}

impl Endpoint {
    /// True if `self` must be ordered strictly before `other` in the same
    /// endpoint array.
    ///
    /// Equal values put closing ends first, except that a collider's own
    /// min always stays before its max, even for zero extent.
    #[inline]
    #[must_use]
    pub fn precedes(&self, other: &Self) -> bool {
        if self.value != other.value {
            return self.value < other.value;
        }
        if self.key == other.key {
            return self.is_min && !other.is_min;
        }
        !self.is_min && other.is_min
    }

    /// Ordering across two endpoint arrays, where keys are unrelated.
    #[inline]
    fn merges_before(&self, other: &Self) -> bool {
        self.value < other.value || (self.value == other.value && !self.is_min && other.is_min)
    }
}

/// Positions of one collider's four endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndpointKey {
    /// Collider entity.
    pub entity: EntityId,
    /// Index of the min endpoint in the X array.
    pub min_x: u32,
    /// Index of the max endpoint in the X array.
    pub max_x: u32,
    /// Index of the min endpoint in the Y array.
    pub min_y: u32,
    /// Index of the max endpoint in the Y array.
    pub max_y: u32,
}

/// Sweep axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    /// Horizontal.
    X,
    /// Vertical.
    Y,
}

/// Which endpoint set a collider lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColliderSet {
    /// Moving colliders.
    Dynamic,
    /// Immovable colliders.
    Static,
}

/// Tagged key of a collider inside the sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColliderKey {
    /// Key into the dynamic set.
    Dynamic(u32),
    /// Key into the static set.
    Static(u32),
}

impl ColliderKey {
    const fn is_static(self) -> bool {
        matches!(self, Self::Static(_))
    }
}

#[inline]
fn to_index(value: usize) -> u32 {
    // Collider counts stay far below u32::MAX.
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Endpoint arrays plus back-references for one collider set.
#[derive(Debug, Default)]
struct EndpointSet {
    keys: Vec<EndpointKey>,
    x: Vec<Endpoint>,
    y: Vec<Endpoint>,
    by_entity: HashMap<EntityId, u32>,
}

impl EndpointSet {
    fn len(&self) -> usize {
        self.keys.len()
    }

    fn axis(&self, axis: Axis) -> &[Endpoint] {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
        }
    }

    fn insert(&mut self, entity: EntityId, bounds: Aabb) -> u32 {
        let key = to_index(self.keys.len());
        let base_x = to_index(self.x.len());
        let base_y = to_index(self.y.len());
        self.keys.push(EndpointKey {
            entity,
            min_x: base_x,
            max_x: base_x + 1,
            min_y: base_y,
            max_y: base_y + 1,
        });
        self.by_entity.insert(entity, key);

        self.x.push(Endpoint { key, value: bounds.min.x, is_min: true });
        self.x.push(Endpoint { key, value: bounds.max.x, is_min: false });
        self.y.push(Endpoint { key, value: bounds.min.y, is_min: true });
        self.y.push(Endpoint { key, value: bounds.max.y, is_min: false });

        // Appended at the end; the max can never pass its own min while settling.
        settle(&mut self.x, &mut self.keys, Axis::X, base_x as usize);
        settle(&mut self.x, &mut self.keys, Axis::X, base_x as usize + 1);
        settle(&mut self.y, &mut self.keys, Axis::Y, base_y as usize);
        settle(&mut self.y, &mut self.keys, Axis::Y, base_y as usize + 1);
        key
    }

    /// Removes a collider; the last key takes over its slot.
    fn remove(&mut self, entity: EntityId) -> bool {
        let Some(key) = self.by_entity.remove(&entity) else {
            return false;
        };
        let last = to_index(self.keys.len() - 1);

        self.x.retain(|endpoint| endpoint.key != key);
        self.y.retain(|endpoint| endpoint.key != key);
        self.keys.swap_remove(key as usize);

        if key != last {
            for endpoint in self.x.iter_mut().chain(self.y.iter_mut()) {
                if endpoint.key == last {
                    endpoint.key = key;
                }
            }
            self.by_entity.insert(self.keys[key as usize].entity, key);
        }
        self.rebuild_back_references();
        true
    }

    fn rebuild_back_references(&mut self) {
        for (index, endpoint) in self.x.iter().enumerate() {
            patch(&mut self.keys, Axis::X, *endpoint, index);
        }
        for (index, endpoint) in self.y.iter().enumerate() {
            patch(&mut self.keys, Axis::Y, *endpoint, index);
        }
    }

    /// Writes new bounds and restores order. Returns the number of swaps.
    fn update(&mut self, key: u32, bounds: Aabb) -> usize {
        let entry = self.keys[key as usize];
        let mut swaps = 0;
        swaps += self.move_interval(Axis::X, entry.min_x, entry.max_x, bounds.min.x, bounds.max.x);
        let entry = self.keys[key as usize];
        swaps += self.move_interval(Axis::Y, entry.min_y, entry.max_y, bounds.min.y, bounds.max.y);
        swaps
    }

    fn move_interval(&mut self, axis: Axis, min_at: u32, max_at: u32, min: f32, max: f32) -> usize {
        let key = match axis {
            Axis::X => self.x[min_at as usize].key,
            Axis::Y => self.y[min_at as usize].key,
        };
        let moving_down = min < self.axis(axis)[min_at as usize].value;

        // Move the leading end first so one endpoint is out of place at a time.
        if moving_down {
            let swaps = self.set_value(axis, min_at, min);
            let max_at = self.position_of(axis, key, false);
            swaps + self.set_value(axis, max_at, max)
        } else {
            let swaps = self.set_value(axis, max_at, max);
            let min_at = self.position_of(axis, key, true);
            swaps + self.set_value(axis, min_at, min)
        }
    }

    fn set_value(&mut self, axis: Axis, at: u32, value: f32) -> usize {
        let endpoints = match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
        };
        endpoints[at as usize].value = value;
        settle(endpoints, &mut self.keys, axis, at as usize)
    }

    fn position_of(&self, axis: Axis, key: u32, is_min: bool) -> u32 {
        let entry = &self.keys[key as usize];
        match (axis, is_min) {
            (Axis::X, true) => entry.min_x,
            (Axis::X, false) => entry.max_x,
            (Axis::Y, true) => entry.min_y,
            (Axis::Y, false) => entry.max_y,
        }
    }

    fn interval(&self, axis: Axis, key: u32) -> (f32, f32) {
        let endpoints = self.axis(axis);
        let min = self.position_of(axis, key, true);
        let max = self.position_of(axis, key, false);
        (endpoints[min as usize].value, endpoints[max as usize].value)
    }
}

/// Points the key of `endpoint` at `index`.
#[inline]
fn patch(keys: &mut [EndpointKey], axis: Axis, endpoint: Endpoint, index: usize) {
    let index = to_index(index);
    let entry = &mut keys[endpoint.key as usize];
    match (axis, endpoint.is_min) {
        (Axis::X, true) => entry.min_x = index,
        (Axis::X, false) => entry.max_x = index,
        (Axis::Y, true) => entry.min_y = index,
        (Axis::Y, false) => entry.max_y = index,
    }
}

/// Current interval of a tracked collider on `axis`.
fn interval_of(dynamic: &EndpointSet, statics: &EndpointSet, axis: Axis, key: ColliderKey) -> (f32, f32) {
    match key {
        ColliderKey::Dynamic(k) => dynamic.interval(axis, k),
        ColliderKey::Static(k) => statics.interval(axis, k),
    }
}

/// Moves the endpoint at `index` to its sorted place by neighbour swaps,
/// patching both swapped keys each time. Returns the number of swaps.
fn settle(endpoints: &mut [Endpoint], keys: &mut [EndpointKey], axis: Axis, mut index: usize) -> usize {
    let mut swaps = 0;
    while index > 0 && endpoints[index].precedes(&endpoints[index - 1]) {
        endpoints.swap(index, index - 1);
        patch(keys, axis, endpoints[index], index);
        patch(keys, axis, endpoints[index - 1], index - 1);
        index -= 1;
        swaps += 1;
    }
    while index + 1 < endpoints.len() && endpoints[index + 1].precedes(&endpoints[index]) {
        endpoints.swap(index, index + 1);
        patch(keys, axis, endpoints[index], index);
        patch(keys, axis, endpoints[index + 1], index + 1);
        index += 1;
        swaps += 1;
    }
    swaps
}

// ============================================================================
// CONTACTS & STATS
// ============================================================================

/// How a confirmed contact was handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactKind {
    /// At least one collider is a trigger; nothing was moved.
    Trigger,
    /// Both solid; the bodies were separated.
    Solid,
}

/// Narrow-phase hit from the last update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Contact {
    /// First collider. Always the dynamic one in dynamic/static contacts.
    pub a: EntityId,
    /// Second collider.
    pub b: EntityId,
    /// Whether `b` is a static collider.
    pub b_is_static: bool,
    /// Trigger or solid.
    pub kind: ContactKind,
    /// Normal from `a` to `b`.
    pub normal: Vec2,
    /// Overlap depth before response.
    pub penetration: f32,
}

/// Counters for the last update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SapStats {
    /// Tracked dynamic colliders.
    pub dynamic_colliders: usize,
    /// Tracked static colliders.
    pub static_colliders: usize,
    /// Colliders registered this frame.
    pub inserted: usize,
    /// Colliders dropped this frame.
    pub removed: usize,
    /// Neighbour swaps spent restoring order.
    pub swaps: usize,
    /// Pairs overlapping on X.
    pub candidate_pairs: usize,
    /// Pairs overlapping on X and Y.
    pub confirmed_pairs: usize,
    /// Pairs the shape test confirmed.
    pub contacts: usize,
    /// Closing endpoints whose key was not open.
    pub missing_keys: usize,
    /// Keys still open after the sweep.
    pub leaked_keys: usize,
    /// Colliders with neither `Velocity2d` nor `StaticBody`, not tracked.
    pub unplaced_colliders: usize,
}

// ============================================================================
// SWEEP AND PRUNE
// ============================================================================

/// Sweep-and-prune collision system.
#[derive(Debug)]
pub struct SweepAndPrune {
    dynamic: EndpointSet,
    statics: EndpointSet,
    active: Vec<ColliderKey>,
    candidates: Vec<(ColliderKey, ColliderKey)>,
    contacts: Vec<Contact>,
    scratch: Vec<(EntityId, Aabb)>,
    unplaced: HashSet<EntityId>,
    default_body: RigidBody2d,
    stats: SapStats,
}

impl Default for SweepAndPrune {
    fn default() -> Self {
        Self::new()
    }
}

impl SweepAndPrune {
    /// Creates an empty system. Dynamic colliders without a rigid body
    /// respond with unit mass and full restitution.
    #[must_use]
    pub fn new() -> Self {
        Self::with_default_body(RigidBody2d::default())
    }

    /// Creates an empty system with the mass properties used for dynamic
    /// colliders that carry no [`RigidBody2d`].
    #[must_use]
    pub fn with_default_body(default_body: RigidBody2d) -> Self {
        Self {
            dynamic: EndpointSet::default(),
            statics: EndpointSet::default(),
            active: Vec::new(),
            candidates: Vec::new(),
            contacts: Vec::new(),
            scratch: Vec::new(),
            unplaced: HashSet::new(),
            default_body,
            stats: SapStats::default(),
        }
    }

    /// Runs one full frame: sync, update, sweep, confirm, narrow phase and
    /// response. Returns the contacts found.
    pub fn on_update(&mut self, registry: &mut ArcheRegistry) -> &[Contact] {
        self.stats = SapStats::default();
        self.sync(registry);
        self.sweep();
        self.confirm_y();
        self.narrow_phase(registry);

        self.stats.dynamic_colliders = self.dynamic.len();
        self.stats.static_colliders = self.statics.len();
        self.stats.candidate_pairs = self.candidates.len();
        self.stats.contacts = self.contacts.len();
        trace!(stats = ?self.stats, "sweep and prune frame");
        &self.contacts
    }

    /// Contacts from the last update.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    /// X-overlapping pairs from the last sweep, as entity pairs.
    #[must_use]
    pub fn candidate_pairs(&self) -> Vec<(EntityId, EntityId)> {
        self.candidates
            .iter()
            .map(|&(a, b)| (self.entity(a), self.entity(b)))
            .collect()
    }

    /// Endpoint array of one set on one axis.
    #[must_use]
    pub fn endpoints(&self, axis: Axis, set: ColliderSet) -> &[Endpoint] {
        self.set(set).axis(axis)
    }

    /// Key table of one set.
    #[must_use]
    pub fn keys(&self, set: ColliderSet) -> &[EndpointKey] {
        &self.set(set).keys
    }

    /// Checks that every endpoint array is sorted.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        [&self.dynamic, &self.statics].iter().all(|set| {
            [Axis::X, Axis::Y].iter().all(|&axis| {
                set.axis(axis)
                    .windows(2)
                    .all(|pair| !pair[1].precedes(&pair[0]))
            })
        })
    }

    /// Checks that every key points at its own endpoints.
    #[must_use]
    pub fn back_references_exact(&self) -> bool {
        [&self.dynamic, &self.statics].iter().all(|set| {
            set.keys.iter().enumerate().all(|(key, entry)| {
                let key = to_index(key);
                let at = |axis: Axis, index: u32, is_min: bool| {
                    set.axis(axis)
                        .get(index as usize)
                        .is_some_and(|e| e.key == key && e.is_min == is_min)
                };
                at(Axis::X, entry.min_x, true)
                    && at(Axis::X, entry.max_x, false)
                    && at(Axis::Y, entry.min_y, true)
                    && at(Axis::Y, entry.max_y, false)
            })
        })
    }

    /// Counters for the last update.
    #[must_use]
    pub fn last_stats(&self) -> SapStats {
        self.stats
    }

    /// Number of tracked dynamic colliders.
    #[must_use]
    pub fn dynamic_count(&self) -> usize {
        self.dynamic.len()
    }

    /// Number of tracked static colliders.
    #[must_use]
    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    fn set(&self, set: ColliderSet) -> &EndpointSet {
        match set {
            ColliderSet::Dynamic => &self.dynamic,
            ColliderSet::Static => &self.statics,
        }
    }

    fn entity(&self, key: ColliderKey) -> EntityId {
        match key {
            ColliderKey::Dynamic(k) => self.dynamic.keys[k as usize].entity,
            ColliderKey::Static(k) => self.statics.keys[k as usize].entity,
        }
    }

    // ------------------------------------------------------------------------
    // Phase 1 + 2: sync and update
    // ------------------------------------------------------------------------

    fn sync(&mut self, registry: &mut ArcheRegistry) {
        let dynamic_gone: Vec<EntityId> = self
            .dynamic
            .keys
            .iter()
            .map(|entry| entry.entity)
            .filter(|&entity| !is_dynamic_collider(registry, entity))
            .collect();
        let static_gone: Vec<EntityId> = self
            .statics
            .keys
            .iter()
            .map(|entry| entry.entity)
            .filter(|&entity| !is_static_collider(registry, entity))
            .collect();
        for entity in dynamic_gone {
            self.dynamic.remove(entity);
            self.stats.removed += 1;
        }
        for entity in static_gone {
            self.statics.remove(entity);
            self.stats.removed += 1;
        }

        self.scratch.clear();
        for chunk in registry
            .query_without::<(&Transform2d, &Collider2d, &Velocity2d), StaticBody>()
        {
            for (entity, (transform, collider, _)) in chunk.with_entities() {
                self.scratch.push((entity, bounds_of(transform, collider)));
            }
        }
        for &(entity, bounds) in &self.scratch {
            match self.dynamic.by_entity.get(&entity) {
                Some(&key) => self.stats.swaps += self.dynamic.update(key, bounds),
                None => {
                    self.dynamic.insert(entity, bounds);
                    self.stats.inserted += 1;
                }
            }
        }

        self.scratch.clear();
        for chunk in registry.query::<(&Transform2d, &Collider2d, &StaticBody)>() {
            for (entity, (transform, collider, _)) in chunk.with_entities() {
                self.scratch.push((entity, bounds_of(transform, collider)));
            }
        }
        for &(entity, bounds) in &self.scratch {
            if !self.statics.by_entity.contains_key(&entity) {
                self.statics.insert(entity, bounds);
                self.stats.inserted += 1;
            }
        }

        // Logged once per entity until it gains a body kind or loses its collider.
        self.unplaced
            .retain(|&entity| is_unplaced_collider(registry, entity));
        for chunk in registry
            .query_without::<(&Transform2d, &Collider2d), (Velocity2d, StaticBody)>()
        {
            for (entity, _) in chunk.with_entities() {
                self.stats.unplaced_colliders += 1;
                if self.unplaced.insert(entity) {
                    debug!(
                        %entity,
                        "collider has neither Velocity2d nor StaticBody, ignored"
                    );
                }
            }
        }

        if self.stats.inserted > 0 || self.stats.removed > 0 {
            debug!(
                inserted = self.stats.inserted,
                removed = self.stats.removed,
                dynamic = self.dynamic.len(),
                statics = self.statics.len(),
                "collider set changed"
            );
        }
    }

    // ------------------------------------------------------------------------
    // Phase 3: sweep X
    // ------------------------------------------------------------------------

    fn sweep(&mut self) {
        let (dynamic, statics) = (&self.dynamic, &self.statics);
        let dynamic_x = &dynamic.x;
        let static_x = &statics.x;
        let active = &mut self.active;
        let candidates = &mut self.candidates;
        active.clear();
        candidates.clear();

        let (mut i, mut j) = (0, 0);
        loop {
            let (endpoint, key) = match (dynamic_x.get(i), static_x.get(j)) {
                (Some(d), Some(s)) if !s.merges_before(d) => {
                    i += 1;
                    (*d, ColliderKey::Dynamic(d.key))
                }
                (_, Some(s)) => {
                    j += 1;
                    (*s, ColliderKey::Static(s.key))
                }
                (Some(d), None) => {
                    i += 1;
                    (*d, ColliderKey::Dynamic(d.key))
                }
                (None, None) => break,
            };

            if endpoint.is_min {
                // Equal mins sort in any order; touching intervals are not pairs.
                let (min, max) = interval_of(dynamic, statics, Axis::X, key);
                for &open in active.iter() {
                    if open.is_static() && key.is_static() {
                        continue;
                    }
                    let (open_min, open_max) = interval_of(dynamic, statics, Axis::X, open);
                    if open_max > min && open_min < max {
                        candidates.push((open, key));
                    }
                }
                active.push(key);
            } else if let Some(position) = active.iter().position(|&open| open == key) {
                active.swap_remove(position);
            } else {
                error!(?key, "closing endpoint without an open interval");
                self.stats.missing_keys += 1;
            }
        }

        if !active.is_empty() {
            warn!(open = active.len(), "active list not empty after sweep, clearing");
            self.stats.leaked_keys = active.len();
            active.clear();
        }
    }

    // ------------------------------------------------------------------------
    // Phase 4: confirm Y
    // ------------------------------------------------------------------------

    fn y_interval(&self, key: ColliderKey) -> (f32, f32) {
        interval_of(&self.dynamic, &self.statics, Axis::Y, key)
    }

    fn confirm_y(&mut self) {
        let mut confirmed = 0;
        for index in 0..self.candidates.len() {
            let (a, b) = self.candidates[index];
            let (min_a, max_a) = self.y_interval(a);
            let (min_b, max_b) = self.y_interval(b);
            if min_a < max_b && max_a > min_b {
                self.candidates.swap(confirmed, index);
                confirmed += 1;
            }
        }
        self.stats.confirmed_pairs = confirmed;
    }

    // ------------------------------------------------------------------------
    // Phase 5: narrow phase and response
    // ------------------------------------------------------------------------

    fn narrow_phase(&mut self, registry: &mut ArcheRegistry) {
        self.contacts.clear();
        for index in 0..self.stats.confirmed_pairs {
            let (first, second) = self.candidates[index];
            // Dynamic collider first so the normal points at the static one.
            let (a, b) = if first.is_static() { (second, first) } else { (first, second) };
            let (entity_a, entity_b) = (self.entity(a), self.entity(b));

            let (Ok(body_a), Ok(body_b)) = (
                collider_state(registry, entity_a),
                collider_state(registry, entity_b),
            ) else {
                error!(%entity_a, %entity_b, "collider lost its transform mid-frame, pair skipped");
                continue;
            };

            let result = detect(body_a, body_b);
            if !result.is_detected {
                continue;
            }

            let is_trigger = body_a.collider.is_trigger || body_b.collider.is_trigger;
            let kind = if is_trigger {
                debug!(%entity_a, %entity_b, "trigger overlap");
                ContactKind::Trigger
            } else {
                if b.is_static() {
                    self.respond_static(registry, entity_a, result);
                } else {
                    self.respond_dynamic(registry, entity_a, entity_b, result);
                }
                ContactKind::Solid
            };

            self.contacts.push(Contact {
                a: entity_a,
                b: entity_b,
                b_is_static: b.is_static(),
                kind,
                normal: result.normal,
                penetration: result.penetration,
            });
        }
    }

    fn body_of(&self, registry: &ArcheRegistry, entity: EntityId) -> RigidBody2d {
        registry
            .try_get_component::<RigidBody2d>(entity)
            .copied()
            .unwrap_or(self.default_body)
    }

    fn respond_dynamic(
        &self,
        registry: &mut ArcheRegistry,
        a: EntityId,
        b: EntityId,
        result: CollisionResult,
    ) {
        let (body_a, body_b) = (self.body_of(registry, a), self.body_of(registry, b));
        let (mut pos_a, mut vel_a) = motion_of(registry, a);
        let (mut pos_b, mut vel_b) = motion_of(registry, b);

        solid_collision_dynamic(
            BodyState {
                position: &mut pos_a,
                velocity: &mut vel_a,
                mass: body_a.mass,
                restitution: body_a.restitution,
            },
            BodyState {
                position: &mut pos_b,
                velocity: &mut vel_b,
                mass: body_b.mass,
                restitution: body_b.restitution,
            },
            result.normal,
            result.penetration,
        );

        write_motion(registry, a, pos_a, vel_a);
        write_motion(registry, b, pos_b, vel_b);
    }

    fn respond_static(&self, registry: &mut ArcheRegistry, entity: EntityId, result: CollisionResult) {
        let body = self.body_of(registry, entity);
        let (mut position, mut velocity) = motion_of(registry, entity);

        solid_collision_static(
            BodyState {
                position: &mut position,
                velocity: &mut velocity,
                mass: body.mass,
                restitution: body.restitution,
            },
            result.normal,
            result.penetration,
        );

        write_motion(registry, entity, position, velocity);
    }
}

// ============================================================================
// ECS GLUE
// ============================================================================

/// Bounds used for endpoints: a box's own extents, a circle's tight square.
fn bounds_of(transform: &Transform2d, collider: &Collider2d) -> Aabb {
    Aabb::from_center(transform.position, collider.shape.half_extents())
}

fn is_dynamic_collider(registry: &ArcheRegistry, entity: EntityId) -> bool {
    registry.has_component::<Transform2d>(entity)
        && registry.has_component::<Collider2d>(entity)
        && registry.has_component::<Velocity2d>(entity)
        && !registry.has_component::<StaticBody>(entity)
}

fn is_static_collider(registry: &ArcheRegistry, entity: EntityId) -> bool {
    registry.has_component::<Transform2d>(entity)
        && registry.has_component::<Collider2d>(entity)
        && registry.has_component::<StaticBody>(entity)
}

fn is_unplaced_collider(registry: &ArcheRegistry, entity: EntityId) -> bool {
    registry.has_component::<Transform2d>(entity)
        && registry.has_component::<Collider2d>(entity)
        && !registry.has_component::<Velocity2d>(entity)
        && !registry.has_component::<StaticBody>(entity)
}

#[derive(Clone, Copy)]
struct ColliderState {
    position: Vec2,
    collider: Collider2d,
}

fn collider_state(
    registry: &ArcheRegistry,
    entity: EntityId,
) -> ember_core::EcsResult<ColliderState> {
    Ok(ColliderState {
        position: registry.try_get_component::<Transform2d>(entity)?.position,
        collider: *registry.try_get_component::<Collider2d>(entity)?,
    })
}

/// Exact test for every shape combination; the normal points from `a` to `b`.
fn detect(a: ColliderState, b: ColliderState) -> CollisionResult {
    match (a.collider.shape, b.collider.shape) {
        (Shape2d::Aabb(sa), Shape2d::Aabb(sb)) => {
            check_aabb_collision(a.position, sa.half_size, b.position, sb.half_size)
        }
        (Shape2d::Circle(ca), Shape2d::Circle(cb)) => {
            check_circle_collision(a.position, ca.radius, b.position, cb.radius)
        }
        (Shape2d::Aabb(sa), Shape2d::Circle(cb)) => {
            check_aabb_circle_collision(a.position, sa.half_size, b.position, cb.radius)
        }
        (Shape2d::Circle(ca), Shape2d::Aabb(sb)) => {
            check_circle_aabb_collision(a.position, ca.radius, b.position, sb.half_size)
        }
    }
}

fn motion_of(registry: &ArcheRegistry, entity: EntityId) -> (Vec2, Vec2) {
    let position = registry.get_component::<Transform2d>(entity).position;
    let velocity = registry
        .try_get_component::<Velocity2d>(entity)
        .map_or(Vec2::ZERO, |velocity| velocity.linear);
    (position, velocity)
}

fn write_motion(registry: &mut ArcheRegistry, entity: EntityId, position: Vec2, velocity: Vec2) {
    registry.get_component_mut::<Transform2d>(entity).position = position;
    if let Ok(component) = registry.try_get_component_mut::<Velocity2d>(entity) {
        component.linear = velocity;
    }
}
