//! # Sweep and Prune Integration Tests
//!
//! Endpoint order, agreement with brute force, and the line/jump/static
//! scenes, driven through a real registry.

use std::collections::BTreeSet;

use ember_core::ecs::components::{Collider2d, Shape2d, StaticBody, Transform2d, Velocity2d};
use ember_core::{ArcheRegistry, EntityId, Vec2};
use ember_physics::{Aabb, ContactKind, SweepAndPrune};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

type PairSet = BTreeSet<(EntityId, EntityId)>;

fn ordered(a: EntityId, b: EntityId) -> (EntityId, EntityId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn spawn_dynamic(registry: &mut ArcheRegistry, position: Vec2, half: Vec2) -> EntityId {
    let entity = registry.create_entity();
    registry.create_components(
        entity,
        (
            Transform2d::at(position),
            Collider2d::trigger(Shape2d::aabb(half.x, half.y)),
            Velocity2d::default(),
        ),
    );
    entity
}

fn spawn_static(registry: &mut ArcheRegistry, position: Vec2, half: Vec2) -> EntityId {
    spawn_static_with(registry, position, Collider2d::solid(Shape2d::aabb(half.x, half.y)))
}

fn spawn_static_with(registry: &mut ArcheRegistry, position: Vec2, collider: Collider2d) -> EntityId {
    let entity = registry.create_entity();
    registry.create_components(entity, (Transform2d::at(position), collider, StaticBody));
    entity
}

fn move_to(registry: &mut ArcheRegistry, entity: EntityId, position: Vec2) {
    registry.get_component_mut::<Transform2d>(entity).position = position;
}

fn contact_pairs(sap: &SweepAndPrune) -> PairSet {
    sap.contacts().iter().map(|c| ordered(c.a, c.b)).collect()
}

struct Body {
    entity: EntityId,
    half: Vec2,
    velocity: Vec2,
    is_static: bool,
}

fn brute_force(registry: &ArcheRegistry, bodies: &[Body]) -> PairSet {
    let bounds = |body: &Body| {
        let position = registry.get_component::<Transform2d>(body.entity).position;
        Aabb::from_center(position, body.half)
    };

    let mut pairs = PairSet::new();
    for (i, a) in bodies.iter().enumerate() {
        for b in &bodies[i + 1..] {
            if a.is_static && b.is_static {
                continue;
            }
            if bounds(a).intersects(&bounds(b)) {
                pairs.insert(ordered(a.entity, b.entity));
            }
        }
    }
    pairs
}

fn random_scene(rng: &mut ChaCha8Rng, registry: &mut ArcheRegistry) -> Vec<Body> {
    let mut bodies = Vec::new();
    for i in 0..140 {
        let position = Vec2::new(rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0));
        let half = Vec2::new(rng.gen_range(0.25..3.0), rng.gen_range(0.25..3.0));
        let is_static = i % 7 == 0;
        // Triggers only, so responses never move a body mid-frame.
        let entity = if is_static {
            spawn_static_with(registry, position, Collider2d::trigger(Shape2d::aabb(half.x, half.y)))
        } else {
            spawn_dynamic(registry, position, half)
        };
        bodies.push(Body {
            entity,
            half,
            velocity: Vec2::new(rng.gen_range(-30.0..30.0), rng.gen_range(-30.0..30.0)),
            is_static,
        });
    }
    bodies
}

fn step(registry: &mut ArcheRegistry, bodies: &[Body], dt: f32) {
    for body in bodies.iter().filter(|body| !body.is_static) {
        let position = registry.get_component::<Transform2d>(body.entity).position;
        move_to(registry, body.entity, position + body.velocity * dt);
    }
}

/// Every endpoint array stays sorted across frames of motion.
#[test]
fn test_endpoints_stay_sorted() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut registry = ArcheRegistry::new();
    let bodies = random_scene(&mut rng, &mut registry);
    let mut sap = SweepAndPrune::new();

    for _ in 0..40 {
        sap.on_update(&mut registry);
        assert!(sap.is_sorted());
        assert!(sap.back_references_exact());
        step(&mut registry, &bodies, 1.0 / 30.0);
    }
}

/// Contacts equal the O(n^2) overlap set every frame.
#[test]
fn test_matches_brute_force() {
    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let mut registry = ArcheRegistry::new();
    let bodies = random_scene(&mut rng, &mut registry);
    let mut sap = SweepAndPrune::new();

    let mut seen = 0;
    for frame in 0..30 {
        sap.on_update(&mut registry);
        let expected = brute_force(&registry, &bodies);
        assert_eq!(contact_pairs(&sap), expected, "frame {frame}");
        seen += expected.len();
        step(&mut registry, &bodies, 1.0 / 60.0);
    }
    assert!(seen > 0, "scene never produced an overlap");
}

/// The active list drains and every closing endpoint finds its interval.
#[test]
fn test_active_list_drains() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    let mut registry = ArcheRegistry::new();
    let bodies = random_scene(&mut rng, &mut registry);
    let mut sap = SweepAndPrune::new();

    for _ in 0..20 {
        sap.on_update(&mut registry);
        let stats = sap.last_stats();
        assert_eq!(stats.missing_keys, 0);
        assert_eq!(stats.leaked_keys, 0);
        assert_eq!(stats.dynamic_colliders + stats.static_colliders, bodies.len());
        step(&mut registry, &bodies, 1.0 / 60.0);
    }
}

/// A line of 100 boxes, each overlapping only its neighbours.
#[test]
fn test_line_of_boxes() {
    let mut registry = ArcheRegistry::new();
    let entities: Vec<EntityId> = (0..100)
        .map(|i| spawn_dynamic(&mut registry, Vec2::new(i as f32 * 0.9, 0.0), Vec2::splat(0.5)))
        .collect();

    let mut sap = SweepAndPrune::new();
    sap.on_update(&mut registry);

    let expected: PairSet = entities.windows(2).map(|w| ordered(w[0], w[1])).collect();
    assert_eq!(sap.contacts().len(), 99);
    assert_eq!(contact_pairs(&sap), expected);
    assert_eq!(sap.last_stats().confirmed_pairs, 99);
}

/// One collider jumps past several others in a single frame.
#[test]
fn test_large_jump() {
    let mut registry = ArcheRegistry::new();
    let entities: Vec<EntityId> = (0..10)
        .map(|i| spawn_dynamic(&mut registry, Vec2::new(i as f32 * 3.0, 0.0), Vec2::splat(1.0)))
        .collect();

    let mut sap = SweepAndPrune::new();
    assert!(sap.on_update(&mut registry).is_empty());

    move_to(&mut registry, entities[0], Vec2::new(21.2, 0.0));
    sap.on_update(&mut registry);

    assert!(sap.is_sorted());
    assert!(sap.back_references_exact());
    let expected: PairSet = [ordered(entities[0], entities[7])].into_iter().collect();
    assert_eq!(contact_pairs(&sap), expected);
    assert!(sap.last_stats().swaps > 0);
}

/// A dynamic box moved into a static one reports exactly that pair.
#[test]
fn test_dynamic_hits_static() {
    let mut registry = ArcheRegistry::new();
    let wall = spawn_static(&mut registry, Vec2::new(5.0, 0.0), Vec2::splat(1.0));
    let mover = registry.create_entity();
    registry.create_components(
        mover,
        (
            Transform2d::at(Vec2::ZERO),
            Collider2d::solid(Shape2d::aabb(1.0, 1.0)),
            Velocity2d::new(2.0, 0.0),
        ),
    );

    let mut sap = SweepAndPrune::new();
    assert!(sap.on_update(&mut registry).is_empty());
    assert_eq!(sap.static_count(), 1);
    assert_eq!(sap.dynamic_count(), 1);

    move_to(&mut registry, mover, Vec2::new(4.5, 0.0));
    let contacts = sap.on_update(&mut registry).to_vec();

    assert_eq!(contacts.len(), 1);
    let contact = contacts[0];
    assert_eq!((contact.a, contact.b), (mover, wall));
    assert!(contact.b_is_static);
    assert_eq!(contact.kind, ContactKind::Solid);
    assert_eq!(contact.normal, Vec2::X);

    // Pushed back out of the wall and bounced.
    let position = registry.get_component::<Transform2d>(mover).position;
    assert!((position.x - 3.0).abs() < 1e-5);
    assert!(registry.get_component::<Velocity2d>(mover).linear.x < 0.0);
    assert_eq!(registry.get_component::<Transform2d>(wall).position, Vec2::new(5.0, 0.0));
}

/// Static colliders never pair with each other.
#[test]
fn test_static_pairs_are_skipped() {
    let mut registry = ArcheRegistry::new();
    spawn_static(&mut registry, Vec2::ZERO, Vec2::splat(2.0));
    spawn_static(&mut registry, Vec2::new(1.0, 0.0), Vec2::splat(2.0));

    let mut sap = SweepAndPrune::new();
    sap.on_update(&mut registry);
    assert!(sap.candidate_pairs().is_empty());
    assert!(sap.contacts().is_empty());
}

fn spawn_point(registry: &mut ArcheRegistry, position: Vec2) -> EntityId {
    let entity = registry.create_entity();
    registry.create_components(
        entity,
        (
            Transform2d::at(position),
            Collider2d::trigger(Shape2d::circle(0.0)),
            Velocity2d::default(),
        ),
    );
    entity
}

/// A zero-extent collider keeps its min ahead of its max.
#[test]
fn test_zero_extent_collider_opens_before_closing() {
    let mut registry = ArcheRegistry::new();
    spawn_point(&mut registry, Vec2::ZERO);
    let circle = registry.create_entity();
    registry.create_components(
        circle,
        (
            Transform2d::at(Vec2::new(5.0, 0.0)),
            Collider2d::trigger(Shape2d::circle(1.0)),
            Velocity2d::default(),
        ),
    );

    let mut sap = SweepAndPrune::new();
    sap.on_update(&mut registry);

    assert!(sap.is_sorted());
    assert!(sap.back_references_exact());
    let stats = sap.last_stats();
    assert_eq!(stats.missing_keys, 0);
    assert_eq!(stats.leaked_keys, 0);
    assert_eq!(stats.candidate_pairs, 0);
    assert!(sap.contacts().is_empty());
}

/// A point strictly inside a box pairs with it; one on the edge does not.
#[test]
fn test_zero_extent_collider_against_box() {
    let mut registry = ArcheRegistry::new();
    let block = spawn_dynamic(&mut registry, Vec2::ZERO, Vec2::splat(1.0));
    let point = spawn_point(&mut registry, Vec2::new(0.25, 0.25));

    let mut sap = SweepAndPrune::new();
    sap.on_update(&mut registry);
    assert_eq!(sap.candidate_pairs().len(), 1);
    assert_eq!(
        sap.candidate_pairs().into_iter().map(|(a, b)| ordered(a, b)).collect::<Vec<_>>(),
        [ordered(block, point)]
    );

    move_to(&mut registry, point, Vec2::new(1.0, 0.0));
    sap.on_update(&mut registry);
    assert!(sap.candidate_pairs().is_empty());
    assert!(sap.contacts().is_empty());

    // Sweep the point across the box and back.
    for i in -20i32..=20 {
        move_to(&mut registry, point, Vec2::new(i as f32 * 0.1, 0.0));
        sap.on_update(&mut registry);
        assert!(sap.is_sorted(), "unsorted at step {i}");
        assert!(sap.back_references_exact(), "stale keys at step {i}");
        let stats = sap.last_stats();
        assert_eq!(stats.missing_keys, 0, "missing key at step {i}");
        assert_eq!(stats.leaked_keys, 0, "leaked key at step {i}");
        assert_eq!(stats.candidate_pairs, usize::from(i.abs() < 10), "step {i}");
    }
}

/// A collider with neither velocity nor a static marker stays untracked
/// until it gains one.
#[test]
fn test_unplaced_collider_is_skipped() {
    let mut registry = ArcheRegistry::new();
    let other = spawn_dynamic(&mut registry, Vec2::ZERO, Vec2::splat(1.0));
    let loose = registry.create_entity();
    registry.create_components(
        loose,
        (
            Transform2d::at(Vec2::new(0.5, 0.0)),
            Collider2d::trigger(Shape2d::aabb(1.0, 1.0)),
        ),
    );

    let mut sap = SweepAndPrune::new();
    for _ in 0..2 {
        assert!(sap.on_update(&mut registry).is_empty());
        let stats = sap.last_stats();
        assert_eq!(stats.unplaced_colliders, 1);
        assert_eq!(stats.dynamic_colliders + stats.static_colliders, 1);
    }

    registry.add_components(loose, Velocity2d::default());
    sap.on_update(&mut registry);
    assert_eq!(sap.last_stats().unplaced_colliders, 0);
    assert_eq!(sap.dynamic_count(), 2);
    assert_eq!(contact_pairs(&sap), [ordered(other, loose)].into_iter().collect());
}
