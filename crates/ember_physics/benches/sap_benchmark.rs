//! # Sweep and Prune Benchmark
//!
//! Frame cost with coherent motion, the case incremental sorting is for.
//!
//! Run with: `cargo bench --package ember_physics`

#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ember_core::ecs::components::{Collider2d, Shape2d, StaticBody, Transform2d, Velocity2d};
use ember_core::{ArcheRegistry, Vec2};
use ember_physics::SweepAndPrune;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const COLLIDER_COUNTS: [usize; 3] = [100, 1_000, 5_000];

fn populate(count: usize) -> ArcheRegistry {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let mut registry = ArcheRegistry::new();
    let extent = (count as f32).sqrt() * 4.0;

    for i in 0..count {
        let entity = registry.create_entity();
        let position = Vec2::new(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        let transform = Transform2d::at(position);
        if i % 10 == 0 {
            let collider = Collider2d::solid(Shape2d::aabb(2.0, 2.0));
            registry.create_components(entity, (transform, collider, StaticBody));
        } else {
            let collider = Collider2d::trigger(Shape2d::aabb(0.5, 0.5));
            let velocity = Velocity2d::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
            registry.create_components(entity, (transform, collider, velocity));
        }
    }
    registry
}

fn integrate(registry: &mut ArcheRegistry, dt: f32) {
    for chunk in registry.query::<(&mut Transform2d, &Velocity2d)>() {
        for (transform, velocity) in chunk {
            transform.position += velocity.linear * dt;
        }
    }
}

fn bench_coherent_frames(c: &mut Criterion) {
    let mut group = c.benchmark_group("sap_coherent_frame");

    for count in COLLIDER_COUNTS {
        let mut registry = populate(count);
        let mut sap = SweepAndPrune::new();
        sap.on_update(&mut registry);

        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                integrate(&mut registry, 1.0 / 60.0);
                black_box(sap.on_update(&mut registry).len())
            });
        });
    }

    group.finish();
}

fn bench_initial_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("sap_initial_insert");
    group.sample_size(20);

    for count in COLLIDER_COUNTS {
        let mut registry = populate(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                let mut sap = SweepAndPrune::new();
                black_box(sap.on_update(&mut registry).len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_coherent_frames, bench_initial_insert);
criterion_main!(benches);
