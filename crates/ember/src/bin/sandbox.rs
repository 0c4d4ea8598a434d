//! # EMBER Sandbox
//!
//! Headless scene exercising the whole engine:
//! - Balls bouncing inside a walled arena (sweep and prune + response)
//! - A trigger zone counting the balls that cross it (scripts + events)
//! - A platform thread feeding input over a channel, ending with Quit
//! - Textures built on a worker and applied on the main thread
//!
//! Usage: `ember_sandbox [config.toml]`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use ember::core::ecs::components::{
    Collider2d, RigidBody2d, Shape2d, Sprite, StaticBody, Tag, Transform2d, Velocity2d,
};
use ember::core::{
    InputEvent, NativeScript, SceneEvent, Script, ScriptContext, ScriptHooks, ScriptResult, Vec2,
};
use ember::{EngineConfig, EngineError, GameLoop, QuadBatch, Scene};

// ============================================================================
// CONSTANTS
// ============================================================================
const ARENA_HALF: f32 = 20.0;
const WALL_THICKNESS: f32 = 1.0;
const BALL_ROWS: usize = 6;
const BALL_COLUMNS: usize = 8;
const FRAME_TIME: Duration = Duration::from_millis(16);
const QUIT_AFTER_FRAMES: u64 = 600;
const KEY_SPACE: u32 = 32;

// ============================================================================
// SCRIPTS
// ============================================================================

/// Counts trigger overlaps reported for the zone entity.
struct ZoneCounter {
    crossings: Arc<AtomicU64>,
}

impl Script for ZoneCounter {
    const HOOKS: ScriptHooks = ScriptHooks::EVENT;

    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &SceneEvent) -> ScriptResult {
        if let SceneEvent::Trigger { a, b } = event {
            if *a == ctx.entity || *b == ctx.entity {
                self.crossings.fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

/// Kicks its ball upwards whenever space is pressed.
struct Kicker {
    kicks: u32,
}

impl Script for Kicker {
    const HOOKS: ScriptHooks = ScriptHooks::EVENT.union(ScriptHooks::DESTROY);

    fn on_event(&mut self, ctx: &mut ScriptContext<'_>, event: &SceneEvent) -> ScriptResult {
        if let SceneEvent::Input(InputEvent::KeyPressed { key: KEY_SPACE, .. }) = event {
            ctx.get_mut::<Velocity2d>()?.linear.y += 4.0;
            self.kicks += 1;
        }
        Ok(())
    }

    fn on_destroy(&mut self, ctx: &mut ScriptContext<'_>) -> ScriptResult {
        let name = &ctx.get::<Tag>()?.name;
        println!("[SANDBOX] {name} was kicked {} times", self.kicks);
        Ok(())
    }
}

// ============================================================================
// SCENE SETUP
// ============================================================================

fn spawn_walls(scene: &mut Scene) {
    let span = ARENA_HALF + WALL_THICKNESS;
    let walls = [
        (Vec2::new(0.0, span), Shape2d::aabb(span, WALL_THICKNESS)),
        (Vec2::new(0.0, -span), Shape2d::aabb(span, WALL_THICKNESS)),
        (Vec2::new(span, 0.0), Shape2d::aabb(WALL_THICKNESS, span)),
        (Vec2::new(-span, 0.0), Shape2d::aabb(WALL_THICKNESS, span)),
    ];
    for (position, shape) in walls {
        let wall = scene.create_entity();
        scene.registry_mut().create_components(
            wall,
            (
                Transform2d::new(position, shape.half_extents() * 2.0),
                Collider2d::solid(shape),
                StaticBody,
                Sprite::colored([0.3, 0.3, 0.3, 1.0]),
            ),
        );
    }
}

#[allow(clippy::cast_precision_loss)]
fn spawn_balls(scene: &mut Scene) -> Vec<ember::core::EntityId> {
    let mut balls = Vec::with_capacity(BALL_ROWS * BALL_COLUMNS);
    for row in 0..BALL_ROWS {
        for column in 0..BALL_COLUMNS {
            let position = Vec2::new(
                -14.0 + column as f32 * 4.0,
                -10.0 + row as f32 * 4.0,
            );
            let velocity = Velocity2d::new(
                3.0 - (column as f32 * 0.7),
                2.0 - (row as f32 * 0.9),
            );
            let ball = scene.create_entity();
            scene.registry_mut().create_components(
                ball,
                (
                    Transform2d::new(position, Vec2::splat(1.0)),
                    Collider2d::solid(Shape2d::circle(0.5)),
                    velocity,
                    RigidBody2d {
                        mass: 1.0 + row as f32 * 0.5,
                        restitution: 0.9,
                    },
                    Sprite::colored([0.9, 0.4, 0.1, 1.0]),
                    Tag::new(format!("ball_{row}_{column}")),
                ),
            );
            balls.push(ball);
        }
    }
    balls
}

fn spawn_zone(scene: &mut Scene, crossings: Arc<AtomicU64>) {
    let zone = scene.create_entity();
    scene.registry_mut().create_components(
        zone,
        (
            Transform2d::new(Vec2::ZERO, Vec2::splat(6.0)),
            Collider2d::trigger(Shape2d::aabb(3.0, 3.0)),
            StaticBody,
            Tag::new("zone"),
            NativeScript::bind(ZoneCounter { crossings }),
        ),
    );
}

fn load_textures(scene: &Scene) {
    scene.spawn_background(
        || {
            // Pretend decode: build the mip chain sizes of a 64x64 texture.
            (0..7).map(|level| 64u32 >> level).collect::<Vec<_>>()
        },
        |mips, scene: &mut Scene| {
            let size = mips.first().copied().unwrap_or(1);
            let handle = scene.textures().register("ball", size, size);
            for sprites in scene.registry_mut().query::<(&mut Sprite, &RigidBody2d)>() {
                for (sprite, _) in sprites {
                    sprite.texture = Some(handle);
                }
            }
            println!("[SANDBOX] texture 'ball' ready ({} mips)", mips.len());
        },
    );
}

// ============================================================================
// PLATFORM THREAD
// ============================================================================

/// Answers every frame tick with that frame's input. Ends with `Quit`.
fn spawn_platform(ticks: Receiver<u64>, input: Sender<Vec<InputEvent>>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for frame in ticks {
            let mut events = Vec::new();
            if frame % 90 == 45 {
                events.push(InputEvent::KeyPressed {
                    key: KEY_SPACE,
                    repeat: false,
                });
            }
            if frame % 90 == 50 {
                events.push(InputEvent::KeyReleased { key: KEY_SPACE });
            }
            if frame == QUIT_AFTER_FRAMES {
                events.push(InputEvent::Quit);
            }
            if input.send(events).is_err() {
                break;
            }
        }
    })
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> Result<(), EngineError> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║                        EMBER SANDBOX                             ║");
    println!("╠══════════════════════════════════════════════════════════════════╣");
    println!("║  update rate: {:>4} Hz   event capacity: {:>6}   workers: {:>2}   ║",
        config.timing.update_hz, config.events.capacity, config.workers.threads);
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let mut scene = Scene::new(&config)?;
    let crossings = Arc::new(AtomicU64::new(0));

    spawn_walls(&mut scene);
    let balls = spawn_balls(&mut scene);
    spawn_zone(&mut scene, Arc::clone(&crossings));
    for &ball in balls.iter().step_by(8) {
        scene
            .registry_mut()
            .add_components(ball, NativeScript::bind(Kicker { kicks: 0 }));
    }
    load_textures(&scene);

    let (tick_tx, tick_rx) = bounded(1);
    let (input_tx, input_rx) = bounded(1);
    let platform = spawn_platform(tick_rx, input_tx);

    let mut game_loop = GameLoop::new(&config);
    let mut batch = QuadBatch::with_capacity(balls.len() + 8);
    let mut contacts = 0;

    while !scene.quit_requested() {
        if tick_tx.send(game_loop.frame_count()).is_err() {
            break;
        }
        let Ok(events) = input_rx.recv() else { break };
        for event in events {
            scene.on_event(event);
        }

        let stats = game_loop.advance(FRAME_TIME, &mut scene, &mut batch);
        contacts += scene.stats().contacts * stats.updates as usize;

        if stats.frame % 120 == 0 {
            let sap = scene.collision().stats();
            println!(
                "[FRAME {:>4}] updates={} quads={} ({} bytes) candidates={} contacts={} swaps={}",
                stats.frame,
                stats.updates,
                batch.quads().len(),
                batch.quad_bytes().len(),
                sap.candidate_pairs,
                sap.contacts,
                sap.swaps,
            );
        }
    }
    drop(tick_tx);
    let _ = platform.join();

    for &ball in balls.iter().step_by(8) {
        scene.destroy_entity(ball);
    }

    let timing = game_loop.stats();
    timing.log_summary();

    println!();
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║  frames: {:>6}   updates: {:>6}   skipped renders: {:>6}        ║",
        timing.frames_recorded, timing.updates, timing.skipped_renders);
    println!("║  zone crossings: {:>6}   approx contacts: {:>8}               ║",
        crossings.load(Ordering::Relaxed), contacts);
    println!("║  entities left: {:>6}   textures: {:>3}                          ║",
        scene.registry().entity_count(), scene.textures().len());
    println!("╚══════════════════════════════════════════════════════════════════╝");

    Ok(())
}
