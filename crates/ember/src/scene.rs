//! # Scene
//!
//! Composition root: one registry, one event channel, the collision
//! system, the texture cache and the background workers.
//!
//! ```text
//! on_update(dt):
//!   1. drain main-thread queue     (background results land here)
//!   2. kinematics                  (transform += velocity * dt)
//!   3. scripts: on_create, on_update
//!   4. collision                   (sweep and prune, response, events)
//!   5. scripts: on_event           (everything queued this step)
//!
//! on_render(renderer):
//!   sprites, cubes, scripts: on_render
//! ```
//!
//! The registry is owned by the scene and only touched on the thread that
//! owns the scene. Background jobs hand their results back through the
//! main-thread queue.

use std::sync::Arc;

use ember_core::ecs::components::RigidBody2d;
use ember_core::{
    ArcheRegistry, EntityId, EventBus, EventReceiver, EventSender, InputEvent, MainThreadHandle,
    MainThreadQueue, SceneEvent, WorkerPool,
};
use ember_physics::Contact;
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::renderer::Renderer;
use crate::resources::TextureCache;
use crate::systems::{kinematics, render, scripts, CollisionSystem};

/// Counters for the last update and render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneStats {
    /// Fixed updates run so far.
    pub updates: u64,
    /// Frames rendered so far.
    pub renders: u64,
    /// Main-thread callbacks run in the last update.
    pub callbacks: usize,
    /// Entities moved in the last update.
    pub moved: usize,
    /// Scripts created in the last update.
    pub scripts_created: usize,
    /// Scripts updated in the last update.
    pub scripts_updated: usize,
    /// Contacts found in the last update.
    pub contacts: usize,
    /// Script event deliveries in the last update.
    pub events_delivered: usize,
    /// Quads and cubes drawn in the last render.
    pub drawn: usize,
}

/// A running world.
pub struct Scene {
    registry: ArcheRegistry,
    sender: EventSender<SceneEvent>,
    receiver: EventReceiver<SceneEvent>,
    collision: CollisionSystem,
    textures: Arc<TextureCache>,
    // Dropped before the queue: joining the workers lets their last
    // callbacks land in a live queue.
    workers: WorkerPool,
    main_thread: Arc<MainThreadQueue<Scene>>,
    stats: SceneStats,
    quit_requested: bool,
}

impl Scene {
    /// Builds an empty scene.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Workers`] if the worker threads cannot start.
    pub fn new(config: &EngineConfig) -> EngineResult<Self> {
        let bus = EventBus::new(config.events.capacity);
        let default_body = RigidBody2d {
            restitution: config.physics.default_restitution,
            ..RigidBody2d::default()
        };
        let workers = WorkerPool::new(config.workers.threads).map_err(EngineError::Workers)?;

        debug!(
            event_capacity = config.events.capacity,
            workers = workers.thread_count(),
            physics = config.physics.enabled,
            "scene created"
        );
        Ok(Self {
            registry: ArcheRegistry::new(),
            sender: bus.sender(),
            receiver: bus.receiver(),
            collision: CollisionSystem::new(config.physics.enabled, default_body),
            textures: Arc::new(TextureCache::new()),
            workers,
            main_thread: Arc::new(MainThreadQueue::new()),
            stats: SceneStats::default(),
            quit_requested: false,
        })
    }

    // ------------------------------------------------------------------------
    // Frame cycle
    // ------------------------------------------------------------------------

    /// Runs one fixed simulation step.
    pub fn on_update(&mut self, dt: f32) {
        let queue = Arc::clone(&self.main_thread);
        self.stats.callbacks = queue.drain(self);

        self.stats.moved = kinematics::integrate(&mut self.registry, dt);
        self.stats.scripts_created = scripts::create_pending(&mut self.registry, &self.sender);
        self.stats.scripts_updated = scripts::update(&mut self.registry, &self.sender, dt);
        self.stats.contacts = self.collision.update(&mut self.registry, &self.sender);
        self.stats.events_delivered = self.dispatch_events();
        self.stats.updates += 1;

        trace!(update = self.stats.updates, stats = ?self.stats, "scene update");
    }

    /// Submits one frame to `renderer`.
    pub fn on_render(&mut self, renderer: &mut dyn Renderer) {
        renderer.begin_frame();
        let sprites = render::draw_sprites(&mut self.registry, renderer);
        let cubes = render::draw_cubes(&mut self.registry, renderer);
        scripts::render(&mut self.registry, &self.sender);
        renderer.end_frame();

        self.stats.drawn = sprites + cubes;
        self.stats.renders += 1;
    }

    /// Forwards platform input to every script.
    ///
    /// [`InputEvent::Quit`] also sets [`quit_requested`](Self::quit_requested).
    pub fn on_event(&mut self, input: InputEvent) {
        if input == InputEvent::Quit {
            debug!("quit requested");
            self.quit_requested = true;
        }
        let event = SceneEvent::Input(input);
        scripts::deliver(&mut self.registry, &self.sender, &event);
    }

    fn dispatch_events(&mut self) -> usize {
        self.receiver
            .drain()
            .iter()
            .map(|event| scripts::deliver(&mut self.registry, &self.sender, event))
            .sum()
    }

    // ------------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------------

    /// Creates an entity without components.
    pub fn create_entity(&mut self) -> EntityId {
        self.registry.create_entity()
    }

    /// Runs the entity's `on_destroy` hook, then destroys it.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        scripts::destroy(&mut self.registry, &self.sender, entity);
        self.registry.destroy_entity(entity)
    }

    /// The scene's registry.
    #[must_use]
    pub fn registry(&self) -> &ArcheRegistry {
        &self.registry
    }

    /// The scene's registry, mutably.
    pub fn registry_mut(&mut self) -> &mut ArcheRegistry {
        &mut self.registry
    }

    // ------------------------------------------------------------------------
    // Background work
    // ------------------------------------------------------------------------

    /// Runs `job` on a worker thread, then `then` on the main thread during
    /// the next [`on_update`](Self::on_update) after the job finished.
    pub fn spawn_background<R, J, T>(&self, job: J, then: T)
    where
        R: Send + 'static,
        J: FnOnce() -> R + Send + 'static,
        T: FnOnce(R, &mut Scene) + Send + 'static,
    {
        let handle = self.main_thread.handle();
        self.workers.execute(move || {
            let result = job();
            handle.enqueue(move |scene: &mut Scene| then(result, scene));
        });
    }

    /// Producer handle for callbacks that must run on the main thread.
    #[must_use]
    pub fn main_thread_handle(&self) -> MainThreadHandle<Scene> {
        self.main_thread.handle()
    }

    /// Blocks until every background job has finished. Their callbacks
    /// still wait for the next update.
    pub fn wait_for_background(&self) {
        self.workers.wait_idle();
    }

    /// Background jobs queued or running.
    #[must_use]
    pub fn background_jobs(&self) -> usize {
        self.workers.pending()
    }

    // ------------------------------------------------------------------------
    // Shared state
    // ------------------------------------------------------------------------

    /// Sender for scene events; events are delivered at the end of the
    /// next update.
    #[must_use]
    pub fn events(&self) -> &EventSender<SceneEvent> {
        &self.sender
    }

    /// The texture cache, shareable with loader threads.
    #[must_use]
    pub fn textures(&self) -> &Arc<TextureCache> {
        &self.textures
    }

    /// The collision system.
    #[must_use]
    pub fn collision(&self) -> &CollisionSystem {
        &self.collision
    }

    /// The collision system, mutably.
    pub fn collision_mut(&mut self) -> &mut CollisionSystem {
        &mut self.collision
    }

    /// Contacts from the last update.
    #[must_use]
    pub fn contacts(&self) -> &[Contact] {
        self.collision.contacts()
    }

    /// Counters for the last update and render.
    #[must_use]
    pub const fn stats(&self) -> SceneStats {
        self.stats
    }

    /// True once a [`InputEvent::Quit`] was received.
    #[must_use]
    pub const fn quit_requested(&self) -> bool {
        self.quit_requested
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.textures.clear();
        debug!(
            entities = self.registry.entity_count(),
            updates = self.stats.updates,
            "scene dropped"
        );
    }
}
