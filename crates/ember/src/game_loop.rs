//! # EMBER Game Loop
//!
//! Fixed-timestep accumulator:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. ACCUMULATE                                                       │
//! │    └─ accumulator += real time since frame N-1                      │
//! │                                                                     │
//! │ 2. SIMULATE (zero or more times)                                    │
//! │    └─ while accumulator >= step: scene.on_update(step)              │
//! │                                                                     │
//! │ 3. RENDER (at most once)                                            │
//! │    ├─ scene.on_render(renderer)                                     │
//! │    └─ skipped when more than max_updates_per_frame steps ran        │
//! │                                                                     │
//! │ 4. RECORD                                                           │
//! │    └─ frame statistics                                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Falling behind skips renders, never simulation steps: every step owed
//! to the accumulator runs, and a frame that needed more than
//! `max_updates_per_frame` of them goes unrendered.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::renderer::Renderer;
use crate::scene::Scene;

/// Frame time above which a frame counts as over budget.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(33);

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number.
    pub frame: u64,
    /// Fixed updates run this frame.
    pub updates: u32,
    /// Whether the scene was rendered this frame.
    pub rendered: bool,
    /// Time spent in updates, in microseconds.
    pub update_us: u64,
    /// Time spent rendering, in microseconds.
    pub render_us: u64,
    /// Total frame time in microseconds.
    pub total_us: u64,
    /// Leftover fraction of a step, for render interpolation.
    pub alpha: f32,
}

/// Drives a scene with fixed simulation steps and at most one render per
/// frame.
pub struct GameLoop {
    step: Duration,
    max_updates: u32,
    accumulator: Duration,
    frame_count: u64,
    last_frame_time: Option<Instant>,
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a loop from the `[loop]` settings.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            step: config.fixed_step(),
            max_updates: config.timing.max_updates_per_frame.max(1),
            accumulator: Duration::ZERO,
            frame_count: 0,
            last_frame_time: None,
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Runs one frame using the real time since the previous call.
    /// The first call simulates nothing and only renders.
    pub fn run_frame(&mut self, scene: &mut Scene, renderer: &mut dyn Renderer) -> FrameStats {
        let now = Instant::now();
        let elapsed = self
            .last_frame_time
            .map_or(Duration::ZERO, |last| now.duration_since(last));
        self.last_frame_time = Some(now);
        self.advance(elapsed, scene, renderer)
    }

    /// Runs one frame as if `elapsed` had passed.
    pub fn advance(
        &mut self,
        elapsed: Duration,
        scene: &mut Scene,
        renderer: &mut dyn Renderer,
    ) -> FrameStats {
        let frame_start = Instant::now();
        self.accumulator += elapsed;

        let dt = self.step.as_secs_f32();
        let mut updates: u32 = 0;
        while self.accumulator >= self.step {
            scene.on_update(dt);
            self.accumulator -= self.step;
            updates = updates.saturating_add(1);
        }
        let update_done = Instant::now();

        let rendered = updates <= self.max_updates;
        if rendered {
            scene.on_render(renderer);
        } else {
            warn!(
                frame = self.frame_count,
                updates,
                "simulation behind real time, skipping render"
            );
        }
        let frame_end = Instant::now();

        let stats = FrameStats {
            frame: self.frame_count,
            updates,
            rendered,
            update_us: micros(update_done - frame_start),
            render_us: micros(frame_end - update_done),
            total_us: micros(frame_end - frame_start),
            alpha: self.interpolation_alpha(),
        };
        self.end_frame(stats);
        stats
    }

    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        self.stats_accumulator.record(stats);
    }

    /// Fraction of a step waiting in the accumulator.
    #[must_use]
    pub fn interpolation_alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }

    /// Length of one simulation step.
    #[must_use]
    pub const fn step(&self) -> Duration {
        self.step
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub const fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Fixed updates run across all frames.
    pub updates: u64,
    /// Frames whose render was skipped.
    pub skipped_renders: u64,
    /// Sum of total frame times.
    pub total_us_sum: u64,
    /// Sum of update times.
    pub update_us_sum: u64,
    /// Sum of render times.
    pub render_us_sum: u64,
    /// Min frame time.
    pub min_frame_us: u64,
    /// Max frame time.
    pub max_frame_us: u64,
    /// Frames that exceeded [`MAX_FRAME_TIME`].
    pub frames_over_budget: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            updates: 0,
            skipped_renders: 0,
            total_us_sum: 0,
            update_us_sum: 0,
            render_us_sum: 0,
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            frames_over_budget: 0,
        }
    }

    /// Records a frame's statistics.
    pub fn record(&mut self, stats: FrameStats) {
        self.frames_recorded += 1;
        self.updates += u64::from(stats.updates);
        if !stats.rendered {
            self.skipped_renders += 1;
        }
        self.total_us_sum += stats.total_us;
        self.update_us_sum += stats.update_us;
        self.render_us_sum += stats.render_us;
        self.min_frame_us = self.min_frame_us.min(stats.total_us);
        self.max_frame_us = self.max_frame_us.max(stats.total_us);

        if stats.total_us > micros(MAX_FRAME_TIME) {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average frame time in milliseconds.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_frame_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.total_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns average FPS.
    #[must_use]
    pub fn avg_fps(&self) -> f64 {
        let avg_ms = self.avg_frame_ms();
        if avg_ms <= 0.0 {
            return 0.0;
        }
        1000.0 / avg_ms
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary at info level.
    #[allow(clippy::cast_precision_loss)]
    pub fn log_summary(&self) {
        if self.frames_recorded == 0 {
            return;
        }
        let frames = self.frames_recorded as f64;
        info!(
            frames = self.frames_recorded,
            updates = self.updates,
            skipped_renders = self.skipped_renders,
            avg_frame_ms = self.avg_frame_ms(),
            avg_fps = self.avg_fps(),
            min_frame_ms = self.min_frame_us as f64 / 1000.0,
            max_frame_ms = self.max_frame_us as f64 / 1000.0,
            avg_update_ms = self.update_us_sum as f64 / frames / 1000.0,
            avg_render_ms = self.render_us_sum as f64 / frames / 1000.0,
            over_budget = self.frames_over_budget,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::QuadBatch;

    fn setup(update_hz: u32, max_updates_per_frame: u32) -> (GameLoop, Scene, QuadBatch) {
        let mut config = EngineConfig::default();
        config.timing.update_hz = update_hz;
        config.timing.max_updates_per_frame = max_updates_per_frame;
        config.workers.threads = 1;
        let scene = Scene::new(&config).unwrap();
        (GameLoop::new(&config), scene, QuadBatch::new())
    }

    #[test]
    fn test_updates_follow_accumulated_time() {
        let (mut game_loop, mut scene, mut batch) = setup(100, 5);
        assert_eq!(game_loop.step(), Duration::from_millis(10));

        let stats = game_loop.advance(Duration::from_millis(25), &mut scene, &mut batch);
        assert_eq!(stats.updates, 2);
        assert!((stats.alpha - 0.5).abs() < 1e-4);

        let stats = game_loop.advance(Duration::from_millis(5), &mut scene, &mut batch);
        assert_eq!(stats.updates, 1);

        let stats = game_loop.advance(Duration::from_millis(9), &mut scene, &mut batch);
        assert_eq!(stats.updates, 0);

        assert_eq!(scene.stats().updates, 3);
        assert_eq!(scene.stats().renders, 3);
        assert_eq!(game_loop.frame_count(), 3);
    }

    #[test]
    fn test_long_frame_runs_every_step_and_skips_render() {
        let (mut game_loop, mut scene, mut batch) = setup(100, 5);

        let stats = game_loop.advance(Duration::from_millis(1_003), &mut scene, &mut batch);
        assert_eq!(stats.updates, 100);
        assert!(!stats.rendered);
        assert!((stats.alpha - 0.3).abs() < 1e-3);
        assert_eq!(scene.stats().updates, 100);
        assert_eq!(scene.stats().renders, 0);
        assert_eq!(batch.frames(), 0);

        // Back on schedule: the next frame renders again.
        let stats = game_loop.advance(Duration::from_millis(10), &mut scene, &mut batch);
        assert_eq!(stats.updates, 1);
        assert!(stats.rendered);
        assert_eq!(scene.stats().updates, 101);
        assert_eq!(scene.stats().renders, 1);
        assert_eq!(game_loop.stats().skipped_renders, 1);
        assert_eq!(game_loop.stats().updates, 101);
    }

    #[test]
    fn test_update_cap_is_inclusive() {
        let (mut game_loop, mut scene, mut batch) = setup(100, 5);

        let stats = game_loop.advance(Duration::from_millis(50), &mut scene, &mut batch);
        assert_eq!(stats.updates, 5);
        assert!(stats.rendered);

        let stats = game_loop.advance(Duration::from_millis(60), &mut scene, &mut batch);
        assert_eq!(stats.updates, 6);
        assert!(!stats.rendered);
        assert_eq!(scene.stats().updates, 11);
        assert_eq!(scene.stats().renders, 1);
    }

    #[test]
    fn test_first_real_frame_only_renders() {
        let (mut game_loop, mut scene, mut batch) = setup(60, 5);
        let stats = game_loop.run_frame(&mut scene, &mut batch);
        assert_eq!(stats.updates, 0);
        assert!(stats.rendered);
        assert_eq!(stats.frame, 0);
        assert_eq!(scene.stats().renders, 1);
    }

    #[test]
    fn test_stats_accumulator() {
        let mut acc = FrameStatsAccumulator::new();

        for i in 0..100 {
            acc.record(FrameStats {
                frame: i,
                updates: 1,
                total_us: 10_000 + (i * 100),
                update_us: 5_000,
                render_us: 2_000,
                rendered: i % 10 != 0,
                ..FrameStats::default()
            });
        }

        assert_eq!(acc.frames_recorded, 100);
        assert_eq!(acc.updates, 100);
        assert_eq!(acc.skipped_renders, 10);
        assert!(acc.avg_fps() > 50.0);
        assert!(acc.avg_fps() < 100.0);
        assert_eq!(acc.frames_over_budget, 0);
        acc.log_summary();
    }
}
