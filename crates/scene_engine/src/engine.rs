//! Main engine loop
//!
//! The [`Engine`] owns the world, the frame scheduler, the fixed-timestep
//! accumulator and the backends. Each outer tick:
//!
//! 1. measures the wall-clock delta and adds it to the backlog,
//! 2. runs one simulation step per whole frame in the backlog
//!    (scene load, frame queue, update cycle, window poll, close check),
//! 3. renders and presents exactly once if any step ran, otherwise idles.
//!
//! State only moves forward: `NotStarted -> Running -> Stopped`.

use crate::application::Application;
use crate::assets::FileResourceLoader;
use crate::backend::{BackendError, HeadlessRenderer, HeadlessWindow, RenderBackend, WindowBackend};
use crate::config::{ConfigError, EngineConfig};
use crate::ecs::{CycleStats, FrameScheduler, World};
use crate::foundation::time::{Clock, FixedTimestep, SystemClock};
use crate::foundation::worker_pool::{PoolError, WorkerPool};
use crate::scene::Scene;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Main loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoopState {
    /// Created, `start` not called yet
    NotStarted,
    /// Ticking
    Running,
    /// Terminal
    Stopped,
}

/// What one outer tick did
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Simulation steps run
    pub steps: u32,
    /// Whether a render cycle ran
    pub rendered: bool,
    /// Real time dropped by the backlog cap
    pub discarded_time: f64,
    /// Update cycle counters, summed over the steps
    pub update: CycleStats,
    /// Render cycle counters
    pub render: CycleStats,
}

/// Counters accumulated over the engine's lifetime
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct LoopStats {
    /// Outer ticks
    pub ticks: u64,
    /// Simulation steps
    pub steps: u64,
    /// Render cycles
    pub renders: u64,
    /// Ticks that ran no step and slept instead
    pub idle_ticks: u64,
    /// Hooks that failed
    pub faults: u64,
    /// Scene swaps applied
    pub scene_loads: u64,
    /// Real time dropped by the backlog cap
    pub discarded_time: f64,
}

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A backend could not be brought up; nothing has run yet
    #[error("Backend initialization failed: {0}")]
    BackendInit(String),

    /// A running backend failed
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation not allowed in the current loop state
    #[error("Cannot {operation} while {state:?}")]
    InvalidState {
        /// Attempted operation
        operation: &'static str,
        /// State at the time
        state: LoopState,
    },

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),

    /// Worker pool error
    #[error("Worker pool error: {0}")]
    WorkerPool(#[from] PoolError),
}

/// Component-based real-time engine
pub struct Engine {
    world: World,
    scheduler: FrameScheduler,
    timestep: FixedTimestep,
    clock: Box<dyn Clock>,
    window: Box<dyn WindowBackend>,
    renderer: Box<dyn RenderBackend>,
    resources: FileResourceLoader,
    workers: Arc<WorkerPool>,
    config: EngineConfig,
    state: LoopState,
    stats: LoopStats,
    idle_sleep: Duration,
    shut_down: bool,
}

impl Engine {
    /// Create an engine around already initialized backends
    pub fn new(
        config: EngineConfig,
        window: Box<dyn WindowBackend>,
        renderer: Box<dyn RenderBackend>,
    ) -> Result<Self, EngineError> {
        config.validate()?;

        let workers = Arc::new(WorkerPool::new(config.workers.threads, config.workers.queue_capacity)?);
        let timestep = FixedTimestep::new(config.timing.target_ups)
            .with_max_unprocessed_time(config.timing.max_unprocessed_time);

        log::info!(
            "Engine created: {} UPS, {} worker threads",
            config.timing.target_ups,
            workers.size()
        );

        Ok(Self {
            world: World::default(),
            scheduler: FrameScheduler::new(),
            timestep,
            clock: Box::new(SystemClock::new()),
            window,
            renderer,
            resources: FileResourceLoader::new(&config.assets),
            workers,
            idle_sleep: Duration::from_millis(config.timing.idle_sleep_ms),
            config,
            state: LoopState::NotStarted,
            stats: LoopStats::default(),
            shut_down: false,
        })
    }

    /// Create an engine with headless backends
    pub fn headless(config: EngineConfig) -> Result<Self, EngineError> {
        let window = HeadlessWindow::new(config.window.width, config.window.height);
        Self::new(config, Box::new(window), Box::new(HeadlessRenderer::new()))
    }

    /// Create an engine with a GLFW window and the headless renderer
    #[cfg(feature = "glfw")]
    pub fn with_glfw_window(config: EngineConfig) -> Result<Self, EngineError> {
        let window = crate::backend::GlfwWindow::new(&config.window)
            .map_err(|e| EngineError::BackendInit(e.to_string()))?;
        Self::new(config, Box::new(window), Box::new(HeadlessRenderer::new()))
    }

    /// Builder pattern: Replace the wall clock
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Builder pattern: Replace the initial scene
    pub fn with_scene(mut self, scene: Scene) -> Self {
        self.world = World::new(scene);
        self
    }

    /// Enter the running state
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state != LoopState::NotStarted {
            return Err(EngineError::InvalidState {
                operation: "start",
                state: self.state,
            });
        }
        self.clock.reset();
        self.timestep.clear_backlog();
        self.state = LoopState::Running;
        log::info!("Main loop started with scene '{}'", self.world.scene().name());
        Ok(())
    }

    /// Run one outer tick
    pub fn tick(&mut self) -> Result<TickReport, EngineError> {
        if self.state != LoopState::Running {
            return Err(EngineError::InvalidState {
                operation: "tick",
                state: self.state,
            });
        }

        let mut report = TickReport::default();
        let delta = self.clock.delta_seconds();
        report.discarded_time = self.timestep.accumulate(delta);
        if report.discarded_time > 0.0 {
            log::warn!(
                "Simulation fell behind, dropping {:.3}s of backlog",
                report.discarded_time
            );
        }

        while self.state == LoopState::Running && self.timestep.try_consume_step() {
            self.step(&mut report);
        }

        if report.steps > 0 && self.state == LoopState::Running {
            self.render(&mut report)?;
        } else if report.steps == 0 {
            self.stats.idle_ticks += 1;
            self.idle();
        }

        self.stats.ticks += 1;
        self.stats.steps += u64::from(report.steps);
        self.stats.discarded_time += report.discarded_time;
        self.stats.faults += (report.update.faults + report.render.faults) as u64;
        Ok(report)
    }

    /// Start if needed, tick until stopped, then shut down
    pub fn run(&mut self) -> Result<(), EngineError> {
        if self.state == LoopState::NotStarted {
            self.start()?;
        }
        let result = self.run_until_stopped();
        self.shutdown();
        result
    }

    /// Drive `app` through initialize, the main loop and cleanup
    pub fn run_application<A: Application>(&mut self, app: &mut A) -> Result<(), EngineError> {
        app.initialize(self)
            .map_err(|e| EngineError::ApplicationError(e.to_string()))?;
        self.start()?;

        let mut result = Ok(());
        while self.state == LoopState::Running {
            let report = match self.tick() {
                Ok(report) => report,
                Err(error) => {
                    result = Err(error);
                    break;
                }
            };
            if let Err(error) = app.on_tick(self, &report) {
                log::error!("Application tick failed: {}", error);
                self.stop();
                result = Err(EngineError::ApplicationError(error.to_string()));
            }
        }

        app.cleanup(self);
        self.shutdown();
        result
    }

    /// Stop the loop; the current tick finishes its step first
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::info!("Main loop stopping after {} steps", self.stats.steps);
            self.state = LoopState::Stopped;
        }
    }

    /// Stop, destroy the current scene's components and join the workers
    ///
    /// Safe to call more than once.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.stop();
        let destroyed = self.world.unload_current();
        self.workers.shutdown();
        self.shut_down = true;
        log::info!("Engine shut down ({} components destroyed)", destroyed);
    }

    fn run_until_stopped(&mut self) -> Result<(), EngineError> {
        while self.state == LoopState::Running {
            self.tick()?;
        }
        Ok(())
    }

    fn step(&mut self, report: &mut TickReport) {
        if self.world.apply_pending_load() {
            self.stats.scene_loads += 1;
        }
        // Removals made outside any hook still owe their on_destroy
        self.world.flush_retired();

        self.world.begin_step(self.timestep.frame_time() as f32);
        self.scheduler.construct_frame_queue(self.world.scene());
        let stats = self.scheduler.run_update_cycle(&mut self.world);
        report.update.merge(stats);
        report.steps += 1;

        self.window.poll_once();

        if self.window.is_close_requested() {
            log::info!("Window close requested");
            self.stop();
        } else if self.world.is_quit_requested() {
            self.stop();
        }
    }

    fn render(&mut self, report: &mut TickReport) -> Result<(), EngineError> {
        self.world.set_render_alpha(self.timestep.alpha() as f32);
        report.render = self
            .scheduler
            .run_render_cycle(&mut self.world, self.renderer.as_mut())?;
        self.window.present()?;
        report.rendered = true;
        self.stats.renders += 1;
        Ok(())
    }

    fn idle(&self) {
        if self.idle_sleep.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(self.idle_sleep);
        }
    }

    /// Current loop state
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Lifetime counters
    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Engine context
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Engine context, mutably
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Current scene
    pub fn scene(&self) -> &Scene {
        self.world.scene()
    }

    /// Current scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.world.scene_mut()
    }

    /// Request a scene swap at the next frame boundary
    pub fn load_scene(&mut self, scene: Scene) {
        self.world.load_scene(scene);
    }

    /// Frame scheduler
    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    /// Fixed-timestep accumulator
    pub fn timestep(&self) -> &FixedTimestep {
        &self.timestep
    }

    /// Window backend
    pub fn window(&self) -> &dyn WindowBackend {
        self.window.as_ref()
    }

    /// Window backend, mutably
    pub fn window_mut(&mut self) -> &mut dyn WindowBackend {
        self.window.as_mut()
    }

    /// Render backend
    pub fn renderer(&self) -> &dyn RenderBackend {
        self.renderer.as_ref()
    }

    /// Resource loader
    pub fn resources(&self) -> &FileResourceLoader {
        &self.resources
    }

    /// Resource loader, mutably
    pub fn resources_mut(&mut self) -> &mut FileResourceLoader {
        &mut self.resources
    }

    /// Shared worker pool
    pub fn workers(&self) -> &Arc<WorkerPool> {
        &self.workers
    }

    /// Configuration the engine was built with
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Component, ComponentContext, ComponentResult};
    use crate::foundation::time::ScriptedClock;
    use approx::assert_relative_eq;
    use std::sync::{Arc, Mutex};

    fn test_config() -> EngineConfig {
        EngineConfig::default()
            .with_target_ups(60)
            .with_idle_sleep_ms(0)
            .with_workers(1, 4)
    }

    fn scripted_engine(deltas: &[f64]) -> Engine {
        Engine::headless(test_config())
            .expect("engine")
            .with_clock(ScriptedClock::new(deltas.iter().copied()))
    }

    fn renderer(engine: &Engine) -> &HeadlessRenderer {
        engine
            .renderer()
            .as_any()
            .downcast_ref::<HeadlessRenderer>()
            .expect("headless renderer")
    }

    fn window(engine: &Engine) -> &HeadlessWindow {
        engine
            .window()
            .as_any()
            .downcast_ref::<HeadlessWindow>()
            .expect("headless window")
    }

    #[test]
    fn test_sixty_hz_ticks() {
        let mut engine = scripted_engine(&[0.04, 0.0, 0.02]);
        engine.scene_mut().spawn("visible");
        engine.start().expect("start");

        let mut steps = Vec::new();
        let mut renders = Vec::new();
        for _ in 0..3 {
            let report = engine.tick().expect("tick");
            steps.push(report.steps);
            renders.push(u32::from(report.rendered));
        }

        assert_eq!(steps, vec![2, 0, 1]);
        assert_eq!(renders, vec![1, 0, 1]);
        assert_relative_eq!(engine.timestep().unprocessed_time(), 0.01, epsilon = 1e-9);
        assert_eq!(renderer(&engine).frames(), 2);
        assert_eq!(renderer(&engine).entities_drawn(), 2);
        assert_eq!(window(&engine).polls(), 3);
        assert_eq!(window(&engine).presents(), 2);
        assert_eq!(engine.stats().idle_ticks, 1);
    }

    #[test]
    fn test_one_render_per_tick_with_steps() {
        let mut engine = scripted_engine(&[0.1, 0.001, 0.05, 0.0, 0.2]);
        engine.start().expect("start");

        for _ in 0..5 {
            let report = engine.tick().expect("tick");
            assert_eq!(report.rendered, report.steps > 0);
        }
        assert_eq!(engine.stats().renders, renderer(&engine).frames());
    }

    #[test]
    fn test_backlog_is_clamped() {
        let config = test_config().with_max_unprocessed_time(Some(0.26));
        let mut engine = Engine::headless(config)
            .expect("engine")
            .with_clock(ScriptedClock::new([2.0]));
        engine.start().expect("start");

        let report = engine.tick().expect("tick");
        assert_relative_eq!(report.discarded_time, 1.74, epsilon = 1e-9);
        assert_eq!(report.steps, 15);
        assert_relative_eq!(engine.timestep().unprocessed_time(), 0.01, epsilon = 1e-9);
    }

    #[test]
    fn test_state_machine() {
        let mut engine = scripted_engine(&[]);
        assert_eq!(engine.state(), LoopState::NotStarted);
        assert!(matches!(
            engine.tick(),
            Err(EngineError::InvalidState { operation: "tick", .. })
        ));

        engine.start().expect("start");
        assert!(matches!(engine.start(), Err(EngineError::InvalidState { .. })));

        engine.stop();
        assert_eq!(engine.state(), LoopState::Stopped);
        assert!(engine.start().is_err());
        assert!(engine.tick().is_err());
    }

    #[test]
    fn test_close_request_stops_after_current_step() {
        let config = test_config();
        let window = HeadlessWindow::new(64, 64).close_after_polls(2);
        let mut engine = Engine::new(config, Box::new(window), Box::new(HeadlessRenderer::new()))
            .expect("engine")
            .with_clock(ScriptedClock::new([0.1]));

        engine.run().expect("run");

        assert_eq!(engine.state(), LoopState::Stopped);
        assert_eq!(engine.stats().steps, 2);
        // Stopping mid-tick skips that tick's render
        assert_eq!(engine.stats().renders, 0);
        assert!(engine.workers().is_shut_down());
    }

    struct Quitter {
        after_updates: u32,
        updates: u32,
    }

    impl Component for Quitter {
        fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
            self.updates += 1;
            if self.updates >= self.after_updates {
                ctx.request_quit();
            }
            Ok(())
        }
    }

    #[test]
    fn test_quit_request_from_component() {
        let mut engine = scripted_engine(&[]);
        let entity = engine.scene_mut().spawn("quitter");
        engine
            .scene_mut()
            .add_component(entity, Quitter { after_updates: 3, updates: 0 })
            .expect("add");
        engine = engine.with_clock(ScriptedClock::new([]).with_fallback(0.02));

        engine.run().expect("run");
        assert_eq!(engine.stats().steps, 3);
    }

    struct DestroyLog(Arc<Mutex<u32>>);

    impl Component for DestroyLog {
        fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
            *self.0.lock().unwrap() += 1;
            Ok(())
        }
    }

    #[test]
    fn test_shutdown_destroys_scene_once() {
        let count = Arc::new(Mutex::new(0));
        let mut engine = scripted_engine(&[]);
        let entity = engine.scene_mut().spawn("thing");
        engine
            .scene_mut()
            .add_component(entity, DestroyLog(count.clone()))
            .expect("add");

        engine.shutdown();
        engine.shutdown();

        assert_eq!(*count.lock().unwrap(), 1);
        assert_eq!(engine.state(), LoopState::Stopped);
        assert!(engine.scene().is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = test_config().with_target_ups(0);
        assert!(matches!(Engine::headless(config), Err(EngineError::Config(_))));
    }
}
