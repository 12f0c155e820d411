//! World: the engine context handed to every lifecycle hook
//!
//! The world owns the scene manager, the per-step frame time and the quit
//! request. Components reach it through
//! [`ComponentContext`](crate::ecs::ComponentContext) instead of through
//! globals.

use super::component::{invoke_hook, Hook, LifecycleHooks};
use super::context::ComponentContext;
use crate::scene::{RetiredComponent, Scene, SceneManager};

/// Timing of the simulation step currently being processed
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct FrameTime {
    /// Fixed simulation step in seconds
    pub delta_time: f32,
    /// Number of simulation steps begun so far
    pub step: u64,
    /// Simulated seconds elapsed, `step * delta_time`
    pub elapsed: f64,
    /// Fraction of a step left unprocessed at the last render, in `[0, 1)`
    pub render_alpha: f32,
}

/// Engine context shared with every component
#[derive(Debug)]
pub struct World {
    scenes: SceneManager,
    time: FrameTime,
    quit_requested: bool,
}

impl World {
    /// Create a world with `scene` as the current scene
    pub fn new(scene: Scene) -> Self {
        Self {
            scenes: SceneManager::new(scene),
            time: FrameTime::default(),
            quit_requested: false,
        }
    }

    /// Current scene
    pub fn scene(&self) -> &Scene {
        self.scenes.current()
    }

    /// Current scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.scenes.current_mut()
    }

    /// Scene manager
    pub fn scene_manager(&self) -> &SceneManager {
        &self.scenes
    }

    /// Scene manager, mutably
    pub fn scene_manager_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    /// Request a scene swap at the next frame boundary
    pub fn load_scene(&mut self, scene: Scene) {
        self.scenes.load(scene);
    }

    /// Ask the main loop to stop after the current step
    pub fn request_quit(&mut self) {
        if !self.quit_requested {
            log::info!("Quit requested");
        }
        self.quit_requested = true;
    }

    /// Whether a component or the application asked to quit
    pub fn is_quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Fixed simulation step in seconds
    pub fn delta_time(&self) -> f32 {
        self.time.delta_time
    }

    /// Timing of the current step
    pub fn frame(&self) -> &FrameTime {
        &self.time
    }

    /// Swap in the pending scene, if any
    ///
    /// Every component of the outgoing scene receives `on_destroy` before the
    /// swap. Returns whether a swap happened.
    pub fn apply_pending_load(&mut self) -> bool {
        let Some(next) = self.scenes.take_pending() else {
            return false;
        };

        let outgoing = self.scenes.current().name().to_string();
        self.scenes.current_mut().retire_all();
        self.flush_retired();
        let previous = self.scenes.replace_current(next);
        log::info!(
            "Scene '{}' unloaded ({} entities left), '{}' loaded",
            outgoing,
            previous.len(),
            self.scenes.current().name()
        );
        true
    }

    /// Destroy every entity of the current scene, running `on_destroy` hooks
    pub(crate) fn unload_current(&mut self) -> usize {
        self.scenes.current_mut().retire_all();
        self.flush_retired()
    }

    pub(crate) fn begin_step(&mut self, delta_time: f32) {
        self.time.delta_time = delta_time;
        self.time.step += 1;
        self.time.elapsed = self.time.step as f64 * f64::from(delta_time);
    }

    pub(crate) fn set_render_alpha(&mut self, alpha: f32) {
        self.time.render_alpha = alpha;
    }

    /// Run `on_destroy` for every retired component
    ///
    /// A destroy hook may itself remove further components, so this keeps
    /// draining until the retired queue stays empty. Returns how many
    /// components were destroyed.
    pub(crate) fn flush_retired(&mut self) -> usize {
        let mut destroyed = 0;
        while self.scene().has_retired() {
            let batch: Vec<RetiredComponent> = self.scene_mut().take_retired();
            for mut retired in batch {
                destroyed += 1;
                if !retired.hooks.contains(LifecycleHooks::DESTROY) {
                    continue;
                }
                let mut ctx = ComponentContext::new(self, retired.entity, retired.component);
                if let Err(fault) = invoke_hook(retired.behaviour.as_mut(), Hook::Destroy, &mut ctx) {
                    log::error!(
                        "Component {} ({:?}) failed in {}: {}",
                        retired.type_name,
                        retired.entity,
                        Hook::Destroy.name(),
                        fault
                    );
                }
            }
        }
        destroyed
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Scene::new("Main"))
    }
}
