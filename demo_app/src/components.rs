//! Gameplay components used by the demo scenes

use rand::Rng;
use scene_engine::prelude::*;

/// Spins its entity around a fixed axis
pub struct Spinner {
    pub axis: Vec3,
    pub radians_per_second: f32,
}

impl Component for Spinner {
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        let angle = self.radians_per_second * ctx.delta_time();
        if let Some(transform) = ctx.transform_mut() {
            transform.rotate_axis_angle(self.axis, angle);
        }
        Ok(())
    }
}

/// Moves its entity at constant velocity
pub struct Drifter {
    pub velocity: Vec3,
}

impl Component for Drifter {
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        let offset = self.velocity * ctx.delta_time();
        if let Some(transform) = ctx.transform_mut() {
            transform.translate(offset);
        }
        Ok(())
    }
}

/// Destroys its entity after a number of simulation steps
pub struct Lifetime {
    pub steps_left: u32,
}

impl Component for Lifetime {
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.steps_left = self.steps_left.saturating_sub(1);
        if self.steps_left == 0 {
            ctx.destroy_self()?;
        }
        Ok(())
    }
}

/// Periodically spawns drifting asteroids as children of its entity
pub struct AsteroidSpawner {
    pub every_steps: u32,
    pub lifetime_steps: u32,
    counter: u32,
    spawned: u32,
}

impl AsteroidSpawner {
    pub fn new(every_steps: u32, lifetime_steps: u32) -> Self {
        Self {
            every_steps: every_steps.max(1),
            lifetime_steps,
            counter: 0,
            spawned: 0,
        }
    }
}

impl Component for AsteroidSpawner {
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.counter += 1;
        if self.counter < self.every_steps {
            return Ok(());
        }
        self.counter = 0;

        let mut rng = rand::thread_rng();
        let asteroid = ctx.spawn(format!("asteroid_{}", self.spawned));
        let me = ctx.entity();
        ctx.set_parent(asteroid, Some(me))?;
        ctx.add_component(
            asteroid,
            Drifter {
                velocity: Vec3::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0), 0.0),
            },
        )?;
        ctx.add_component(
            asteroid,
            Spinner {
                axis: Vec3::z(),
                radians_per_second: rng.gen_range(0.5..3.0),
            },
        )?;
        ctx.add_component(asteroid, Lifetime { steps_left: self.lifetime_steps })?;
        self.spawned += 1;
        Ok(())
    }

    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        log::info!("Spawner retired after {} asteroids", self.spawned);
        Ok(())
    }
}

/// Switches to the arena scene after a number of steps
pub struct SceneSwitcher {
    pub after_steps: u32,
    pub quit_after_steps: u32,
    steps: u32,
}

impl SceneSwitcher {
    pub fn new(after_steps: u32, quit_after_steps: u32) -> Self {
        Self {
            after_steps,
            quit_after_steps,
            steps: 0,
        }
    }
}

impl Component for SceneSwitcher {
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::UPDATE
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.steps += 1;
        if self.steps == self.after_steps {
            log::info!("Switching to arena after {} steps", self.steps);
            ctx.load_scene(crate::build_arena_scene(self.quit_after_steps)?);
        }
        Ok(())
    }
}

/// Requests quit after a number of steps
pub struct QuitTimer {
    pub after_steps: u32,
    steps: u32,
}

impl QuitTimer {
    pub fn new(after_steps: u32) -> Self {
        Self { after_steps, steps: 0 }
    }
}

impl Component for QuitTimer {
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::START | LifecycleHooks::UPDATE
    }

    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        log::info!("Quit timer armed in scene '{}'", ctx.scene().name());
        Ok(())
    }

    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.steps += 1;
        if self.steps >= self.after_steps {
            ctx.request_quit();
        }
        Ok(())
    }
}
