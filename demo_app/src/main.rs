//! Scene engine demo
//!
//! Builds a small title scene with a spinning ship and an asteroid spawner,
//! switches to an arena scene after a few seconds and quits on a timer.
//! Runs headless by default; build with `--features glfw` for a real window.
//!
//! Usage: `scene_demo [config.toml|config.ron]`

mod components;

use components::{AsteroidSpawner, QuitTimer, SceneSwitcher, Spinner};
use scene_engine::foundation::logging;
use scene_engine::prelude::*;
use std::process;

const SWITCH_AFTER_STEPS: u32 = 120;
const QUIT_AFTER_STEPS: u32 = 180;

/// Arena scene: a ring of spinning pylons and the quit timer
pub fn build_arena_scene(quit_after_steps: u32) -> Result<Scene, SceneError> {
    let mut scene = Scene::new("arena").with_clear_policy(ClearPolicy::SolidColor(Vec4::new(0.02, 0.02, 0.05, 1.0)));

    let center = scene.spawn("arena_center");
    for i in 0..6u8 {
        let angle = f32::from(i) * std::f32::consts::TAU / 6.0;
        let pylon = scene.spawn_with_transform(
            format!("pylon_{i}"),
            Transform::from_position(Vec3::new(angle.cos() * 8.0, angle.sin() * 8.0, 0.0)),
        );
        scene.set_parent(pylon, Some(center))?;
        scene.add_component(
            pylon,
            Spinner {
                axis: Vec3::y(),
                radians_per_second: 1.0 + f32::from(i) * 0.25,
            },
        )?;
    }

    let timer = scene.spawn("quit_timer");
    scene.add_component(timer, QuitTimer::new(quit_after_steps))?;
    Ok(scene)
}

struct DemoApp;

impl Application for DemoApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let scene = engine.scene_mut();

        let ship = scene.spawn_with_transform("ship", Transform::from_position(Vec3::new(0.0, 0.0, -5.0)));
        scene.add_component(
            ship,
            Spinner {
                axis: Vec3::y(),
                radians_per_second: std::f32::consts::FRAC_PI_2,
            },
        )?;

        let spawner = scene.spawn("asteroid_field");
        scene.add_component(spawner, AsteroidSpawner::new(15, 90))?;

        let director = scene.spawn("director");
        scene.add_component(director, SceneSwitcher::new(SWITCH_AFTER_STEPS, QUIT_AFTER_STEPS))?;

        if let Some(readme) = engine.resources_mut().load("README.md") {
            log::debug!("Found README ({} bytes)", readme.len());
        }

        log::info!("Title scene ready with {} entities", engine.scene().len());
        Ok(())
    }

    fn on_tick(&mut self, engine: &mut Engine, report: &TickReport) -> Result<(), AppError> {
        if report.update.faults > 0 {
            log::warn!("{} component faults this tick", report.update.faults);
        }
        if engine.stats().ticks % 600 == 0 && report.rendered {
            log::debug!("Scene '{}' has {} entities", engine.scene().name(), engine.scene().len());
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let stats = engine.stats();
        log::info!(
            "Demo finished: {} ticks, {} steps, {} renders, {} scene loads, {} faults",
            stats.ticks,
            stats.steps,
            stats.renders,
            stats.scene_loads,
            stats.faults
        );
    }
}

fn load_config() -> EngineConfig {
    let Some(path) = std::env::args().nth(1) else {
        return EngineConfig::default();
    };
    match EngineConfig::load_from_file(&path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config '{path}': {e}, using defaults");
            EngineConfig::default()
        }
    }
}

#[cfg(feature = "glfw")]
fn create_engine(config: EngineConfig) -> Result<Engine, EngineError> {
    Engine::with_glfw_window(config)
}

#[cfg(not(feature = "glfw"))]
fn create_engine(config: EngineConfig) -> Result<Engine, EngineError> {
    Engine::headless(config)
}

fn main() {
    let config = load_config();
    logging::init(&config.log_level);

    log::info!("Starting scene engine demo");
    let mut engine = match create_engine(config) {
        Ok(engine) => engine,
        Err(e) => {
            log::error!("Failed to initialize engine: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = engine.run_application(&mut DemoApp) {
        log::error!("Demo failed: {}", e);
        process::exit(1);
    }
}
