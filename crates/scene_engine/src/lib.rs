//! # Scene Engine
//!
//! A component-based real-time engine core: a fixed-timestep loop drives a
//! scene of GameObjects whose behaviour lives in attachable components.
//!
//! ## Features
//!
//! - **Staged lifecycle**: `on_start`, `on_update`, `on_post_update` per step and
//!   `on_pre_render`, `on_render`, `on_post_render` per rendered frame
//! - **Safe structural edits**: spawn, destroy and detach from inside any hook
//! - **Fault isolation**: a failing or panicking hook never stops the frame
//! - **Deferred scene swaps**: applied only between frames
//! - **Headless backends**: deterministic runs for tests and CI
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_engine::prelude::*;
//!
//! struct Spin;
//!
//! impl Component for Spin {
//!     fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
//!         let dt = ctx.delta_time();
//!         if let Some(transform) = ctx.transform_mut() {
//!             transform.rotate_axis_angle(Vec3::y(), dt);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! struct MyApp;
//!
//! impl Application for MyApp {
//!     fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
//!         let cube = engine.scene_mut().spawn("cube");
//!         engine.scene_mut().add_component(cube, Spin)?;
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine = Engine::headless(EngineConfig::default())?;
//!     engine.run_application(&mut MyApp)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod backend;
pub mod config;
pub mod ecs;
pub mod foundation;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError, LoopState, LoopStats, TickReport};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        assets::{FileResourceLoader, Resource, ResourceLoader},
        backend::{ClearPolicy, HeadlessRenderer, HeadlessWindow, RenderBackend, WindowBackend},
        config::{Config, EngineConfig},
        ecs::{
            Component, ComponentContext, ComponentError, ComponentId, ComponentResult, EntityId, GameObject,
            LifecycleHooks, World,
        },
        foundation::{
            math::{Mat4, Quat, Vec3, Vec4},
            time::{Clock, ScriptedClock, SystemClock},
        },
        scene::{Scene, SceneError, SceneManager, Transform},
        AppError, Application, Engine, EngineError, LoopState, LoopStats, TickReport,
    };
}
