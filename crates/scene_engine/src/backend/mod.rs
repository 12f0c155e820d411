//! # Backend Module
//!
//! Boundary traits between the frame scheduler and the platform.
//!
//! ## Organization
//!
//! - **Window**: [`WindowBackend`] is polled once per simulation step and
//!   presented once per render cycle
//! - **Render**: [`RenderBackend`] receives one `begin_frame`/`end_frame` pair per
//!   render cycle and one `render_entity` call per drawn GameObject
//! - **Headless**: counting implementations of both, used by tests and CI
//! - **GLFW** (feature `glfw`): a real desktop window

pub mod headless;

#[cfg(feature = "glfw")]
pub mod glfw_window;

pub use headless::{HeadlessRenderer, HeadlessWindow};

#[cfg(feature = "glfw")]
pub use glfw_window::GlfwWindow;

use crate::ecs::GameObject;
use crate::foundation::math::{Mat4, Vec4};
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;

/// How a render backend clears the frame before drawing a scene
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ClearPolicy {
    /// Draw the skybox over the whole frame
    #[default]
    Skybox,
    /// Clear color and depth to an RGBA color
    SolidColor(Vec4),
    /// Clear depth only, keeping the previous color buffer
    DepthOnly,
    /// Leave both buffers untouched
    NoClear,
}

/// Backend errors
#[derive(Error, Debug)]
pub enum BackendError {
    /// Backend could not be brought up
    #[error("Backend initialization failed: {0}")]
    Initialization(String),

    /// Window system failure
    #[error("Window error: {0}")]
    Window(String),

    /// Render submission failure
    #[error("Render error: {0}")]
    Render(String),
}

/// Window and input backend
pub trait WindowBackend {
    /// Process pending window and input events; called once per simulation step
    fn poll_once(&mut self);

    /// Whether the user or the application asked the window to close
    fn is_close_requested(&self) -> bool;

    /// Present the finished frame; called once per render cycle
    fn present(&mut self) -> Result<(), BackendError>;

    /// Ask the window to close
    fn request_close(&mut self);

    /// Client area size in pixels
    fn size(&self) -> (u32, u32);

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Render backend
pub trait RenderBackend {
    /// Start a frame, clearing according to `clear_policy`
    fn begin_frame(&mut self, clear_policy: &ClearPolicy) -> Result<(), BackendError>;

    /// Draw one GameObject with its local-to-world matrix
    fn render_entity(&mut self, object: &GameObject, world_matrix: &Mat4) -> Result<(), BackendError>;

    /// Finish the frame
    fn end_frame(&mut self) -> Result<(), BackendError>;

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
