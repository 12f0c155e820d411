//! Component trait and lifecycle hooks
//!
//! A component is a behaviour unit attached to exactly one [`GameObject`]. Every
//! lifecycle hook has a no-op default, so a component only overrides what it
//! needs. [`Component::hooks`] narrows the set of hooks the scheduler will call
//! at all; components that leave it at the default receive every hook.
//!
//! [`GameObject`]: crate::ecs::GameObject

use crate::ecs::context::ComponentContext;
use crate::scene::SceneError;
use bitflags::bitflags;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

bitflags! {
    /// Set of lifecycle hooks a component wants to receive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LifecycleHooks: u8 {
        /// First frame the component is scheduled
        const START = 1 << 0;
        /// Every simulation step
        const UPDATE = 1 << 1;
        /// Every simulation step, after all updates
        const POST_UPDATE = 1 << 2;
        /// Every render, before any entity is drawn
        const PRE_RENDER = 1 << 3;
        /// Every render, just before the owning entity is drawn
        const RENDER = 1 << 4;
        /// Every render, after all entities are drawn
        const POST_RENDER = 1 << 5;
        /// When the component is removed, its entity destroyed or its scene unloaded
        const DESTROY = 1 << 6;
        /// Simulation hooks only
        const SIMULATION = Self::START.bits() | Self::UPDATE.bits() | Self::POST_UPDATE.bits();
        /// Render hooks only
        const RENDERING = Self::PRE_RENDER.bits() | Self::RENDER.bits() | Self::POST_RENDER.bits();
    }
}

/// Result type returned by lifecycle hooks
pub type ComponentResult = Result<(), ComponentError>;

/// Errors a lifecycle hook can report
///
/// A failing hook never aborts a frame: the error is logged with the component
/// and entity identity and the scheduler moves on to the next component.
#[derive(Error, Debug)]
pub enum ComponentError {
    /// Scene operation requested by the hook failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Free-form failure
    #[error("{0}")]
    Failed(String),
}

impl ComponentError {
    /// Convenience constructor for free-form failures
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Downcasting support, implemented for every `'static` type
pub trait AsAny {
    /// Borrow as `&dyn Any`
    fn as_any(&self) -> &dyn Any;

    /// Borrow as `&mut dyn Any`
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour unit with optional lifecycle hooks
#[allow(unused_variables)]
pub trait Component: AsAny + 'static {
    /// Name used in logs
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Hooks the scheduler should call for this component
    fn hooks(&self) -> LifecycleHooks {
        LifecycleHooks::all()
    }

    /// Called once, before the component's first update
    fn on_start(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called once per simulation step
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called once per simulation step, after every component has updated
    fn on_post_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called once per render, before any entity is drawn
    fn on_pre_render(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called once per render, right before the owning entity is drawn
    fn on_render(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called once per render, after every entity is drawn
    fn on_post_render(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }

    /// Called when the component leaves the scene
    fn on_destroy(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        Ok(())
    }
}

/// Identifies a single lifecycle hook
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// [`Component::on_start`]
    Start,
    /// [`Component::on_update`]
    Update,
    /// [`Component::on_post_update`]
    PostUpdate,
    /// [`Component::on_pre_render`]
    PreRender,
    /// [`Component::on_render`]
    Render,
    /// [`Component::on_post_render`]
    PostRender,
    /// [`Component::on_destroy`]
    Destroy,
}

impl Hook {
    /// Capability flag matching this hook
    pub fn flag(self) -> LifecycleHooks {
        match self {
            Self::Start => LifecycleHooks::START,
            Self::Update => LifecycleHooks::UPDATE,
            Self::PostUpdate => LifecycleHooks::POST_UPDATE,
            Self::PreRender => LifecycleHooks::PRE_RENDER,
            Self::Render => LifecycleHooks::RENDER,
            Self::PostRender => LifecycleHooks::POST_RENDER,
            Self::Destroy => LifecycleHooks::DESTROY,
        }
    }

    /// Method name, for logs
    pub fn name(self) -> &'static str {
        match self {
            Self::Start => "on_start",
            Self::Update => "on_update",
            Self::PostUpdate => "on_post_update",
            Self::PreRender => "on_pre_render",
            Self::Render => "on_render",
            Self::PostRender => "on_post_render",
            Self::Destroy => "on_destroy",
        }
    }
}

/// Call one hook, turning both returned errors and panics into a message
pub(crate) fn invoke_hook(
    behaviour: &mut dyn Component,
    hook: Hook,
    ctx: &mut ComponentContext<'_>,
) -> Result<(), String> {
    let outcome = catch_unwind(AssertUnwindSafe(|| match hook {
        Hook::Start => behaviour.on_start(ctx),
        Hook::Update => behaviour.on_update(ctx),
        Hook::PostUpdate => behaviour.on_post_update(ctx),
        Hook::PreRender => behaviour.on_pre_render(ctx),
        Hook::Render => behaviour.on_render(ctx),
        Hook::PostRender => behaviour.on_post_render(ctx),
        Hook::Destroy => behaviour.on_destroy(ctx),
    }));

    match outcome {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(error.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
