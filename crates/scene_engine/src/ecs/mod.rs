//! Entity-Component implementation
//!
//! GameObjects own behaviour components; the frame scheduler drives their
//! lifecycle hooks in stages over a per-step snapshot of the scene.

pub mod component;
pub mod context;
pub mod entity;
pub mod scheduler;
pub mod world;

#[cfg(test)]
mod tests;

pub use component::{Component, ComponentError, ComponentResult, Hook, LifecycleHooks};
pub use context::ComponentContext;
pub use entity::{ComponentId, EntityId, GameObject};
pub use scheduler::{CycleStats, FrameQueue, FrameScheduler, QueuedEntity};
pub use world::{FrameTime, World};
