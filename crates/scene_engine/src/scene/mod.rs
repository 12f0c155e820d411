//! Scene management
//!
//! A [`Scene`] owns the live set of GameObjects. The [`SceneManager`] keeps the
//! current scene and applies load requests only at frame boundaries.
//!
//! ## Architecture
//!
//! ```text
//! SceneManager ── current ──> Scene ── SlotMap<EntityId, GameObject>
//!              └─ pending ──> Scene    SlotMap<ComponentId, slot>
//! ```

mod scene;
mod scene_manager;
mod transform;

pub use scene::{ComponentInfo, Scene, SceneId};
pub(crate) use scene::RetiredComponent;
pub use scene_manager::SceneManager;
pub use transform::Transform;

use crate::ecs::{ComponentId, EntityId};
use thiserror::Error;

/// Scene-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// The entity is not (or no longer) part of the scene
    #[error("Entity {0:?} does not exist in the scene")]
    UnknownEntity(EntityId),

    /// The component is not (or no longer) attached
    #[error("Component {0:?} is not attached to any entity")]
    UnknownComponent(ComponentId),

    /// The requested parent link would make the hierarchy cyclic
    #[error("Parenting {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle {
        /// Entity being re-parented
        child: EntityId,
        /// Requested parent
        parent: EntityId,
    },
}
