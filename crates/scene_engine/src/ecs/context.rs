//! Context passed to lifecycle hooks
//!
//! Gives a running component access to its own entity, the current scene and
//! the engine world. Structural edits made here (spawning, destroying,
//! removing components) are safe mid-frame: the scheduler iterates a snapshot
//! and skips anything that vanished.

use super::component::Component;
use super::world::{FrameTime, World};
use super::{ComponentId, EntityId, GameObject};
use crate::scene::{Scene, SceneError, Transform};

/// Per-call view of the world for one component
pub struct ComponentContext<'w> {
    world: &'w mut World,
    entity: EntityId,
    component: ComponentId,
}

impl<'w> ComponentContext<'w> {
    pub(crate) fn new(world: &'w mut World, entity: EntityId, component: ComponentId) -> Self {
        Self {
            world,
            entity,
            component,
        }
    }

    /// Entity that owns the running component
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Id of the running component
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Read-only world access
    pub fn world(&self) -> &World {
        self.world
    }

    /// Current scene
    pub fn scene(&self) -> &Scene {
        self.world.scene()
    }

    /// Current scene, mutably
    pub fn scene_mut(&mut self) -> &mut Scene {
        self.world.scene_mut()
    }

    /// The owning GameObject, unless it has been destroyed
    pub fn game_object(&self) -> Option<&GameObject> {
        self.world.scene().entity(self.entity)
    }

    /// Local transform of the owning entity
    pub fn transform(&self) -> Option<&Transform> {
        self.game_object().map(GameObject::transform)
    }

    /// Mutable local transform of the owning entity
    pub fn transform_mut(&mut self) -> Option<&mut Transform> {
        let entity = self.entity;
        self.world
            .scene_mut()
            .entity_mut(entity)
            .map(GameObject::transform_mut)
    }

    /// Fixed simulation step in seconds
    pub fn delta_time(&self) -> f32 {
        self.world.delta_time()
    }

    /// Timing of the current step
    pub fn frame(&self) -> &FrameTime {
        self.world.frame()
    }

    /// Create a new GameObject in the current scene
    ///
    /// Components added to it start on the next frame.
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        self.world.scene_mut().spawn(name)
    }

    /// Destroy any GameObject in the current scene
    pub fn destroy(&mut self, entity: EntityId) -> Result<(), SceneError> {
        self.world.scene_mut().destroy(entity)
    }

    /// Destroy the owning GameObject
    pub fn destroy_self(&mut self) -> Result<(), SceneError> {
        let entity = self.entity;
        self.destroy(entity)
    }

    /// Attach a component to any GameObject in the current scene
    pub fn add_component<C: Component>(&mut self, entity: EntityId, component: C) -> Result<ComponentId, SceneError> {
        self.world.scene_mut().add_component(entity, component)
    }

    /// Detach any component
    pub fn remove_component(&mut self, component: ComponentId) -> Result<(), SceneError> {
        self.world.scene_mut().remove_component(component)
    }

    /// Detach the running component; its `on_destroy` follows this hook
    pub fn remove_self(&mut self) -> Result<(), SceneError> {
        let component = self.component;
        self.remove_component(component)
    }

    /// Enable or disable a component
    pub fn set_enabled(&mut self, component: ComponentId, enabled: bool) -> Result<(), SceneError> {
        self.world.scene_mut().set_enabled(component, enabled)
    }

    /// Re-parent an entity within the current scene
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        self.world.scene_mut().set_parent(child, parent)
    }

    /// First GameObject with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.world.scene().find_by_name(name)
    }

    /// Request a scene swap at the next frame boundary
    pub fn load_scene(&mut self, scene: Scene) {
        self.world.load_scene(scene);
    }

    /// Ask the main loop to stop
    pub fn request_quit(&mut self) {
        self.world.request_quit();
    }
}
