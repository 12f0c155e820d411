//! GameObject (entity) implementation

use crate::scene::Transform;

slotmap::new_key_type! {
    /// Opaque, generational identifier of a GameObject
    ///
    /// Ids are never reused while a stale copy could still be observed: a
    /// destroyed entity's id simply stops resolving.
    pub struct EntityId;

    /// Opaque, generational identifier of an attached component
    pub struct ComponentId;
}

/// A named container of components plus exactly one transform
///
/// Names are labels only and are not required to be unique.
#[derive(Debug)]
pub struct GameObject {
    id: EntityId,
    name: String,
    active: bool,
    transform: Transform,
    components: Vec<ComponentId>,
}

impl GameObject {
    pub(crate) fn new(id: EntityId, name: String, transform: Transform) -> Self {
        Self {
            id,
            name,
            active: true,
            transform,
            components: Vec::new(),
        }
    }

    /// Get the entity ID
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the entity
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Inactive entities keep their components but get no update or render hooks
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Local transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Mutable local transform (position, rotation and scale only)
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Components attached to this entity, in attachment order
    pub fn components(&self) -> &[ComponentId] {
        &self.components
    }

    pub(crate) fn attach(&mut self, component: ComponentId) {
        self.components.push(component);
    }

    pub(crate) fn detach(&mut self, component: ComponentId) {
        self.components.retain(|c| *c != component);
    }
}
