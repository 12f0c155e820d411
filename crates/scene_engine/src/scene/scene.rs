//! Scene: the live set of GameObjects and their components
//!
//! Entities and components live in generational slot maps. Anything that
//! iterates the scene while callbacks run (the frame scheduler) works from a
//! snapshot of keys, so a removal during iteration turns into a lookup miss
//! instead of an invalidated iterator.

use super::{SceneError, Transform};
use crate::backend::ClearPolicy;
use crate::ecs::component::{Component, LifecycleHooks};
use crate::ecs::{ComponentId, EntityId, GameObject};
use crate::foundation::math::Mat4;
use slotmap::SlotMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SCENE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique scene identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(u64);

impl SceneId {
    fn next() -> Self {
        Self(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Bookkeeping for one attached component
pub(crate) struct ComponentSlot {
    pub(crate) entity: EntityId,
    pub(crate) type_name: &'static str,
    pub(crate) hooks: LifecycleHooks,
    pub(crate) started: bool,
    pub(crate) enabled: bool,
    /// `None` while the component is executing one of its own hooks
    pub(crate) behaviour: Option<Box<dyn Component>>,
}

/// A component that has left the scene and still owes its `on_destroy`
pub(crate) struct RetiredComponent {
    pub(crate) entity: EntityId,
    pub(crate) component: ComponentId,
    pub(crate) type_name: &'static str,
    pub(crate) hooks: LifecycleHooks,
    pub(crate) behaviour: Box<dyn Component>,
}

/// Read-only view of a component's scheduling state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentInfo {
    /// Owning entity
    pub entity: EntityId,
    /// Component type name
    pub type_name: &'static str,
    /// Whether `on_start` has already fired
    pub started: bool,
    /// Whether update and render hooks fire
    pub enabled: bool,
}

/// An unordered set of GameObjects
pub struct Scene {
    id: SceneId,
    name: String,
    clear_policy: ClearPolicy,
    entities: SlotMap<EntityId, GameObject>,
    components: SlotMap<ComponentId, ComponentSlot>,
    retired: Vec<RetiredComponent>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SceneId::next(),
            name: name.into(),
            clear_policy: ClearPolicy::default(),
            entities: SlotMap::with_key(),
            components: SlotMap::with_key(),
            retired: Vec::new(),
        }
    }

    /// Scene identifier
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the render backend clears the frame for this scene
    pub fn clear_policy(&self) -> &ClearPolicy {
        &self.clear_policy
    }

    /// Change the clear policy
    pub fn set_clear_policy(&mut self, policy: ClearPolicy) {
        self.clear_policy = policy;
    }

    /// Builder pattern: Set the clear policy
    pub fn with_clear_policy(mut self, policy: ClearPolicy) -> Self {
        self.clear_policy = policy;
        self
    }

    // ---------------------------------------------------------------------
    // Entities
    // ---------------------------------------------------------------------

    /// Create a GameObject with an identity transform
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        self.spawn_with_transform(name, Transform::identity())
    }

    /// Create a GameObject with the given local transform
    pub fn spawn_with_transform(&mut self, name: impl Into<String>, transform: Transform) -> EntityId {
        let name = name.into();
        let id = self
            .entities
            .insert_with_key(|id| GameObject::new(id, name, transform));
        log::trace!("Spawned entity {:?} in scene '{}'", id, self.name);
        id
    }

    /// Destroy a GameObject and every component attached to it
    ///
    /// Children are detached and become roots. The removed components are
    /// queued for their `on_destroy` hook.
    pub fn destroy(&mut self, entity: EntityId) -> Result<(), SceneError> {
        let mut object = self
            .entities
            .remove(entity)
            .ok_or(SceneError::UnknownEntity(entity))?;

        if let Some(parent) = object.transform().parent() {
            if let Some(parent) = self.entities.get_mut(parent) {
                parent.transform_mut().remove_child_link(entity);
            }
        }
        for child in object.transform_mut().take_children() {
            if let Some(child) = self.entities.get_mut(child) {
                child.transform_mut().set_parent_link(None);
            }
        }
        for &component in object.components() {
            self.retire(component);
        }

        log::trace!("Destroyed entity '{}' ({:?})", object.name(), entity);
        Ok(())
    }

    /// Whether the entity exists in this scene
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    /// Look up a GameObject
    pub fn entity(&self, entity: EntityId) -> Option<&GameObject> {
        self.entities.get(entity)
    }

    /// Look up a GameObject mutably
    pub fn entity_mut(&mut self, entity: EntityId) -> Option<&mut GameObject> {
        self.entities.get_mut(entity)
    }

    /// Iterate over every GameObject
    pub fn entities(&self) -> impl Iterator<Item = &GameObject> {
        self.entities.values()
    }

    /// Snapshot of every entity id
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.entities.keys().collect()
    }

    /// Number of GameObjects
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no GameObjects
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// First GameObject with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.entities
            .iter()
            .find(|(_, object)| object.name() == name)
            .map(|(id, _)| id)
    }

    /// Every GameObject with the given name
    pub fn find_all_by_name(&self, name: &str) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, object)| object.name() == name)
            .map(|(id, _)| id)
            .collect()
    }

    /// Activate or deactivate a GameObject
    pub fn set_active(&mut self, entity: EntityId, active: bool) -> Result<(), SceneError> {
        self.entities
            .get_mut(entity)
            .ok_or(SceneError::UnknownEntity(entity))?
            .set_active(active);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Components
    // ---------------------------------------------------------------------

    /// Attach a component; ownership moves to the entity
    pub fn add_component<C: Component>(&mut self, entity: EntityId, component: C) -> Result<ComponentId, SceneError> {
        self.add_boxed_component(entity, Box::new(component))
    }

    /// Attach an already boxed component
    pub fn add_boxed_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn Component>,
    ) -> Result<ComponentId, SceneError> {
        if !self.entities.contains_key(entity) {
            return Err(SceneError::UnknownEntity(entity));
        }

        let slot = ComponentSlot {
            entity,
            type_name: component.type_name(),
            hooks: component.hooks(),
            started: false,
            enabled: true,
            behaviour: Some(component),
        };
        let id = self.components.insert(slot);
        if let Some(object) = self.entities.get_mut(entity) {
            object.attach(id);
        }
        Ok(id)
    }

    /// Detach a component and queue its `on_destroy` hook
    pub fn remove_component(&mut self, component: ComponentId) -> Result<(), SceneError> {
        let entity = self
            .components
            .get(component)
            .map(|slot| slot.entity)
            .ok_or(SceneError::UnknownComponent(component))?;

        if let Some(object) = self.entities.get_mut(entity) {
            object.detach(component);
        }
        self.retire(component);
        Ok(())
    }

    /// Whether the component is still attached
    pub fn contains_component(&self, component: ComponentId) -> bool {
        self.components.contains_key(component)
    }

    /// Scheduling state of a component
    pub fn component_info(&self, component: ComponentId) -> Option<ComponentInfo> {
        self.components.get(component).map(|slot| ComponentInfo {
            entity: slot.entity,
            type_name: slot.type_name,
            started: slot.started,
            enabled: slot.enabled,
        })
    }

    /// Enable or disable a component's update and render hooks
    pub fn set_enabled(&mut self, component: ComponentId, enabled: bool) -> Result<(), SceneError> {
        self.components
            .get_mut(component)
            .ok_or(SceneError::UnknownComponent(component))?
            .enabled = enabled;
        Ok(())
    }

    /// Borrow a component by id and concrete type
    ///
    /// Returns `None` while that component is executing one of its own hooks.
    pub fn get<C: Component>(&self, component: ComponentId) -> Option<&C> {
        self.components
            .get(component)?
            .behaviour
            .as_deref()?
            .as_any()
            .downcast_ref::<C>()
    }

    /// Mutably borrow a component by id and concrete type
    pub fn get_mut<C: Component>(&mut self, component: ComponentId) -> Option<&mut C> {
        self.components
            .get_mut(component)?
            .behaviour
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<C>()
    }

    /// First component of type `C` on an entity
    pub fn component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.entities
            .get(entity)?
            .components()
            .iter()
            .find_map(|&id| self.get::<C>(id))
    }

    /// First component of type `C` on an entity, mutably
    pub fn component_mut<C: Component>(&mut self, entity: EntityId) -> Option<&mut C> {
        let id = self
            .entities
            .get(entity)?
            .components()
            .iter()
            .copied()
            .find(|&id| self.get::<C>(id).is_some())?;
        self.get_mut::<C>(id)
    }

    /// Total number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    // ---------------------------------------------------------------------
    // Hierarchy
    // ---------------------------------------------------------------------

    /// Re-parent `child` under `parent` (or make it a root with `None`)
    ///
    /// Rejects any link that would make the parent chain cyclic, including
    /// parenting an entity to itself.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        if !self.entities.contains_key(child) {
            return Err(SceneError::UnknownEntity(child));
        }
        if let Some(parent) = parent {
            if !self.entities.contains_key(parent) {
                return Err(SceneError::UnknownEntity(parent));
            }
            if self.is_ancestor_or_self(child, parent) {
                return Err(SceneError::HierarchyCycle { child, parent });
            }
        }

        let previous = self.entities[child].transform().parent();
        if previous == parent {
            return Ok(());
        }
        if let Some(previous) = previous {
            if let Some(previous) = self.entities.get_mut(previous) {
                previous.transform_mut().remove_child_link(child);
            }
        }
        if let Some(parent) = parent {
            self.entities[parent].transform_mut().add_child_link(child);
        }
        self.entities[child].transform_mut().set_parent_link(parent);
        Ok(())
    }

    /// Whether `ancestor` is `entity` itself or appears on its parent chain
    fn is_ancestor_or_self(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut current = Some(entity);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.entities.get(id).and_then(|o| o.transform().parent());
        }
        false
    }

    /// Parent of an entity
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.entities.get(entity)?.transform().parent()
    }

    /// Direct children of an entity
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.entities
            .get(entity)
            .map_or(&[][..], |object| object.transform().children())
    }

    /// Every descendant of an entity, depth first, parents before children
    pub fn children_recursive(&self, entity: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        let mut stack: Vec<EntityId> = self.children(entity).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// Entities without a parent
    pub fn roots(&self) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, object)| object.transform().is_root())
            .map(|(id, _)| id)
            .collect()
    }

    /// Every entity, each root followed by its descendants
    pub fn hierarchy_order(&self) -> Vec<EntityId> {
        let mut order = Vec::with_capacity(self.entities.len());
        for root in self.roots() {
            order.push(root);
            order.extend(self.children_recursive(root));
        }
        order
    }

    /// Local-to-world matrix, composed through every parent
    pub fn world_matrix(&self, entity: EntityId) -> Option<Mat4> {
        let object = self.entities.get(entity)?;
        let mut matrix = object.transform().local_matrix();
        let mut current = object.transform().parent();
        while let Some(id) = current {
            let parent = self.entities.get(id)?;
            matrix = parent.transform().local_matrix() * matrix;
            current = parent.transform().parent();
        }
        Some(matrix)
    }

    // ---------------------------------------------------------------------
    // Scheduler plumbing
    // ---------------------------------------------------------------------

    pub(crate) fn slot_mut(&mut self, component: ComponentId) -> Option<&mut ComponentSlot> {
        self.components.get_mut(component)
    }

    /// Move a component out of the live set and into the retired queue
    fn retire(&mut self, component: ComponentId) {
        let Some(slot) = self.components.remove(component) else {
            return;
        };
        // A component detached while running its own hook is retired by the
        // scheduler once the hook returns.
        if let Some(behaviour) = slot.behaviour {
            self.retired.push(RetiredComponent {
                entity: slot.entity,
                component,
                type_name: slot.type_name,
                hooks: slot.hooks,
                behaviour,
            });
        }
    }

    /// Queue a component whose slot vanished while it was executing
    pub(crate) fn retire_detached(
        &mut self,
        entity: EntityId,
        component: ComponentId,
        type_name: &'static str,
        hooks: LifecycleHooks,
        behaviour: Box<dyn Component>,
    ) {
        self.retired.push(RetiredComponent {
            entity,
            component,
            type_name,
            hooks,
            behaviour,
        });
    }

    /// Remove every entity and queue every component for destruction
    pub(crate) fn retire_all(&mut self) {
        let components: Vec<ComponentId> = self.components.keys().collect();
        for component in components {
            self.retire(component);
        }
        self.entities.clear();
    }

    pub(crate) fn take_retired(&mut self) -> Vec<RetiredComponent> {
        std::mem::take(&mut self.retired)
    }

    pub(crate) fn has_retired(&self) -> bool {
        !self.retired.is_empty()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("entities", &self.entities.len())
            .field("components", &self.components.len())
            .finish()
    }
}
