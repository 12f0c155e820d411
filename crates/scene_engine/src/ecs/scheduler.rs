//! Frame scheduling and staged lifecycle dispatch
//!
//! Once per simulation step the scheduler snapshots the current scene into a
//! private frame queue, in hierarchy order. Every stage then runs over the
//! whole queue before the next stage begins:
//!
//! ```text
//! update cycle:  on_start ─> on_update ─> on_post_update
//! render cycle:  begin_frame ─> on_pre_render ─> on_render + draw ─> on_post_render ─> end_frame
//! ```
//!
//! The queue holds generational keys only. Anything spawned during a stage
//! waits for the next queue; anything destroyed during a stage simply stops
//! resolving and is skipped.

use super::component::{invoke_hook, Hook};
use super::context::ComponentContext;
use super::world::World;
use super::{ComponentId, EntityId, GameObject};
use crate::backend::{BackendError, RenderBackend};
use crate::scene::{Scene, SceneId};

/// One entity in the frame queue, with the components it had at snapshot time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEntity {
    /// Queued entity
    pub entity: EntityId,
    /// Components attached when the queue was built
    pub components: Vec<ComponentId>,
}

/// Snapshot of a scene taken at the start of a simulation step
#[derive(Debug, Default, Clone)]
pub struct FrameQueue {
    scene: Option<SceneId>,
    entries: Vec<QueuedEntity>,
}

impl FrameQueue {
    /// Scene the snapshot was taken from
    pub fn scene(&self) -> Option<SceneId> {
        self.scene
    }

    /// Entities in dispatch order
    pub fn entries(&self) -> &[QueuedEntity] {
        &self.entries
    }

    /// Entity ids in dispatch order
    pub fn entity_order(&self) -> Vec<EntityId> {
        self.entries.iter().map(|entry| entry.entity).collect()
    }

    /// Number of queued entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queued components
    pub fn component_count(&self) -> usize {
        self.entries.iter().map(|entry| entry.components.len()).sum()
    }
}

/// Counters for one update or render cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Hooks actually invoked
    pub dispatched: usize,
    /// Hooks that returned an error or panicked
    pub faults: usize,
    /// Queue entries that no longer resolved
    pub skipped: usize,
    /// Components that received `on_destroy`
    pub destroyed: usize,
    /// Entities handed to the render backend
    pub drawn: usize,
}

impl CycleStats {
    /// Add another cycle's counters to this one
    pub fn merge(&mut self, other: CycleStats) {
        self.dispatched += other.dispatched;
        self.faults += other.faults;
        self.skipped += other.skipped;
        self.destroyed += other.destroyed;
        self.drawn += other.drawn;
    }
}

const UPDATE_STAGES: [Hook; 3] = [Hook::Start, Hook::Update, Hook::PostUpdate];

/// Builds the per-step frame queue and dispatches lifecycle stages over it
#[derive(Debug, Default)]
pub struct FrameScheduler {
    queue: FrameQueue,
    queues_built: u64,
}

impl FrameScheduler {
    /// Create a scheduler with an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot `scene` into the frame queue
    ///
    /// Each root is followed by its descendants, depth first. The scene itself
    /// is left untouched.
    pub fn construct_frame_queue(&mut self, scene: &Scene) {
        self.queue.entries.clear();
        for entity in scene.hierarchy_order() {
            if let Some(object) = scene.entity(entity) {
                self.queue.entries.push(QueuedEntity {
                    entity,
                    components: object.components().to_vec(),
                });
            }
        }
        self.queue.scene = Some(scene.id());
        self.queues_built += 1;
        log::trace!(
            "Frame queue built for '{}': {} entities, {} components",
            scene.name(),
            self.queue.len(),
            self.queue.component_count()
        );
    }

    /// Current frame queue
    pub fn frame_queue(&self) -> &FrameQueue {
        &self.queue
    }

    /// Number of queues built so far
    pub fn queues_built(&self) -> u64 {
        self.queues_built
    }

    /// Run `on_start`, `on_update` and `on_post_update` over the frame queue
    pub fn run_update_cycle(&mut self, world: &mut World) -> CycleStats {
        self.refresh_if_stale(world);

        let mut stats = CycleStats::default();
        for hook in UPDATE_STAGES {
            self.run_stage(world, hook, &mut stats);
        }
        stats
    }

    /// Run the render stages over the frame queue, bracketed by the backend
    ///
    /// `on_render` of an entity's components runs right before that entity is
    /// handed to the backend. A failing draw call is logged and counted as a
    /// fault; failures to begin or end the frame are returned.
    pub fn run_render_cycle(
        &mut self,
        world: &mut World,
        renderer: &mut dyn RenderBackend,
    ) -> Result<CycleStats, BackendError> {
        self.refresh_if_stale(world);

        let mut stats = CycleStats::default();
        renderer.begin_frame(world.scene().clear_policy())?;

        self.run_stage(world, Hook::PreRender, &mut stats);

        for entry in &self.queue.entries {
            for &component in &entry.components {
                dispatch(world, entry.entity, component, Hook::Render, &mut stats);
            }

            let scene = world.scene();
            let Some(object) = scene.entity(entry.entity).filter(|o| o.is_active()) else {
                continue;
            };
            let Some(matrix) = scene.world_matrix(entry.entity) else {
                continue;
            };
            match renderer.render_entity(object, &matrix) {
                Ok(()) => stats.drawn += 1,
                Err(error) => {
                    stats.faults += 1;
                    log::error!("Failed to render '{}' ({:?}): {}", object.name(), entry.entity, error);
                }
            }
        }

        self.run_stage(world, Hook::PostRender, &mut stats);

        renderer.end_frame()?;
        Ok(stats)
    }

    /// The queue must describe the current scene; a swap or a missing build
    /// forces a fresh snapshot.
    fn refresh_if_stale(&mut self, world: &World) {
        if self.queue.scene != Some(world.scene().id()) {
            log::debug!("Frame queue is stale, rebuilding for '{}'", world.scene().name());
            self.construct_frame_queue(world.scene());
        }
    }

    fn run_stage(&self, world: &mut World, hook: Hook, stats: &mut CycleStats) {
        for entry in &self.queue.entries {
            for &component in &entry.components {
                dispatch(world, entry.entity, component, hook, stats);
            }
        }
    }
}

/// Invoke one hook on one queued component, if it is still eligible
fn dispatch(world: &mut World, entity: EntityId, component: ComponentId, hook: Hook, stats: &mut CycleStats) {
    let scene = world.scene_mut();
    let Some(active) = scene.entity(entity).map(GameObject::is_active) else {
        stats.skipped += 1;
        return;
    };
    let Some(slot) = scene.slot_mut(component) else {
        stats.skipped += 1;
        return;
    };

    if hook == Hook::Start {
        if slot.started {
            return;
        }
        // Marked before the call: a failed start is not retried
        slot.started = true;
    } else if !(slot.started && slot.enabled && active) {
        return;
    }
    if !slot.hooks.contains(hook.flag()) {
        return;
    }
    // Already running further up the stack
    let Some(mut behaviour) = slot.behaviour.take() else {
        return;
    };
    let (type_name, hooks) = (slot.type_name, slot.hooks);

    log::trace!("{} -> {}::{}", hook.name(), type_name, entity_label(world, entity));
    let result = {
        let mut ctx = ComponentContext::new(world, entity, component);
        invoke_hook(behaviour.as_mut(), hook, &mut ctx)
    };
    stats.dispatched += 1;

    if let Err(fault) = result {
        stats.faults += 1;
        log::error!(
            "Component {} on '{}' ({:?}) failed in {}: {}",
            type_name,
            entity_label(world, entity),
            entity,
            hook.name(),
            fault
        );
    }

    let scene = world.scene_mut();
    match scene.slot_mut(component) {
        Some(slot) => slot.behaviour = Some(behaviour),
        None => scene.retire_detached(entity, component, type_name, hooks, behaviour),
    }
    stats.destroyed += world.flush_retired();
}

fn entity_label(world: &World, entity: EntityId) -> String {
    world
        .scene()
        .entity(entity)
        .map_or_else(|| "<destroyed>".to_string(), |object| object.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_follows_hierarchy() {
        let mut scene = Scene::new("queue");
        let child = scene.spawn("child");
        let root = scene.spawn("root");
        scene.set_parent(child, Some(root)).expect("parent");

        let mut scheduler = FrameScheduler::new();
        scheduler.construct_frame_queue(&scene);

        assert_eq!(scheduler.frame_queue().entity_order(), vec![root, child]);
        assert_eq!(scheduler.frame_queue().scene(), Some(scene.id()));
        assert_eq!(scheduler.queues_built(), 1);
    }

    #[test]
    fn test_queue_is_a_snapshot() {
        let mut scene = Scene::new("queue");
        scene.spawn("before");

        let mut scheduler = FrameScheduler::new();
        scheduler.construct_frame_queue(&scene);
        scene.spawn("after");

        assert_eq!(scheduler.frame_queue().len(), 1);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_stats_merge() {
        let mut total = CycleStats { dispatched: 1, ..Default::default() };
        total.merge(CycleStats { dispatched: 2, faults: 1, skipped: 3, destroyed: 4, drawn: 5 });
        assert_eq!(total, CycleStats { dispatched: 3, faults: 1, skipped: 3, destroyed: 4, drawn: 5 });
    }
}
