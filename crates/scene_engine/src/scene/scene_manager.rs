//! # Scene Manager
//!
//! Holds exactly one current scene and at most one pending scene. A load
//! request never swaps scenes on the spot: it is parked as pending and applied
//! by [`World::apply_pending_load`](crate::ecs::World::apply_pending_load) at the
//! next frame boundary, before the frame queue is built. No stage ever sees a
//! half-old, half-new scene.

use super::Scene;

/// Current/pending scene pair
#[derive(Debug)]
pub struct SceneManager {
    current: Scene,
    pending: Option<Scene>,
    loads_applied: u64,
}

impl SceneManager {
    /// Create a manager with `initial` as the current scene
    pub fn new(initial: Scene) -> Self {
        Self {
            current: initial,
            pending: None,
            loads_applied: 0,
        }
    }

    /// The active scene
    pub fn current(&self) -> &Scene {
        &self.current
    }

    /// The active scene, mutably
    pub fn current_mut(&mut self) -> &mut Scene {
        &mut self.current
    }

    /// Request a scene swap at the next frame boundary
    ///
    /// A second request before the boundary replaces the first one.
    pub fn load(&mut self, scene: Scene) {
        if let Some(replaced) = self.pending.replace(scene) {
            log::warn!(
                "Scene load '{}' superseded by '{}' before it was applied",
                replaced.name(),
                self.pending.as_ref().map_or("", Scene::name)
            );
        } else {
            log::debug!(
                "Scene load requested: '{}'",
                self.pending.as_ref().map_or("", Scene::name)
            );
        }
    }

    /// Scene waiting for the next frame boundary
    pub fn pending(&self) -> Option<&Scene> {
        self.pending.as_ref()
    }

    /// Whether a load request is waiting
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop a pending request without applying it
    pub fn cancel_pending(&mut self) -> Option<Scene> {
        self.pending.take()
    }

    /// Number of swaps applied so far
    pub fn loads_applied(&self) -> u64 {
        self.loads_applied
    }

    pub(crate) fn take_pending(&mut self) -> Option<Scene> {
        self.pending.take()
    }

    /// Install `next` as current and hand back the outgoing scene
    pub(crate) fn replace_current(&mut self, next: Scene) -> Scene {
        self.loads_applied += 1;
        std::mem::replace(&mut self.current, next)
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new(Scene::new("Main"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_is_deferred() {
        let mut manager = SceneManager::new(Scene::new("menu"));
        manager.load(Scene::new("level"));

        assert_eq!(manager.current().name(), "menu");
        assert_eq!(manager.pending().map(Scene::name), Some("level"));
    }

    #[test]
    fn test_latest_request_wins() {
        let mut manager = SceneManager::default();
        manager.load(Scene::new("first"));
        manager.load(Scene::new("second"));

        assert_eq!(manager.pending().map(Scene::name), Some("second"));
        assert_eq!(manager.cancel_pending().map(|s| s.name().to_string()), Some("second".to_string()));
        assert!(!manager.has_pending());
    }

    #[test]
    fn test_replace_current_counts_loads() {
        let mut manager = SceneManager::default();
        let previous = manager.replace_current(Scene::new("next"));

        assert_eq!(previous.name(), "Main");
        assert_eq!(manager.current().name(), "next");
        assert_eq!(manager.loads_applied(), 1);
    }
}
