//! Stage ordering, start semantics and deferral of new objects

use super::{Journal, Probe};
use crate::ecs::{Component, ComponentContext, ComponentResult, FrameScheduler, LifecycleHooks, World};

fn step(scheduler: &mut FrameScheduler, world: &mut World) {
    world.begin_step(1.0 / 60.0);
    scheduler.construct_frame_queue(world.scene());
    scheduler.run_update_cycle(world);
}

#[test]
fn test_every_start_precedes_every_update() {
    let journal = Journal::default();
    let mut world = World::default();
    for label in ["a", "b", "c"] {
        let entity = world.scene_mut().spawn(label);
        world
            .scene_mut()
            .add_component(entity, Probe::new(label, &journal).with_hooks(LifecycleHooks::SIMULATION))
            .expect("add");
    }

    let mut scheduler = FrameScheduler::new();
    step(&mut scheduler, &mut world);

    let last_start = ["a", "b", "c"]
        .iter()
        .filter_map(|l| journal.position(&format!("start {l}")))
        .max()
        .expect("starts");
    let first_update = ["a", "b", "c"]
        .iter()
        .filter_map(|l| journal.position(&format!("update {l}")))
        .min()
        .expect("updates");
    let last_update = ["a", "b", "c"]
        .iter()
        .filter_map(|l| journal.position(&format!("update {l}")))
        .max()
        .expect("updates");
    let first_post = ["a", "b", "c"]
        .iter()
        .filter_map(|l| journal.position(&format!("post_update {l}")))
        .min()
        .expect("post updates");

    assert!(last_start < first_update);
    assert!(last_update < first_post);
    assert_eq!(journal.entries().len(), 9);
}

#[test]
fn test_start_fires_exactly_once() {
    let journal = Journal::default();
    let mut world = World::default();
    let entity = world.scene_mut().spawn("once");
    let component = world
        .scene_mut()
        .add_component(entity, Probe::new("once", &journal))
        .expect("add");

    let mut scheduler = FrameScheduler::new();
    for _ in 0..3 {
        step(&mut scheduler, &mut world);
    }

    assert_eq!(journal.count("start once"), 1);
    assert_eq!(journal.count("update once"), 3);
    assert!(world.scene().component_info(component).expect("info").started);
}

#[test]
fn test_only_declared_hooks_are_called() {
    let journal = Journal::default();
    let mut world = World::default();
    let entity = world.scene_mut().spawn("pair");
    let a = world
        .scene_mut()
        .add_component(entity, Probe::new("A", &journal).with_hooks(LifecycleHooks::empty()))
        .expect("a");
    world
        .scene_mut()
        .add_component(
            entity,
            Probe::new("B", &journal).with_hooks(LifecycleHooks::START | LifecycleHooks::UPDATE),
        )
        .expect("b");

    let mut scheduler = FrameScheduler::new();
    let stats = scheduler.run_update_cycle(&mut world);

    assert_eq!(journal.entries(), vec!["start B".to_string(), "update B".to_string()]);
    assert_eq!(stats.dispatched, 2);
    // Without an on_start hook A is still considered started
    assert!(world.scene().component_info(a).expect("info").started);
}

struct Spawner {
    journal: Journal,
    spawned: bool,
}

impl Component for Spawner {
    fn on_update(&mut self, ctx: &mut ComponentContext<'_>) -> ComponentResult {
        if !self.spawned {
            let late = ctx.spawn("late");
            ctx.add_component(late, Probe::new("late", &self.journal))?;
            let me = ctx.entity();
            ctx.add_component(me, Probe::new("sibling", &self.journal))?;
            self.spawned = true;
        }
        Ok(())
    }
}

#[test]
fn test_new_objects_wait_for_next_step() {
    let journal = Journal::default();
    let mut world = World::default();
    let entity = world.scene_mut().spawn("spawner");
    world
        .scene_mut()
        .add_component(entity, Spawner { journal: journal.clone(), spawned: false })
        .expect("add");

    let mut scheduler = FrameScheduler::new();
    step(&mut scheduler, &mut world);

    assert!(journal.entries().is_empty());
    assert!(world.scene().find_by_name("late").is_some());

    step(&mut scheduler, &mut world);

    for label in ["late", "sibling"] {
        assert_eq!(journal.count(&format!("start {label}")), 1);
        assert_eq!(journal.count(&format!("update {label}")), 1);
        assert_eq!(journal.count(&format!("post_update {label}")), 1);
    }
}

#[test]
fn test_disabled_component_starts_but_does_not_update() {
    let journal = Journal::default();
    let mut world = World::default();
    let entity = world.scene_mut().spawn("sleeper");
    let component = world
        .scene_mut()
        .add_component(entity, Probe::new("sleeper", &journal))
        .expect("add");
    world.scene_mut().set_enabled(component, false).expect("disable");

    let mut scheduler = FrameScheduler::new();
    step(&mut scheduler, &mut world);
    assert_eq!(journal.entries(), vec!["start sleeper".to_string()]);

    world.scene_mut().set_enabled(component, true).expect("enable");
    step(&mut scheduler, &mut world);
    assert_eq!(journal.count("update sleeper"), 1);
    assert_eq!(journal.count("start sleeper"), 1);
}

#[test]
fn test_inactive_entity_skips_updates() {
    let journal = Journal::default();
    let mut world = World::default();
    let entity = world.scene_mut().spawn("hidden");
    world
        .scene_mut()
        .add_component(entity, Probe::new("hidden", &journal))
        .expect("add");
    world.scene_mut().set_active(entity, false).expect("deactivate");

    let mut scheduler = FrameScheduler::new();
    step(&mut scheduler, &mut world);
    step(&mut scheduler, &mut world);

    assert_eq!(journal.entries(), vec!["start hidden".to_string()]);
}

#[test]
fn test_parents_dispatch_before_children() {
    let journal = Journal::default();
    let mut world = World::default();
    let child = world.scene_mut().spawn("child");
    let parent = world.scene_mut().spawn("parent");
    world.scene_mut().set_parent(child, Some(parent)).expect("parent");
    for (entity, label) in [(child, "child"), (parent, "parent")] {
        world
            .scene_mut()
            .add_component(entity, Probe::new(label, &journal).with_hooks(LifecycleHooks::UPDATE))
            .expect("add");
    }

    let mut scheduler = FrameScheduler::new();
    step(&mut scheduler, &mut world);

    assert_eq!(journal.entries(), vec!["update parent".to_string(), "update child".to_string()]);
}
