//! Frame scheduler scenario tests
//!
//! Every scenario records lifecycle calls into a shared journal and asserts on
//! the exact order.

mod lifecycle;

use crate::ecs::{Component, ComponentContext, ComponentResult, LifecycleHooks};
use std::cell::RefCell;
use std::rc::Rc;

/// Shared, ordered record of hook calls
#[derive(Clone, Default)]
pub(super) struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub(super) fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    pub(super) fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    pub(super) fn count(&self, entry: &str) -> usize {
        self.0.borrow().iter().filter(|e| e.as_str() == entry).count()
    }

    pub(super) fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub(super) fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

/// Records `"<hook> <label>"` for every hook it declares
pub(super) struct Probe {
    pub(super) label: &'static str,
    pub(super) journal: Journal,
    pub(super) hooks: LifecycleHooks,
}

impl Probe {
    pub(super) fn new(label: &'static str, journal: &Journal) -> Self {
        Self {
            label,
            journal: journal.clone(),
            hooks: LifecycleHooks::all(),
        }
    }

    pub(super) fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    fn note(&self, hook: &str) -> ComponentResult {
        self.journal.record(format!("{hook} {}", self.label));
        Ok(())
    }
}

impl Component for Probe {
    fn hooks(&self) -> LifecycleHooks {
        self.hooks
    }

    fn on_start(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("start")
    }

    fn on_update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("update")
    }

    fn on_post_update(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("post_update")
    }

    fn on_pre_render(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("pre_render")
    }

    fn on_render(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("render")
    }

    fn on_post_render(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("post_render")
    }

    fn on_destroy(&mut self, _ctx: &mut ComponentContext<'_>) -> ComponentResult {
        self.note("destroy")
    }
}
