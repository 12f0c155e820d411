//! Headless backends
//!
//! No window, no GPU. Both backends only count what they are asked to do, so
//! tests can assert on the exact sequence of polls, frames and draw calls.

use super::{BackendError, ClearPolicy, RenderBackend, WindowBackend};
use crate::ecs::GameObject;
use crate::foundation::math::Mat4;
use std::any::Any;

/// Window stand-in that can close itself after a number of polls
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    width: u32,
    height: u32,
    polls: u64,
    presents: u64,
    close_after_polls: Option<u64>,
    close_requested: bool,
}

impl HeadlessWindow {
    /// Create a window that stays open until asked to close
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Builder pattern: Request close once `polls` polls have happened
    pub fn close_after_polls(mut self, polls: u64) -> Self {
        self.close_after_polls = Some(polls);
        self
    }

    /// Number of `poll_once` calls
    pub fn polls(&self) -> u64 {
        self.polls
    }

    /// Number of `present` calls
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl WindowBackend for HeadlessWindow {
    fn poll_once(&mut self) {
        self.polls += 1;
        if self.close_after_polls.is_some_and(|limit| self.polls >= limit) {
            self.close_requested = true;
        }
    }

    fn is_close_requested(&self) -> bool {
        self.close_requested
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.presents += 1;
        Ok(())
    }

    fn request_close(&mut self) {
        self.close_requested = true;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Render stand-in that records frames and draw calls
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    frames_ended: u64,
    entities_drawn: u64,
    in_frame: bool,
    last_clear_policy: Option<ClearPolicy>,
    last_frame: Vec<String>,
}

impl HeadlessRenderer {
    /// Create a renderer with zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed frames
    pub fn frames(&self) -> u64 {
        self.frames_ended
    }

    /// Total `render_entity` calls across all frames
    pub fn entities_drawn(&self) -> u64 {
        self.entities_drawn
    }

    /// Clear policy of the most recent frame
    pub fn last_clear_policy(&self) -> Option<&ClearPolicy> {
        self.last_clear_policy.as_ref()
    }

    /// Names of the entities drawn in the most recent frame, in draw order
    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }
}

impl RenderBackend for HeadlessRenderer {
    fn begin_frame(&mut self, clear_policy: &ClearPolicy) -> Result<(), BackendError> {
        if self.in_frame {
            return Err(BackendError::Render("begin_frame called twice without end_frame".to_string()));
        }
        self.in_frame = true;
        self.last_clear_policy = Some(*clear_policy);
        self.last_frame.clear();
        Ok(())
    }

    fn render_entity(&mut self, object: &GameObject, _world_matrix: &Mat4) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::Render("render_entity outside of a frame".to_string()));
        }
        self.entities_drawn += 1;
        self.last_frame.push(object.name().to_string());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), BackendError> {
        if !self.in_frame {
            return Err(BackendError::Render("end_frame without begin_frame".to_string()));
        }
        self.in_frame = false;
        self.frames_ended += 1;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_closes_after_polls() {
        let mut window = HeadlessWindow::new(640, 480).close_after_polls(2);
        window.poll_once();
        assert!(!window.is_close_requested());
        window.poll_once();
        assert!(window.is_close_requested());
        assert_eq!(window.size(), (640, 480));
    }

    #[test]
    fn test_renderer_rejects_unbalanced_frames() {
        let mut renderer = HeadlessRenderer::new();
        assert!(renderer.end_frame().is_err());
        renderer.begin_frame(&ClearPolicy::DepthOnly).expect("begin");
        assert!(renderer.begin_frame(&ClearPolicy::DepthOnly).is_err());
        renderer.end_frame().expect("end");

        assert_eq!(renderer.frames(), 1);
        assert_eq!(renderer.last_clear_policy(), Some(&ClearPolicy::DepthOnly));
    }
}
