//! GLFW window backend
//!
//! Opens a plain desktop window without a client API. Presentation belongs to
//! whatever render backend draws into the window, so `present` only tracks
//! frame count here. Escape or the close button request close.

use super::{BackendError, WindowBackend};
use crate::config::WindowConfig;
use std::any::Any;

/// Desktop window driven by GLFW
pub struct GlfwWindow {
    glfw: glfw::Glfw,
    window: glfw::PWindow,
    events: glfw::GlfwReceiver<(f64, glfw::WindowEvent)>,
    presents: u64,
}

impl GlfwWindow {
    /// Initialize GLFW and open a window
    pub fn new(config: &WindowConfig) -> Result<Self, BackendError> {
        let mut glfw = glfw::init(glfw::fail_on_errors)
            .map_err(|e| BackendError::Initialization(format!("GLFW init failed: {e:?}")))?;

        glfw.window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
        glfw.window_hint(glfw::WindowHint::Resizable(true));

        let (mut window, events) = glfw
            .create_window(config.width, config.height, &config.title, glfw::WindowMode::Windowed)
            .ok_or_else(|| BackendError::Initialization("Window creation failed".to_string()))?;

        window.set_key_polling(true);
        window.set_close_polling(true);
        window.set_size_polling(true);

        log::info!("Opened window '{}' ({}x{})", config.title, config.width, config.height);
        Ok(Self {
            glfw,
            window,
            events,
            presents: 0,
        })
    }

    /// Number of presented frames
    pub fn presents(&self) -> u64 {
        self.presents
    }
}

impl WindowBackend for GlfwWindow {
    fn poll_once(&mut self) {
        self.glfw.poll_events();
        for (_, event) in glfw::flush_messages(&self.events) {
            match event {
                glfw::WindowEvent::Key(glfw::Key::Escape, _, glfw::Action::Press, _)
                | glfw::WindowEvent::Close => self.window.set_should_close(true),
                glfw::WindowEvent::Size(width, height) => {
                    log::debug!("Window resized to {}x{}", width, height);
                }
                _ => {}
            }
        }
    }

    fn is_close_requested(&self) -> bool {
        self.window.should_close()
    }

    fn present(&mut self) -> Result<(), BackendError> {
        self.presents += 1;
        Ok(())
    }

    fn request_close(&mut self) {
        self.window.set_should_close(true);
    }

    fn size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_size();
        (width.max(0) as u32, height.max(0) as u32)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
