//! Application trait and lifecycle management

use crate::config::ConfigError;
use crate::engine::{Engine, EngineError, TickReport};
use crate::scene::SceneError;
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive the engine with
/// [`Engine::run_application`].
pub trait Application {
    /// Initialize the application
    ///
    /// Called once before the loop starts. Build the first scene here, either
    /// by populating `engine.scene_mut()` or by calling `engine.load_scene`.
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError>;

    /// Called after every outer tick
    ///
    /// An error stops the loop.
    #[allow(unused_variables)]
    fn on_tick(&mut self, engine: &mut Engine, report: &TickReport) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once the loop has stopped, before the current scene is unloaded.
    #[allow(unused_variables)]
    fn cleanup(&mut self, engine: &mut Engine) {}
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Scene edit failed
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::foundation::time::ScriptedClock;

    #[derive(Default)]
    struct CountingApp {
        initialized: bool,
        ticks: u32,
        cleaned_up: bool,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            engine.scene_mut().spawn("root");
            self.initialized = true;
            Ok(())
        }

        fn on_tick(&mut self, engine: &mut Engine, _report: &TickReport) -> Result<(), AppError> {
            self.ticks += 1;
            if self.ticks == 4 {
                engine.world_mut().request_quit();
            }
            Ok(())
        }

        fn cleanup(&mut self, engine: &mut Engine) {
            assert_eq!(engine.scene().len(), 1);
            self.cleaned_up = true;
        }
    }

    struct FailingApp;

    impl Application for FailingApp {
        fn initialize(&mut self, _engine: &mut Engine) -> Result<(), AppError> {
            Err(AppError::Custom("no assets".to_string()))
        }
    }

    fn engine() -> Engine {
        let config = EngineConfig::default().with_idle_sleep_ms(0).with_workers(1, 4);
        Engine::headless(config)
            .expect("engine")
            .with_clock(ScriptedClock::new([]).with_fallback(0.02))
    }

    #[test]
    fn test_application_lifecycle() {
        let mut engine = engine();
        let mut app = CountingApp::default();

        engine.run_application(&mut app).expect("run");

        assert!(app.initialized && app.cleaned_up);
        // Quit requested on tick 4 is seen during tick 5's step
        assert_eq!(app.ticks, 5);
        assert!(engine.scene().is_empty());
    }

    #[test]
    fn test_failed_initialize_never_starts() {
        let mut engine = engine();
        let result = engine.run_application(&mut FailingApp);

        assert!(matches!(result, Err(EngineError::ApplicationError(_))));
        assert_eq!(engine.stats().ticks, 0);
    }
}
