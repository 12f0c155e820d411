//! Configuration system
//!
//! Engine settings are plain serde structures that can be loaded from or saved
//! to TOML and RON files. The format is picked from the file extension.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        match extension(path) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match extension(path) {
            Some("toml") => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
            }
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

fn extension(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Window settings handed to the window backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Client area width in pixels
    pub width: u32,
    /// Client area height in pixels
    pub height: u32,
    /// Synchronize buffer swaps with the display
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Scene Engine Application".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
        }
    }
}

/// Main loop timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Simulation updates per second
    pub target_ups: u32,
    /// Largest backlog of real time the loop will try to catch up on, in seconds.
    /// `None` lets the loop catch up on any stall.
    pub max_unprocessed_time: Option<f64>,
    /// Sleep taken when a tick ran no simulation step, in milliseconds.
    /// Zero yields the thread instead of sleeping.
    pub idle_sleep_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            target_ups: 60,
            max_unprocessed_time: Some(0.25),
            idle_sleep_ms: 1,
        }
    }
}

/// Background worker pool sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Number of worker threads
    pub threads: usize,
    /// Maximum number of queued jobs
    pub queue_capacity: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: 2,
            queue_capacity: 64,
        }
    }
}

/// Asset lookup settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directories searched, in order, for relative asset paths
    pub search_paths: Vec<String>,
    /// Keep loaded resources in memory and hand out shared copies
    pub cache: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            search_paths: vec!["resources".to_string(), ".".to_string()],
            cache: true,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default log filter when `RUST_LOG` is not set
    pub log_level: String,
    /// Window settings
    pub window: WindowConfig,
    /// Main loop timing
    pub timing: TimingConfig,
    /// Worker pool sizing
    pub workers: WorkerConfig,
    /// Asset lookup
    pub assets: AssetConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            window: WindowConfig::default(),
            timing: TimingConfig::default(),
            workers: WorkerConfig::default(),
            assets: AssetConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Set the simulation rate
    pub fn with_target_ups(mut self, ups: u32) -> Self {
        self.timing.target_ups = ups;
        self
    }

    /// Set or disable the catch-up cap
    pub fn with_max_unprocessed_time(mut self, max: Option<f64>) -> Self {
        self.timing.max_unprocessed_time = max;
        self
    }

    /// Set the idle sleep in milliseconds
    pub fn with_idle_sleep_ms(mut self, ms: u64) -> Self {
        self.timing.idle_sleep_ms = ms;
        self
    }

    /// Set the worker pool size
    pub fn with_workers(mut self, threads: usize, queue_capacity: usize) -> Self {
        self.workers = WorkerConfig {
            threads,
            queue_capacity,
        };
        self
    }

    /// Check that every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timing.target_ups == 0 {
            return Err(ConfigError::Invalid("target_ups must be at least 1".to_string()));
        }
        if let Some(max) = self.timing.max_unprocessed_time {
            let frame_time = 1.0 / f64::from(self.timing.target_ups);
            if !max.is_finite() || max < frame_time {
                return Err(ConfigError::Invalid(format!(
                    "max_unprocessed_time ({max}) must be at least one frame ({frame_time:.5}s)"
                )));
            }
        }
        if self.workers.threads == 0 {
            return Err(ConfigError::Invalid("worker threads must be at least 1".to_string()));
        }
        if self.workers.queue_capacity == 0 {
            return Err(ConfigError::Invalid("worker queue capacity must be at least 1".to_string()));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size {}x{} is empty",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("scene_engine_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EngineConfig::default().with_target_ups(0).validate().is_err());
        assert!(EngineConfig::default().with_workers(0, 4).validate().is_err());
        assert!(EngineConfig::default()
            .with_max_unprocessed_time(Some(0.001))
            .validate()
            .is_err());
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let path = temp_path("engine.toml");
        let config = EngineConfig::default()
            .with_target_ups(120)
            .with_max_unprocessed_time(Some(0.5));

        config.save_to_file(&path).expect("save");
        let loaded = EngineConfig::load_from_file(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let path = temp_path("partial.ron");
        std::fs::write(&path, "(timing: (target_ups: 30))").expect("write");
        let loaded = EngineConfig::load_from_file(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.timing.target_ups, 30);
        assert_eq!(loaded.timing.idle_sleep_ms, 1);
        assert_eq!(loaded.window, WindowConfig::default());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result = EngineConfig::load_from_file("settings.ini");
        assert!(matches!(result, Err(ConfigError::Io(_)) | Err(ConfigError::UnsupportedFormat(_))));
        let saved = EngineConfig::default().save_to_file(temp_path("settings.ini"));
        assert!(matches!(saved, Err(ConfigError::UnsupportedFormat(_))));
    }
}
