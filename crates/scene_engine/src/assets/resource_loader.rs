//! File-backed resource loading
//!
//! Paths are resolved against the configured search paths in order. Failures
//! never escape as errors: they are logged and the caller gets `None`, so a
//! missing file cannot take down a frame.

use crate::config::AssetConfig;
use crate::foundation::worker_pool::{PoolError, WorkerPool};
use crossbeam_channel::{bounded, Receiver};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

/// Raw bytes of a loaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl Resource {
    /// Resolved path the bytes came from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// File contents as UTF-8, if valid
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Size in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the file was empty
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Source of resources by path
pub trait ResourceLoader {
    /// Load a resource; failures are logged and yield `None`
    fn load(&mut self, path: &str) -> Option<Arc<Resource>>;
}

/// Why a load failed; only ever logged
#[derive(Error, Debug)]
enum ResourceError {
    #[error("'{0}' not found in any search path")]
    NotFound(String),

    #[error("Failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

type Cache = Arc<Mutex<HashMap<PathBuf, Arc<Resource>>>>;

/// Loads files from a list of search paths, optionally caching them
#[derive(Debug, Clone)]
pub struct FileResourceLoader {
    search_paths: Vec<PathBuf>,
    cache: Option<Cache>,
}

impl FileResourceLoader {
    /// Create a loader from the asset configuration
    pub fn new(config: &AssetConfig) -> Self {
        Self {
            search_paths: config.search_paths.iter().map(PathBuf::from).collect(),
            cache: config.cache.then(Cache::default),
        }
    }

    /// Search paths, in lookup order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing file matching `path`
    ///
    /// Absolute paths are used as-is.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        resolve_in(&self.search_paths, path)
    }

    /// Number of cached resources
    pub fn cached(&self) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |cache| cache.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Drop every cached resource
    pub fn clear_cache(&mut self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Load on the worker pool; the result arrives on the returned channel
    ///
    /// Fails only if the pool refuses the job.
    pub fn load_async(&self, path: &str, pool: &WorkerPool) -> Result<Receiver<Option<Arc<Resource>>>, PoolError> {
        let (sender, receiver) = bounded(1);
        let search_paths = self.search_paths.clone();
        let cache = self.cache.clone();
        let path = path.to_string();

        pool.submit(move || {
            let resource = load_logged(&search_paths, cache.as_ref(), &path);
            // The receiver may have been dropped; nobody is waiting then
            let _ = sender.send(resource);
        })?;
        Ok(receiver)
    }
}

impl ResourceLoader for FileResourceLoader {
    fn load(&mut self, path: &str) -> Option<Arc<Resource>> {
        load_logged(&self.search_paths, self.cache.as_ref(), path)
    }
}

fn resolve_in(search_paths: &[PathBuf], path: &str) -> Option<PathBuf> {
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    search_paths
        .iter()
        .map(|root| root.join(candidate))
        .find(|full| full.is_file())
}

fn load_logged(search_paths: &[PathBuf], cache: Option<&Cache>, path: &str) -> Option<Arc<Resource>> {
    match load_from(search_paths, cache, path) {
        Ok(resource) => Some(resource),
        Err(error) => {
            log::error!("Resource load failed: {}", error);
            None
        }
    }
}

fn load_from(search_paths: &[PathBuf], cache: Option<&Cache>, path: &str) -> Result<Arc<Resource>, ResourceError> {
    let resolved = resolve_in(search_paths, path).ok_or_else(|| ResourceError::NotFound(path.to_string()))?;

    if let Some(hit) = cache.and_then(|c| c.lock().unwrap_or_else(PoisonError::into_inner).get(&resolved).cloned()) {
        log::trace!("Resource cache hit: {}", resolved.display());
        return Ok(hit);
    }

    let bytes = std::fs::read(&resolved).map_err(|source| ResourceError::Read {
        path: resolved.clone(),
        source,
    })?;
    log::debug!("Loaded {} ({} bytes)", resolved.display(), bytes.len());

    let resource = Arc::new(Resource { path: resolved.clone(), bytes });
    if let Some(cache) = cache {
        cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(resolved, Arc::clone(&resource));
    }
    Ok(resource)
}
