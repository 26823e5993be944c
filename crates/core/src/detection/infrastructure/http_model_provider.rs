use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::detection::domain::model_provider::{
    ModelEntry, ModelLoadError, ModelProvider, ModelState,
};
use crate::detection::infrastructure::model_resolver::{self, ModelResolveError, ProgressFn};

/// Model provider that resolves manifest entries through the local cache
/// (downloading over HTTP on a miss) and holds the resolved files in memory
/// as opaque byte buffers.
///
/// Loading is all-or-nothing: the first failing entry aborts the attempt,
/// drops anything loaded so far, and marks the provider `Failed`.
pub struct HttpModelProvider {
    cache_dir: PathBuf,
    bundled_dir: Option<PathBuf>,
    progress: Option<ProgressFn>,
    state: ModelState,
    resources: HashMap<String, Vec<u8>>,
}

impl HttpModelProvider {
    /// Provider backed by the per-user model cache.
    pub fn new(bundled_dir: Option<PathBuf>) -> Result<Self, ModelResolveError> {
        let cache_dir = model_resolver::default_cache_dir()?;
        Ok(Self::with_cache_dir(cache_dir, bundled_dir))
    }

    /// Provider with an explicit cache directory.
    pub fn with_cache_dir(cache_dir: PathBuf, bundled_dir: Option<PathBuf>) -> Self {
        Self {
            cache_dir,
            bundled_dir,
            progress: None,
            state: ModelState::Unloaded,
            resources: HashMap::new(),
        }
    }

    /// Forward download progress to `progress` while fetching.
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    fn load_entry(&mut self, entry: &ModelEntry) -> Result<(), ModelLoadError> {
        let wrap = |e: Box<dyn std::error::Error + Send + Sync>| ModelLoadError {
            model_name: entry.name.clone(),
            source: e,
        };
        let path = model_resolver::resolve(
            entry,
            &self.cache_dir,
            self.bundled_dir.as_deref(),
            self.progress.as_ref(),
        )
        .map_err(|e| wrap(Box::new(e)))?;
        let bytes = fs::read(&path).map_err(|e| wrap(Box::new(e)))?;
        self.resources.insert(entry.name.clone(), bytes);
        Ok(())
    }
}

impl ModelProvider for HttpModelProvider {
    fn load_all(&mut self, manifest: &[ModelEntry]) -> Result<(), ModelLoadError> {
        if self.state == ModelState::Ready {
            log::debug!("models already loaded, skipping fetch");
            return Ok(());
        }

        self.state = ModelState::Loading;
        self.resources.clear();
        for (i, entry) in manifest.iter().enumerate() {
            log::info!("loading model {}/{}: {}", i + 1, manifest.len(), entry.name);
            if let Err(e) = self.load_entry(entry) {
                self.state = ModelState::Failed;
                self.resources.clear();
                return Err(e);
            }
        }
        self.state = ModelState::Ready;
        log::info!("all {} models loaded", manifest.len());
        Ok(())
    }

    fn state(&self) -> ModelState {
        self.state
    }

    fn resource(&self, name: &str) -> Option<&[u8]> {
        self.resources.get(name).map(Vec::as_slice)
    }
}
