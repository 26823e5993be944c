use std::fmt;

use thiserror::Error;

/// Lifecycle of a model load attempt. At most one attempt is in flight at
/// a time; `Ready` and `Failed` describe the attempt as a whole, never a
/// partially loaded manifest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelState {
    Unloaded,
    Loading,
    Ready,
    Failed,
}

impl fmt::Display for ModelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ModelState::Unloaded => "unloaded",
            ModelState::Loading => "loading",
            ModelState::Ready => "ready",
            ModelState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One named model resource and the URI it is fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelEntry {
    pub name: String,
    pub uri: String,
}

impl ModelEntry {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// A named model failed to fetch or read. Fatal to the whole load attempt:
/// the provider exposes no partial "some models ready" state.
#[derive(Error, Debug)]
#[error("failed to load model {model_name}: {source}")]
pub struct ModelLoadError {
    pub model_name: String,
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

/// Capability that fetches and holds named model resources.
///
/// Implementations load manifest entries in order and report per-model
/// progress via logging. `load_all` after `Ready` must return immediately
/// without re-fetching.
pub trait ModelProvider: Send {
    fn load_all(&mut self, manifest: &[ModelEntry]) -> Result<(), ModelLoadError>;

    fn state(&self) -> ModelState;

    /// Raw bytes of a loaded resource, or `None` before `Ready` or for an
    /// unknown name.
    fn resource(&self, name: &str) -> Option<&[u8]>;
}
