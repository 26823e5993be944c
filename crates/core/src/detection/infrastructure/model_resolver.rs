use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::detection::domain::model_provider::ModelEntry;
use crate::shared::constants::{DOWNLOAD_PROGRESS_CHUNK, MODEL_CACHE_DIR_NAME};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory {path}: {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("download failed for {uri}: {source}")]
    Download {
        uri: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine a model cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Default per-user model cache: `<platform cache dir>/facetask/models/`.
pub fn default_cache_dir() -> Result<PathBuf, ModelResolveError> {
    dirs::cache_dir()
        .map(|d| d.join(MODEL_CACHE_DIR_NAME).join("models"))
        .ok_or(ModelResolveError::NoCacheDir)
}

/// Resolve one manifest entry to a local file, fetching at most once.
///
/// Resolution order:
/// 1. `cache_dir/<name>` if it already exists
/// 2. `bundled_dir/<name>` (pre-packaged installs, offline use)
/// 3. Download from the entry's URI into the cache
pub fn resolve(
    entry: &ModelEntry,
    cache_dir: &Path,
    bundled_dir: Option<&Path>,
    progress: Option<&ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cached_path = cache_dir.join(&entry.name);
    if cached_path.exists() {
        log::debug!("model {} found in cache", entry.name);
        return Ok(cached_path);
    }

    if let Some(dir) = bundled_dir {
        let bundled_path = dir.join(&entry.name);
        if bundled_path.exists() {
            log::debug!("model {} found in bundled dir", entry.name);
            return Ok(bundled_path);
        }
    }

    fs::create_dir_all(cache_dir).map_err(|e| ModelResolveError::CacheDir {
        path: cache_dir.to_path_buf(),
        source: e,
    })?;
    log::info!("downloading model {} from {}", entry.name, entry.uri);
    download(&entry.uri, &cached_path, progress)?;
    Ok(cached_path)
}

fn download(
    uri: &str,
    dest: &Path,
    progress: Option<&ProgressFn>,
) -> Result<(), ModelResolveError> {
    let map_download = |e: reqwest::Error| ModelResolveError::Download {
        uri: uri.to_string(),
        source: e,
    };
    let response = reqwest::blocking::get(uri)
        .and_then(|r| r.error_for_status())
        .map_err(map_download)?;

    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(map_download)?;

    // Write to a temp file first, then rename, so a failed download never
    // leaves a truncated model in the cache.
    let temp_path = dest.with_extension("part");
    let mut file = fs::File::create(&temp_path).map_err(write_err(&temp_path))?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(DOWNLOAD_PROGRESS_CHUNK) {
        file.write_all(chunk).map_err(write_err(&temp_path))?;
        downloaded += chunk.len() as u64;
        if let Some(cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_err(&temp_path))?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(write_err(dest))?;
    Ok(())
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> ModelResolveError + '_ {
    move |e| ModelResolveError::Write {
        path: path.to_path_buf(),
        source: e,
    }
}
