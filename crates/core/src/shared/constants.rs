pub const DETECTOR_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const DETECTOR_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

/// Directory name under the platform cache dir where models are stored.
pub const MODEL_CACHE_DIR_NAME: &str = "facetask";

/// Download progress is reported at most once per this many bytes.
pub const DOWNLOAD_PROGRESS_CHUNK: usize = 1024 * 1024;
