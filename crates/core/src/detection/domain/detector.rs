use thiserror::Error;

use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::model_provider::ModelProvider;
use crate::shared::image_buffer::ImageBuffer;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("model resource {0} is not loaded")]
    MissingModel(String),
    #[error("failed to parse model {name}: {message}")]
    ModelParse { name: String, message: String },
    #[error("unsupported image layout: {0}")]
    UnsupportedImage(String),
    #[error("detection engine failed: {0}")]
    Engine(String),
}

/// Domain interface for face detection.
///
/// One atomic call per image: implementations return the full detection
/// sequence or an error, never partial results. Engines may be stateful,
/// hence `&mut self`.
pub trait Detector: Send + std::fmt::Debug {
    fn detect(
        &mut self,
        image: &ImageBuffer,
        options: &DetectorOptions,
    ) -> Result<Vec<Detection>, DetectionError>;
}

/// Builds a detector from a provider whose resources are loaded.
///
/// The dispatcher invokes this once, on the first transition to `Ready`.
pub trait DetectorFactory: Send {
    fn build(&self, provider: &dyn ModelProvider) -> Result<Box<dyn Detector>, DetectionError>;
}
