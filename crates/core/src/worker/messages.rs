use crate::detection::domain::detection::Detection;
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::model_provider::ModelState;
use crate::shared::image_buffer::ImageBuffer;

/// Messages sent from the controller to the worker.
///
/// Closed enum: every variant is handled exhaustively by the dispatcher,
/// so an unrecognized command tag cannot exist at runtime.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    LoadModels,
    DetectFaces {
        image: ImageBuffer,
        options: DetectorOptions,
    },
}

/// Messages sent from the worker back to the controller. Exactly one
/// response is emitted per command, in command order.
#[derive(Clone, Debug, PartialEq)]
pub enum Response {
    ModelsLoaded,
    LoadError {
        message: String,
    },
    DetectionResult {
        detections: Vec<Detection>,
        /// The buffers the detections were computed from, moved back to
        /// the controller byte-for-byte.
        source_images: Vec<ImageBuffer>,
    },
    /// Detection was requested before models were ready; carries the state
    /// the worker was in when it rejected the command.
    ModelsNotReady {
        state: ModelState,
    },
    InvalidOptions {
        message: String,
    },
    DetectionFailed {
        message: String,
    },
}
