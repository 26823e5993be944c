use std::io::Cursor;

use crate::detection::domain::detection::{BoundingBox, Detection};
use crate::detection::domain::detector::{DetectionError, Detector, DetectorFactory};
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::model_provider::ModelProvider;
use crate::shared::image_buffer::ImageBuffer;

/// rustface scores are unnormalized classifier sums; 2.0 corresponds
/// roughly to a 0.5 confidence cut, so a normalized threshold scales by 4.
const SCORE_THRESH_SCALE: f64 = 4.0;

const SLIDE_WINDOW_STEP: u32 = 4;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The engine works on luminance data; RGB input is converted on the fly.
/// SeetaFace produces bounding regions only, so landmark and descriptor
/// fields of each [`Detection`] stay empty.
pub struct RustfaceDetector {
    model: rustface::Model,
}

impl std::fmt::Debug for RustfaceDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RustfaceDetector").finish_non_exhaustive()
    }
}

impl RustfaceDetector {
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self, DetectionError> {
        let model =
            rustface::read_model(Cursor::new(bytes)).map_err(|e| DetectionError::ModelParse {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self { model })
    }
}

impl Detector for RustfaceDetector {
    fn detect(
        &mut self,
        image: &ImageBuffer,
        options: &DetectorOptions,
    ) -> Result<Vec<Detection>, DetectionError> {
        let gray = to_luma(image)?;

        // The engine carries per-run pyramid state, so build it fresh for
        // each call from the shared parsed model.
        let mut engine = rustface::create_detector_with_model(self.model.clone());
        engine.set_min_face_size(options.min_face_size);
        engine.set_score_thresh(options.score_threshold * SCORE_THRESH_SCALE);
        engine.set_pyramid_scale_factor(options.pyramid_scale_factor);
        engine.set_slide_window_step(SLIDE_WINDOW_STEP, SLIDE_WINDOW_STEP);

        let faces = engine.detect(&rustface::ImageData::new(
            &gray,
            image.width(),
            image.height(),
        ));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                Detection::from_region(BoundingBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                })
            })
            .collect())
    }
}

/// Flattens an image to a single luminance channel (Rec. 601 weights).
fn to_luma(image: &ImageBuffer) -> Result<Vec<u8>, DetectionError> {
    match image.channels() {
        1 => Ok(image.data().to_vec()),
        3 => Ok(image
            .data()
            .chunks_exact(3)
            .map(|px| {
                let luma =
                    299 * u32::from(px[0]) + 587 * u32::from(px[1]) + 114 * u32::from(px[2]);
                (luma / 1000) as u8
            })
            .collect()),
        other => Err(DetectionError::UnsupportedImage(format!(
            "expected 1 or 3 channels, got {other}"
        ))),
    }
}

/// Builds a [`RustfaceDetector`] from the named resource of a loaded
/// provider.
pub struct RustfaceDetectorFactory {
    model_name: String,
}

impl RustfaceDetectorFactory {
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }
}

impl DetectorFactory for RustfaceDetectorFactory {
    fn build(&self, provider: &dyn ModelProvider) -> Result<Box<dyn Detector>, DetectionError> {
        let bytes = provider
            .resource(&self.model_name)
            .ok_or_else(|| DetectionError::MissingModel(self.model_name.clone()))?;
        Ok(Box::new(RustfaceDetector::from_bytes(
            &self.model_name,
            bytes,
        )?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::model_provider::{ModelEntry, ModelLoadError, ModelState};

    struct EmptyProvider;

    impl ModelProvider for EmptyProvider {
        fn load_all(&mut self, _manifest: &[ModelEntry]) -> Result<(), ModelLoadError> {
            Ok(())
        }
        fn state(&self) -> ModelState {
            ModelState::Ready
        }
        fn resource(&self, _name: &str) -> Option<&[u8]> {
            None
        }
    }

    #[test]
    fn test_garbage_model_bytes_fail_to_parse() {
        let err = RustfaceDetector::from_bytes("bad.bin", b"not a seetaface model").unwrap_err();
        match err {
            DetectionError::ModelParse { name, .. } => assert_eq!(name, "bad.bin"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_factory_reports_missing_resource() {
        let factory = RustfaceDetectorFactory::new("detector.bin");
        let err = factory.build(&EmptyProvider).unwrap_err();
        assert!(matches!(err, DetectionError::MissingModel(name) if name == "detector.bin"));
    }

    #[test]
    fn test_to_luma_passes_grayscale_through() {
        let image = ImageBuffer::new(vec![10, 20, 30, 40], 2, 2, 1).unwrap();
        assert_eq!(to_luma(&image).unwrap(), vec![10, 20, 30, 40]);
    }

    #[test]
    fn test_to_luma_weighs_rgb() {
        // Pure red, green, blue pixels.
        let image = ImageBuffer::new(vec![255, 0, 0, 0, 255, 0, 0, 0, 255], 3, 1, 3).unwrap();
        let luma = to_luma(&image).unwrap();
        assert_eq!(luma, vec![76, 149, 29]);
    }

    #[test]
    fn test_to_luma_rejects_rgba() {
        let image = ImageBuffer::new(vec![0u8; 16], 2, 2, 4).unwrap();
        assert!(matches!(
            to_luma(&image),
            Err(DetectionError::UnsupportedImage(_))
        ));
    }
}
