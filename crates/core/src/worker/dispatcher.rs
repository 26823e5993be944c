use crate::detection::domain::detector::{Detector, DetectorFactory};
use crate::detection::domain::detector_options::DetectorOptions;
use crate::detection::domain::model_provider::{ModelEntry, ModelProvider, ModelState};
use crate::shared::image_buffer::ImageBuffer;
use crate::worker::messages::{Command, Response};

/// Worker-side control loop state: routes commands to the model provider
/// and detector, emitting exactly one response per command.
///
/// Owns the model lifecycle explicitly instead of reading it from any
/// ambient engine state. The detector is built once, on the first
/// transition to `Ready`, and reused for every detection after that.
pub struct Dispatcher {
    provider: Box<dyn ModelProvider>,
    factory: Box<dyn DetectorFactory>,
    detector: Option<Box<dyn Detector>>,
    manifest: Vec<ModelEntry>,
    state: ModelState,
}

impl Dispatcher {
    pub fn new(
        provider: Box<dyn ModelProvider>,
        factory: Box<dyn DetectorFactory>,
        manifest: Vec<ModelEntry>,
    ) -> Self {
        Self {
            provider,
            factory,
            detector: None,
            manifest,
            state: ModelState::Unloaded,
        }
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    /// Handles one command to completion. Capability errors never escape:
    /// they are converted to an error response here, at the boundary.
    pub fn handle(&mut self, command: Command) -> Response {
        match command {
            Command::LoadModels => self.handle_load_models(),
            Command::DetectFaces { image, options } => self.handle_detect_faces(image, options),
        }
    }

    fn handle_load_models(&mut self) -> Response {
        if self.state == ModelState::Ready {
            log::debug!("load requested while ready, responding without reload");
            return Response::ModelsLoaded;
        }

        self.state = ModelState::Loading;
        if let Err(e) = self.provider.load_all(&self.manifest) {
            log::warn!("model load failed: {e}");
            self.state = ModelState::Failed;
            return Response::LoadError {
                message: e.to_string(),
            };
        }

        match self.factory.build(self.provider.as_ref()) {
            Ok(detector) => {
                self.detector = Some(detector);
                self.state = ModelState::Ready;
                log::info!("models loaded, worker ready");
                Response::ModelsLoaded
            }
            Err(e) => {
                log::warn!("detector construction failed: {e}");
                self.state = ModelState::Failed;
                Response::LoadError {
                    message: e.to_string(),
                }
            }
        }
    }

    fn handle_detect_faces(&mut self, image: ImageBuffer, options: DetectorOptions) -> Response {
        if self.state != ModelState::Ready {
            log::warn!("detection requested while {}, rejecting", self.state);
            return Response::ModelsNotReady { state: self.state };
        }

        if let Err(e) = options.validate() {
            return Response::InvalidOptions {
                message: e.to_string(),
            };
        }

        // Ready implies the factory has run; a missing detector would mean
        // the state machine was corrupted, so report it as not ready rather
        // than panic in the worker.
        let Some(detector) = self.detector.as_mut() else {
            return Response::ModelsNotReady { state: self.state };
        };

        match detector.detect(&image, &options) {
            Ok(detections) => Response::DetectionResult {
                detections,
                source_images: vec![image],
            },
            Err(e) => {
                log::warn!("detection failed: {e}");
                Response::DetectionFailed {
                    message: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use crate::detection::domain::detection::{BoundingBox, Detection};
    use crate::detection::domain::detector::DetectionError;
    use crate::detection::domain::model_provider::ModelLoadError;

    struct FakeProvider {
        fail_model: Option<String>,
        load_calls: Arc<AtomicUsize>,
        state: ModelState,
    }

    impl FakeProvider {
        fn ok(load_calls: Arc<AtomicUsize>) -> Self {
            Self {
                fail_model: None,
                load_calls,
                state: ModelState::Unloaded,
            }
        }

        fn failing(model: &str) -> Self {
            Self {
                fail_model: Some(model.to_string()),
                load_calls: Arc::new(AtomicUsize::new(0)),
                state: ModelState::Unloaded,
            }
        }
    }

    impl ModelProvider for FakeProvider {
        fn load_all(&mut self, _manifest: &[ModelEntry]) -> Result<(), ModelLoadError> {
            self.load_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(name) = &self.fail_model {
                self.state = ModelState::Failed;
                return Err(ModelLoadError {
                    model_name: name.clone(),
                    source: "fetch refused".into(),
                });
            }
            self.state = ModelState::Ready;
            Ok(())
        }

        fn state(&self) -> ModelState {
            self.state
        }

        fn resource(&self, _name: &str) -> Option<&[u8]> {
            Some(b"model bytes")
        }
    }

    #[derive(Debug)]
    enum FakeDetectorMode {
        Faces(Vec<Detection>),
        Fail,
    }

    #[derive(Debug)]
    struct FakeDetector {
        mode: FakeDetectorMode,
        calls: Arc<AtomicUsize>,
    }

    impl Detector for FakeDetector {
        fn detect(
            &mut self,
            _image: &ImageBuffer,
            _options: &DetectorOptions,
        ) -> Result<Vec<Detection>, DetectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.mode {
                FakeDetectorMode::Faces(faces) => Ok(faces.clone()),
                FakeDetectorMode::Fail => Err(DetectionError::Engine("inference blew up".into())),
            }
        }
    }

    struct FakeFactory {
        faces: Vec<Detection>,
        fail_detect: bool,
        detect_calls: Arc<AtomicUsize>,
    }

    impl DetectorFactory for FakeFactory {
        fn build(
            &self,
            _provider: &dyn ModelProvider,
        ) -> Result<Box<dyn Detector>, DetectionError> {
            let mode = if self.fail_detect {
                FakeDetectorMode::Fail
            } else {
                FakeDetectorMode::Faces(self.faces.clone())
            };
            Ok(Box::new(FakeDetector {
                mode,
                calls: self.detect_calls.clone(),
            }))
        }
    }

    fn detection(x: i32) -> Detection {
        Detection::from_region(BoundingBox {
            x,
            y: 10,
            width: 40,
            height: 40,
            score: 0.9,
        })
    }

    fn manifest() -> Vec<ModelEntry> {
        vec![
            ModelEntry::new("tiny_face_detector", "http://models/tiny"),
            ModelEntry::new("face_landmark_68", "http://models/landmark"),
            ModelEntry::new("face_recognition", "http://models/recognition"),
        ]
    }

    fn image() -> ImageBuffer {
        ImageBuffer::new(vec![0u8; 100 * 100 * 3], 100, 100, 3).unwrap()
    }

    fn ready_dispatcher(
        faces: Vec<Detection>,
        fail_detect: bool,
    ) -> (Dispatcher, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let load_calls = Arc::new(AtomicUsize::new(0));
        let detect_calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new(
            Box::new(FakeProvider::ok(load_calls.clone())),
            Box::new(FakeFactory {
                faces,
                fail_detect,
                detect_calls: detect_calls.clone(),
            }),
            manifest(),
        );
        assert_eq!(dispatcher.handle(Command::LoadModels), Response::ModelsLoaded);
        (dispatcher, load_calls, detect_calls)
    }

    #[test]
    fn test_load_models_reaches_ready() {
        let (dispatcher, load_calls, _) = ready_dispatcher(vec![], false);
        assert_eq!(dispatcher.state(), ModelState::Ready);
        assert_eq!(load_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_load_is_a_no_op() {
        let (mut dispatcher, load_calls, _) = ready_dispatcher(vec![], false);

        assert_eq!(dispatcher.handle(Command::LoadModels), Response::ModelsLoaded);

        assert_eq!(dispatcher.state(), ModelState::Ready);
        assert_eq!(load_calls.load(Ordering::SeqCst), 1, "must not reload");
    }

    #[test]
    fn test_load_failure_names_model_and_marks_failed() {
        let mut dispatcher = Dispatcher::new(
            Box::new(FakeProvider::failing("face_landmark_68")),
            Box::new(FakeFactory {
                faces: vec![],
                fail_detect: false,
                detect_calls: Arc::new(AtomicUsize::new(0)),
            }),
            manifest(),
        );

        let response = dispatcher.handle(Command::LoadModels);

        match response {
            Response::LoadError { message } => {
                assert!(message.contains("face_landmark_68"));
            }
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(dispatcher.state(), ModelState::Failed);
    }

    #[test]
    fn test_detect_before_load_is_rejected_explicitly() {
        let detect_calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = Dispatcher::new(
            Box::new(FakeProvider::ok(Arc::new(AtomicUsize::new(0)))),
            Box::new(FakeFactory {
                faces: vec![],
                fail_detect: false,
                detect_calls: detect_calls.clone(),
            }),
            manifest(),
        );

        let response = dispatcher.handle(Command::DetectFaces {
            image: image(),
            options: DetectorOptions::default(),
        });

        assert_eq!(
            response,
            Response::ModelsNotReady {
                state: ModelState::Unloaded
            }
        );
        assert_eq!(detect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detect_after_failed_load_is_rejected() {
        let mut dispatcher = Dispatcher::new(
            Box::new(FakeProvider::failing("tiny_face_detector")),
            Box::new(FakeFactory {
                faces: vec![],
                fail_detect: false,
                detect_calls: Arc::new(AtomicUsize::new(0)),
            }),
            manifest(),
        );
        dispatcher.handle(Command::LoadModels);

        let response = dispatcher.handle(Command::DetectFaces {
            image: image(),
            options: DetectorOptions::default(),
        });

        assert_eq!(
            response,
            Response::ModelsNotReady {
                state: ModelState::Failed
            }
        );
    }

    #[test]
    fn test_load_retry_after_failure() {
        let load_calls = Arc::new(AtomicUsize::new(0));
        // Provider that fails its first attempt, then succeeds.
        struct FlakyProvider {
            inner: FakeProvider,
            failures_left: usize,
        }
        impl ModelProvider for FlakyProvider {
            fn load_all(&mut self, manifest: &[ModelEntry]) -> Result<(), ModelLoadError> {
                if self.failures_left > 0 {
                    self.failures_left -= 1;
                    self.inner.fail_model = Some("tiny_face_detector".to_string());
                } else {
                    self.inner.fail_model = None;
                }
                self.inner.load_all(manifest)
            }
            fn state(&self) -> ModelState {
                self.inner.state()
            }
            fn resource(&self, name: &str) -> Option<&[u8]> {
                self.inner.resource(name)
            }
        }

        let mut dispatcher = Dispatcher::new(
            Box::new(FlakyProvider {
                inner: FakeProvider::ok(load_calls.clone()),
                failures_left: 1,
            }),
            Box::new(FakeFactory {
                faces: vec![],
                fail_detect: false,
                detect_calls: Arc::new(AtomicUsize::new(0)),
            }),
            manifest(),
        );

        assert!(matches!(
            dispatcher.handle(Command::LoadModels),
            Response::LoadError { .. }
        ));
        assert_eq!(dispatcher.state(), ModelState::Failed);

        assert_eq!(dispatcher.handle(Command::LoadModels), Response::ModelsLoaded);
        assert_eq!(dispatcher.state(), ModelState::Ready);
        assert_eq!(load_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_detection_echoes_source_image_bytes() {
        let (mut dispatcher, _, _) = ready_dispatcher(vec![detection(5)], false);
        let original = image();

        let response = dispatcher.handle(Command::DetectFaces {
            image: original.clone(),
            options: DetectorOptions::default(),
        });

        match response {
            Response::DetectionResult {
                detections,
                source_images,
            } => {
                assert_eq!(detections, vec![detection(5)]);
                assert_eq!(source_images, vec![original]);
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_zero_faces_yields_empty_detections() {
        let (mut dispatcher, _, _) = ready_dispatcher(vec![], false);

        let response = dispatcher.handle(Command::DetectFaces {
            image: image(),
            options: DetectorOptions::default(),
        });

        match response {
            Response::DetectionResult { detections, .. } => assert!(detections.is_empty()),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_options_rejected_before_detector_runs() {
        let (mut dispatcher, _, detect_calls) = ready_dispatcher(vec![detection(5)], false);

        let response = dispatcher.handle(Command::DetectFaces {
            image: image(),
            options: DetectorOptions {
                score_threshold: -1.0,
                ..DetectorOptions::default()
            },
        });

        assert!(matches!(response, Response::InvalidOptions { .. }));
        assert_eq!(detect_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_detector_failure_becomes_error_response() {
        let (mut dispatcher, _, _) = ready_dispatcher(vec![], true);

        let response = dispatcher.handle(Command::DetectFaces {
            image: image(),
            options: DetectorOptions::default(),
        });

        match response {
            Response::DetectionFailed { message } => assert!(message.contains("inference")),
            other => panic!("unexpected response: {other:?}"),
        }
        // Still ready: a failed inference is not a failed load.
        assert_eq!(dispatcher.state(), ModelState::Ready);
    }
}
