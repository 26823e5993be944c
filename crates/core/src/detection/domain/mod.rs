pub mod detection;
pub mod detector;
pub mod detector_options;
pub mod model_provider;
