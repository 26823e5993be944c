pub mod http_model_provider;
pub mod model_resolver;
pub mod rustface_detector;
