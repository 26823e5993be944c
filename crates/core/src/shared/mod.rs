pub mod constants;
pub mod image_buffer;
