use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageBufferError {
    #[error("image dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
    #[error("buffer length {actual} does not match {width}x{height}x{channels} = {expected}")]
    LengthMismatch {
        width: u32,
        height: u32,
        channels: u8,
        expected: usize,
        actual: usize,
    },
}

/// An owned image: contiguous bytes in row-major order.
///
/// Buffers are moved across the worker boundary, never shared mutably.
/// A buffer echoed back by the worker is byte-identical to the one sent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageBuffer {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl ImageBuffer {
    /// Checked constructor: dimensions must be positive and consistent with
    /// the buffer length.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, ImageBufferError> {
        if width == 0 || height == 0 {
            return Err(ImageBufferError::ZeroDimension { width, height });
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(ImageBufferError::LengthMismatch {
                width,
                height,
                channels,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
