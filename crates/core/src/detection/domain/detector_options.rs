use thiserror::Error;

/// Smallest face size any engine is expected to resolve reliably.
pub const MIN_FACE_SIZE_FLOOR: u32 = 20;

#[derive(Error, Debug)]
pub enum InvalidOptionsError {
    #[error("score_threshold must be within 0.0..=1.0, got {0}")]
    ScoreThreshold(f64),
    #[error("min_face_size must be at least {MIN_FACE_SIZE_FLOOR}, got {0}")]
    MinFaceSize(u32),
    #[error("pyramid_scale_factor must be within 0.1..=0.99, got {0}")]
    PyramidScaleFactor(f32),
}

/// Configuration for a detection run.
///
/// Out-of-range values fail fast in [`DetectorOptions::validate`] rather
/// than being clamped, so caller bugs surface as explicit errors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorOptions {
    /// Minimum confidence for a detection to be reported, normalized to 0..=1.
    pub score_threshold: f64,
    /// Smallest face side length to search for, in pixels.
    pub min_face_size: u32,
    /// Downscale ratio between image pyramid levels.
    pub pyramid_scale_factor: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            score_threshold: 0.5,
            min_face_size: MIN_FACE_SIZE_FLOOR,
            pyramid_scale_factor: 0.8,
        }
    }
}

impl DetectorOptions {
    pub fn validate(&self) -> Result<(), InvalidOptionsError> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(InvalidOptionsError::ScoreThreshold(self.score_threshold));
        }
        if self.min_face_size < MIN_FACE_SIZE_FLOOR {
            return Err(InvalidOptionsError::MinFaceSize(self.min_face_size));
        }
        if !(0.1..=0.99).contains(&self.pyramid_scale_factor) {
            return Err(InvalidOptionsError::PyramidScaleFactor(
                self.pyramid_scale_factor,
            ));
        }
        Ok(())
    }
}
