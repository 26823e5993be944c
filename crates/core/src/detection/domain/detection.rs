/// Axis-aligned bounding region of a detected face, with the engine's
/// detection score.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub score: f64,
}

/// A facial landmark point in image coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
}

/// One detected face: region, landmark set, descriptor vector.
///
/// The worker treats this as opaque payload: it neither validates nor
/// mutates what a detection engine produced. Engines that compute no
/// landmarks or descriptors leave those empty.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub region: BoundingBox,
    pub landmarks: Vec<Landmark>,
    pub descriptor: Vec<f32>,
}

impl Detection {
    /// A detection carrying only a bounding region.
    pub fn from_region(region: BoundingBox) -> Self {
        Self {
            region,
            landmarks: Vec::new(),
            descriptor: Vec::new(),
        }
    }
}
