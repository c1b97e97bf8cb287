/// Row-major 8-bit image buffer (depth/intensity frame or skin mask)
pub type Image = Vec<u8>;

/// 3D hand position reported by the sensor, in sensor coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HandPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl HandPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Detected corner candidate with its Harris strength.
///
/// `rejected` is set by the cross-frame stability filter only; rejected
/// points are kept for diagnostics but excluded from downstream use.
#[derive(Debug, Clone, Copy)]
pub struct InterestPoint {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
    pub rejected: bool,
}

impl InterestPoint {
    pub fn new(x: f32, y: f32, strength: f32) -> Self {
        Self { x, y, strength, rejected: false }
    }
}

/// Classifier output: one of the model's gesture vocabulary, or Unknown.
///
/// The numeric index refers into the loaded model's label list; names are
/// resolved through the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureLabel {
    Unknown,
    Gesture(u16),
}

impl GestureLabel {
    pub fn is_unknown(&self) -> bool {
        matches!(self, GestureLabel::Unknown)
    }

    /// Vocabulary index, if this is a recognized gesture
    pub fn index(&self) -> Option<usize> {
        match self {
            GestureLabel::Unknown => None,
            GestureLabel::Gesture(i) => Some(*i as usize),
        }
    }
}

/// Axis-aligned pixel region used to restrict detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, px: usize, py: usize) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    /// Clip to an image of the given dimensions
    pub fn clipped(&self, width: usize, height: usize) -> Rect {
        let x = self.x.min(width);
        let y = self.y.min(height);
        Rect {
            x,
            y,
            width: self.width.min(width - x),
            height: self.height.min(height - y),
        }
    }
}

/// Default worker count for row-parallel scans
pub fn default_threads() -> usize {
    num_cpus::get().max(1)
}
