use gesture_core::{HandPosition, Image, InterestPoint};
use gesture_harris::{HarrisBuffer, HarrisConfig};

use crate::error::{EngineError, EngineResult};

/// Fixed feature-vector length. Layout:
/// 0..3   hand x, y, z
/// 3      skin coverage ratio
/// 4..6   skin-masked intensity mean and variance (normalized to [0, 1])
/// 6      accepted interest-point count
/// 7..9   log-compressed strength mean and variance
/// 9..11  point-centroid offset from image center (x, y fractions)
/// 11     mean point spread around the centroid (width fraction)
pub const FEATURE_LEN: usize = 12;

/// Per-frame feature extraction.
///
/// Owns the interest-point buffer and drives it one frame at a time; the
/// actual vector construction is the pure [`aggregate`] below, so all
/// temporal state lives in the buffer.
pub struct FeatureProcessor {
    buffer: HarrisBuffer,
    initialized: bool,
}

impl FeatureProcessor {
    pub fn new(cfg: HarrisConfig) -> EngineResult<Self> {
        Ok(Self {
            buffer: HarrisBuffer::new(cfg)?,
            initialized: false,
        })
    }

    /// Advance the buffer with this frame and build its feature vector.
    /// The first valid frame also initializes the buffer.
    pub fn compute(&mut self, hand: HandPosition, image: &Image, skin: &Image) -> EngineResult<Vec<f64>> {
        if skin.len() != image.len() {
            return Err(EngineError::MaskSizeMismatch {
                image_len: image.len(),
                mask_len: skin.len(),
            });
        }
        if !self.initialized {
            self.buffer.init(image)?;
            self.initialized = true;
        }
        self.buffer.process_frame(image, None)?;

        let (width, height) = self.buffer.dimensions();
        let points: Vec<InterestPoint> = self.buffer.interest_points().copied().collect();
        aggregate(hand, image, skin, width, height, &points)
    }

    /// Accepted points of the most recent frame (for overlays)
    pub fn interest_points(&self) -> impl Iterator<Item = &InterestPoint> {
        self.buffer.interest_points()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.buffer.dimensions()
    }
}

/// Pure fixed-shape aggregation of one frame's inputs.
///
/// The output length is always [`FEATURE_LEN`] regardless of how many
/// interest points the frame produced; point statistics degrade to zeros
/// when the filtered set is empty.
pub fn aggregate(
    hand: HandPosition,
    image: &Image,
    skin: &Image,
    width: usize,
    height: usize,
    points: &[InterestPoint],
) -> EngineResult<Vec<f64>> {
    let expected_len = width * height;
    if image.len() != expected_len {
        return Err(EngineError::FrameSizeMismatch {
            expected_len,
            actual_len: image.len(),
        });
    }
    if skin.len() != image.len() {
        return Err(EngineError::MaskSizeMismatch {
            image_len: image.len(),
            mask_len: skin.len(),
        });
    }

    let mut fv = vec![0.0f64; FEATURE_LEN];
    fv[0] = hand.x as f64;
    fv[1] = hand.y as f64;
    fv[2] = hand.z as f64;

    // Skin-masked intensity statistics
    let mut skin_count = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for (i, &m) in skin.iter().enumerate() {
        if m > 0 {
            let v = image[i] as f64;
            skin_count += 1;
            sum += v;
            sum_sq += v * v;
        }
    }
    fv[3] = skin_count as f64 / expected_len as f64;
    if skin_count > 0 {
        let mean = sum / skin_count as f64;
        let var = (sum_sq / skin_count as f64 - mean * mean).max(0.0);
        fv[4] = mean / 255.0;
        fv[5] = var / (255.0 * 255.0);
    }

    // Interest-point summary; strengths are log-compressed to keep the
    // feature scale commensurate with the other entries
    fv[6] = points.len() as f64;
    if !points.is_empty() {
        let n = points.len() as f64;
        let logs: Vec<f64> = points.iter().map(|p| (p.strength as f64).ln_1p()).collect();
        let s_mean = logs.iter().sum::<f64>() / n;
        let s_var = logs.iter().map(|s| (s - s_mean) * (s - s_mean)).sum::<f64>() / n;
        fv[7] = s_mean;
        fv[8] = s_var;

        let cx = points.iter().map(|p| p.x as f64).sum::<f64>() / n;
        let cy = points.iter().map(|p| p.y as f64).sum::<f64>() / n;
        fv[9] = (cx - width as f64 / 2.0) / width as f64;
        fv[10] = (cy - height as f64 / 2.0) / height as f64;

        let spread = points
            .iter()
            .map(|p| {
                let dx = p.x as f64 - cx;
                let dy = p.y as f64 - cy;
                (dx * dx + dy * dy).sqrt()
            })
            .sum::<f64>()
            / n;
        fv[11] = spread / width as f64;
    }

    Ok(fv)
}
