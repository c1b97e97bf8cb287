use gesture_core::{Image, InterestPoint, Rect};
use rayon::prelude::*;

/// Harris sensitivity constant in `det(M) - k * trace(M)^2`
const HARRIS_K: f64 = 0.04;

/// Central gradient magnitude below which a pixel is skipped outright.
/// Avoids the 5x5 second-moment window on flat regions.
const MIN_CENTER_GRADIENT: f32 = 1.0;

/// Single-scale Harris corner scan
pub(crate) struct CornerScan;

impl CornerScan {
    /// Scan the image (optionally restricted to `roi`) for Harris corners
    /// above `floor`, in row-parallel fashion. Returned points are in
    /// detection order (row-major) and unflagged.
    pub(crate) fn detect(
        img: &Image,
        width: usize,
        height: usize,
        roi: Option<Rect>,
        floor: f32,
    ) -> Vec<InterestPoint> {
        // 2-pixel margin for the second-moment window plus the Sobel kernel
        let full = Rect::new(0, 0, width, height);
        let region = roi.map(|r| r.clipped(width, height)).unwrap_or(full);
        let y0 = region.y.max(3);
        let y1 = (region.y + region.height).min(height.saturating_sub(3));
        let x0 = region.x.max(3);
        let x1 = (region.x + region.width).min(width.saturating_sub(3));
        if y0 >= y1 || x0 >= x1 {
            return Vec::new();
        }

        let rows: Vec<Vec<InterestPoint>> = (y0..y1)
            .into_par_iter()
            .map(|y| {
                let mut row = Vec::new();
                for x in x0..x1 {
                    let (gx, gy) = Self::gradients(img, width, x, y);
                    if gx.abs() + gy.abs() < MIN_CENTER_GRADIENT {
                        continue;
                    }
                    let response = Self::harris_response(img, width, x, y);
                    if response >= floor {
                        row.push(InterestPoint::new(x as f32, y as f32, response));
                    }
                }
                row
            })
            .collect();

        rows.into_iter().flatten().collect()
    }

    /// Harris corner response over a 5x5 second-moment window
    pub(crate) fn harris_response(img: &Image, width: usize, x: usize, y: usize) -> f32 {
        let mut ixx = 0.0f64;
        let mut ixy = 0.0f64;
        let mut iyy = 0.0f64;

        for dy in -2..=2 {
            for dx in -2..=2 {
                let nx = (x as i32 + dx) as usize;
                let ny = (y as i32 + dy) as usize;
                let (gx, gy) = Self::gradients(img, width, nx, ny);

                ixx += (gx * gx) as f64;
                ixy += (gx * gy) as f64;
                iyy += (gy * gy) as f64;
            }
        }

        let det = ixx * iyy - ixy * ixy;
        let trace = ixx + iyy;
        let response = det - HARRIS_K * trace * trace;

        // Only positive responses count as corners
        if response > 0.0 {
            response as f32
        } else {
            0.0
        }
    }

    /// Image gradients using the Sobel operator.
    /// Callers guarantee at least a 1-pixel margin.
    fn gradients(img: &Image, width: usize, x: usize, y: usize) -> (f32, f32) {
        let gx = (img[(y - 1) * width + (x + 1)] as f32) * 1.0
            + (img[y * width + (x + 1)] as f32) * 2.0
            + (img[(y + 1) * width + (x + 1)] as f32) * 1.0
            - (img[(y - 1) * width + (x - 1)] as f32) * 1.0
            - (img[y * width + (x - 1)] as f32) * 2.0
            - (img[(y + 1) * width + (x - 1)] as f32) * 1.0;

        let gy = (img[(y + 1) * width + (x - 1)] as f32) * 1.0
            + (img[(y + 1) * width + x] as f32) * 2.0
            + (img[(y + 1) * width + (x + 1)] as f32) * 1.0
            - (img[(y - 1) * width + (x - 1)] as f32) * 1.0
            - (img[(y - 1) * width + x] as f32) * 2.0
            - (img[(y - 1) * width + (x + 1)] as f32) * 1.0;

        (gx / 8.0, gy / 8.0)
    }

    /// Non-maximum suppression keeping the strongest point in each
    /// neighborhood of `min_distance`
    pub(crate) fn non_maximum_suppression(points: &[InterestPoint], min_distance: f32) -> Vec<InterestPoint> {
        if points.is_empty() {
            return Vec::new();
        }

        let mut sorted = points.to_vec();
        sorted.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(std::cmp::Ordering::Equal));

        let mut kept: Vec<InterestPoint> = Vec::new();
        let min_distance_sq = min_distance * min_distance;

        for candidate in sorted {
            let mut is_local_maximum = true;

            for accepted in &kept {
                let dx = candidate.x - accepted.x;
                let dy = candidate.y - accepted.y;
                if dx * dx + dy * dy < min_distance_sq {
                    is_local_maximum = false;
                    break;
                }
            }

            if is_local_maximum {
                kept.push(candidate);
            }
        }

        // Restore detection order for the per-frame snapshot
        kept.sort_by(|a, b| (a.y, a.x).partial_cmp(&(b.y, b.x)).unwrap_or(std::cmp::Ordering::Equal));
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_corner_image(width: usize, height: usize) -> Image {
        let mut img = vec![50; width * height];
        let cx = width / 2;
        let cy = height / 2;
        // Bright square whose corners produce strong Harris responses
        for dy in -2..=2i32 {
            for dx in -2..=2i32 {
                let x = (cx as i32 + dx) as usize;
                let y = (cy as i32 + dy) as usize;
                if x < width && y < height {
                    img[y * width + x] = 255;
                }
            }
        }
        img
    }

    #[test]
    fn test_uniform_image_has_no_corners() {
        let img = vec![128; 20 * 20];
        let points = CornerScan::detect(&img, 20, 20, None, 1.0);
        assert!(points.is_empty());
    }

    #[test]
    fn test_corner_pattern_is_detected() {
        let img = create_corner_image(20, 20);
        let points = CornerScan::detect(&img, 20, 20, None, 1.0);
        assert!(!points.is_empty());
        for p in &points {
            assert!(p.strength > 0.0);
            assert!(p.strength.is_finite());
            assert!(!p.rejected);
        }
    }

    #[test]
    fn test_roi_restricts_detection() {
        let img = create_corner_image(40, 40);
        // Square sits at the center; an off-center ROI must miss it
        let points = CornerScan::detect(&img, 40, 40, Some(Rect::new(0, 0, 10, 10)), 1.0);
        assert!(points.is_empty());

        let points = CornerScan::detect(&img, 40, 40, Some(Rect::new(10, 10, 20, 20)), 1.0);
        assert!(!points.is_empty());
    }

    #[test]
    fn test_nms_enforces_min_distance() {
        let img = create_corner_image(20, 20);
        let raw = CornerScan::detect(&img, 20, 20, None, 1.0);
        let kept = CornerScan::non_maximum_suppression(&raw, 3.0);
        assert!(kept.len() <= raw.len());

        for i in 0..kept.len() {
            for j in (i + 1)..kept.len() {
                let dx = kept[i].x - kept[j].x;
                let dy = kept[i].y - kept[j].y;
                let dist = (dx * dx + dy * dy).sqrt();
                assert!(dist >= 3.0, "points too close after suppression: {}", dist);
            }
        }
    }

    #[test]
    fn test_nms_keeps_strongest() {
        let points = vec![
            InterestPoint::new(5.0, 5.0, 10.0),
            InterestPoint::new(6.0, 5.0, 90.0),
            InterestPoint::new(15.0, 15.0, 40.0),
        ];
        let kept = CornerScan::non_maximum_suppression(&points, 3.0);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|p| p.strength == 90.0));
        assert!(kept.iter().all(|p| p.strength != 10.0));
    }
}
