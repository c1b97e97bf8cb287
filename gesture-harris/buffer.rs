use gesture_core::{Image, InterestPoint, Rect};

use crate::config::HarrisConfig;
use crate::detection::CornerScan;
use crate::error::{HarrisError, HarrisResult};

/// Per-frame Harris corner detector with a two-frame stability filter.
///
/// The buffer owns all cross-frame state: the current frame's point list
/// (including rejected points, kept for diagnostics) and the previous
/// frame's accepted set. Both collections are replaced wholesale on every
/// successful `process_frame`; a failed call leaves the previous state
/// authoritative.
pub struct HarrisBuffer {
    cfg: HarrisConfig,
    /// Scoped worker pool sized by `cfg.n_threads`; the row-parallel scan
    /// runs inside it rather than on the global pool
    pool: rayon::ThreadPool,
    initialized: bool,
    /// Current frame's candidates after suppression, rejection flags set
    points: Vec<InterestPoint>,
    /// Accepted points of the previous frame, used by the continuity test
    prev_accepted: Vec<InterestPoint>,
    frames_seen: u64,
}

impl HarrisBuffer {
    /// Creates a new buffer with validation
    pub fn new(cfg: HarrisConfig) -> HarrisResult<Self> {
        cfg.validate()?;

        // The scan needs a 3-pixel margin (Sobel + 5x5 window)
        const MIN_SIZE: usize = 7;
        if cfg.width < MIN_SIZE || cfg.height < MIN_SIZE {
            return Err(HarrisError::ImageTooSmall {
                width: cfg.width,
                height: cfg.height,
                min_size: MIN_SIZE,
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.n_threads)
            .build()
            .map_err(|e| HarrisError::ThreadPool(e.to_string()))?;

        Ok(Self {
            cfg,
            pool,
            initialized: false,
            points: Vec::new(),
            prev_accepted: Vec::new(),
            frames_seen: 0,
        })
    }

    /// Validates a frame against the configured geometry
    fn validate_image(&self, img: &Image) -> HarrisResult<()> {
        let expected_len = self.cfg.width * self.cfg.height;
        if img.len() != expected_len {
            return Err(HarrisError::InvalidImageData {
                expected_len,
                actual_len: img.len(),
            });
        }
        Ok(())
    }

    /// Checks the frame geometry and resets all cross-frame state.
    ///
    /// Fails on a geometry mismatch without touching existing state, so a
    /// subsequent `init` with a correct frame starts clean.
    pub fn init(&mut self, img: &Image) -> HarrisResult<()> {
        self.validate_image(img)?;
        self.points.clear();
        self.prev_accepted.clear();
        self.frames_seen = 0;
        self.initialized = true;
        Ok(())
    }

    /// Detects corners in the current frame and filters them against the
    /// previous frame's accepted set.
    ///
    /// Candidates failing the stability test are marked rejected rather
    /// than dropped. On success the buffer unconditionally advances to the
    /// new frame; on error the previous frame's state is preserved.
    pub fn process_frame(&mut self, img: &Image, roi: Option<Rect>) -> HarrisResult<()> {
        if !self.initialized {
            return Err(HarrisError::NotInitialized);
        }
        self.validate_image(img)?;

        let (width, height, floor) = (self.cfg.width, self.cfg.height, self.cfg.min_strength);
        let raw = self
            .pool
            .install(|| CornerScan::detect(img, width, height, roi, floor));
        let mut candidates = CornerScan::non_maximum_suppression(&raw, self.cfg.nms_radius);

        // Frame-adaptive strength cutoff, floored by the absolute minimum
        let frame_max = candidates.iter().map(|p| p.strength).fold(0.0f32, f32::max);
        let cutoff = (frame_max * self.cfg.relative_cutoff).max(self.cfg.min_strength);

        let mut accepted = Vec::new();
        for point in candidates.iter_mut() {
            point.rejected = !self.is_stable(point, cutoff);
            if !point.rejected {
                accepted.push(*point);
            }
        }

        log::debug!(
            "frame {}: {} candidates, {} accepted, {} rejected",
            self.frames_seen,
            candidates.len(),
            accepted.len(),
            candidates.len() - accepted.len()
        );

        self.points = candidates;
        self.prev_accepted = accepted;
        self.frames_seen += 1;
        Ok(())
    }

    /// A candidate is stable when it clears the adaptive cutoff and, if
    /// prior-frame data exists, has an accepted counterpart within the
    /// proximity radius whose strength changed by no more than the band.
    /// The first frame after `init` has no prior data and accepts all
    /// cutoff survivors.
    fn is_stable(&self, point: &InterestPoint, cutoff: f32) -> bool {
        if point.strength < cutoff {
            return false;
        }
        if self.frames_seen == 0 {
            return true;
        }

        let radius_sq = self.cfg.proximity_radius * self.cfg.proximity_radius;
        self.prev_accepted.iter().any(|prev| {
            let dx = point.x - prev.x;
            let dy = point.y - prev.y;
            if dx * dx + dy * dy > radius_sq {
                return false;
            }
            let ratio = point.strength / prev.strength.max(f32::EPSILON);
            ratio <= self.cfg.strength_band && ratio >= 1.0 / self.cfg.strength_band
        })
    }

    /// Unrejected points of the current frame, in detection order.
    /// A per-frame snapshot: the next `process_frame` replaces it.
    pub fn interest_points(&self) -> impl Iterator<Item = &InterestPoint> {
        self.points.iter().filter(|p| !p.rejected)
    }

    /// All evaluated candidates of the current frame, rejected ones
    /// included. Diagnostics only.
    pub fn all_points(&self) -> &[InterestPoint] {
        &self.points
    }

    pub fn config(&self) -> &HarrisConfig {
        &self.cfg
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cfg.width, self.cfg.height)
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(width: usize, height: usize) -> HarrisConfig {
        let mut cfg = HarrisConfig::new(width, height);
        cfg.min_strength = 1.0;
        cfg.n_threads = 1;
        cfg
    }

    fn blank_image(width: usize, height: usize) -> Image {
        vec![128; width * height]
    }

    /// Bright square with its top-left corner at (cx, cy)
    fn square_image(width: usize, height: usize, cx: usize, cy: usize) -> Image {
        let mut img = vec![50; width * height];
        for dy in 0..5 {
            for dx in 0..5 {
                let x = cx + dx;
                let y = cy + dy;
                if x < width && y < height {
                    img[y * width + x] = 255;
                }
            }
        }
        img
    }

    fn new_buffer(width: usize, height: usize) -> HarrisBuffer {
        HarrisBuffer::new(test_config(width, height)).unwrap()
    }

    #[test]
    fn test_construction_validates_config() {
        assert!(HarrisBuffer::new(test_config(40, 40)).is_ok());
        assert!(matches!(
            HarrisBuffer::new(test_config(6, 6)),
            Err(HarrisError::ImageTooSmall { .. })
        ));
        assert!(matches!(
            HarrisBuffer::new(test_config(0, 40)),
            Err(HarrisError::InvalidImageSize { .. })
        ));
    }

    #[test]
    fn test_init_rejects_wrong_geometry_then_accepts_correct() {
        let mut buf = new_buffer(40, 40);
        let wrong = blank_image(20, 20);
        assert!(matches!(buf.init(&wrong), Err(HarrisError::InvalidImageData { .. })));

        let right = blank_image(40, 40);
        assert!(buf.init(&right).is_ok());
    }

    #[test]
    fn test_process_frame_requires_init() {
        let mut buf = new_buffer(40, 40);
        let img = blank_image(40, 40);
        assert!(matches!(buf.process_frame(&img, None), Err(HarrisError::NotInitialized)));
    }

    #[test]
    fn test_interest_points_never_contain_rejected() {
        let mut buf = new_buffer(40, 40);
        let a = square_image(40, 40, 10, 10);
        buf.init(&a).unwrap();
        buf.process_frame(&a, None).unwrap();
        // Move the square far beyond the proximity radius: every candidate
        // in the second frame must be evaluated and rejected
        let b = square_image(40, 40, 28, 28);
        buf.process_frame(&b, None).unwrap();

        assert!(buf.interest_points().all(|p| !p.rejected));
        for p in buf.all_points() {
            assert!(p.rejected);
        }
    }

    #[test]
    fn test_first_frame_accepts_cutoff_survivors() {
        let mut buf = new_buffer(40, 40);
        let img = square_image(40, 40, 15, 15);
        buf.init(&img).unwrap();
        buf.process_frame(&img, None).unwrap();
        assert!(buf.interest_points().count() > 0);
    }

    #[test]
    fn test_static_corners_stay_accepted() {
        let mut buf = new_buffer(40, 40);
        let img = square_image(40, 40, 15, 15);
        buf.init(&img).unwrap();
        buf.process_frame(&img, None).unwrap();
        let first = buf.interest_points().count();
        buf.process_frame(&img, None).unwrap();
        let second = buf.interest_points().count();
        assert!(first > 0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_small_motion_keeps_points_large_motion_rejects() {
        let mut buf = new_buffer(60, 60);
        buf.init(&blank_image(60, 60)).unwrap();
        buf.process_frame(&square_image(60, 60, 20, 20), None).unwrap();
        assert!(buf.interest_points().count() > 0);

        // 2 pixels of motion is within the default proximity radius
        buf.process_frame(&square_image(60, 60, 22, 20), None).unwrap();
        assert!(buf.interest_points().count() > 0);

        // A 25-pixel jump is not
        buf.process_frame(&square_image(60, 60, 47, 20), None).unwrap();
        assert_eq!(buf.interest_points().count(), 0);
        assert!(!buf.all_points().is_empty());
    }

    #[test]
    fn test_failed_frame_preserves_state() {
        let mut buf = new_buffer(40, 40);
        let img = square_image(40, 40, 15, 15);
        buf.init(&img).unwrap();
        buf.process_frame(&img, None).unwrap();
        let before: Vec<_> = buf.interest_points().map(|p| (p.x, p.y)).collect();
        let frames = buf.frames_seen();

        let malformed = blank_image(10, 10);
        assert!(buf.process_frame(&malformed, None).is_err());

        let after: Vec<_> = buf.interest_points().map(|p| (p.x, p.y)).collect();
        assert_eq!(before, after);
        assert_eq!(buf.frames_seen(), frames);
    }

    #[test]
    fn test_init_resets_cross_frame_state() {
        let mut buf = new_buffer(40, 40);
        let img = square_image(40, 40, 15, 15);
        buf.init(&img).unwrap();
        buf.process_frame(&img, None).unwrap();
        assert_eq!(buf.frames_seen(), 1);

        buf.init(&img).unwrap();
        assert_eq!(buf.frames_seen(), 0);
        assert_eq!(buf.interest_points().count(), 0);
        assert!(buf.all_points().is_empty());
    }

    #[test]
    fn test_blank_frame_yields_empty_snapshot() {
        // Transient detection failure is not an error
        let mut buf = new_buffer(40, 40);
        let img = blank_image(40, 40);
        buf.init(&img).unwrap();
        assert!(buf.process_frame(&img, None).is_ok());
        assert_eq!(buf.interest_points().count(), 0);
    }

    #[test]
    fn test_thread_count_does_not_change_results() {
        let frames = [
            square_image(60, 60, 20, 20),
            square_image(60, 60, 22, 20),
            square_image(60, 60, 24, 21),
        ];

        let run = |n_threads: usize| {
            let mut cfg = test_config(60, 60);
            cfg.n_threads = n_threads;
            let mut buf = HarrisBuffer::new(cfg).unwrap();
            buf.init(&frames[0]).unwrap();
            let mut seen = Vec::new();
            for frame in &frames {
                buf.process_frame(frame, None).unwrap();
                seen.push(
                    buf.all_points()
                        .iter()
                        .map(|p| (p.x.to_bits(), p.y.to_bits(), p.strength.to_bits(), p.rejected))
                        .collect::<Vec<_>>(),
                );
            }
            seen
        };

        let serial = run(1);
        let parallel = run(4);
        assert!(serial.iter().any(|frame| !frame.is_empty()));
        assert_eq!(serial, parallel);
    }

    #[test]
    fn test_roi_limits_detection() {
        let mut buf = new_buffer(60, 60);
        let img = square_image(60, 60, 20, 20);
        buf.init(&img).unwrap();
        buf.process_frame(&img, Some(Rect::new(40, 40, 20, 20))).unwrap();
        assert_eq!(buf.interest_points().count(), 0);
    }
}
