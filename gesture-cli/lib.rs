use gesture_core::{HandPosition, Image};
use gesture_harris::HarrisError;
use gesture_hmm::{EngineError, GestureModel, FEATURE_LEN};

pub use gesture_core::{self, GestureLabel, InterestPoint};
pub use gesture_harris::{HarrisBuffer, HarrisConfig};
pub use gesture_hmm::{EngineState, GestureModel as Model, GestureProcessor, InfEngine, OverlayPoint};

#[derive(Debug)]
pub enum GestureError {
    Engine(EngineError),
    Harris(HarrisError),
}

impl std::fmt::Display for GestureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GestureError::Engine(e) => write!(f, "Engine error: {}", e),
            GestureError::Harris(e) => write!(f, "Harris error: {}", e),
        }
    }
}

impl std::error::Error for GestureError {}

impl From<EngineError> for GestureError {
    fn from(err: EngineError) -> Self {
        GestureError::Engine(err)
    }
}

impl From<HarrisError> for GestureError {
    fn from(err: HarrisError) -> Self {
        GestureError::Harris(err)
    }
}

pub type GestureResult<T> = Result<T, GestureError>;

/// Builds a ready-to-run processor from explicit tuning and a model.
///
/// Validates the tuning up front so a bad parameter surfaces here as a
/// [`GestureError::Harris`] rather than deep inside the first frame.
pub fn build_pipeline(cfg: HarrisConfig, model: Model) -> GestureResult<GestureProcessor> {
    cfg.validate()?;
    Ok(GestureProcessor::with_config(cfg, model)?)
}

/// Synthetic sensor: a bright hand-sized block sweeping horizontally with
/// a matching skin mask and a hand position that follows the block.
pub struct DemoStream {
    width: usize,
    height: usize,
    t: usize,
}

impl DemoStream {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, t: 0 }
    }

    /// Produce the next frame of the sweep
    pub fn next_frame(&mut self) -> (HandPosition, Image, Image) {
        let span = self.width.saturating_sub(40).max(1);
        let cx = 10 + (self.t * 3) % span;
        let cy = self.height / 2;
        self.t += 1;

        let mut image = vec![40u8; self.width * self.height];
        let mut skin = vec![0u8; self.width * self.height];
        for dy in 0..16 {
            for dx in 0..16 {
                let x = cx + dx;
                let y = cy + dy;
                if x < self.width && y < self.height {
                    image[y * self.width + x] = 230;
                    skin[y * self.width + x] = 255;
                }
            }
        }

        let hand = HandPosition::new(
            cx as f32 / self.width as f32,
            cy as f32 / self.height as f32,
            1.0,
        );
        (hand, image, skin)
    }
}

/// Built-in two-gesture model so the demo runs without a model file.
///
/// "sweep" matches the moving-block prototype the [`DemoStream`] emits;
/// "still" matches a centered hand over a featureless frame. Variances are
/// deliberately wide — this is a smoke-test model, not a trained one.
pub fn demo_model() -> GestureModel {
    let mut still_mean = vec![0.0; FEATURE_LEN];
    still_mean[0] = 0.5; // hand x
    still_mean[1] = 0.5; // hand y
    still_mean[2] = 1.0; // hand z

    let mut sweep_mean = vec![0.0; FEATURE_LEN];
    sweep_mean[0] = 0.5;
    sweep_mean[1] = 0.5;
    sweep_mean[2] = 1.0;
    sweep_mean[3] = 0.001; // small skin patch
    sweep_mean[4] = 0.9; // bright hand pixels
    sweep_mean[6] = 4.0; // a few stable corners
    sweep_mean[7] = 14.0; // log-compressed Harris strength
    sweep_mean[11] = 0.02;

    GestureModel {
        labels: vec!["still".to_string(), "sweep".to_string()],
        feature_len: FEATURE_LEN,
        prior: vec![0.5, 0.5],
        transition: vec![vec![0.9, 0.1], vec![0.1, 0.9]],
        means: vec![still_mean, sweep_mean],
        variances: vec![vec![4.0; FEATURE_LEN], vec![4.0; FEATURE_LEN]],
        state_labels: vec![0, 1],
        min_context: 5,
        decision_threshold: 0.4,
        sample_rate: 30,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_model_is_valid() {
        assert!(demo_model().validate().is_ok());
    }

    #[test]
    fn test_demo_stream_geometry() {
        let mut stream = DemoStream::new(320, 240);
        for _ in 0..5 {
            let (hand, image, skin) = stream.next_frame();
            assert_eq!(image.len(), 320 * 240);
            assert_eq!(skin.len(), image.len());
            assert!((0.0..=1.0).contains(&hand.x));
        }
    }

    #[test]
    fn test_build_pipeline_succeeds() {
        let proc = build_pipeline(HarrisConfig::new(160, 120), demo_model()).unwrap();
        assert_eq!(proc.dimensions(), (160, 120));
    }

    #[test]
    fn test_build_pipeline_rejects_bad_tuning() {
        let mut cfg = HarrisConfig::new(160, 120);
        cfg.nms_radius = 0.0;
        assert!(matches!(
            build_pipeline(cfg, demo_model()),
            Err(GestureError::Harris(_))
        ));
    }

    #[test]
    fn test_build_pipeline_rejects_model_shape() {
        let mut model = demo_model();
        model.feature_len = 3;
        model.means = vec![vec![0.0; 3], vec![0.0; 3]];
        model.variances = vec![vec![1.0; 3], vec![1.0; 3]];
        assert!(matches!(
            build_pipeline(HarrisConfig::new(160, 120), model),
            Err(GestureError::Engine(_))
        ));
    }

    #[test]
    fn test_demo_stream_drives_pipeline() {
        let mut stream = DemoStream::new(160, 120);
        let mut proc = build_pipeline(HarrisConfig::new(160, 120), demo_model()).unwrap();
        for i in 0..10 {
            let (hand, image, skin) = stream.next_frame();
            let label = proc.update(hand.x, hand.y, hand.z, &image, &skin, false).unwrap();
            if i + 1 < 5 {
                assert_eq!(label, GestureLabel::Unknown);
            }
        }
        assert_eq!(proc.engine_state(), EngineState::Classifying);
    }
}
