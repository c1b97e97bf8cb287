use gesture_core::{GestureLabel, HandPosition, Image};
use gesture_harris::HarrisConfig;

use crate::engine::{EngineState, InfEngine};
use crate::error::{EngineError, EngineResult};
use crate::features::{FeatureProcessor, FEATURE_LEN};
use crate::model::GestureModel;

/// Accepted interest point exported for external rendering
#[derive(Debug, Clone, Copy)]
pub struct OverlayPoint {
    pub x: f32,
    pub y: f32,
    pub strength: f32,
}

/// The per-frame entry point to the recognition pipeline.
///
/// Owns one feature processor and one inference engine, constructed once.
/// Consumers call `update` for every sensor frame and `reset` to cancel
/// the current gesture sequence.
pub struct GestureProcessor {
    features: FeatureProcessor,
    engine: InfEngine,
    overlay: Vec<OverlayPoint>,
}

impl GestureProcessor {
    /// Construct for a fixed frame geometry and a loaded model
    pub fn new(width: usize, height: usize, model: GestureModel) -> EngineResult<Self> {
        Self::with_config(HarrisConfig::new(width, height), model)
    }

    /// Construct with custom detection/stability tuning
    pub fn with_config(cfg: HarrisConfig, model: GestureModel) -> EngineResult<Self> {
        if model.feature_len != FEATURE_LEN {
            return Err(EngineError::FeatureLenMismatch {
                expected: FEATURE_LEN,
                actual: model.feature_len,
            });
        }
        Ok(Self {
            features: FeatureProcessor::new(cfg)?,
            engine: InfEngine::new(model)?,
            overlay: Vec::new(),
        })
    }

    /// Feed one frame: hand position, depth/intensity image, skin mask.
    ///
    /// `visualize` only controls whether the overlay side channel is
    /// refreshed; it never affects the returned label.
    pub fn update(
        &mut self,
        x: f32,
        y: f32,
        z: f32,
        image: &Image,
        skin: &Image,
        visualize: bool,
    ) -> EngineResult<GestureLabel> {
        let fv = self.features.compute(HandPosition::new(x, y, z), image, skin)?;

        if visualize {
            self.overlay = self
                .features
                .interest_points()
                .map(|p| OverlayPoint { x: p.x, y: p.y, strength: p.strength })
                .collect();
        } else {
            self.overlay.clear();
        }

        self.engine.update(&fv)
    }

    /// Cancel the current gesture sequence. Detection is frame-local and
    /// self-correcting, so only the engine's temporal state is cleared.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Declared engine cadence in Hz
    pub fn sample_rate(&self) -> u32 {
        self.engine.sample_rate()
    }

    pub fn engine_state(&self) -> EngineState {
        self.engine.state()
    }

    /// Resolve a label against the model vocabulary
    pub fn label_name(&self, label: GestureLabel) -> Option<&str> {
        self.engine.model().label_name(label)
    }

    /// Accepted points of the last visualized frame (position + strength).
    /// Empty unless the preceding `update` was called with `visualize`.
    pub fn overlay(&self) -> &[OverlayPoint] {
        &self.overlay
    }

    pub fn dimensions(&self) -> (usize, usize) {
        self.features.dimensions()
    }
}
