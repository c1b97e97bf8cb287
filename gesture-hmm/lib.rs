mod engine;
mod error;
mod features;
mod model;
mod processor;

pub use engine::{EngineState, InfEngine, HYSTERESIS_MARGIN};
pub use error::{EngineError, EngineResult};
pub use features::{aggregate, FeatureProcessor, FEATURE_LEN};
pub use model::GestureModel;
pub use processor::{GestureProcessor, OverlayPoint};
