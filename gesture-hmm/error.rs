use gesture_harris::HarrisError;

#[derive(Debug, Clone)]
pub enum EngineError {
    Harris(HarrisError),
    FrameSizeMismatch { expected_len: usize, actual_len: usize },
    MaskSizeMismatch { image_len: usize, mask_len: usize },
    FeatureLenMismatch { expected: usize, actual: usize },
    EmptyModel,
    StateCountMismatch { field: &'static str, expected: usize, actual: usize },
    EmissionDimMismatch { state: usize, expected: usize, actual: usize },
    BadPriorSum { sum: f64 },
    BadTransitionRow { state: usize, sum: f64 },
    BadStateLabel { state: usize, label: usize, n_labels: usize },
    NonPositiveVariance { state: usize, dim: usize },
    InvalidMinContext(usize),
    InvalidDecisionThreshold(f64),
    InvalidSampleRate(u32),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Harris(e) => write!(f, "Interest-point buffer error: {}", e),
            EngineError::FrameSizeMismatch { expected_len, actual_len } => {
                write!(f, "Frame length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            EngineError::MaskSizeMismatch { image_len, mask_len } => {
                write!(f, "Skin mask length {} does not match image length {}", mask_len, image_len)
            }
            EngineError::FeatureLenMismatch { expected, actual } => {
                write!(f, "Feature vector length mismatch: expected {}, got {}", expected, actual)
            }
            EngineError::EmptyModel => {
                write!(f, "Model has no labels or no hidden states")
            }
            EngineError::StateCountMismatch { field, expected, actual } => {
                write!(f, "Model field '{}' has {} entries, expected {}", field, actual, expected)
            }
            EngineError::EmissionDimMismatch { state, expected, actual } => {
                write!(f, "Emission parameters of state {} have {} dims, expected {}", state, actual, expected)
            }
            EngineError::BadPriorSum { sum } => {
                write!(f, "State prior does not sum to 1 (sum = {})", sum)
            }
            EngineError::BadTransitionRow { state, sum } => {
                write!(f, "Transition row {} does not sum to 1 (sum = {})", state, sum)
            }
            EngineError::BadStateLabel { state, label, n_labels } => {
                write!(f, "State {} maps to label {} but the vocabulary has {} labels", state, label, n_labels)
            }
            EngineError::NonPositiveVariance { state, dim } => {
                write!(f, "Variance of state {} dim {} must be > 0", state, dim)
            }
            EngineError::InvalidMinContext(n) => {
                write!(f, "Invalid minimum context length: {} (must be >= 1)", n)
            }
            EngineError::InvalidDecisionThreshold(t) => {
                write!(f, "Invalid decision threshold: {} (must be in [0, 1])", t)
            }
            EngineError::InvalidSampleRate(r) => {
                write!(f, "Invalid sample rate: {} Hz (must be > 0)", r)
            }
        }
    }
}

impl std::error::Error for EngineError {}

impl From<HarrisError> for EngineError {
    fn from(err: HarrisError) -> Self {
        EngineError::Harris(err)
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
