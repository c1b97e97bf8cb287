#[derive(Debug, Clone)]
pub enum HarrisError {
    InvalidImageSize { width: usize, height: usize },
    ImageTooSmall { width: usize, height: usize, min_size: usize },
    InvalidImageData { expected_len: usize, actual_len: usize },
    InvalidCutoff(f32),
    InvalidMinStrength(f32),
    InvalidNmsRadius(f32),
    InvalidProximityRadius(f32),
    InvalidStrengthBand(f32),
    NotInitialized,
    ThreadPool(String),
}

impl std::fmt::Display for HarrisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HarrisError::InvalidImageSize { width, height } => {
                write!(f, "Invalid image dimensions: {}x{} (must be > 0)", width, height)
            }
            HarrisError::ImageTooSmall { width, height, min_size } => {
                write!(f, "Image {}x{} too small (minimum {}x{})", width, height, min_size, min_size)
            }
            HarrisError::InvalidImageData { expected_len, actual_len } => {
                write!(f, "Image data length mismatch: expected {}, got {}", expected_len, actual_len)
            }
            HarrisError::InvalidCutoff(c) => {
                write!(f, "Invalid relative strength cutoff: {} (must be in (0, 1))", c)
            }
            HarrisError::InvalidMinStrength(s) => {
                write!(f, "Invalid minimum strength: {} (must be > 0)", s)
            }
            HarrisError::InvalidNmsRadius(r) => {
                write!(f, "Invalid suppression radius: {} (must be > 0)", r)
            }
            HarrisError::InvalidProximityRadius(r) => {
                write!(f, "Invalid proximity radius: {} (must be > 0)", r)
            }
            HarrisError::InvalidStrengthBand(b) => {
                write!(f, "Invalid strength continuity band: {} (must be > 1)", b)
            }
            HarrisError::NotInitialized => {
                write!(f, "Buffer not initialized: call init with a valid frame first")
            }
            HarrisError::ThreadPool(msg) => {
                write!(f, "Thread pool error: {}", msg)
            }
        }
    }
}

impl std::error::Error for HarrisError {}

pub type HarrisResult<T> = Result<T, HarrisError>;
