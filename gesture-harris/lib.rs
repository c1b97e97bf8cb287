mod buffer;
mod config;
mod detection;
mod error;

pub use buffer::HarrisBuffer;
pub use config::HarrisConfig;
pub use error::{HarrisError, HarrisResult};
