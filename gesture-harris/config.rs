use crate::error::{HarrisError, HarrisResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunable parameters for detection and cross-frame stability filtering.
///
/// The numeric defaults are calibration targets, not ground truth; they are
/// meant to be adjusted against reference recordings.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HarrisConfig {
    /// Image dimensions the buffer is configured for
    pub width: usize,
    pub height: usize,
    /// Candidate floor relative to the strongest response in the frame
    pub relative_cutoff: f32,
    /// Absolute floor below which a response is never a candidate
    pub min_strength: f32,
    /// Minimum distance between surviving candidates (non-maximum suppression)
    pub nms_radius: f32,
    /// Maximum distance to a previous-frame accepted point for continuity
    pub proximity_radius: f32,
    /// Allowed strength ratio between a candidate and its prior counterpart
    pub strength_band: f32,
    /// Worker threads for the row-parallel scan
    pub n_threads: usize,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl HarrisConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            relative_cutoff: 0.05,
            min_strength: 50.0,
            nms_radius: 3.0,
            proximity_radius: 8.0,
            strength_band: 4.0,
            n_threads: 1,
            name: None,
        }
    }

    /// Permissive preset: keeps weaker corners and tolerates larger
    /// frame-to-frame motion. Suited to fast hand movement.
    pub fn permissive_preset(width: usize, height: usize) -> Self {
        Self {
            relative_cutoff: 0.02,
            min_strength: 20.0,
            nms_radius: 3.0,
            proximity_radius: 14.0,
            strength_band: 8.0,
            n_threads: gesture_core::default_threads(),
            name: Some("Permissive".to_string()),
            ..Self::new(width, height)
        }
    }

    /// Strict preset: only strong, slowly moving corners survive.
    pub fn strict_preset(width: usize, height: usize) -> Self {
        Self {
            relative_cutoff: 0.10,
            min_strength: 100.0,
            nms_radius: 5.0,
            proximity_radius: 5.0,
            strength_band: 2.0,
            n_threads: gesture_core::default_threads(),
            name: Some("Strict".to_string()),
            ..Self::new(width, height)
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "HarrisConfig: {}x{}, cutoff={:.3} (floor {:.1}), nms={:.1}, proximity={:.1}, band={:.1}, threads={}",
            self.width, self.height, self.relative_cutoff, self.min_strength,
            self.nms_radius, self.proximity_radius, self.strength_band, self.n_threads
        )
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> HarrisResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(HarrisError::InvalidImageSize { width: self.width, height: self.height });
        }
        if !(self.relative_cutoff > 0.0 && self.relative_cutoff < 1.0) {
            return Err(HarrisError::InvalidCutoff(self.relative_cutoff));
        }
        if !(self.min_strength > 0.0) {
            return Err(HarrisError::InvalidMinStrength(self.min_strength));
        }
        if !(self.nms_radius > 0.0) {
            return Err(HarrisError::InvalidNmsRadius(self.nms_radius));
        }
        if !(self.proximity_radius > 0.0) {
            return Err(HarrisError::InvalidProximityRadius(self.proximity_radius));
        }
        if !(self.strength_band > 1.0) {
            return Err(HarrisError::InvalidStrengthBand(self.strength_band));
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HarrisConfig::new(640, 480).validate().is_ok());
        assert!(HarrisConfig::permissive_preset(640, 480).validate().is_ok());
        assert!(HarrisConfig::strict_preset(640, 480).validate().is_ok());
    }

    #[test]
    fn test_invalid_dimensions() {
        let cfg = HarrisConfig::new(0, 480);
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidImageSize { .. })));
    }

    #[test]
    fn test_invalid_cutoff() {
        let mut cfg = HarrisConfig::new(640, 480);
        cfg.relative_cutoff = 1.5;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidCutoff(_))));

        cfg.relative_cutoff = 0.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidCutoff(_))));
    }

    #[test]
    fn test_invalid_min_strength() {
        let mut cfg = HarrisConfig::new(640, 480);
        cfg.min_strength = 0.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidMinStrength(_))));

        cfg.min_strength = -5.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidMinStrength(_))));
    }

    #[test]
    fn test_invalid_nms_radius() {
        // A zero radius would silently disable suppression
        let mut cfg = HarrisConfig::new(640, 480);
        cfg.nms_radius = 0.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidNmsRadius(_))));

        cfg.nms_radius = -1.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidNmsRadius(_))));
    }

    #[test]
    fn test_invalid_continuity_parameters() {
        let mut cfg = HarrisConfig::new(640, 480);
        cfg.proximity_radius = 0.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidProximityRadius(_))));

        let mut cfg = HarrisConfig::new(640, 480);
        cfg.strength_band = 1.0;
        assert!(matches!(cfg.validate(), Err(HarrisError::InvalidStrengthBand(_))));
    }
}
