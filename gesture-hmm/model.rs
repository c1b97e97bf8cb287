use gesture_core::GestureLabel;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Tolerance for stochastic-vector sums in model validation
const SUM_TOLERANCE: f64 = 1e-6;

/// Trained gesture model: label vocabulary plus hidden-Markov parameters
/// with diagonal-Gaussian emissions.
///
/// The file format is plain serde JSON (or TOML); training happens
/// elsewhere. Hidden states outnumber labels — `state_labels` maps each
/// state to the gesture it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureModel {
    /// Gesture vocabulary; `GestureLabel::Gesture(i)` indexes this list
    pub labels: Vec<String>,
    /// Expected feature-vector length
    pub feature_len: usize,
    /// Initial state distribution
    pub prior: Vec<f64>,
    /// Row-stochastic state transition matrix
    pub transition: Vec<Vec<f64>>,
    /// Per-state emission means
    pub means: Vec<Vec<f64>>,
    /// Per-state diagonal emission variances
    pub variances: Vec<Vec<f64>>,
    /// Hidden state -> label index
    pub state_labels: Vec<usize>,
    /// Frames of context required before classification starts
    pub min_context: usize,
    /// Minimum label posterior; anything weaker reports Unknown
    pub decision_threshold: f64,
    /// Declared update cadence in Hz, independent of sensor frame rate
    pub sample_rate: u32,
}

impl GestureModel {
    pub fn n_states(&self) -> usize {
        self.prior.len()
    }

    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Resolve a label to its vocabulary name
    pub fn label_name(&self, label: GestureLabel) -> Option<&str> {
        label.index().and_then(|i| self.labels.get(i)).map(|s| s.as_str())
    }

    /// Validate model parameters
    pub fn validate(&self) -> EngineResult<()> {
        let n = self.n_states();
        if self.labels.is_empty() || n == 0 {
            return Err(EngineError::EmptyModel);
        }

        let prior_sum: f64 = self.prior.iter().sum();
        if (prior_sum - 1.0).abs() > SUM_TOLERANCE || self.prior.iter().any(|p| *p < 0.0) {
            return Err(EngineError::BadPriorSum { sum: prior_sum });
        }

        if self.transition.len() != n {
            return Err(EngineError::StateCountMismatch {
                field: "transition",
                expected: n,
                actual: self.transition.len(),
            });
        }
        for (s, row) in self.transition.iter().enumerate() {
            if row.len() != n {
                return Err(EngineError::StateCountMismatch {
                    field: "transition row",
                    expected: n,
                    actual: row.len(),
                });
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > SUM_TOLERANCE || row.iter().any(|p| *p < 0.0) {
                return Err(EngineError::BadTransitionRow { state: s, sum });
            }
        }

        for (field, values) in [("means", &self.means), ("variances", &self.variances)] {
            if values.len() != n {
                return Err(EngineError::StateCountMismatch {
                    field,
                    expected: n,
                    actual: values.len(),
                });
            }
            for (s, row) in values.iter().enumerate() {
                if row.len() != self.feature_len {
                    return Err(EngineError::EmissionDimMismatch {
                        state: s,
                        expected: self.feature_len,
                        actual: row.len(),
                    });
                }
            }
        }
        for (s, row) in self.variances.iter().enumerate() {
            for (d, v) in row.iter().enumerate() {
                if !(*v > 0.0) {
                    return Err(EngineError::NonPositiveVariance { state: s, dim: d });
                }
            }
        }

        if self.state_labels.len() != n {
            return Err(EngineError::StateCountMismatch {
                field: "state_labels",
                expected: n,
                actual: self.state_labels.len(),
            });
        }
        for (s, &l) in self.state_labels.iter().enumerate() {
            if l >= self.n_labels() {
                return Err(EngineError::BadStateLabel { state: s, label: l, n_labels: self.n_labels() });
            }
        }

        if self.min_context == 0 {
            return Err(EngineError::InvalidMinContext(self.min_context));
        }
        if !(0.0..=1.0).contains(&self.decision_threshold) {
            return Err(EngineError::InvalidDecisionThreshold(self.decision_threshold));
        }
        if self.sample_rate == 0 {
            return Err(EngineError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Log-density of the diagonal-Gaussian emission of `state` at `fv`
    pub fn log_emission(&self, state: usize, fv: &[f64]) -> f64 {
        const LN_2PI: f64 = 1.8378770664093453;
        let mean = &self.means[state];
        let var = &self.variances[state];
        let mut acc = 0.0;
        for d in 0..self.feature_len {
            let diff = fv[d] - mean[d];
            acc += -0.5 * (LN_2PI + var[d].ln() + diff * diff / var[d]);
        }
        acc
    }

    /// Load model from JSON file
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    /// Save model to JSON file
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load model from TOML file
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let model: Self = toml::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    /// Save model to TOML file
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let toml = toml::to_string_pretty(self)?;
        std::fs::write(path, toml)?;
        Ok(())
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let model: Self = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_state_model() -> GestureModel {
        GestureModel {
            labels: vec!["left".to_string(), "right".to_string()],
            feature_len: 2,
            prior: vec![0.5, 0.5],
            transition: vec![vec![0.9, 0.1], vec![0.1, 0.9]],
            means: vec![vec![-1.0, 0.0], vec![1.0, 0.0]],
            variances: vec![vec![1.0, 1.0], vec![1.0, 1.0]],
            state_labels: vec![0, 1],
            min_context: 3,
            decision_threshold: 0.4,
            sample_rate: 30,
        }
    }

    #[test]
    fn test_valid_model() {
        assert!(two_state_model().validate().is_ok());
    }

    #[test]
    fn test_bad_transition_row() {
        let mut m = two_state_model();
        m.transition[1] = vec![0.6, 0.6];
        assert!(matches!(m.validate(), Err(EngineError::BadTransitionRow { state: 1, .. })));
    }

    #[test]
    fn test_bad_prior() {
        let mut m = two_state_model();
        m.prior = vec![0.2, 0.2];
        assert!(matches!(m.validate(), Err(EngineError::BadPriorSum { .. })));
    }

    #[test]
    fn test_non_positive_variance() {
        let mut m = two_state_model();
        m.variances[0][1] = 0.0;
        assert!(matches!(
            m.validate(),
            Err(EngineError::NonPositiveVariance { state: 0, dim: 1 })
        ));
    }

    #[test]
    fn test_state_label_out_of_range() {
        let mut m = two_state_model();
        m.state_labels[1] = 5;
        assert!(matches!(m.validate(), Err(EngineError::BadStateLabel { .. })));
    }

    #[test]
    fn test_emission_dim_mismatch() {
        let mut m = two_state_model();
        m.means[0] = vec![0.0; 7];
        assert!(matches!(m.validate(), Err(EngineError::EmissionDimMismatch { state: 0, .. })));
    }

    #[test]
    fn test_label_name_resolution() {
        let m = two_state_model();
        assert_eq!(m.label_name(GestureLabel::Gesture(1)), Some("right"));
        assert_eq!(m.label_name(GestureLabel::Gesture(9)), None);
        assert_eq!(m.label_name(GestureLabel::Unknown), None);
    }

    #[test]
    fn test_emission_peaks_at_mean() {
        let m = two_state_model();
        let at_mean = m.log_emission(0, &[-1.0, 0.0]);
        let off_mean = m.log_emission(0, &[2.0, 0.0]);
        assert!(at_mean > off_mean);
    }

    #[test]
    fn test_json_round_trip_validates() {
        let m = two_state_model();
        let json = serde_json::to_string(&m).unwrap();
        let restored = GestureModel::from_json(&json).unwrap();
        assert_eq!(restored.labels, m.labels);
        assert_eq!(restored.n_states(), 2);
        assert_eq!(restored.sample_rate, 30);
    }

    #[test]
    fn test_invalid_json_model_rejected() {
        let mut m = two_state_model();
        m.min_context = 0;
        let json = serde_json::to_string(&m).unwrap();
        assert!(GestureModel::from_json(&json).is_err());
    }
}
