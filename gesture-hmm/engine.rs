use gesture_core::GestureLabel;

use crate::error::{EngineError, EngineResult};
use crate::model::GestureModel;

/// Posterior gap within which the previously emitted label keeps winning.
/// Prevents label flicker on near-equal scores.
pub const HYSTERESIS_MARGIN: f64 = 1e-6;

/// Temporal phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Post-construction / post-reset, no frames consumed
    Initialized,
    /// Consuming frames, context still below the model's minimum
    Accumulating,
    /// Enough context; every update yields a (possibly Unknown) label
    Classifying,
}

/// Sequence classifier: one log-domain HMM forward step per frame.
///
/// All temporal state is held in explicit fields so `reset` is a plain
/// reassignment and runs are trivially reproducible.
pub struct InfEngine {
    model: GestureModel,
    /// Normalized log forward probabilities, one per hidden state
    log_alpha: Vec<f64>,
    frames_seen: usize,
    state: EngineState,
    last_emitted: GestureLabel,
}

impl InfEngine {
    pub fn new(model: GestureModel) -> EngineResult<Self> {
        model.validate()?;
        let mut engine = Self {
            model,
            log_alpha: Vec::new(),
            frames_seen: 0,
            state: EngineState::Initialized,
            last_emitted: GestureLabel::Unknown,
        };
        engine.reset();
        Ok(engine)
    }

    /// Advance the sequence state by one frame and return the current
    /// most probable label, or Unknown while accumulating context or when
    /// no label clears the decision threshold.
    pub fn update(&mut self, fv: &[f64]) -> EngineResult<GestureLabel> {
        if fv.len() != self.model.feature_len {
            return Err(EngineError::FeatureLenMismatch {
                expected: self.model.feature_len,
                actual: fv.len(),
            });
        }

        let n = self.model.n_states();
        let mut next = vec![f64::NEG_INFINITY; n];
        for j in 0..n {
            let mut acc = f64::NEG_INFINITY;
            for i in 0..n {
                let t = self.model.transition[i][j];
                if t > 0.0 {
                    acc = log_add(acc, self.log_alpha[i] + t.ln());
                }
            }
            next[j] = acc + self.model.log_emission(j, fv);
        }

        // Renormalize so exp(log_alpha) stays a proper posterior. If the
        // mass underflowed entirely, fall back to the prior.
        let z = log_sum(&next);
        if z.is_finite() {
            for v in next.iter_mut() {
                *v -= z;
            }
            self.log_alpha = next;
        } else {
            self.log_alpha = self.prior_logs();
        }

        self.frames_seen += 1;
        if self.frames_seen < self.model.min_context {
            self.state = EngineState::Accumulating;
            return Ok(GestureLabel::Unknown);
        }

        if self.state != EngineState::Classifying {
            log::debug!("classification begins at frame {}", self.frames_seen);
        }
        self.state = EngineState::Classifying;
        let label = self.classify();
        if !label.is_unknown() {
            self.last_emitted = label;
        }
        Ok(label)
    }

    /// Label posterior argmax with tie hysteresis
    fn classify(&self) -> GestureLabel {
        let mut log_post = vec![f64::NEG_INFINITY; self.model.n_labels()];
        for (s, &l) in self.model.state_labels.iter().enumerate() {
            log_post[l] = log_add(log_post[l], self.log_alpha[s]);
        }
        let post: Vec<f64> = log_post.iter().map(|lp| lp.exp()).collect();

        let mut best = 0;
        for (l, &p) in post.iter().enumerate() {
            if p > post[best] {
                best = l;
            }
        }

        // Near-equal scores keep the previously emitted label
        if let Some(prev) = self.last_emitted.index() {
            if prev != best && post[best] - post[prev] <= HYSTERESIS_MARGIN {
                best = prev;
            }
        }

        if post[best] < self.model.decision_threshold {
            GestureLabel::Unknown
        } else {
            GestureLabel::Gesture(best as u16)
        }
    }

    /// Clear all temporal state back to the post-construction condition.
    /// Idempotent.
    pub fn reset(&mut self) {
        self.log_alpha = self.prior_logs();
        self.frames_seen = 0;
        self.state = EngineState::Initialized;
        self.last_emitted = GestureLabel::Unknown;
    }

    fn prior_logs(&self) -> Vec<f64> {
        self.model.prior.iter().map(|p| p.ln()).collect()
    }

    /// Declared update cadence in Hz. Advisory: the engine performs no
    /// internal throttling.
    pub fn sample_rate(&self) -> u32 {
        self.model.sample_rate
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn frames_seen(&self) -> usize {
        self.frames_seen
    }

    pub fn model(&self) -> &GestureModel {
        &self.model
    }
}

fn log_add(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let (hi, lo) = if a > b { (a, b) } else { (b, a) };
    hi + (lo - hi).exp().ln_1p()
}

fn log_sum(values: &[f64]) -> f64 {
    values.iter().fold(f64::NEG_INFINITY, |acc, &v| log_add(acc, v))
}
