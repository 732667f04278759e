use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, CalibrationResult};

/// Thresholds for turning labeled outcomes into proposals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPolicy {
    /// Gates with fewer labeled attempts never receive proposals.
    pub min_samples: usize,
    /// `moved_too_early / total` at or above which thresholds and cooldowns
    /// should be raised.
    pub moved_too_early_rate: f64,
    /// `false_negative / total` at or above which thresholds should be
    /// lowered.
    pub false_negative_rate: f64,
}

impl Default for CalibrationPolicy {
    fn default() -> Self {
        Self {
            min_samples: 3,
            moved_too_early_rate: 0.30,
            false_negative_rate: 0.30,
        }
    }
}

impl CalibrationPolicy {
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    pub fn with_moved_too_early_rate(mut self, rate: f64) -> Self {
        self.moved_too_early_rate = rate;
        self
    }

    pub fn with_false_negative_rate(mut self, rate: f64) -> Self {
        self.false_negative_rate = rate;
        self
    }

    pub fn validate(&self) -> CalibrationResult<()> {
        if self.min_samples < 1 {
            return Err(CalibrationError::ZeroMinSamples);
        }
        for (name, value) in [
            ("moved_too_early_rate", self.moved_too_early_rate),
            ("false_negative_rate", self.false_negative_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CalibrationError::RateOutOfRange { name, value });
            }
        }
        Ok(())
    }
}
