use thiserror::Error;

/// Invalid calibration inputs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("outcome_window_seconds must be non-negative, got {0}")]
    NegativeWindow(i64),

    #[error("min_samples must be >= 1")]
    ZeroMinSamples,

    #[error("{name} must be within [0, 1], got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;
