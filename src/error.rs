//! Error taxonomy for coil construction, field statistics and study loading.
use thiserror::Error;

/// Errors raised by the solver, the models and the study loader.
///
/// Input problems fail fast here instead of being clamped. Singular segment
/// contributions are not errors; the Biot-Savart kernel skips them.
#[derive(Error, Debug)]
pub enum CoilError {
    #[error("loop radius must be positive, got {radius} m")]
    NonPositiveRadius { radius: f64 },

    #[error("loop turn count must be at least 1")]
    ZeroTurns,

    #[error("critical temperature must be positive, got {tc} K")]
    NonPositiveCriticalTemperature { tc: f64 },

    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// Mean field too close to zero for a relative ripple to mean anything.
    #[error("ripple undefined for near-zero mean field {mean:e} T")]
    UndefinedRipple { mean: f64 },

    #[error("field sample contains no points")]
    EmptySample,

    #[error("Length mismatch")]
    LengthMismatch,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoilResult<T> = Result<T, CoilError>;

/// Reject values that are not finite and strictly positive.
pub(crate) fn require_positive(name: &'static str, value: f64) -> CoilResult<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(CoilError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}

/// Reject values that are not finite and non-negative.
pub(crate) fn require_non_negative(name: &'static str, value: f64) -> CoilResult<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(CoilError::InvalidParameter {
            name,
            value,
            reason: "must be finite and non-negative",
        })
    }
}
