//! Optional stress cross-validation.
//!
//! A [`StressOracle`] maps a configuration to a peak mechanical stress. External
//! finite-element backends plug in through the trait; [`HoopStressOracle`] is the
//! lumped built-in. Feasibility never depends on an oracle: an unavailable backend
//! is recorded and the evaluation carries on.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::require_positive;
use crate::search::Configuration;

/// Peak stress returned by an oracle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressEstimate {
    /// (Pa)
    pub peak_stress: f64,
    /// Set when the estimate comes from a low-confidence model or run
    pub uncertain: bool,
}

/// Why an oracle produced no estimate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("stress backend unavailable: {0}")]
    Unavailable(String),

    #[error("stress backend rejected the configuration: {0}")]
    Rejected(String),
}

/// A backend that can estimate peak stress for a configuration.
pub trait StressOracle: Sync {
    /// # Arguments
    ///
    /// * `config`: the evaluated configuration
    /// * `peak_field`: (T) largest sampled field magnitude for the configuration
    fn peak_stress(
        &self,
        config: &Configuration,
        peak_field: f64,
    ) -> Result<StressEstimate, OracleError>;
}

/// Outcome of the cross-validation step for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CrossValidation {
    /// No oracle was supplied.
    NotRequested,
    /// The oracle could not produce an estimate.
    Unavailable { reason: String },
    Available(StressEstimate),
}

impl CrossValidation {
    pub(crate) fn run(
        oracle: Option<&dyn StressOracle>,
        config: &Configuration,
        peak_field: f64,
    ) -> Self {
        match oracle {
            None => CrossValidation::NotRequested,
            Some(oracle) => match oracle.peak_stress(config, peak_field) {
                Ok(estimate) => CrossValidation::Available(estimate),
                Err(e) => {
                    log::warn!("stress cross-validation skipped: {e}");
                    CrossValidation::Unavailable {
                        reason: e.to_string(),
                    }
                }
            },
        }
    }
}

/// Lumped hoop stress `sigma = J * B * R` with `J = I / (tape_width * tape_thickness)`.
///
/// Always flagged uncertain; it ignores support structure and stress sharing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HoopStressOracle {
    /// (m)
    pub tape_width: f64,
    /// (m)
    pub tape_thickness: f64,
}

impl Default for HoopStressOracle {
    /// 4 mm x 0.1 mm tape.
    fn default() -> Self {
        Self {
            tape_width: 4e-3,
            tape_thickness: 1e-4,
        }
    }
}

impl StressOracle for HoopStressOracle {
    fn peak_stress(
        &self,
        config: &Configuration,
        peak_field: f64,
    ) -> Result<StressEstimate, OracleError> {
        let area = require_positive("tape_width", self.tape_width)
            .and_then(|w| require_positive("tape_thickness", self.tape_thickness).map(|t| w * t))
            .map_err(|e| OracleError::Rejected(e.to_string()))?;
        let j = config.current.abs() / area; // [A/m^2]
        Ok(StressEstimate {
            peak_stress: j * peak_field.abs() * config.outer_radius(),
            uncertain: true,
        })
    }
}
