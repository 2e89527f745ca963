//! Named pass/fail gates over metrics, thermal balance and critical current.
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, CoilResult};
use crate::metrics::MetricsResult;
use crate::thermal::ThermalBalance;

/// Target thresholds for the gates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// (T) minimum `|b_mean|`
    #[serde(default = "default_min_field")]
    pub min_field: f64,
    /// maximum `ripple_rms`
    #[serde(default = "default_max_ripple")]
    pub max_ripple: f64,
    /// (K) minimum thermal margin
    #[serde(default = "default_min_thermal_margin")]
    pub min_thermal_margin: f64,
}

fn default_min_field() -> f64 {
    5.0
}
fn default_max_ripple() -> f64 {
    0.01
}
fn default_min_thermal_margin() -> f64 {
    0.02
}

impl Default for Thresholds {
    /// 5 T, 1 % ripple, 20 mK margin.
    fn default() -> Self {
        Self {
            min_field: default_min_field(),
            max_ripple: default_max_ripple(),
            min_thermal_margin: default_min_thermal_margin(),
        }
    }
}

/// One gate: its verdict plus the value and threshold that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    pub passed: bool,
    pub value: f64,
    pub threshold: f64,
}

/// Every gate for one configuration, always all four, plus the overall verdict.
///
/// Immutable once assessed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeasibilityReport {
    /// `|b_mean| >= min_field`
    pub field: Gate,
    /// `ripple_rms <= max_ripple`
    pub ripple: Gate,
    /// `thermal_margin >= min_thermal_margin`
    pub thermal_margin: Gate,
    /// `jc > 0`
    pub critical_current: Gate,
    /// (K) temperature at which `jc` was evaluated
    pub operating_temperature: f64,
    /// (T) field at which `jc` was derated
    pub derating_field: f64,
    pub feasible: bool,
}

impl FeasibilityReport {
    /// Evaluate all gates.
    ///
    /// # Arguments
    ///
    /// * `metrics`: uniformity statistics of the sampled field
    /// * `thermal`: heat balance at the operating point
    /// * `thermal_margin`: (K) margin from [`ThermalBalance::thermal_margin`]
    /// * `jc`: (A/m^2) derated critical current density at the operating point
    /// * `derating_field`: (T) field `jc` was derated at
    pub fn assess(
        metrics: &MetricsResult,
        thermal: &ThermalBalance,
        thermal_margin: f64,
        jc: f64,
        derating_field: f64,
        thresholds: &Thresholds,
    ) -> CoilResult<Self> {
        require_non_negative("min_field", thresholds.min_field)?;
        require_non_negative("max_ripple", thresholds.max_ripple)?;
        require_non_negative("min_thermal_margin", thresholds.min_thermal_margin)?;

        let b = metrics.b_mean.abs();
        let field = Gate {
            passed: b >= thresholds.min_field,
            value: b,
            threshold: thresholds.min_field,
        };
        let ripple = Gate {
            passed: metrics.ripple_rms <= thresholds.max_ripple,
            value: metrics.ripple_rms,
            threshold: thresholds.max_ripple,
        };
        let thermal_margin = Gate {
            passed: thermal_margin >= thresholds.min_thermal_margin,
            value: thermal_margin,
            threshold: thresholds.min_thermal_margin,
        };
        let critical_current = Gate {
            passed: jc > 0.0,
            value: jc,
            threshold: 0.0,
        };

        Ok(Self {
            field,
            ripple,
            thermal_margin,
            critical_current,
            operating_temperature: thermal.final_temperature,
            derating_field,
            feasible: field.passed
                && ripple.passed
                && thermal_margin.passed
                && critical_current.passed,
        })
    }

    /// Names of the gates that failed, in a fixed order.
    pub fn failed_gates(&self) -> Vec<&'static str> {
        [
            ("field", self.field.passed),
            ("ripple", self.ripple.passed),
            ("thermal_margin", self.thermal_margin.passed),
            ("critical_current", self.critical_current.passed),
        ]
        .into_iter()
        .filter(|(_, passed)| !passed)
        .map(|(name, _)| name)
        .collect()
    }
}
