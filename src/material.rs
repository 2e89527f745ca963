//! Critical current density of a REBCO-class superconductor.
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive, CoilError, CoilResult};

/// Temperature scaling exponent of `Jc(T)`.
const TEMPERATURE_EXPONENT: f64 = 1.5;

/// Superconductor parameters. Build with [`Superconductor::new`] or deserialize and
/// call [`Superconductor::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Superconductor {
    /// (K) critical temperature
    pub tc: f64,
    /// (A/m^2) critical current density at zero temperature and field
    pub jc0: f64,
    /// (T) characteristic field of the derating law
    pub b0: f64,
    /// Derating exponent
    pub n: f64,
}

impl Default for Superconductor {
    /// REBCO-class tape: Tc = 90 K, Jc0 = 3e10 A/m^2, B0 = 18 T, n = 1.
    fn default() -> Self {
        Self {
            tc: 90.0,
            jc0: 3.0e10,
            b0: 18.0,
            n: 1.0,
        }
    }
}

impl Superconductor {
    pub fn new(tc: f64, jc0: f64, b0: f64, n: f64) -> CoilResult<Self> {
        let sc = Self { tc, jc0, b0, n };
        sc.validate()?;
        Ok(sc)
    }

    /// # Errors
    ///
    /// `tc <= 0` is [`CoilError::NonPositiveCriticalTemperature`]; `jc0 < 0`,
    /// `b0 <= 0` and `n <= 0` are [`CoilError::InvalidParameter`].
    pub fn validate(&self) -> CoilResult<()> {
        if !(self.tc.is_finite() && self.tc > 0.0) {
            return Err(CoilError::NonPositiveCriticalTemperature { tc: self.tc });
        }
        require_non_negative("jc0", self.jc0)?;
        require_positive("b0", self.b0)?;
        require_positive("n", self.n)?;
        Ok(())
    }

    /// (A/m^2) `Jc0 * max(0, 1 - T/Tc)^1.5`.
    pub fn critical_current_density_at_temperature(&self, t: f64) -> CoilResult<f64> {
        self.validate()?;
        require_non_negative("temperature", t)?;
        let reduced = (1.0 - t / self.tc).max(0.0);
        Ok(self.jc0 * reduced.powf(TEMPERATURE_EXPONENT))
    }

    /// (A/m^2) `Jc(T) / (1 + (B/B0)^n)` for `B > 0`, else `Jc(T)`.
    ///
    /// The field enters by magnitude.
    pub fn critical_current_density(&self, t: f64, b: f64) -> CoilResult<f64> {
        let jc_t = self.critical_current_density_at_temperature(t)?;
        if !b.is_finite() {
            return Err(CoilError::InvalidParameter {
                name: "field",
                value: b,
                reason: "must be finite",
            });
        }
        let b = b.abs();
        if b > 0.0 {
            Ok(jc_t / (1.0 + (b / self.b0).powf(self.n)))
        } else {
            Ok(jc_t)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_zero_at_and_above_tc() {
        let sc = Superconductor::default();
        assert_eq!(sc.critical_current_density_at_temperature(90.0).unwrap(), 0.0);
        assert_eq!(sc.critical_current_density(120.0, 5.0).unwrap(), 0.0);
        assert_eq!(sc.critical_current_density_at_temperature(0.0).unwrap(), sc.jc0);
    }

    #[test]
    fn test_field_derating() {
        let sc = Superconductor::new(90.0, 1e10, 10.0, 2.0).unwrap();
        let jc_t = sc.critical_current_density(20.0, 0.0).unwrap();
        let jc_b = sc.critical_current_density(20.0, 10.0).unwrap();
        assert!((jc_b - 0.5 * jc_t).abs() < 1e-6 * jc_t);
        assert_eq!(
            sc.critical_current_density(20.0, -10.0).unwrap(),
            jc_b
        );
    }

    #[test]
    fn test_invalid_inputs_fail_fast() {
        assert!(matches!(
            Superconductor::new(0.0, 1e10, 10.0, 1.0),
            Err(CoilError::NonPositiveCriticalTemperature { .. })
        ));
        assert!(matches!(
            Superconductor::new(-5.0, 1e10, 10.0, 1.0),
            Err(CoilError::NonPositiveCriticalTemperature { .. })
        ));
        assert!(Superconductor::new(90.0, 1e10, 0.0, 1.0).is_err());
        assert!(Superconductor::new(90.0, -1.0, 10.0, 1.0).is_err());
        let sc = Superconductor::default();
        assert!(sc.critical_current_density_at_temperature(-1.0).is_err());
        assert!(sc.critical_current_density(20.0, f64::NAN).is_err());

        let bad = Superconductor {
            tc: 0.0,
            ..Default::default()
        };
        assert!(bad.critical_current_density(20.0, 1.0).is_err());
    }
}
