//! Uniformity and stored-energy statistics of a field sample.
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, CoilError, CoilResult};
use crate::math::mean_std;
use crate::sampler::FieldSample;
use crate::MU_0;

/// (T) Mean fields with magnitude below this leave the ripple undefined.
pub const MEAN_FIELD_FLOOR: f64 = 1e-12;

/// Scalars derived from one [`FieldSample`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// (T) mean of the sampled scalar; signed for `Bz` planes
    pub b_mean: f64,
    /// (T) population standard deviation
    pub b_std: f64,
    /// `b_std / |b_mean|`, never negative
    pub ripple_rms: f64,
    /// (T) largest absolute sampled value
    pub b_peak: f64,
    /// Fraction of points whose magnitude lies within `coverage_band` of the peak
    pub coverage_fraction: f64,
    /// Relative band used for `coverage_fraction`
    pub coverage_band: f64,
    /// (J) Riemann sum of `B^2 / (2 mu_0)` over the sampled volume; `None` for planes
    pub stored_energy_J: Option<f64>,
    /// Grid shape the statistics were computed on, reported with the energy
    pub resolution: Vec<usize>,
}

impl MetricsResult {
    /// Reduce a sample to its statistics.
    ///
    /// `coverage_band` has no default; callers choose how close to the peak a point
    /// must be to count as covered.
    ///
    /// # Errors
    ///
    /// * [`CoilError::EmptySample`] when the sample has no points
    /// * [`CoilError::UndefinedRipple`] when `|b_mean|` is below [`MEAN_FIELD_FLOOR`]
    ///   or any statistic is not finite
    pub fn from_sample(sample: &FieldSample, coverage_band: f64) -> CoilResult<Self> {
        require_non_negative("coverage_band", coverage_band)?;
        let values = sample.values();
        let (b_mean, b_std) = mean_std(&values).ok_or(CoilError::EmptySample)?;

        if !(b_mean.is_finite() && b_std.is_finite()) || b_mean.abs() < MEAN_FIELD_FLOOR {
            return Err(CoilError::UndefinedRipple { mean: b_mean });
        }
        let ripple_rms = b_std / b_mean.abs();

        let b_peak = values.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let floor = b_peak * (1.0 - coverage_band);
        let covered = values.iter().filter(|v| v.abs() >= floor).count();
        let coverage_fraction = covered as f64 / values.len() as f64;

        let stored_energy_J = sample.cell_volume().map(|dv| {
            let sum_sq: f64 = values.iter().map(|v| v * v).sum();
            sum_sq / (2.0 * MU_0) * dv
        });

        Ok(Self {
            b_mean,
            b_std,
            ripple_rms,
            b_peak,
            coverage_fraction,
            coverage_band,
            stored_energy_J,
            resolution: sample.shape(),
        })
    }
}

#[cfg(test)]
mod test {
    use ndarray::{s, Array2, Array3};

    use super::*;
    use crate::sampler::SampledField;

    fn plane(values: Vec<f64>) -> FieldSample {
        let n = (values.len() as f64).sqrt() as usize;
        FieldSample {
            x: (0..n).map(|i| i as f64).collect(),
            y: (0..n).map(|i| i as f64).collect(),
            field: SampledField::Plane {
                z: 0.0,
                bz: Array2::from_shape_vec((n, n), values).unwrap(),
            },
        }
    }

    #[test]
    fn test_plane_statistics() {
        let m = MetricsResult::from_sample(&plane(vec![4.0, 6.0, 4.0, 6.0]), 0.1).unwrap();
        assert_eq!(m.b_mean, 5.0);
        assert_eq!(m.b_std, 1.0);
        assert_eq!(m.ripple_rms, 0.2);
        assert_eq!(m.b_peak, 6.0);
        // 6.0 is within 10% of the peak, 4.0 is not
        assert_eq!(m.coverage_fraction, 0.5);
        assert!(m.stored_energy_J.is_none());
        assert_eq!(m.resolution, vec![2, 2]);
    }

    #[test]
    fn test_negative_field_ripple_non_negative() {
        let m = MetricsResult::from_sample(&plane(vec![-4.0, -6.0, -4.0, -6.0]), 0.5).unwrap();
        assert_eq!(m.b_mean, -5.0);
        assert_eq!(m.ripple_rms, 0.2);
        assert_eq!(m.coverage_fraction, 1.0);
    }

    #[test]
    fn test_cancelled_field_is_flagged() {
        let res = MetricsResult::from_sample(&plane(vec![1.0, -1.0, 1.0, -1.0]), 0.1);
        assert!(matches!(res, Err(CoilError::UndefinedRipple { .. })));
        let res = MetricsResult::from_sample(&plane(vec![0.0; 4]), 0.1);
        assert!(matches!(res, Err(CoilError::UndefinedRipple { .. })));
        let res = MetricsResult::from_sample(&plane(vec![f64::NAN; 4]), 0.1);
        assert!(matches!(res, Err(CoilError::UndefinedRipple { .. })));
    }

    #[test]
    fn test_plane_layout_does_not_matter() {
        let standard = MetricsResult::from_sample(&plane(vec![4.0, 6.0, 4.0, 6.0]), 0.1).unwrap();

        // Column-major storage of the same values
        let mut transposed = plane(vec![4.0, 4.0, 6.0, 6.0]);
        if let SampledField::Plane { bz, .. } = &mut transposed.field {
            *bz = bz.clone().reversed_axes();
        }
        assert_eq!(transposed.values().len(), 4);
        let m = MetricsResult::from_sample(&transposed, 0.1).unwrap();
        assert_eq!(m.b_mean, standard.b_mean);
        assert_eq!(m.b_std, standard.b_std);
        assert_eq!(m.coverage_fraction, standard.coverage_fraction);

        // Strided storage: every other column of a 2 x 4 array
        let wide = Array2::from_shape_vec((2, 4), vec![4.0, 0.0, 6.0, 0.0, 4.0, 0.0, 6.0, 0.0])
            .unwrap()
            .slice_move(s![.., ..;2]);
        let strided = FieldSample {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            field: SampledField::Plane { z: 0.0, bz: wide },
        };
        let m = MetricsResult::from_sample(&strided, 0.1).unwrap();
        assert_eq!(m.b_mean, 5.0);
        assert_eq!(m.ripple_rms, 0.2);
        assert_eq!(m.resolution, vec![2, 2]);
    }

    #[test]
    fn test_clone_keeps_resolution() {
        let m = MetricsResult::from_sample(&plane(vec![4.0, 6.0, 4.0, 6.0]), 0.1).unwrap();
        let copy = m.clone();
        assert_eq!(copy, m);
        assert_eq!(copy.resolution, vec![2, 2]);
    }

    #[test]
    fn test_degenerate_volume_has_no_energy() {
        // A single z-layer spans no volume
        let sample = FieldSample {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            field: SampledField::Volume {
                z: vec![0.0],
                magnitude: Array3::from_elem((1, 2, 2), 24.0),
            },
        };
        let m = MetricsResult::from_sample(&sample, 0.01).unwrap();
        assert_eq!(m.b_mean, 24.0);
        assert!(m.stored_energy_J.is_none());
    }

    #[test]
    fn test_volume_energy() {
        // Uniform 2 T over a 2 x 2 x 2 grid with unit spacing
        let sample = FieldSample {
            x: vec![0.0, 1.0],
            y: vec![0.0, 1.0],
            field: SampledField::Volume {
                z: vec![0.0, 1.0],
                magnitude: Array3::from_elem((2, 2, 2), 2.0),
            },
        };
        let m = MetricsResult::from_sample(&sample, 0.01).unwrap();
        let expected = 8.0 * 4.0 / (2.0 * MU_0);
        assert!((m.stored_energy_J.unwrap() - expected).abs() < 1e-9 * expected);
        assert_eq!(m.ripple_rms, 0.0);
        assert_eq!(m.coverage_fraction, 1.0);
    }
}
