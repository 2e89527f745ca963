//! Evaluation of a [`LoopAssembly`] over structured planes and volumes.
//!
//! Every grid point is independent, so the points are flattened and handed to the
//! parallel Biot-Savart kernel in one call. Per-point summation order is fixed by
//! the assembly's segment order, so the result does not depend on how the points
//! are chunked.
use std::borrow::Cow;

use log::debug;
use ndarray::{Array, Array2, Array3, Dimension};
use serde::{Deserialize, Serialize};

use crate::error::{require_non_negative, require_positive, CoilError, CoilResult};
use crate::math::{linspace, linspace_step, rss3};
use crate::physics::loops::LoopAssembly;

/// Square plane of points at fixed height, sampling `Bz`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneSpec {
    /// (m) x and y run from `-half_width` to `half_width`
    pub half_width: f64,
    /// Points per side
    pub resolution: usize,
    /// (m) height of the plane
    #[serde(default)]
    pub z: f64,
}

impl Default for PlaneSpec {
    /// Central 10 cm square in the mid-plane, 21 x 21 points.
    fn default() -> Self {
        Self {
            half_width: 0.05,
            resolution: 21,
            z: 0.0,
        }
    }
}

/// Box of points centred on the origin, sampling `|B|`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// (m) x and y run from `-half_width` to `half_width`
    pub half_width: f64,
    /// Points per side in x and y
    pub resolution: usize,
    /// (m) z runs from `-half_height` to `half_height`
    pub half_height: f64,
    /// Points along z
    pub z_resolution: usize,
}

/// Which scalar a sample holds, together with its grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SampledField {
    /// (T) Bz indexed `[iy, ix]`
    Plane { z: f64, bz: Array2<f64> },
    /// (T) |B| indexed `[iz, iy, ix]`
    Volume { z: Vec<f64>, magnitude: Array3<f64> },
}

/// Coordinates plus field values from one evaluation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSample {
    /// (m)
    pub x: Vec<f64>,
    /// (m)
    pub y: Vec<f64>,
    pub field: SampledField,
}

impl FieldSample {
    /// All field values, borrowed when the array is contiguous in any order and
    /// copied out otherwise. Order is unspecified.
    pub fn values(&self) -> Cow<'_, [f64]> {
        match &self.field {
            SampledField::Plane { bz, .. } => contiguous_or_copied(bz),
            SampledField::Volume { magnitude, .. } => contiguous_or_copied(magnitude),
        }
    }

    /// (m^3) Volume of one grid cell. `None` for a plane, or for a volume that
    /// is flat along some axis.
    pub fn cell_volume(&self) -> Option<f64> {
        match &self.field {
            SampledField::Plane { .. } => None,
            SampledField::Volume { z, .. } => {
                let dv = (step(&self.x) * step(&self.y) * step(z)).abs();
                (dv > 0.0).then_some(dv)
            }
        }
    }

    /// Grid shape, `[ny, nx]` or `[nz, ny, nx]`.
    pub fn shape(&self) -> Vec<usize> {
        match &self.field {
            SampledField::Plane { bz, .. } => bz.shape().to_vec(),
            SampledField::Volume { magnitude, .. } => magnitude.shape().to_vec(),
        }
    }
}

fn contiguous_or_copied<D: Dimension>(a: &Array<f64, D>) -> Cow<'_, [f64]> {
    match a.as_slice_memory_order() {
        Some(values) => Cow::Borrowed(values),
        None => Cow::Owned(a.iter().copied().collect()),
    }
}

fn step(coords: &[f64]) -> f64 {
    match coords {
        [first, .., last] => linspace_step(*first, *last, coords.len()),
        _ => 0.0,
    }
}

fn check_grid(half_width: f64, resolution: usize) -> CoilResult<()> {
    require_non_negative("half_width", half_width)?;
    if resolution == 0 {
        return Err(CoilError::InvalidParameter {
            name: "resolution",
            value: 0.0,
            reason: "need at least one point per side",
        });
    }
    Ok(())
}

/// Sample `Bz` over a square plane.
pub fn sample_plane(assembly: &LoopAssembly, spec: &PlaneSpec) -> CoilResult<FieldSample> {
    check_grid(spec.half_width, spec.resolution)?;
    if !spec.z.is_finite() {
        return Err(CoilError::InvalidParameter {
            name: "z",
            value: spec.z,
            reason: "must be finite",
        });
    }

    let n = spec.resolution;
    let x = linspace(-spec.half_width, spec.half_width, n);
    let y = x.clone();

    let npts = n * n;
    let mut xp = Vec::with_capacity(npts);
    let mut yp = Vec::with_capacity(npts);
    for yi in &y {
        for xi in &x {
            xp.push(*xi);
            yp.push(*yi);
        }
    }
    let zp = vec![spec.z; npts];

    let (mut bx, mut by, mut bz) = (vec![0.0; npts], vec![0.0; npts], vec![0.0; npts]);
    assembly.flux_density_many((&xp, &yp, &zp), (&mut bx, &mut by, &mut bz))?;
    debug!(
        "sampled plane z={} m, {n}x{n} points over {} segments",
        spec.z,
        assembly.segment_count()
    );

    let bz = Array2::from_shape_vec((n, n), bz).map_err(|_| CoilError::LengthMismatch)?;
    Ok(FieldSample {
        x,
        y,
        field: SampledField::Plane { z: spec.z, bz },
    })
}

/// Sample `|B|` over a box.
///
/// The box must have extent along every axis and at least two points per axis,
/// so that it has a cell volume to integrate energy over.
pub fn sample_volume(assembly: &LoopAssembly, spec: &VolumeSpec) -> CoilResult<FieldSample> {
    check_grid(spec.half_width, spec.resolution)?;
    check_grid(spec.half_height, spec.z_resolution)?;
    require_positive("half_width", spec.half_width)?;
    require_positive("half_height", spec.half_height)?;
    if spec.resolution < 2 || spec.z_resolution < 2 {
        return Err(CoilError::InvalidParameter {
            name: "resolution",
            value: spec.resolution.min(spec.z_resolution) as f64,
            reason: "a volume needs at least two points per axis",
        });
    }

    let n = spec.resolution;
    let nz = spec.z_resolution;
    let x = linspace(-spec.half_width, spec.half_width, n);
    let y = x.clone();
    let z = linspace(-spec.half_height, spec.half_height, nz);

    let npts = nz * n * n;
    let mut xp = Vec::with_capacity(npts);
    let mut yp = Vec::with_capacity(npts);
    let mut zp = Vec::with_capacity(npts);
    for zi in &z {
        for yi in &y {
            for xi in &x {
                xp.push(*xi);
                yp.push(*yi);
                zp.push(*zi);
            }
        }
    }

    let (mut bx, mut by, mut bz) = (vec![0.0; npts], vec![0.0; npts], vec![0.0; npts]);
    assembly.flux_density_many((&xp, &yp, &zp), (&mut bx, &mut by, &mut bz))?;
    debug!(
        "sampled volume {n}x{n}x{nz} points over {} segments",
        assembly.segment_count()
    );

    let magnitude: Vec<f64> = (0..npts).map(|i| rss3(bx[i], by[i], bz[i])).collect();
    let magnitude =
        Array3::from_shape_vec((nz, n, n), magnitude).map_err(|_| CoilError::LengthMismatch)?;
    Ok(FieldSample {
        x,
        y,
        field: SampledField::Volume { z, magnitude },
    })
}

#[cfg(test)]
mod test {
    use nalgebra::Vector3;

    use super::*;
    use crate::physics::loops::{CrossSection, Discretization};

    fn helmholtz() -> LoopAssembly {
        LoopAssembly::helmholtz(
            1000.0,
            10,
            0.3,
            None,
            &CrossSection::Filament,
            Discretization::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_plane_layout_matches_pointwise() {
        let assembly = helmholtz();
        let spec = PlaneSpec {
            half_width: 0.05,
            resolution: 5,
            z: 0.01,
        };
        let sample = sample_plane(&assembly, &spec).unwrap();
        assert_eq!(sample.shape(), vec![5, 5]);
        assert!(sample.cell_volume().is_none());

        let SampledField::Plane { bz, .. } = &sample.field else {
            panic!("expected a plane sample");
        };
        for (iy, y) in sample.y.iter().enumerate() {
            for (ix, x) in sample.x.iter().enumerate() {
                let b = assembly.flux_density(Vector3::new(*x, *y, 0.01)).unwrap();
                assert_eq!(bz[[iy, ix]], b.z);
            }
        }
    }

    #[test]
    fn test_volume_layout_and_cell() {
        let assembly = helmholtz();
        let spec = VolumeSpec {
            half_width: 0.04,
            resolution: 3,
            half_height: 0.02,
            z_resolution: 5,
        };
        let sample = sample_volume(&assembly, &spec).unwrap();
        assert_eq!(sample.shape(), vec![5, 3, 3]);
        assert_eq!(sample.values().len(), 45);
        let dv = sample.cell_volume().unwrap();
        assert!((dv - 0.04 * 0.04 * 0.01).abs() < 1e-18);

        let SampledField::Volume { z, magnitude } = &sample.field else {
            panic!("expected a volume sample");
        };
        let b = assembly
            .flux_density(Vector3::new(sample.x[2], sample.y[0], z[4]))
            .unwrap();
        assert_eq!(magnitude[[4, 0, 2]], rss3(b.x, b.y, b.z));
    }

    #[test]
    fn test_invalid_grids() {
        let assembly = helmholtz();
        let spec = PlaneSpec {
            half_width: 0.05,
            resolution: 0,
            z: 0.0,
        };
        assert!(sample_plane(&assembly, &spec).is_err());
        let spec = PlaneSpec {
            half_width: -0.05,
            resolution: 3,
            z: 0.0,
        };
        assert!(sample_plane(&assembly, &spec).is_err());
    }

    #[test]
    fn test_flat_volume_rejected() {
        let assembly = helmholtz();
        let flat = VolumeSpec {
            half_width: 0.05,
            resolution: 5,
            half_height: 0.0,
            z_resolution: 1,
        };
        assert!(sample_volume(&assembly, &flat).is_err());
        let single_column = VolumeSpec {
            half_width: 0.05,
            resolution: 1,
            half_height: 0.02,
            z_resolution: 3,
        };
        assert!(sample_volume(&assembly, &single_column).is_err());
    }
}
