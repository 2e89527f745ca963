//! Biot-Savart summation over short straight current segments.
use std::num::NonZeroUsize;

use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::{ParallelSlice, ParallelSliceMut},
};

use crate::error::{CoilError, CoilResult};
use crate::math::{cross3, dot3};
use crate::MU0_OVER_4PI;

/// (m) Default distance below which a segment's contribution to an observation point is skipped.
pub const DEFAULT_SINGULAR_EPS: f64 = 1e-9;

/// Biot-Savart calculation for B-field contribution from many current segments
/// to many observation points. This variant of the function is
/// parallelized over chunks of observation points.
///
/// Each observation point accumulates segments in the same order as the serial
/// variant, so the two produce bit-identical results.
///
/// # Arguments
///
/// * `xyzp`:     (m) Observation point coords, each length `n`
/// * `xyzmid`:   (m) Segment source point (midpoint) coords, each length `m`
/// * `dlxyz`:    (m) Segment displacement vectors, each length `m`
/// * `iseg`:     (A) Segment current (ampere-turns), length `m`
/// * `eps`:      (m) Distances below this skip the segment instead of dividing by ~0
/// * `out`:      (T) bx, by, bz at observation points, each length `n`
pub fn flux_density_segments_par(
    xyzp: (&[f64], &[f64], &[f64]),
    xyzmid: (&[f64], &[f64], &[f64]),
    dlxyz: (&[f64], &[f64], &[f64]),
    iseg: &[f64],
    eps: f64,
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> CoilResult<()> {
    // Chunking truncates silently on mismatch, so check observation lengths up front
    let m = xyzp.0.len();
    if xyzp.1.len() != m
        || xyzp.2.len() != m
        || out.0.len() != m
        || out.1.len() != m
        || out.2.len() != m
    {
        return Err(CoilError::LengthMismatch);
    }

    // Chunk inputs
    let ncores = std::thread::available_parallelism()
        .unwrap_or(NonZeroUsize::MIN)
        .get();

    let n = (m / ncores).max(1);

    let xpc = xyzp.0.par_chunks(n);
    let ypc = xyzp.1.par_chunks(n);
    let zpc = xyzp.2.par_chunks(n);

    let bxc = out.0.par_chunks_mut(n);
    let byc = out.1.par_chunks_mut(n);
    let bzc = out.2.par_chunks_mut(n);

    // Run calcs
    bxc.zip(byc.zip(bzc.zip(xpc.zip(ypc.zip(zpc)))))
        .try_for_each(|(bx, (by, (bz, (xp, (yp, zp)))))| {
            flux_density_segments((xp, yp, zp), xyzmid, dlxyz, iseg, eps, (bx, by, bz))
        })?;

    Ok(())
}

/// Biot-Savart calculation for B-field contribution from many current segments
/// to many observation points.
///
/// Accumulates `(mu_0 / 4pi) * I * dl x r / |r|^3` with `r` measured from each
/// segment's source point. Segments closer than `eps` to an observation point are
/// skipped, which only matters for points lying on the conductor itself.
///
/// # Arguments
///
/// * `xyzp`:     (m) Observation point coords, each length `n`
/// * `xyzmid`:   (m) Segment source point (midpoint) coords, each length `m`
/// * `dlxyz`:    (m) Segment displacement vectors, each length `m`
/// * `iseg`:     (A) Segment current (ampere-turns), length `m`
/// * `eps`:      (m) Distances below this skip the segment instead of dividing by ~0
/// * `out`:      (T) bx, by, bz at observation points, each length `n`
pub fn flux_density_segments(
    xyzp: (&[f64], &[f64], &[f64]),
    xyzmid: (&[f64], &[f64], &[f64]),
    dlxyz: (&[f64], &[f64], &[f64]),
    iseg: &[f64],
    eps: f64,
    out: (&mut [f64], &mut [f64], &mut [f64]),
) -> CoilResult<()> {
    // Unpack
    let (xp, yp, zp) = xyzp;
    let (xmid, ymid, zmid) = xyzmid;
    let (dlx, dly, dlz) = dlxyz;

    let (bx, by, bz) = out;

    // Check lengths; if there is any possibility of mismatch,
    // the compiler will bypass vectorization
    let n = xmid.len();
    let m = xp.len();

    if yp.len() != m
        || zp.len() != m
        || bx.len() != m
        || by.len() != m
        || bz.len() != m
        || ymid.len() != n
        || zmid.len() != n
        || dlx.len() != n
        || dly.len() != n
        || dlz.len() != n
        || iseg.len() != n
    {
        return Err(CoilError::LengthMismatch);
    }

    bx.fill(0.0);
    by.fill(0.0);
    bz.fill(0.0);

    let eps2 = eps * eps;

    // For each segment, evaluate the contribution to each observation point
    for i in 0..n {
        let (dlxi, dlyi, dlzi) = (dlx[i], dly[i], dlz[i]); // [m]
        let current = iseg[i]; // [A]

        for j in 0..m {
            // Distance from the segment source point to the observation point
            let rx = xp[j] - xmid[i]; // [m]
            let ry = yp[j] - ymid[i]; // [m]
            let rz = zp[j] - zmid[i]; // [m]

            let sumsq = dot3(rx, ry, rz, rx, ry, rz); // [m^2]
            if sumsq < eps2 {
                continue;
            }

            // 1/r^3 without forming the cube explicitly
            let c = current * sumsq.powf(-1.5);
            let (cx, cy, cz) = cross3(dlxi, dlyi, dlzi, rx, ry, rz);

            // Units of A/m^2 until the mu_0 / (4 * pi) factor below
            bx[j] = c.mul_add(cx, bx[j]);
            by[j] = c.mul_add(cy, by[j]);
            bz[j] = c.mul_add(cz, bz[j]);
        }
    }

    for j in 0..m {
        bx[j] *= MU0_OVER_4PI;
        by[j] *= MU0_OVER_4PI;
        bz[j] *= MU0_OVER_4PI;
    }

    Ok(())
}
