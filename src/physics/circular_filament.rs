//! Closed-form field of ideal circular current filaments.
//!
//! These are exact up to the numerical evaluation of the complete elliptic
//! integrals, and serve as the reference that the discretized loop solver
//! is validated against.
use crate::error::{CoilError, CoilResult};
use crate::math::{ellipe, ellipk};
use crate::MU0_OVER_4PI;

/// Off-axis Br,Bz of one circular filament centred on the z-axis, in vacuum.
///
/// # Arguments
///
/// * `rzifil`: (m, m, A-turns) radius, z-coord, and current of the filament
/// * `rzobs`:  (m, m) r-coord and z-coord of the observation point
///
/// # Returns
///
/// * (T, T) r- and z-components of the magnetic flux density
///
/// # Commentary
///
/// See eqns. 12,13 pg. 34 in \[1\]. The radial component there must be
/// multiplied by (z / r) to satisfy the constraints of the calculation.
/// On the axis the radial component is zero by symmetry and is returned as such
/// rather than evaluated as 0 * (z / 0).
///
/// # References
///
///   \[1\] D. B. Montgomery and J. Terrell,
///         “Some Useful Information For The Design Of Aircore Solenoids,”
///         Francis Bitter National Magnet Lab, Nov. 1961.
///         Available: <https://apps.dtic.mil/sti/citations/tr/AD0269073>
///
///   \[2\] J. C. Simpson, J. E. Lane, C. D. Immer, R. C. Youngquist, and T. Steinrock,
///         “Simple Analytic Expressions for the Magnetic Field of a Circular Current Loop,”
///         2001. Available: <https://ntrs.nasa.gov/citations/20010038494>
pub fn flux_density_circular_filament_scalar(
    rzifil: (f64, f64, f64),
    rzobs: (f64, f64),
) -> (f64, f64) {
    let (rfil, zfil, ifil) = rzifil;
    let (rprime, zprime) = rzobs;

    let z = zprime - zfil; // [m]
    let z2 = z * z; // [m^2]
    let r2 = rprime * rprime; // [m^2]
    let rfil2 = rfil * rfil; // [m^2]

    let rpr = rfil + rprime;
    let q = rpr.mul_add(rpr, z2); // [m^2]
    let k2 = 4.0 * rfil * rprime / q; // [nondim]

    let a0 = 2.0 * ifil / q.sqrt(); // [A/m]
    let f = ellipk(k2); // [nondim]
    let s_over_q = ellipe(k2) / (1.0 - k2) / q; // [m^-2]

    let hz = a0 * s_over_q.mul_add(rfil2 - r2 - z2, f);
    let hr = if rprime == 0.0 {
        0.0
    } else {
        (z / rprime) * a0 * s_over_q.mul_add(rfil2 + r2 + z2, -f)
    };

    (hr * MU0_OVER_4PI, hz * MU0_OVER_4PI)
}

/// Off-axis Br,Bz components for many circular filaments at many observation points.
///
/// # Arguments
///
/// * `ifil`:    (A) current in each filament, length `m`
/// * `rfil`:    (m) r-coord of each filament, length `m`
/// * `zfil`:    (m) z-coord of each filament, length `m`
/// * `rprime`:  (m) r-coord of each observation point, length `n`
/// * `zprime`:  (m) z-coord of each observation point, length `n`
/// * `out_r`:   (T), r-component of magnetic flux density at observation locations, length `n`
/// * `out_z`:   (T), z-component of magnetic flux density at observation locations, length `n`
pub fn flux_density_circular_filament(
    ifil: &[f64],
    rfil: &[f64],
    zfil: &[f64],
    rprime: &[f64],
    zprime: &[f64],
    out_r: &mut [f64],
    out_z: &mut [f64],
) -> CoilResult<()> {
    let n = ifil.len();
    let m = rprime.len();

    if rfil.len() != n
        || zfil.len() != n
        || zprime.len() != m
        || out_r.len() != m
        || out_z.len() != m
    {
        return Err(CoilError::LengthMismatch);
    }

    out_r.fill(0.0);
    out_z.fill(0.0);

    for i in 0..n {
        for j in 0..m {
            let (br, bz) = flux_density_circular_filament_scalar(
                (rfil[i], zfil[i], ifil[i]),
                (rprime[j], zprime[j]),
            );
            out_r[j] += br;
            out_z[j] += bz;
        }
    }

    Ok(())
}

/// (T) On-axis Bz of a circular filament, `mu_0 I R^2 / (2 (R^2 + z^2)^(3/2))`.
///
/// At the loop centre this reduces to `mu_0 I / (2 R)`.
pub fn flux_density_on_axis(rfil: f64, ifil: f64, z: f64) -> f64 {
    let rfil2 = rfil * rfil;
    2.0 * core::f64::consts::PI * MU0_OVER_4PI * ifil * rfil2 / z.mul_add(z, rfil2).powf(1.5)
}
