//! Discretized circular windings and their superposition.
//!
//! Every loop is coaxial with the z-axis. A [`Loop`] is cut into straight segments
//! uniform in angle; each segment is represented by its arc midpoint and its arc
//! tangent displacement, scaled by the loop's ampere-turns. A [`LoopAssembly`] holds
//! the concatenated segments of all its loops, in loop order, and sums them with
//! [`flux_density_segments`](super::linear_filament::flux_density_segments).
use core::f64::consts::PI;

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::circular_filament::flux_density_circular_filament_scalar;
use super::linear_filament::{
    flux_density_segments, flux_density_segments_par, DEFAULT_SINGULAR_EPS,
};
use crate::error::{require_non_negative, require_positive, CoilError, CoilResult};

/// Default number of angular segments per loop.
pub const DEFAULT_SEGMENTS: usize = 360;

/// How finely each loop is cut up for the Biot-Savart sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Discretization {
    /// Segments per loop, uniform in angle
    #[serde(default = "default_segments")]
    pub segments: usize,
    /// (m) Segment-to-point distance below which a contribution is skipped
    #[serde(default = "default_singular_eps")]
    pub singular_eps: f64,
}

fn default_segments() -> usize {
    DEFAULT_SEGMENTS
}
fn default_singular_eps() -> f64 {
    DEFAULT_SINGULAR_EPS
}

impl Default for Discretization {
    fn default() -> Self {
        Self {
            segments: DEFAULT_SEGMENTS,
            singular_eps: DEFAULT_SINGULAR_EPS,
        }
    }
}

impl Discretization {
    fn validate(&self) -> CoilResult<()> {
        if self.segments == 0 {
            return Err(CoilError::InvalidParameter {
                name: "segments",
                value: 0.0,
                reason: "a loop needs at least one segment",
            });
        }
        require_non_negative("singular_eps", self.singular_eps)?;
        Ok(())
    }
}

/// One circular winding (or one sub-element of a smeared conductor) centred on the z-axis.
///
/// Immutable once built. The sign of `current` encodes direction: positive current
/// produces +z field at the loop centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Loop {
    current: f64,
    turns: u32,
    radius: f64,
    z_offset: f64,
}

impl Loop {
    /// # Errors
    ///
    /// Fails on a non-positive or non-finite radius, zero turns, or a non-finite
    /// current or offset.
    pub fn new(current: f64, turns: u32, radius: f64, z_offset: f64) -> CoilResult<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(CoilError::NonPositiveRadius { radius });
        }
        if turns == 0 {
            return Err(CoilError::ZeroTurns);
        }
        if !current.is_finite() {
            return Err(CoilError::InvalidParameter {
                name: "current",
                value: current,
                reason: "must be finite",
            });
        }
        if !z_offset.is_finite() {
            return Err(CoilError::InvalidParameter {
                name: "z_offset",
                value: z_offset,
                reason: "must be finite",
            });
        }
        Ok(Self {
            current,
            turns,
            radius,
            z_offset,
        })
    }

    /// (A) current per turn
    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn turns(&self) -> u32 {
        self.turns
    }

    /// (m)
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// (m) axial position of the loop plane
    pub fn z_offset(&self) -> f64 {
        self.z_offset
    }

    /// (A-turns)
    pub fn ampere_turns(&self) -> f64 {
        self.current * f64::from(self.turns)
    }

    /// Append this loop's segments to `segs`.
    fn push_segments(&self, nseg: usize, segs: &mut Segments) {
        let dtheta = 2.0 * PI / nseg as f64;
        let arc = self.radius * dtheta; // [m]
        let ampere_turns = self.ampere_turns();
        for i in 0..nseg {
            let theta = dtheta * (i as f64 + 0.5);
            let (sin, cos) = theta.sin_cos();
            segs.xmid.push(self.radius * cos);
            segs.ymid.push(self.radius * sin);
            segs.zmid.push(self.z_offset);
            segs.dlx.push(-arc * sin);
            segs.dly.push(arc * cos);
            segs.dlz.push(0.0);
            segs.current.push(ampere_turns);
        }
    }

    /// (T) Field of this loop alone at `obs`, by discretized Biot-Savart.
    pub fn flux_density(
        &self,
        obs: Vector3<f64>,
        disc: &Discretization,
    ) -> CoilResult<Vector3<f64>> {
        disc.validate()?;
        let mut segs = Segments::with_capacity(disc.segments);
        self.push_segments(disc.segments, &mut segs);
        segs.flux_density(obs, disc.singular_eps)
    }
}

/// Structure-of-arrays segment storage in the layout the kernels take.
#[derive(Debug, Clone, Default)]
struct Segments {
    xmid: Vec<f64>,
    ymid: Vec<f64>,
    zmid: Vec<f64>,
    dlx: Vec<f64>,
    dly: Vec<f64>,
    dlz: Vec<f64>,
    current: Vec<f64>,
}

impl Segments {
    fn with_capacity(n: usize) -> Self {
        Self {
            xmid: Vec::with_capacity(n),
            ymid: Vec::with_capacity(n),
            zmid: Vec::with_capacity(n),
            dlx: Vec::with_capacity(n),
            dly: Vec::with_capacity(n),
            dlz: Vec::with_capacity(n),
            current: Vec::with_capacity(n),
        }
    }

    fn len(&self) -> usize {
        self.current.len()
    }

    fn flux_density(&self, obs: Vector3<f64>, eps: f64) -> CoilResult<Vector3<f64>> {
        let (mut bx, mut by, mut bz) = ([0.0], [0.0], [0.0]);
        flux_density_segments(
            (&[obs.x], &[obs.y], &[obs.z]),
            (&self.xmid, &self.ymid, &self.zmid),
            (&self.dlx, &self.dly, &self.dlz),
            &self.current,
            eps,
            (&mut bx, &mut by, &mut bz),
        )?;
        Ok(Vector3::new(bx[0], by[0], bz[0]))
    }
}

/// Strategy for approximating a conductor of finite cross-section by several
/// fractional-current sub-loops whose weights sum to one.
///
/// This spreads the current geometrically; it does not solve for the actual
/// current distribution inside the conductor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossSection {
    /// Thin filament; the loop is used as-is.
    #[default]
    Filament,
    /// Cell-centred grid over a `width` (radial) by `thickness` (axial) rectangle.
    Rectangular {
        width: f64,
        thickness: f64,
        radial_samples: usize,
        axial_samples: usize,
    },
    /// Equal-area sunflower sampling of a disk of radius `cs_radius`.
    Round { cs_radius: f64, samples: usize },
}

impl CrossSection {
    /// Replace `lp` by its sub-loops. Each sub-loop keeps the turn count and carries
    /// `current * weight`.
    ///
    /// # Errors
    ///
    /// Fails on non-positive dimensions, zero sample counts, or a sub-loop whose
    /// radius would not be positive (cross-section wider than the loop).
    pub fn smear(&self, lp: &Loop) -> CoilResult<Vec<Loop>> {
        let offsets: Vec<(f64, f64)> = match *self {
            CrossSection::Filament => return Ok(vec![*lp]),
            CrossSection::Rectangular {
                width,
                thickness,
                radial_samples,
                axial_samples,
            } => {
                require_positive("width", width)?;
                require_positive("thickness", thickness)?;
                require_samples("radial_samples", radial_samples)?;
                require_samples("axial_samples", axial_samples)?;
                let dr = width / radial_samples as f64;
                let dz = thickness / axial_samples as f64;
                (0..radial_samples)
                    .flat_map(|i| {
                        (0..axial_samples).map(move |k| {
                            (
                                dr.mul_add(i as f64 + 0.5, -0.5 * width),
                                dz.mul_add(k as f64 + 0.5, -0.5 * thickness),
                            )
                        })
                    })
                    .collect()
            }
            CrossSection::Round { cs_radius, samples } => {
                require_positive("cs_radius", cs_radius)?;
                require_samples("samples", samples)?;
                let golden_angle = PI * (3.0 - 5.0_f64.sqrt());
                (0..samples)
                    .map(|i| {
                        let rho = cs_radius * ((i as f64 + 0.5) / samples as f64).sqrt();
                        let (sin, cos) = (golden_angle * i as f64).sin_cos();
                        (rho * cos, rho * sin)
                    })
                    .collect()
            }
        };

        let weight = 1.0 / offsets.len() as f64;
        offsets
            .into_iter()
            .map(|(dr, dz)| {
                Loop::new(
                    lp.current * weight,
                    lp.turns,
                    lp.radius + dr,
                    lp.z_offset + dz,
                )
            })
            .collect()
    }
}

fn require_samples(name: &'static str, n: usize) -> CoilResult<()> {
    if n == 0 {
        Err(CoilError::InvalidParameter {
            name,
            value: 0.0,
            reason: "need at least one sample",
        })
    } else {
        Ok(())
    }
}

/// An ordered, immutable set of loops whose fields superpose linearly.
///
/// The segment arrays are built once at construction; building a different
/// configuration means building a new assembly.
#[derive(Debug, Clone)]
pub struct LoopAssembly {
    loops: Vec<Loop>,
    disc: Discretization,
    segs: Segments,
}

impl LoopAssembly {
    /// # Errors
    ///
    /// Fails on an empty loop list or an invalid discretization.
    pub fn new(loops: Vec<Loop>, disc: Discretization) -> CoilResult<Self> {
        disc.validate()?;
        if loops.is_empty() {
            return Err(CoilError::InvalidParameter {
                name: "loops",
                value: 0.0,
                reason: "an assembly needs at least one loop",
            });
        }
        let mut segs = Segments::with_capacity(loops.len() * disc.segments);
        for lp in &loops {
            lp.push_segments(disc.segments, &mut segs);
        }
        Ok(Self { loops, disc, segs })
    }

    /// One winding in the z = 0 plane.
    pub fn single(
        current: f64,
        turns: u32,
        radius: f64,
        cs: &CrossSection,
        disc: Discretization,
    ) -> CoilResult<Self> {
        let lp = Loop::new(current, turns, radius, 0.0)?;
        Self::new(cs.smear(&lp)?, disc)
    }

    /// Two identical windings at `z = -separation/2` and `z = +separation/2`.
    /// `separation` defaults to `radius`, the Helmholtz condition.
    ///
    /// `turns` and `current` describe the pair as a whole: each winding carries
    /// half of the `turns * current` ampere-turns.
    pub fn helmholtz(
        current: f64,
        turns: u32,
        radius: f64,
        separation: Option<f64>,
        cs: &CrossSection,
        disc: Discretization,
    ) -> CoilResult<Self> {
        let separation = require_positive("separation", separation.unwrap_or(radius))?;
        let mut loops = Vec::new();
        for z in [-0.5 * separation, 0.5 * separation] {
            loops.extend(cs.smear(&Loop::new(0.5 * current, turns, radius, z)?)?);
        }
        Self::new(loops, disc)
    }

    /// `layers` windings evenly spaced by `axial_spacing` and centred on z = 0.
    /// Layer `k` (from the -z end) has radius `radius + k * delta_r`.
    #[allow(clippy::too_many_arguments)]
    pub fn stack(
        current: f64,
        turns: u32,
        radius: f64,
        layers: u32,
        axial_spacing: f64,
        delta_r: f64,
        cs: &CrossSection,
        disc: Discretization,
    ) -> CoilResult<Self> {
        if layers == 0 {
            return Err(CoilError::InvalidParameter {
                name: "layers",
                value: 0.0,
                reason: "a stack needs at least one layer",
            });
        }
        require_non_negative("axial_spacing", axial_spacing)?;
        if !delta_r.is_finite() {
            return Err(CoilError::InvalidParameter {
                name: "delta_r",
                value: delta_r,
                reason: "must be finite",
            });
        }
        let centre = 0.5 * f64::from(layers - 1);
        let mut loops = Vec::new();
        for k in 0..layers {
            let k = f64::from(k);
            let lp = Loop::new(
                current,
                turns,
                delta_r.mul_add(k, radius),
                axial_spacing * (k - centre),
            )?;
            loops.extend(cs.smear(&lp)?);
        }
        Self::new(loops, disc)
    }

    pub fn loops(&self) -> &[Loop] {
        &self.loops
    }

    pub fn discretization(&self) -> &Discretization {
        &self.disc
    }

    /// Total number of Biot-Savart segments.
    pub fn segment_count(&self) -> usize {
        self.segs.len()
    }

    /// (T) Superposed field at one point.
    pub fn flux_density(&self, obs: Vector3<f64>) -> CoilResult<Vector3<f64>> {
        self.segs.flux_density(obs, self.disc.singular_eps)
    }

    /// (T) Superposed field at many points, parallelized over chunks of points.
    ///
    /// # Arguments
    ///
    /// * `xyzp`: (m) Observation point coords, each length `n`
    /// * `out`:  (T) bx, by, bz at observation points, each length `n`
    pub fn flux_density_many(
        &self,
        xyzp: (&[f64], &[f64], &[f64]),
        out: (&mut [f64], &mut [f64], &mut [f64]),
    ) -> CoilResult<()> {
        let s = &self.segs;
        flux_density_segments_par(
            xyzp,
            (&s.xmid, &s.ymid, &s.zmid),
            (&s.dlx, &s.dly, &s.dlz),
            &s.current,
            self.disc.singular_eps,
            out,
        )
    }

    /// (T) Superposed field at one point from the closed-form filament solution.
    /// Used to cross-check the discretization.
    pub fn flux_density_reference(&self, obs: Vector3<f64>) -> Vector3<f64> {
        let rho = obs.x.hypot(obs.y);
        let (mut br, mut bz) = (0.0, 0.0);
        for lp in &self.loops {
            let (r, z) = flux_density_circular_filament_scalar(
                (lp.radius, lp.z_offset, lp.ampere_turns()),
                (rho, obs.z),
            );
            br += r;
            bz += z;
        }
        if rho == 0.0 {
            Vector3::new(0.0, 0.0, bz)
        } else {
            Vector3::new(br * obs.x / rho, br * obs.y / rho, bz)
        }
    }
}
