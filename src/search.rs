//! Parameter sweep over coil configurations.
//!
//! Each configuration runs through the same pure pipeline: build the loop assembly,
//! sample its field, reduce to metrics, balance the heat load, derate the critical
//! current and gate the result. Configurations are independent, so they are
//! evaluated in parallel; a failure in one is recorded against it and the sweep
//! continues.
use core::f64::consts::PI;

use log::{debug, info, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use serde::{Deserialize, Serialize};

use crate::error::{CoilError, CoilResult};
use crate::feasibility::{FeasibilityReport, Thresholds};
use crate::material::Superconductor;
use crate::metrics::MetricsResult;
use crate::oracle::{CrossValidation, StressOracle};
use crate::physics::loops::{CrossSection, Discretization, LoopAssembly};
use crate::sampler::{sample_plane, sample_volume, PlaneSpec, VolumeSpec};
use crate::thermal::{ThermalBalance, ThermalState};

/// Coil arrangement and its geometry-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Geometry {
    Single,
    /// Coaxial pair; `separation` (m) defaults to the radius.
    Helmholtz {
        #[serde(default)]
        separation: Option<f64>,
    },
    /// `layers` coils spaced by `axial_spacing` (m), each `delta_r` (m) wider than the last.
    Stack {
        layers: u32,
        axial_spacing: f64,
        #[serde(default)]
        delta_r: f64,
    },
}

/// One point of the design space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    pub geometry: Geometry,
    /// Total turns. A Helmholtz pair splits them between its two coils; a stack
    /// winds them on every layer.
    pub turns: u32,
    /// (A) current per turn
    pub current: f64,
    /// (m) coil radius (innermost layer for stacks)
    pub radius: f64,
}

impl Configuration {
    pub fn assembly(&self, cs: &CrossSection, disc: Discretization) -> CoilResult<LoopAssembly> {
        match self.geometry {
            Geometry::Single => {
                LoopAssembly::single(self.current, self.turns, self.radius, cs, disc)
            }
            Geometry::Helmholtz { separation } => {
                LoopAssembly::helmholtz(self.current, self.turns, self.radius, separation, cs, disc)
            }
            Geometry::Stack {
                layers,
                axial_spacing,
                delta_r,
            } => LoopAssembly::stack(
                self.current,
                self.turns,
                self.radius,
                layers,
                axial_spacing,
                delta_r,
                cs,
                disc,
            ),
        }
    }

    /// Radius and turn count of each physical coil.
    fn coils(&self) -> Vec<(f64, f64)> {
        let turns = f64::from(self.turns);
        match self.geometry {
            Geometry::Single => vec![(self.radius, turns)],
            Geometry::Helmholtz { .. } => vec![(self.radius, 0.5 * turns); 2],
            Geometry::Stack { layers, delta_r, .. } => (0..layers)
                .map(|k| (delta_r.mul_add(f64::from(k), self.radius), turns))
                .collect(),
        }
    }

    /// (m) Total conductor length, `sum(2 pi r N)` over the physical coils.
    pub fn conductor_length(&self) -> f64 {
        self.coils().iter().map(|(r, n)| 2.0 * PI * r * n).sum()
    }

    /// (m) Largest coil radius.
    pub fn outer_radius(&self) -> f64 {
        self.coils().into_iter().map(|(r, _)| r).fold(self.radius, f64::max)
    }
}

/// Values to sweep. Every list must be non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpace {
    pub geometries: Vec<Geometry>,
    pub turns: Vec<u32>,
    /// (A)
    pub currents: Vec<f64>,
    /// (m)
    pub radii: Vec<f64>,
}

impl Default for ParameterSpace {
    /// Helmholtz pairs over N in {200, 400, 600}, I in {20, 40, 80} kA, R in {0.2, 0.3, 0.5} m.
    fn default() -> Self {
        Self {
            geometries: vec![Geometry::Helmholtz { separation: None }],
            turns: vec![200, 400, 600],
            currents: vec![20_000.0, 40_000.0, 80_000.0],
            radii: vec![0.2, 0.3, 0.5],
        }
    }
}

/// How points are drawn from a [`ParameterSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Strategy {
    /// Cartesian product of all lists, in geometry, turns, current, radius order.
    #[default]
    Grid,
    /// `samples` points: geometry picked from its list, turns uniform over the
    /// integer span of its list, current and radius uniform over `[min, max]` of theirs.
    Random { samples: usize, seed: u64 },
}

impl ParameterSpace {
    fn validate(&self) -> CoilResult<()> {
        let empty = [
            ("geometries", self.geometries.is_empty()),
            ("turns", self.turns.is_empty()),
            ("currents", self.currents.is_empty()),
            ("radii", self.radii.is_empty()),
        ];
        for (name, is_empty) in empty {
            if is_empty {
                return Err(CoilError::InvalidParameter {
                    name,
                    value: 0.0,
                    reason: "parameter list is empty",
                });
            }
        }
        if self.currents.iter().chain(&self.radii).any(|v| !v.is_finite()) {
            return Err(CoilError::InvalidParameter {
                name: "currents/radii",
                value: f64::NAN,
                reason: "all values must be finite",
            });
        }
        Ok(())
    }

    /// Enumerate the configurations the strategy visits.
    pub fn configurations(&self, strategy: &Strategy) -> CoilResult<Vec<Configuration>> {
        self.validate()?;
        match *strategy {
            Strategy::Grid => {
                let n = self.geometries.len()
                    * self.turns.len()
                    * self.currents.len()
                    * self.radii.len();
                let mut out = Vec::with_capacity(n);
                for &geometry in &self.geometries {
                    for &turns in &self.turns {
                        for &current in &self.currents {
                            for &radius in &self.radii {
                                out.push(Configuration {
                                    geometry,
                                    turns,
                                    current,
                                    radius,
                                });
                            }
                        }
                    }
                }
                Ok(out)
            }
            Strategy::Random { samples, seed } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let (tmin, tmax) = span(self.turns.iter().copied());
                let (imin, imax) = span_f64(&self.currents);
                let (rmin, rmax) = span_f64(&self.radii);
                Ok((0..samples)
                    .map(|_| Configuration {
                        geometry: self.geometries[rng.gen_range(0..self.geometries.len())],
                        turns: rng.gen_range(tmin..=tmax),
                        current: uniform(&mut rng, imin, imax),
                        radius: uniform(&mut rng, rmin, rmax),
                    })
                    .collect())
            }
        }
    }
}

fn span(values: impl Iterator<Item = u32> + Clone) -> (u32, u32) {
    let min = values.clone().min().unwrap_or(1);
    let max = values.max().unwrap_or(min);
    (min, max)
}

fn span_f64(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

fn uniform(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

/// Where the field is sampled for the statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sampling {
    Plane(PlaneSpec),
    Volume(VolumeSpec),
}

impl Default for Sampling {
    fn default() -> Self {
        Sampling::Plane(PlaneSpec::default())
    }
}

/// Everything besides the configuration that an evaluation needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub cross_section: CrossSection,
    #[serde(default)]
    pub discretization: Discretization,
    #[serde(default)]
    pub sampling: Sampling,
    /// Relative band around the peak for the coverage fraction; no default
    pub coverage_band: f64,
    #[serde(default)]
    pub material: Superconductor,
    #[serde(default)]
    pub thermal: ThermalState,
    /// (m) Fixed conductor length for the heat balance; derived from the geometry when absent
    #[serde(default)]
    pub conductor_length: Option<f64>,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Pipeline {
    /// Default models and thresholds with the given coverage band.
    pub fn new(coverage_band: f64) -> Self {
        Self {
            cross_section: CrossSection::default(),
            discretization: Discretization::default(),
            sampling: Sampling::default(),
            coverage_band,
            material: Superconductor::default(),
            thermal: ThermalState::default(),
            conductor_length: None,
            thresholds: Thresholds::default(),
        }
    }
}

/// Everything derived for a configuration that evaluated cleanly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub metrics: MetricsResult,
    pub thermal: ThermalBalance,
    /// (K)
    pub thermal_margin: f64,
    /// (A/m^2) derated at the operating temperature and peak sampled field
    pub critical_current_density: f64,
    pub report: FeasibilityReport,
    pub cross_validation: CrossValidation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Assessed(Assessment),
    /// Evaluation raised an error; counted as infeasible.
    Failed { reason: String },
}

/// A configuration tagged with its outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub configuration: Configuration,
    pub outcome: Outcome,
}

impl Evaluation {
    pub fn assessment(&self) -> Option<&Assessment> {
        match &self.outcome {
            Outcome::Assessed(a) => Some(a),
            Outcome::Failed { .. } => None,
        }
    }

    pub fn is_feasible(&self) -> bool {
        self.assessment().is_some_and(|a| a.report.feasible)
    }

    pub fn failure(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { reason } => Some(reason),
            Outcome::Assessed(_) => None,
        }
    }
}

fn assess(config: &Configuration, pipeline: &Pipeline) -> CoilResult<Assessment> {
    pipeline.material.validate()?;

    let assembly = config.assembly(&pipeline.cross_section, pipeline.discretization)?;
    let sample = match &pipeline.sampling {
        Sampling::Plane(spec) => sample_plane(&assembly, spec)?,
        Sampling::Volume(spec) => sample_volume(&assembly, spec)?,
    };
    let metrics = MetricsResult::from_sample(&sample, pipeline.coverage_band)?;

    let length = pipeline
        .conductor_length
        .unwrap_or_else(|| config.conductor_length());
    let thermal = pipeline.thermal.balance(length)?;
    let thermal_margin = thermal.thermal_margin(pipeline.material.tc);

    let derating_field = metrics.b_peak;
    let jc = pipeline
        .material
        .critical_current_density(thermal.final_temperature, derating_field)?;

    let report = FeasibilityReport::assess(
        &metrics,
        &thermal,
        thermal_margin,
        jc,
        derating_field,
        &pipeline.thresholds,
    )?;

    Ok(Assessment {
        metrics,
        thermal,
        thermal_margin,
        critical_current_density: jc,
        report,
        cross_validation: CrossValidation::NotRequested,
    })
}

/// Run the full pipeline for one configuration. Never fails; errors become
/// [`Outcome::Failed`].
pub fn evaluate(
    config: &Configuration,
    pipeline: &Pipeline,
    oracle: Option<&dyn StressOracle>,
) -> Evaluation {
    let outcome = match assess(config, pipeline) {
        Ok(mut assessment) => {
            assessment.cross_validation =
                CrossValidation::run(oracle, config, assessment.metrics.b_peak);
            debug!(
                "{config:?}: B_mean={:.4} T ripple={:.3e} feasible={}",
                assessment.metrics.b_mean, assessment.metrics.ripple_rms, assessment.report.feasible
            );
            Outcome::Assessed(assessment)
        }
        Err(e) => {
            warn!("{config:?}: evaluation failed: {e}");
            Outcome::Failed {
                reason: e.to_string(),
            }
        }
    };
    Evaluation {
        configuration: *config,
        outcome,
    }
}

/// Secondary ranking among feasible configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[default]
    LowestRipple,
    HighestThermalMargin,
    HighestField,
}

impl Objective {
    /// Sort key, smaller is better.
    fn key(&self, a: &Assessment) -> f64 {
        match self {
            Objective::LowestRipple => a.metrics.ripple_rms,
            Objective::HighestThermalMargin => -a.thermal_margin,
            Objective::HighestField => -a.metrics.b_mean.abs(),
        }
    }
}

/// Every evaluation of a sweep, in enumeration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub evaluations: Vec<Evaluation>,
}

impl SearchOutcome {
    pub fn feasible(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| e.is_feasible())
    }

    pub fn failures(&self) -> impl Iterator<Item = &Evaluation> {
        self.evaluations.iter().filter(|e| e.failure().is_some())
    }

    /// Feasible evaluations, best first. Ties keep enumeration order.
    pub fn ranked(&self, objective: Objective) -> Vec<&Evaluation> {
        let mut ranked: Vec<(f64, &Evaluation)> = self
            .evaluations
            .iter()
            .filter_map(|e| match e.assessment() {
                Some(a) if a.report.feasible => Some((objective.key(a), e)),
                _ => None,
            })
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        ranked.into_iter().map(|(_, e)| e).collect()
    }
}

/// Evaluate every configuration the strategy draws from `space`.
///
/// # Errors
///
/// Only an invalid parameter space fails the sweep; per-configuration errors are
/// recorded in the outcome.
pub fn search(
    space: &ParameterSpace,
    strategy: &Strategy,
    pipeline: &Pipeline,
    oracle: Option<&dyn StressOracle>,
) -> CoilResult<SearchOutcome> {
    let configs = space.configurations(strategy)?;
    info!("evaluating {} configurations ({strategy:?})", configs.len());

    let evaluations: Vec<Evaluation> = configs
        .par_iter()
        .map(|c| evaluate(c, pipeline, oracle))
        .collect();

    let outcome = SearchOutcome { evaluations };
    info!(
        "{} feasible, {} failed of {}",
        outcome.feasible().count(),
        outcome.failures().count(),
        outcome.evaluations.len()
    );
    Ok(outcome)
}
