//! Magnetic field solver and feasibility screening for superconducting coil sets.
//!
//! Circular windings are discretized into straight segments and summed with the
//! Biot-Savart law, sampled over planes or volumes, reduced to uniformity and
//! energy metrics, and combined with a critical current density model and a lumped
//! thermal balance into pass/fail gates. A parameter search runs that pipeline over
//! a declared design space.
#![allow(non_snake_case)]

pub mod config;
pub mod error;
pub mod feasibility;
pub mod material;
pub mod math;
pub mod metrics;
pub mod oracle;
pub mod physics;
pub mod sampler;
pub mod search;
pub mod thermal;

pub use error::{CoilError, CoilResult};
pub use physics::loops::{CrossSection, Loop, LoopAssembly};

/// (H/m) vacuum magnetic permeability.
/// Value from 2022 CODATA recommended values, [NIST SPI 961](https://physics.nist.gov/cuu/pdf/wall_2022.pdf).
pub const MU_0: f64 = 0.999_999_999_87 * core::f64::consts::PI * 4e-7; // [H/m]

/// (H/m) Recurring constant multiple of `mu_0`
pub const MU0_OVER_4PI: f64 = MU_0 / (4.0 * core::f64::consts::PI);

/// (W/m^2/K^4) Stefan-Boltzmann constant, exact in the 2019 SI.
pub const STEFAN_BOLTZMANN: f64 = 5.670_374_419e-8;
