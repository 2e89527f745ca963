//! End-to-end checks of the solver against closed forms and of the screening
//! pipeline on the reference Helmholtz sweep.
use core::f64::consts::PI;

use nalgebra::Vector3;

use supercoil::feasibility::Thresholds;
use supercoil::material::Superconductor;
use supercoil::metrics::MetricsResult;
use supercoil::sampler::{sample_plane, sample_volume, PlaneSpec, VolumeSpec};
use supercoil::search::{
    evaluate, search, Configuration, Geometry, Objective, ParameterSpace, Pipeline, Strategy,
};
use supercoil::thermal::ThermalState;
use supercoil::{CrossSection, Loop, LoopAssembly, MU_0};

use supercoil::physics::loops::Discretization;

fn rel_err(truth: f64, val: f64) -> f64 {
    ((val - truth) / truth).abs()
}

#[test]
fn single_loop_centre_matches_closed_form() {
    for (current, turns, radius) in [(1.0, 1, 1.0), (45_000.0, 180, 0.5), (-2.0e4, 600, 0.2)] {
        let assembly = LoopAssembly::single(
            current,
            turns,
            radius,
            &CrossSection::Filament,
            Discretization::default(),
        )
        .unwrap();
        let b = assembly.flux_density(Vector3::zeros()).unwrap();
        let expected = MU_0 * f64::from(turns) * current / (2.0 * radius);
        assert!(rel_err(expected, b.z) < 1e-10, "{} vs {expected}", b.z);
    }
}

#[test]
fn helmholtz_centre_independent_of_loop_order() {
    let radius = 0.3;
    // Each coil carries half of the pair's ampere-turns
    let a = Loop::new(20_000.0, 200, radius, -0.5 * radius).unwrap();
    let b = Loop::new(20_000.0, 200, radius, 0.5 * radius).unwrap();
    let disc = Discretization::default();

    let ab = LoopAssembly::new(vec![a, b], disc).unwrap();
    let ba = LoopAssembly::new(vec![b, a], disc).unwrap();
    let canonical =
        LoopAssembly::helmholtz(40_000.0, 200, radius, None, &CrossSection::Filament, disc)
            .unwrap();

    let f_ab = ab.flux_density(Vector3::zeros()).unwrap();
    let f_ba = ba.flux_density(Vector3::zeros()).unwrap();
    let f_canonical = canonical.flux_density(Vector3::zeros()).unwrap();
    assert!(rel_err(f_ab.z, f_ba.z) < 1e-12);
    assert_eq!(f_ab, f_canonical);
    assert!(f_ab.x.abs() < 1e-12 * f_ab.z && f_ab.y.abs() < 1e-12 * f_ab.z);
}

#[test]
fn helmholtz_more_uniform_than_single_coil() {
    let disc = Discretization::default();
    let spec = PlaneSpec::default();
    for radius in [0.2, 0.3, 0.5] {
        let single =
            LoopAssembly::single(40_000.0, 200, radius, &CrossSection::Filament, disc).unwrap();
        let pair =
            LoopAssembly::helmholtz(40_000.0, 200, radius, None, &CrossSection::Filament, disc)
                .unwrap();
        let m_single =
            MetricsResult::from_sample(&sample_plane(&single, &spec).unwrap(), 0.01).unwrap();
        let m_pair =
            MetricsResult::from_sample(&sample_plane(&pair, &spec).unwrap(), 0.01).unwrap();
        assert!(m_pair.ripple_rms >= 0.0);
        assert!(
            m_pair.ripple_rms < m_single.ripple_rms,
            "R={radius}: pair {} vs single {}",
            m_pair.ripple_rms,
            m_single.ripple_rms
        );
    }
}

#[test]
fn grid_search_feasible_set() {
    let pipeline = Pipeline::new(0.01);
    let outcome = search(&ParameterSpace::default(), &Strategy::Grid, &pipeline, None).unwrap();
    assert_eq!(outcome.evaluations.len(), 27);
    assert_eq!(outcome.failures().count(), 0);

    let ranked = outcome.ranked(Objective::LowestRipple);
    assert!(!ranked.is_empty());
    let thresholds = Thresholds::default();
    for e in &ranked {
        let a = e.assessment().unwrap();
        assert!(a.metrics.b_mean.abs() >= thresholds.min_field);
        assert!(a.metrics.ripple_rms <= thresholds.max_ripple);
        assert!(a.report.feasible);
    }
    for pair in ranked.windows(2) {
        let r0 = pair[0].assessment().unwrap().metrics.ripple_rms;
        let r1 = pair[1].assessment().unwrap().metrics.ripple_rms;
        assert!(r0 <= r1);
    }

    // Every infeasible point still carries all four gates
    for e in outcome.evaluations.iter().filter(|e| !e.is_feasible()) {
        let report = e.assessment().unwrap().report;
        assert!(!report.failed_gates().is_empty());
    }
}

#[test]
fn helmholtz_reference_design_point() {
    // N = 180, I = 45 kA, R = 0.5 m is documented at about 7.26 T with 0.29 % ripple
    let config = Configuration {
        geometry: Geometry::Helmholtz { separation: None },
        turns: 180,
        current: 45_000.0,
        radius: 0.5,
    };
    let evaluation = evaluate(&config, &Pipeline::new(0.01), None);
    let a = evaluation.assessment().unwrap();
    assert!((a.metrics.b_mean - 7.26).abs() < 0.05, "{}", a.metrics.b_mean);
    assert!(a.metrics.ripple_rms < Thresholds::default().max_ripple);
    assert!((config.conductor_length() - 180.0 * PI).abs() < 1e-9);
    assert!(a.report.feasible, "{:?}", a.report.failed_gates());
}

#[test]
fn search_is_reproducible() {
    let pipeline = Pipeline {
        sampling: supercoil::search::Sampling::Plane(PlaneSpec {
            half_width: 0.05,
            resolution: 5,
            z: 0.0,
        }),
        ..Pipeline::new(0.01)
    };
    let strategy = Strategy::Random {
        samples: 12,
        seed: 2024,
    };
    let space = ParameterSpace::default();
    let a = search(&space, &strategy, &pipeline, None).unwrap();
    let b = search(&space, &strategy, &pipeline, None).unwrap();
    assert_eq!(a, b);

    // Each evaluation matches a standalone evaluation of the same point
    for e in &a.evaluations {
        assert_eq!(*e, evaluate(&e.configuration, &pipeline, None));
    }
}

#[test]
fn thermal_margin_exact_when_cooling_keeps_up() {
    let config = Configuration {
        geometry: Geometry::Helmholtz { separation: None },
        turns: 200,
        current: 40_000.0,
        radius: 0.5,
    };
    let pipeline = Pipeline::new(0.01);
    let evaluation = evaluate(&config, &pipeline, None);
    let a = evaluation.assessment().unwrap();
    assert!(a.thermal.total_load < a.thermal.cooling_capacity);
    assert_eq!(
        a.thermal_margin,
        pipeline.material.tc - pipeline.thermal.base_temperature
    );
    assert_eq!(a.report.thermal_margin.value, a.thermal_margin);
}

#[test]
fn overloaded_cryocooler_fails_thermal_gate_only_as_a_gate() {
    let config = Configuration {
        geometry: Geometry::Helmholtz { separation: None },
        turns: 200,
        current: 40_000.0,
        radius: 0.5,
    };
    let pipeline = Pipeline {
        thermal: ThermalState {
            cryocooler_power: 0.0,
            ..Default::default()
        },
        ..Pipeline::new(0.01)
    };
    let evaluation = evaluate(&config, &pipeline, None);
    let a = evaluation.assessment().unwrap();
    assert_eq!(a.thermal_margin, 0.0);
    assert!(!a.report.feasible);
    assert!(a.report.failed_gates().contains(&"thermal_margin"));
    assert!(a.report.failed_gates().contains(&"critical_current"));
}

#[test]
fn smeared_stack_volume_energy() {
    let config = Configuration {
        geometry: Geometry::Stack {
            layers: 4,
            axial_spacing: 0.02,
            delta_r: 0.005,
        },
        turns: 50,
        current: 1000.0,
        radius: 0.2,
    };
    let cs = CrossSection::Rectangular {
        width: 0.004,
        thickness: 0.004,
        radial_samples: 2,
        axial_samples: 2,
    };
    let assembly = config.assembly(&cs, Discretization::default()).unwrap();
    assert_eq!(assembly.loops().len(), 16);

    let spec = VolumeSpec {
        half_width: 0.05,
        resolution: 5,
        half_height: 0.02,
        z_resolution: 5,
    };
    let sample = sample_volume(&assembly, &spec).unwrap();
    let m = MetricsResult::from_sample(&sample, 0.05).unwrap();
    let energy = m.stored_energy_J.unwrap();
    // Bounded by the peak energy density over all sampled cells
    let sampled_volume = sample.cell_volume().unwrap() * 125.0;
    assert!(energy > 0.0);
    assert!(energy <= m.b_peak.powi(2) / (2.0 * MU_0) * sampled_volume * (1.0 + 1e-12));
    assert!(m.coverage_fraction > 0.0 && m.coverage_fraction <= 1.0);
}

#[test]
fn invalid_inputs_fail_fast() {
    assert!(Loop::new(1.0, 1, 0.0, 0.0).is_err());
    assert!(Loop::new(1.0, 0, 0.1, 0.0).is_err());
    assert!(Superconductor::new(0.0, 1e10, 18.0, 1.0).is_err());
}
