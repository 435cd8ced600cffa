use rand::rngs::StdRng;
use rand::SeedableRng;
use yamc_distributions::{
    AngularDistributions, Distribution, DistributionData, DistributionDataType, DistributionError,
    EnergyDistributions, GridDistributions, InterpolationType, LegendreDistribution, LinearisationTolerance,
    ReferenceFrame, TabulatedDistribution, TabulatedFunction, TwoBodyDistributionData,
    UncorrelatedDistributionData,
};

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {}, got {} (tolerance {})",
        expected,
        actual,
        tolerance
    );
}

fn two_point(left: f64, right: f64) -> TabulatedDistribution {
    TabulatedDistribution::new(TabulatedFunction::linear(vec![-1.0, 1.0], vec![left, right]).unwrap())
}

#[test]
fn test_legendre_case_b() {
    let distribution = LegendreDistribution::from_coefficients(vec![0.5, 0.25]).unwrap();
    assert_close(distribution.pdf().integral(), 1.0, 1e-14);
    assert_close(distribution.average_value(), 1.0 / 6.0, 1e-14);
    assert_close(distribution.evaluate(-1.0), 0.25, 1e-14);
    assert_close(distribution.evaluate(1.0), 0.75, 1e-14);
    assert_eq!(distribution.evaluate(1.5), 0.0);
    assert_close(distribution.cdf().evaluate(-1.0), 0.0, 1e-14);
    assert_close(distribution.cdf().evaluate(1.0), 1.0, 1e-14);
}

#[test]
fn test_grid_case_c() {
    // values at mu = -0.5 are 0.5, 0.495, 0.45 and 0.3
    let grid = GridDistributions::linear(
        vec![1.0, 2.0, 3.0, 4.0],
        vec![
            two_point(0.5, 0.5),
            two_point(0.49, 0.51),
            two_point(0.4, 0.6),
            two_point(0.1, 0.9),
        ],
    )
    .unwrap();
    assert_close(grid.evaluate(3.0, -0.5), 0.45, 1e-12);
    assert_close(grid.evaluate(2.5, -0.5), 0.4725, 1e-12);
    assert_eq!(grid.evaluate(5.0, -0.5), 0.0);
}

#[test]
fn test_legendre_linearise_is_idempotent() {
    let distribution = LegendreDistribution::from_coefficients(vec![0.5, 0.3, 0.2, 0.1]).unwrap();
    let tolerance = LinearisationTolerance::new(1e-4, 1e-10).unwrap();
    let linear = distribution.linearise(&tolerance).unwrap();
    let again = linear.linearise(&tolerance).unwrap();
    assert_eq!(linear, again);
    assert_close(linear.integral(), distribution.integral(), 1e-3);
    assert_close(linear.cdf().unwrap().evaluate(1.0), 1.0, 1e-12);
}

#[test]
fn test_sampling_reproduces_mean() {
    let mut rng = StdRng::seed_from_u64(42);
    let n = 20000;

    let legendre = LegendreDistribution::from_coefficients(vec![0.5, 0.25]).unwrap();
    let mean = (0..n).map(|_| legendre.sample(&mut rng).unwrap()).sum::<f64>() / n as f64;
    assert_close(mean, 1.0 / 6.0, 0.02);

    let tabulated = TabulatedDistribution::new(
        TabulatedFunction::linear(vec![0.0, 1.0, 3.0], vec![0.0, 0.5, 0.0]).unwrap(),
    );
    let expected = tabulated.average_value() / tabulated.integral();
    let mean = (0..n).map(|_| tabulated.sample(&mut rng).unwrap()).sum::<f64>() / n as f64;
    assert_close(mean, expected, 0.03);
}

#[test]
fn test_cumulative_without_density() {
    let distribution = two_point(0.5, 0.5);
    assert!(matches!(distribution.cdf(), Err(DistributionError::NotAvailable(_))));

    let cdf = TabulatedFunction::linear(vec![-1.0, 0.0, 1.0], vec![0.0, 0.25, 1.0]).unwrap();
    let derived = TabulatedDistribution::from_cumulative(cdf).unwrap();
    assert_close(derived.evaluate(-0.5), 0.25, 1e-14);
    assert_close(derived.evaluate(0.5), 0.75, 1e-14);
    assert_close(derived.integral(), 1.0, 1e-14);

    let two_regions = TabulatedFunction::new(
        vec![-1.0, 0.0, 1.0],
        vec![0.0, 0.25, 1.0],
        vec![1, 2],
        vec![InterpolationType::LinearLinear, InterpolationType::LinearLinear],
    )
    .unwrap();
    assert!(matches!(
        TabulatedDistribution::from_cumulative(two_regions),
        Err(DistributionError::Unsupported(_))
    ));
}

#[test]
fn test_distribution_data_from_json() {
    let json = r#"{
        "type": "uncorrelated",
        "frame": "lab",
        "angle": {
            "type": "Legendre",
            "grid": {"x": [1e5, 2e7], "boundaries": [1], "interpolants": ["lin-lin"]},
            "distributions": [
                {"pdf": {"coefficients": [0.5]}},
                {"pdf": {"coefficients": [0.5, 0.25]}}
            ]
        },
        "energy": {
            "type": "Tabulated",
            "grid": {"x": [1e5, 2e7], "boundaries": [1], "interpolants": ["log-log"]},
            "distributions": [
                {"pdf": {"x": [0.0, 1e4], "y": [1e-4, 1e-4], "boundaries": [1], "interpolants": ["lin-lin"]}},
                {"pdf": {"x": [0.0, 1e6], "y": [1e-6, 1e-6], "boundaries": [1], "interpolants": ["lin-lin"]}}
            ]
        }
    }"#;
    let data: DistributionData = serde_json::from_str(json).unwrap();
    assert_eq!(data.data_type(), DistributionDataType::Uncorrelated);
    assert_eq!(data.frame(), ReferenceFrame::Laboratory);
    assert_close(data.angle().evaluate(2e7, 1.0), 0.75, 1e-14);

    let DistributionData::Uncorrelated(uncorrelated) = &data else {
        panic!("expected uncorrelated data");
    };
    assert_close(uncorrelated.energy().evaluate(1e5, 5e3).unwrap(), 1e-4, 1e-18);
    // above 1e4 only the upper spectrum is non-zero
    let partial = uncorrelated.energy().evaluate(1e6, 5e4).unwrap();
    assert_close(partial, 1e-6 * 10.0_f64.ln() / 200.0_f64.ln(), 1e-18);

    let mut rng = StdRng::seed_from_u64(1);
    let (e_out, mu) = uncorrelated.sample(2e7, &mut rng).unwrap();
    assert!((0.0..=1e6).contains(&e_out));
    assert!((-1.0..=1.0).contains(&mu));
}

#[test]
fn test_invalid_json_is_rejected() {
    // leading discontinuity in the outer grid
    let json = r#"{
        "type": "Tabulated",
        "grid": {"x": [1.0, 1.0, 2.0], "boundaries": [2], "interpolants": ["lin-lin"]},
        "distributions": []
    }"#;
    assert!(serde_json::from_str::<EnergyDistributions>(json).is_err());
}

#[test]
fn test_linearise_two_body_data() {
    let angle = AngularDistributions::Legendre(
        GridDistributions::new(
            vec![1e5, 1e6, 2e7],
            vec![
                LegendreDistribution::from_coefficients(vec![0.5]).unwrap(),
                LegendreDistribution::from_coefficients(vec![0.5, 0.2, 0.1]).unwrap(),
                LegendreDistribution::from_coefficients(vec![0.5, 0.4, 0.3, 0.1]).unwrap(),
            ],
            vec![2],
            vec![InterpolationType::LogLog],
        )
        .unwrap(),
    );
    let data = TwoBodyDistributionData::new(ReferenceFrame::CentreOfMass, angle);
    let tolerance = LinearisationTolerance::new(1e-3, 1e-10).unwrap();
    let linear = data.linearise(&tolerance).unwrap();

    for energy in [1e5, 3e5, 1e6, 5e6, 2e7] {
        for mu in [-0.9, -0.3, 0.0, 0.4, 0.95] {
            let exact = data.angle().evaluate(energy, mu);
            let approximate = linear.angle().evaluate(energy, mu);
            assert_close(approximate, exact, 3e-3 * exact.abs() + 1e-9);
        }
    }
    assert_eq!(linear.frame(), ReferenceFrame::CentreOfMass);
}

#[test]
fn test_isotropic_uncorrelated_sampling() {
    let energy = EnergyDistributions::Tabulated(
        GridDistributions::linear(
            vec![1.0, 2.0],
            vec![
                TabulatedDistribution::new(TabulatedFunction::linear(vec![0.0, 1.0], vec![1.0, 1.0]).unwrap()),
                TabulatedDistribution::new(TabulatedFunction::linear(vec![0.0, 2.0], vec![0.5, 0.5]).unwrap()),
            ],
        )
        .unwrap(),
    );
    let data = UncorrelatedDistributionData::new(ReferenceFrame::Laboratory, AngularDistributions::Isotropic, energy);

    let mut rng = StdRng::seed_from_u64(3);
    let n = 20000;
    let mut sum_mu = 0.0;
    for _ in 0..n {
        let (e_out, mu) = data.sample(1.0, &mut rng).unwrap();
        assert!((0.0..=1.0).contains(&e_out));
        sum_mu += mu;
    }
    assert_close(sum_mu / n as f64, 0.0, 0.02);
}
