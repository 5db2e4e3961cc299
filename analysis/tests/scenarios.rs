//! Model and bootstrap scenarios, plus the properties the analysis promises.

use numlpa_analysis::bootstrap::{median, summarize};
use numlpa_analysis::evaluator::WilkensModel;
use numlpa_analysis::transform::Transform;
use numlpa_analysis::{wilkens, BootstrapError};
use proptest::prelude::*;

fn transform(variable: &[f64]) -> Transform {
    serde_json::from_value(serde_json::json!({
        "distribution": {"module": "dipoles", "seed": 3, "density": 5e13, "length": 0.0},
        "region": {"type": "square", "side": 2e-6},
        "diffraction": {"g_hkl": [1, 1, 1], "b_uvw": [1, 1, 0], "cell": 4.05e-10, "contrast": 0.25},
        "coefficients": {"harmonic": [1], "variable": variable}
    }))
    .unwrap()
}

#[test]
fn zero_fourier_variable_has_unit_amplitude() {
    let t = transform(&[0.0]);
    let model = WilkensModel::new(&t, 1, None).unwrap();
    let amplitude = model.closure();
    for (rho, cutoff) in [(0.0, 0.0), (1e14, 1e-7), (1e16, 1e-9), (3.0, 0.0)] {
        assert_eq!(amplitude(rho, cutoff), vec![1.0]);
    }
}

#[test]
fn bootstrap_of_uniform_grid_reports_growth() {
    let lambdas: Vec<f64> = (0..100).map(|i| 1.0 + f64::from(i) / 100.0).collect();
    let summary = summarize(&lambdas, 0.1, Some((0.01, 0.5))).unwrap();
    let [lo, center, hi] = summary.intervals;
    assert!(lo <= 1.49 && 1.50 <= hi);
    assert!((center - 1.495).abs() < 1e-9);
    assert!(summary.hypothesis_test_statement_latex_sp.contains("creciendo"));
    assert!(summary.lambda_latex_interval.starts_with("$\\lambda = 1.4950^{+"));
    assert!(summary
        .bootstrap_intermediate_distribution
        .iter()
        .all(|l| *l > lo && *l < hi));
}

#[test]
fn bootstrap_needs_two_values() {
    assert_eq!(
        summarize(&[0.95], 0.1, Some((0.5, 0.5))),
        Err(BootstrapError::EmptyDistribution { count: 1 })
    );
}

proptest! {
    #[test]
    fn prop_wilkens_f_is_continuous_at_one(exponent in 4i32..9) {
        let eps = 10f64.powi(-exponent);
        let gap = (wilkens::f(1.0 - eps) - wilkens::f(1.0 + eps)).abs();
        prop_assert!(gap < 1e-3 * eps.sqrt() + 10.0 * eps, "gap {gap} at ε = {eps}");
    }

    #[test]
    fn prop_wilkens_f_is_positive_and_decreasing(eta in 1e-3..50.0f64) {
        let here = wilkens::f(eta);
        prop_assert!(here > 0.0);
        prop_assert!(wilkens::f(eta * 1.01) < here);
    }

    #[test]
    fn prop_closure_is_pure(rho in 1e12..1e16f64, cutoff in 1e-9..1e-5f64) {
        let t = transform(&[1e-9, 5e-9, 2e-8]);
        let model = WilkensModel::new(&t, 1, None).unwrap();
        let first = model.closure()(rho, cutoff);
        let _ = model.evaluate(rho * 2.0, cutoff / 3.0);
        let second = model.closure()(rho, cutoff);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_interval_brackets_the_median(
        lambdas in prop::collection::vec(0.1..10.0f64, 2..60),
        alpha in 0.001..0.999f64,
        p_low in 0.0..=1.0f64,
        p_high in 0.0..=1.0f64,
    ) {
        let summary = summarize(&lambdas, alpha, Some((p_low, p_high))).unwrap();
        let [lo, center, hi] = summary.intervals;
        let mut sorted = lambdas.clone();
        sorted.sort_by(f64::total_cmp);
        prop_assert_eq!(center, median(&sorted));
        prop_assert!(lo <= center && center <= hi);
    }
}
