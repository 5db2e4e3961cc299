//! Bootstrap aggregation of growth factors.
//!
//! Reduces the λ of a batch to an asymmetric interval around its median,
//! renders it in LaTeX, and states the outcome of the one-sided tests on
//! whether the dislocation population grows or shrinks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::BootstrapError;

/// Summary written by the bootstrap command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BootstrapSummary {
    /// `[lo, median, hi]`.
    pub intervals: [f64; 3],
    /// `$\lambda = m^{+…}_{-…}$`.
    pub lambda_latex_interval: String,
    /// Rounded `[p₀, p₁]`.
    #[serde(rename = "p-values")]
    pub p_values: [f64; 2],
    /// λ values strictly inside `(lo, hi)`, ascending.
    pub bootstrap_intermediate_distribution: Vec<f64>,
    /// Verdict in Spanish.
    pub hypothesis_test_statement_latex_sp: String,
    /// Verdict in English.
    pub hypothesis_test_statement_latex_en: String,
}

/// Outcome of the one-sided tests at level α.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// `H₀: λ > 1` rejected with p-value `p`.
    Decreasing {
        /// Rounded p-value of the rejected hypothesis.
        p: f64,
    },
    /// `H₀: λ < 1` rejected with p-value `p`.
    Increasing {
        /// Rounded p-value of the rejected hypothesis.
        p: f64,
    },
    /// Neither hypothesis is rejected.
    Inconclusive {
        /// Rounded `p₀`.
        low: f64,
        /// Rounded `p₁`.
        high: f64,
    },
}

impl Verdict {
    /// Decides between the hypotheses from the rounded p-values.
    #[must_use]
    pub fn decide(alpha: f64, low: f64, high: f64) -> Self {
        if high < alpha {
            Self::Decreasing { p: high }
        } else if low < alpha {
            Self::Increasing { p: low }
        } else {
            Self::Inconclusive { low, high }
        }
    }

    /// English statement.
    #[must_use]
    pub fn english(&self) -> String {
        match self {
            Self::Decreasing { p } => {
                format!("Population decreasing; $H_0: \\lambda > 1$, $\\alpha > p = {p:.4}$")
            }
            Self::Increasing { p } => {
                format!("Population increasing; $H_0: \\lambda < 1$, $\\alpha > p = {p:.4}$")
            }
            Self::Inconclusive { low, high } => format!(
                "Calculated $p$ exceeds $\\alpha$ under both null hypotheses \
                 ($H_0: \\lambda < 1$, $p = {low:.4}$; $H_0: \\lambda > 1$, $p = {high:.4}$)"
            ),
        }
    }

    /// Spanish statement.
    #[must_use]
    pub fn spanish(&self) -> String {
        match self {
            Self::Decreasing { p } => {
                format!("Población decreciendo; $H_0: \\lambda > 1$, $\\alpha > p = {p:.4}$")
            }
            Self::Increasing { p } => {
                format!("Población creciendo; $H_0: \\lambda < 1$, $\\alpha > p = {p:.4}$")
            }
            Self::Inconclusive { low, high } => format!(
                "El $p$ calculado excede $\\alpha$ bajo ambas hipótesis nulas \
                 ($H_0: \\lambda < 1$, $p = {low:.4}$; $H_0: \\lambda > 1$, $p = {high:.4}$)"
            ),
        }
    }
}

/// Fraction of λ at or below 1 and at or above 1.
///
/// Used when the λ file carries no p-values of its own.
#[must_use]
pub fn empirical_p_values(lambdas: &[f64]) -> (f64, f64) {
    if lambdas.is_empty() {
        return (1.0, 1.0);
    }
    let n = lambdas.len() as f64;
    let low = lambdas.iter().filter(|&&l| l <= 1.0).count() as f64;
    let high = lambdas.iter().filter(|&&l| l >= 1.0).count() as f64;
    (low / n, high / n)
}

/// Quantile `q` of ascending `sorted`, interpolating linearly between the
/// two closest order statistics.
#[must_use]
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [only] => *only,
        _ => {
            let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
            let below = position.floor() as usize;
            let above = (below + 1).min(sorted.len() - 1);
            let weight = position - below as f64;
            sorted[below] + weight * (sorted[above] - sorted[below])
        }
    }
}

/// Median of ascending `sorted`.
#[must_use]
pub fn median(sorted: &[f64]) -> f64 {
    quantile(sorted, 0.5)
}

fn round4(p: f64) -> f64 {
    (p * 1e4).round() / 1e4
}

/// Aggregates `lambdas` at significance `alpha`.
///
/// `p_values` is `(p_low, p_high)`; when absent it is estimated with
/// [`empirical_p_values`].
///
/// # Errors
///
/// [`BootstrapError::EmptyDistribution`] for fewer than two values and
/// [`BootstrapError::InvalidArgument`] when α is outside (0, 1), a p-value
/// is outside [0, 1], or a λ is not finite.
pub fn summarize(
    lambdas: &[f64],
    alpha: f64,
    p_values: Option<(f64, f64)>,
) -> Result<BootstrapSummary, BootstrapError> {
    if lambdas.len() < 2 {
        return Err(BootstrapError::EmptyDistribution {
            count: lambdas.len(),
        });
    }
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(BootstrapError::InvalidArgument {
            name: "alpha",
            reason: format!("must lie in (0, 1), got {alpha}"),
        });
    }
    if let Some(bad) = lambdas.iter().find(|l| !l.is_finite()) {
        return Err(BootstrapError::InvalidArgument {
            name: "lambdas",
            reason: format!("every value must be finite, got {bad}"),
        });
    }
    let (p_low, p_high) = p_values.unwrap_or_else(|| empirical_p_values(lambdas));
    for (name, p) in [("p_low", p_low), ("p_high", p_high)] {
        if !(0.0..=1.0).contains(&p) {
            return Err(BootstrapError::InvalidArgument {
                name,
                reason: format!("must lie in [0, 1], got {p}"),
            });
        }
    }

    let mut sorted = lambdas.to_vec();
    sorted.sort_by(f64::total_cmp);
    let lo = quantile(&sorted, alpha / 2.0 * (1.0 - p_low));
    let hi = quantile(&sorted, 1.0 - alpha / 2.0 * (1.0 - p_high));
    let center = median(&sorted);
    let intermediate = sorted.iter().copied().filter(|&l| l > lo && l < hi).collect();

    let (p0, p1) = (round4(p_low), round4(p_high));
    let verdict = Verdict::decide(alpha, p0, p1);
    debug!(lo, center, hi, ?verdict, "bootstrap interval");
    Ok(BootstrapSummary {
        intervals: [lo, center, hi],
        lambda_latex_interval: format!(
            "$\\lambda = {center:.4}^{{+{:.4}}}_{{-{:.4}}}$",
            hi - center,
            center - lo
        ),
        p_values: [p0, p1],
        bootstrap_intermediate_distribution: intermediate,
        hypothesis_test_statement_latex_sp: verdict.spanish(),
        hypothesis_test_statement_latex_en: verdict.english(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantile_interpolates_like_order_statistics() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&v, 0.0), 1.0);
        assert_eq!(quantile(&v, 1.0), 4.0);
        assert!((quantile(&v, 0.5) - 2.5).abs() < 1e-15);
        assert!((quantile(&v, 0.25) - 1.75).abs() < 1e-15);
        assert_eq!(median(&[3.0]), 3.0);
    }

    #[test]
    fn verdict_prefers_decreasing() {
        assert_eq!(Verdict::decide(0.05, 0.01, 0.02), Verdict::Decreasing { p: 0.02 });
        assert_eq!(Verdict::decide(0.05, 0.01, 0.2), Verdict::Increasing { p: 0.01 });
        assert!(matches!(Verdict::decide(0.05, 0.3, 0.2), Verdict::Inconclusive { .. }));
        assert!(Verdict::decide(0.05, 0.3, 0.01).spanish().contains("decreciendo"));
    }

    #[test]
    fn p_values_are_rounded_before_the_verdict() {
        let summary = summarize(&[0.9, 1.1, 1.2], 0.1, Some((0.123_456, 0.099_996))).unwrap();
        assert_eq!(summary.p_values, [0.1235, 0.1]);
        assert!(summary.hypothesis_test_statement_latex_en.contains("both null hypotheses"));
    }

    #[test]
    fn empirical_p_values_count_each_side() {
        assert_eq!(empirical_p_values(&[0.5, 1.0, 1.5, 2.0]), (0.5, 0.75));
    }

    #[test]
    fn rejects_invalid_arguments() {
        assert!(matches!(
            summarize(&[1.0, 2.0], 1.0, None),
            Err(BootstrapError::InvalidArgument { name: "alpha", .. })
        ));
        assert!(matches!(
            summarize(&[1.0, 2.0], 0.1, Some((1.5, 0.0))),
            Err(BootstrapError::InvalidArgument { name: "p_low", .. })
        ));
        assert!(matches!(
            summarize(&[1.0, f64::NAN], 0.1, None),
            Err(BootstrapError::InvalidArgument { name: "lambdas", .. })
        ));
    }

    #[test]
    fn summary_uses_hyphenated_key() {
        let summary = summarize(&[0.5, 0.6, 0.7], 0.2, None).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("p-values").is_some());
        assert_eq!(json["intervals"].as_array().unwrap().len(), 3);
    }
}
