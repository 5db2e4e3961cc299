//! The Wilkens intermediate function f(η).
//!
//! f is piecewise at η = 1. The small-η branch needs the integral
//! ∫₀^η arcsin(V)/V dV, which has no elementary closed form and is computed
//! here by adaptive Simpson quadrature.

use std::f64::consts::{FRAC_2_PI, LN_2, PI};

/// Relative accuracy requested from the arcsine integral.
const QUADRATURE_TOLERANCE: f64 = 1e-13;

/// Maximum bisection depth of the adaptive quadrature.
const QUADRATURE_DEPTH: u32 = 48;

/// Wilkens intermediate function.
///
/// `f(0) = +∞`, `f(+∞) = 0`, and negative or NaN arguments yield NaN.
#[must_use]
pub fn f(eta: f64) -> f64 {
    if eta.is_nan() || eta < 0.0 {
        return f64::NAN;
    }
    if eta == 0.0 {
        return f64::INFINITY;
    }
    if eta.is_infinite() {
        return 0.0;
    }
    if eta <= 1.0 {
        inner(eta)
    } else {
        outer(eta)
    }
}

fn inner(eta: f64) -> f64 {
    let eta2 = eta * eta;
    let eta3 = eta2 * eta;
    7.0 / 4.0 - eta.ln() - LN_2 + 512.0 / (90.0 * PI * eta)
        + FRAC_2_PI * (1.0 - 1.0 / (4.0 * eta2)) * arcsin_integral(eta)
        - (769.0 / (180.0 * eta) + 41.0 * eta / 90.0 + 2.0 * eta3 / 90.0)
            * (1.0 - eta2).sqrt()
            / PI
        - (11.0 / (12.0 * eta2) + 7.0 / 2.0 + eta2 / 3.0) * eta.asin() / PI
        + eta2 / 6.0
}

fn outer(eta: f64) -> f64 {
    512.0 / (90.0 * PI * eta) - (11.0 / 24.0 + LN_2 * eta / 4.0) / (eta * eta)
}

/// arcsin(V)/V with its continuous extension at V = 0.
fn sinc_arcsin(v: f64) -> f64 {
    if v == 0.0 {
        1.0
    } else {
        v.asin() / v
    }
}

/// ∫₀^η arcsin(V)/V dV for 0 ≤ η ≤ 1.
#[must_use]
pub fn arcsin_integral(eta: f64) -> f64 {
    if eta <= 0.0 {
        return 0.0;
    }
    let (fa, fm, fb) = (sinc_arcsin(0.0), sinc_arcsin(eta / 2.0), sinc_arcsin(eta));
    let whole = simpson(0.0, eta, fa, fm, fb);
    adaptive(
        0.0,
        eta,
        (fa, fm, fb),
        whole,
        QUADRATURE_TOLERANCE * eta,
        QUADRATURE_DEPTH,
    )
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

fn adaptive(a: f64, b: f64, (fa, fm, fb): (f64, f64, f64), whole: f64, tol: f64, depth: u32) -> f64 {
    let m = (a + b) / 2.0;
    let (lm, rm) = ((a + m) / 2.0, (m + b) / 2.0);
    let (flm, frm) = (sinc_arcsin(lm), sinc_arcsin(rm));
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;
    if depth == 0 || delta.abs() <= 15.0 * tol {
        return left + right + delta / 15.0;
    }
    adaptive(a, m, (fa, flm, fm), left, tol / 2.0, depth - 1)
        + adaptive(m, b, (fm, frm, fb), right, tol / 2.0, depth - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_matches_closed_form_at_one() {
        // ∫₀¹ arcsin(V)/V dV = (π/2) ln 2
        assert!((arcsin_integral(1.0) - PI / 2.0 * LN_2).abs() < 1e-10);
    }

    #[test]
    fn integral_of_small_interval_is_its_length() {
        let eta = 1e-4;
        assert!((arcsin_integral(eta) - eta).abs() < 1e-12);
    }

    #[test]
    fn both_branches_meet_at_one() {
        let expected = 512.0 / (90.0 * PI) - 11.0 / 24.0 - LN_2 / 4.0;
        assert!((inner(1.0) - expected).abs() < 1e-10);
        assert!((outer(1.0) - expected).abs() < 1e-15);
    }

    #[test]
    fn small_argument_behaves_like_negative_log() {
        let eta: f64 = 1e-3;
        let expected = -eta.ln() + 7.0 / 4.0 - LN_2;
        assert!((f(eta) - expected).abs() < 1e-3);
    }

    #[test]
    fn limits() {
        assert_eq!(f(0.0), f64::INFINITY);
        assert_eq!(f(f64::INFINITY), 0.0);
        assert!(f(-1.0).is_nan());
        assert!(f(1e6) > 0.0 && f(1e6) < 1e-5);
    }
}
