//! Quadrature rules for the one-dimensional domain `[-1, 1]`.

use crate::quadrature::Rule;
use std::f64::consts::PI;

/// Recurrence relation for Legendre polynomials.
///
/// Note: we use a formula for which derivatives are *not* defined at |x| == 1, so it is only
/// suitable for evaluation in the open interval (-1, 1).
#[derive(Debug, Default)]
struct LegendreRecurrence {
    n: usize,
    x: f64,
    // The current value, i.e. p_n(x)
    p1: f64,
    // The previous value in the recurrence, i.e. p_{n - 1}(x)
    p2: f64,
}

impl LegendreRecurrence {
    fn evaluate(n: usize, x: f64) -> Self {
        // m P_m(x) = (2m - 1) * x P_{m - 1}(x) - (m - 1) P_{m - 2}(x)
        let mut p1 = 1.0;
        let mut p2 = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p3 = p2;
            p2 = p1;
            p1 = ((2.0 * m - 1.0) * x * p2 - (m - 1.0) * p3) / m;
        }
        Self { n, x, p1, p2 }
    }

    fn value(&self) -> f64 {
        self.p1
    }

    fn derivative(&self) -> f64 {
        // dp_n/dx (x) = n * (x * p_n(x) - p_{n - 1}(x)) / (x^2 - 1)
        let n = self.n as f64;
        n * (self.x * self.p1 - self.p2) / (self.x * self.x - 1.0)
    }
}

/// Gauss-Legendre quadrature with `num_points` points, exact for polynomials of degree
/// `2 * num_points - 1`.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let m = (n + 1) / 2;
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    // Newton iteration from the Chebyshev-like initial guess for the first m roots, the
    // remaining ones follow by symmetry
    for i in 0..m {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp;
        let mut iterations = 0;
        loop {
            let recurrence = LegendreRecurrence::evaluate(n, x);
            dp = recurrence.derivative();
            let dx = -recurrence.value() / dp;
            x += dx;
            iterations += 1;
            if dx.abs() <= 1e-15 || iterations >= 100 {
                break;
            }
        }
        dp = LegendreRecurrence::evaluate(n, x).derivative();
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
        points.push([x]);
    }

    for i in m..n {
        let mirror = n - i - 1;
        points.push([-points[mirror][0]]);
        weights.push(weights[mirror]);
    }

    (weights, points)
}

/// Gauss-Legendre quadrature mapped to `[0, 1]`.
pub fn gauss_unit_interval(num_points: usize) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    (
        weights.into_iter().map(|w| 0.5 * w).collect(),
        points.into_iter().map(|[x]| [0.5 * (x + 1.0)]).collect(),
    )
}
