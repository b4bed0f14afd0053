//! Rules for the unit triangle `{x, y >= 0, x + y <= 1}`, the unit tetrahedron and prisms.
use crate::quadrature::univariate::{gauss, gauss_unit_interval};
use crate::quadrature::Rule;

/// Symmetric triangle rules with 3 (degree 2), 4 (degree 3) or 6 (degree 4) points.
///
/// # Panics
///
/// Panics for any other number of points.
pub fn triangle(num_points: usize) -> Rule<2> {
    match num_points {
        3 => {
            let w = 1.0 / 6.0;
            let (a, b) = (1.0 / 6.0, 2.0 / 3.0);
            (vec![w; 3], vec![[a, a], [b, a], [a, b]])
        }
        4 => {
            let (w0, w1) = (-27.0 / 96.0, 25.0 / 96.0);
            let (a, b) = (0.2, 0.6);
            (vec![w0, w1, w1, w1], vec![[1.0 / 3.0, 1.0 / 3.0], [a, a], [b, a], [a, b]])
        }
        6 => {
            let a = 0.445_948_490_915_965;
            let b = 0.091_576_213_509_771;
            let wa = 0.223_381_589_678_011 / 2.0;
            let wb = 0.109_951_743_655_322 / 2.0;
            (
                vec![wa, wa, wa, wb, wb, wb],
                vec![
                    [a, a],
                    [1.0 - 2.0 * a, a],
                    [a, 1.0 - 2.0 * a],
                    [b, b],
                    [1.0 - 2.0 * b, b],
                    [b, 1.0 - 2.0 * b],
                ],
            )
        }
        _ => panic!("no symmetric triangle rule with {num_points} points"),
    }
}

/// The 4-point tetrahedron rule, exact for quadratics.
pub fn tetrahedron_4() -> Rule<3> {
    let a = 0.585_410_196_624_968_5;
    let b = 0.138_196_601_125_010_5;
    let w = 1.0 / 24.0;
    (vec![w; 4], vec![[b, b, b], [a, b, b], [b, a, b], [b, b, a]])
}

/// Collapsed Gauss rule for the tetrahedron with `n^3` points.
///
/// The unit cube is mapped onto the tetrahedron by `x = u`, `y = v (1 - u)`,
/// `z = w (1 - u) (1 - v)`. Exact for polynomials of degree `2 n - 3`.
pub fn tetrahedron_collapsed(n: usize) -> Rule<3> {
    let (weights1d, points1d) = gauss_unit_interval(n);
    let mut weights = Vec::with_capacity(n * n * n);
    let mut points = Vec::with_capacity(n * n * n);
    for (&wu, &[u]) in weights1d.iter().zip(&points1d) {
        for (&wv, &[v]) in weights1d.iter().zip(&points1d) {
            for (&ww, &[w]) in weights1d.iter().zip(&points1d) {
                let jacobian = (1.0 - u) * (1.0 - u) * (1.0 - v);
                weights.push(wu * wv * ww * jacobian);
                points.push([u, v * (1.0 - u), w * (1.0 - u) * (1.0 - v)]);
            }
        }
    }
    (weights, points)
}

/// Product of a triangle rule and a Gauss rule along the prism axis `[-1, 1]`.
pub fn prism(num_triangle_points: usize, num_axial_points: usize) -> Rule<3> {
    let (tri_weights, tri_points) = triangle(num_triangle_points);
    let (axial_weights, axial_points) = gauss(num_axial_points);
    let mut weights = Vec::new();
    let mut points = Vec::new();
    for (&wt, &[x, y]) in tri_weights.iter().zip(&tri_points) {
        for (&wz, &[z]) in axial_weights.iter().zip(&axial_points) {
            weights.push(wt * wz);
            points.push([x, y, z]);
        }
    }
    (weights, points)
}
