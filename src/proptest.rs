//! Strategies for property tests of connectivities and element geometry.
use crate::connectivity::Connectivity;
use crate::geometry::{node_point, signed_area_2d};
use ::proptest::collection::vec;
use ::proptest::prelude::*;

fn coordinate() -> impl Strategy<Value = f64> {
    // Keep coordinates small so that Jacobians stay well conditioned
    -10.0..10.0
}

/// Connectivities with up to `max_rows` rows of up to `max_row_len` entries below `n2`.
pub fn connectivity(max_rows: usize, max_cols: usize, max_row_len: usize) -> impl Strategy<Value = Connectivity> {
    (1..=max_cols.max(1))
        .prop_flat_map(move |n2| (Just(n2), vec(vec(0..n2, 0..=max_row_len), 0..=max_rows)))
        .prop_filter_map("rows must fit the column count", |(n2, rows)| {
            Connectivity::from_rows(n2, &rows).ok()
        })
}

/// Node coordinates of a counterclockwise triangle in the xy-plane.
pub fn counterclockwise_triangle() -> impl Strategy<Value = Vec<f64>> {
    vec(coordinate(), 6).prop_filter_map("triangle must not be degenerate", |c| {
        let mut xpts = vec![c[0], c[1], 0.0, c[2], c[3], 0.0, c[4], c[5], 0.0];
        let area = signed_area_2d(&node_point(&xpts, 0), &node_point(&xpts, 1), &node_point(&xpts, 2));
        if area.abs() < 1e-2 {
            return None;
        }
        if area < 0.0 {
            for d in 0..3 {
                xpts.swap(3 + d, 6 + d);
            }
        }
        Some(xpts)
    })
}

/// Node coordinates of a positively oriented tetrahedron.
pub fn positive_tetrahedron() -> impl Strategy<Value = Vec<f64>> {
    vec(coordinate(), 12).prop_filter_map("tetrahedron must not be degenerate", |mut xpts| {
        let origin = node_point(&xpts, 0);
        let [a, b, c] = [1, 2, 3].map(|i| node_point(&xpts, i) - origin);
        let volume = a.cross(&b).dot(&c) / 6.0;
        if volume.abs() < 1e-2 {
            return None;
        }
        if volume < 0.0 {
            for d in 0..3 {
                xpts.swap(3 + d, 6 + d);
            }
        }
        Some(xpts)
    })
}
