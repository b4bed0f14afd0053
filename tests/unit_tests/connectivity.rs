use itertools::Itertools;
use parfem::connectivity::Connectivity;
use parfem::proptest::connectivity;
use proptest::prelude::*;
use util::{assert_panics, prefix_sum};

#[test]
fn invert_two_triangles() {
    let conn = Connectivity::from_rows(4, &[[0usize, 1, 2], [1, 3, 2]]).unwrap();
    let inverse = conn.invert();
    assert_eq!(inverse.n1(), 4);
    assert_eq!(inverse.n2(), 2);
    let rows: Vec<Vec<usize>> = inverse.rows().map(|row| row.to_vec()).collect();
    assert_eq!(rows, vec![vec![0], vec![0, 1], vec![0, 1], vec![1]]);
}

#[test]
fn node_to_node_of_two_triangles() {
    let conn = Connectivity::from_rows(4, &[[0usize, 1, 2], [1, 3, 2]]).unwrap();
    let adjacency = conn.node_to_node();
    let sorted_rows: Vec<Vec<usize>> = adjacency.rows().map(|row| row.iter().copied().sorted().collect()).collect();
    assert_eq!(
        sorted_rows,
        vec![vec![0, 1, 2], vec![0, 1, 2, 3], vec![0, 1, 2, 3], vec![1, 2, 3]]
    );
}

#[test]
fn out_of_range_column_is_rejected() {
    assert!(Connectivity::from_rows(2, &[[0usize, 2]]).is_err());
    assert!(Connectivity::new(3, vec![2, 1], vec![0, 1]).is_err());
}

#[test]
fn row_access_is_bounds_checked() {
    let conn = Connectivity::from_rows(3, &[[0usize, 1], [1, 2]]).unwrap();
    assert!(conn.get_row(2).is_err());
    assert_panics!(conn.row(2));
}

proptest! {
    #[test]
    fn invert_transposes_every_entry(conn in connectivity(12, 10, 5)) {
        let inverse = conn.invert();
        prop_assert_eq!(inverse.nnz(), conn.nnz());
        prop_assert_eq!(inverse.ptr().to_vec(), prefix_sum(inverse.cnt().iter().copied(), 0).collect::<Vec<_>>());
        for (i, row) in conn.rows().enumerate() {
            for &j in row {
                prop_assert!(inverse.row(j).contains(&i));
            }
        }
        // Rows of the inverse list their entities in increasing order
        for row in inverse.rows() {
            prop_assert!(row.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn node_to_node_is_symmetric_and_unique(conn in connectivity(12, 10, 5)) {
        let adjacency = conn.node_to_node();
        let touched = conn.invert();
        for (node, row) in adjacency.rows().enumerate() {
            prop_assert_eq!(row.iter().unique().count(), row.len());
            prop_assert_eq!(row.contains(&node), !touched.row(node).is_empty());
            for &neighbor in row {
                prop_assert!(adjacency.row(neighbor).contains(&node));
            }
        }
    }
}
