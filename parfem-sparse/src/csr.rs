//! Helpers for building and constraining CSR matrices.
use nalgebra::RealField;
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use std::collections::BTreeMap;

/// Builds a CSR matrix from `(row, col, value)` triplets, summing duplicates.
///
/// # Panics
///
/// Panics if a triplet lies outside the `nrows x ncols` shape.
pub fn csr_from_triplets<T>(nrows: usize, ncols: usize, triplets: &[(usize, usize, T)]) -> CsrMatrix<T>
where
    T: RealField + Copy,
{
    let mut coo = CooMatrix::new(nrows, ncols);
    for &(i, j, v) in triplets {
        coo.push(i, j, v);
    }
    CsrMatrix::from(&coo)
}

/// Symmetric elimination of prescribed unknowns on a block of rows.
///
/// The matrix holds the rows `row_offset..row_offset + nrows` of a larger square system with
/// global column indices. For every prescribed unknown `j` with value `x_j`:
///
///  - rows `i` not prescribed get `rhs[i] -= A_ij x_j` and `A_ij = 0`,
///  - the row of `j` (if stored here) is zeroed with a unit diagonal and `rhs[j] = x_j`.
pub fn apply_fixed_values_csr<T>(
    matrix: &mut CsrMatrix<T>,
    row_offset: usize,
    fixed: &BTreeMap<usize, T>,
    rhs: &mut [T],
) where
    T: RealField + Copy,
{
    assert_eq!(matrix.nrows(), rhs.len(), "rhs must match the number of stored rows");
    for (local_row, mut row) in matrix.row_iter_mut().enumerate() {
        let global_row = row_offset + local_row;
        let (cols, values) = row.cols_and_values_mut();
        if let Some(&prescribed) = fixed.get(&global_row) {
            for (&col, val) in cols.iter().zip(values) {
                *val = if col == global_row { T::one() } else { T::zero() };
            }
            rhs[local_row] = prescribed;
        } else {
            for (&col, val) in cols.iter().zip(values) {
                if let Some(&prescribed) = fixed.get(&col) {
                    rhs[local_row] -= *val * prescribed;
                    *val = T::zero();
                }
            }
        }
    }
}

/// Maximum absolute difference between `A` and its transpose.
///
/// # Panics
///
/// Panics if the matrix is not square.
pub fn symmetry_defect<T>(matrix: &CsrMatrix<T>) -> T
where
    T: RealField + Copy,
{
    let transpose = matrix.transpose();
    let difference = matrix - &transpose;
    difference
        .values()
        .iter()
        .fold(T::zero(), |defect, v| defect.max(v.abs()))
}
