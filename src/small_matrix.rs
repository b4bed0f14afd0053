//! Closed-form operations on the leading `n x n` block of a 3x3 matrix, `n` in `1..=3`.
//!
//! Reference-to-physical Jacobians are always stored as 3x3 matrices. Only the leading block
//! given by the reference (or physical) dimension is meaningful, the remaining entries are zero.
use nalgebra::Matrix3;

pub trait LeadingBlock {
    /// Determinant of the leading `n x n` block.
    fn leading_determinant(&self, n: usize) -> f64;

    /// Inverse of the leading `n x n` block, padded with zeros. `None` if the block is singular.
    fn leading_inverse(&self, n: usize) -> Option<Matrix3<f64>>;

    /// Moore-Penrose pseudo-inverse of a matrix with `n` meaningful columns.
    ///
    /// Returns `(J^T J)^{-1} J^T` with the inverse taken over the leading `n x n` block, together
    /// with `sqrt(det(J^T J))`, the generalized measure of the mapping.
    fn leading_pseudo_inverse(&self, n: usize) -> Option<(Matrix3<f64>, f64)>;
}

impl LeadingBlock for Matrix3<f64> {
    fn leading_determinant(&self, n: usize) -> f64 {
        let m = self;
        match n {
            1 => m[(0, 0)],
            2 => m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)],
            3 => m.determinant(),
            _ => panic!("leading block dimension must be in 1..=3, got {n}"),
        }
    }

    fn leading_inverse(&self, n: usize) -> Option<Matrix3<f64>> {
        let det = self.leading_determinant(n);
        if det == 0.0 {
            return None;
        }
        let m = self;
        let mut inv = Matrix3::zeros();
        match n {
            1 => inv[(0, 0)] = 1.0 / det,
            2 => {
                inv[(0, 0)] = m[(1, 1)] / det;
                inv[(0, 1)] = -m[(0, 1)] / det;
                inv[(1, 0)] = -m[(1, 0)] / det;
                inv[(1, 1)] = m[(0, 0)] / det;
            }
            _ => {
                inv[(0, 0)] = (m[(1, 1)] * m[(2, 2)] - m[(1, 2)] * m[(2, 1)]) / det;
                inv[(0, 1)] = (m[(0, 2)] * m[(2, 1)] - m[(0, 1)] * m[(2, 2)]) / det;
                inv[(0, 2)] = (m[(0, 1)] * m[(1, 2)] - m[(0, 2)] * m[(1, 1)]) / det;
                inv[(1, 0)] = (m[(1, 2)] * m[(2, 0)] - m[(1, 0)] * m[(2, 2)]) / det;
                inv[(1, 1)] = (m[(0, 0)] * m[(2, 2)] - m[(0, 2)] * m[(2, 0)]) / det;
                inv[(1, 2)] = (m[(0, 2)] * m[(1, 0)] - m[(0, 0)] * m[(1, 2)]) / det;
                inv[(2, 0)] = (m[(1, 0)] * m[(2, 1)] - m[(1, 1)] * m[(2, 0)]) / det;
                inv[(2, 1)] = (m[(0, 1)] * m[(2, 0)] - m[(0, 0)] * m[(2, 1)]) / det;
                inv[(2, 2)] = (m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)]) / det;
            }
        }
        Some(inv)
    }

    fn leading_pseudo_inverse(&self, n: usize) -> Option<(Matrix3<f64>, f64)> {
        let jt = self.transpose();
        let jtj = jt * self;
        let det = jtj.leading_determinant(n);
        if det <= 0.0 {
            return None;
        }
        let inv = jtj.leading_inverse(n)?;
        Some((inv * jt, det.sqrt()))
    }
}
