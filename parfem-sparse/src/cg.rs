//! Preconditioned conjugate gradient for symmetric positive definite operators.
use core::fmt;
use nalgebra::{DVector, RealField};
use nalgebra_sparse::ops::serial::spmm_csr_dense;
use nalgebra_sparse::ops::Op;
use nalgebra_sparse::CsrMatrix;
use std::error::Error;
use std::marker::PhantomData;

pub type OperatorError = Box<dyn Error + Send + Sync>;

/// A linear operator `y = A x`.
pub trait LinearOperator<T: RealField> {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), OperatorError>;
}

impl<'a, T, A> LinearOperator<T> for &'a A
where
    T: RealField,
    A: ?Sized + LinearOperator<T>,
{
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), OperatorError> {
        <A as LinearOperator<T>>::apply(self, y, x)
    }
}

impl<T: RealField + Copy> LinearOperator<T> for CsrMatrix<T> {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), OperatorError> {
        if self.ncols() != x.len() || self.nrows() != y.len() {
            return Err(format!(
                "operator of size {}x{} applied to vectors of length {} and {}",
                self.nrows(),
                self.ncols(),
                y.len(),
                x.len()
            )
            .into());
        }
        spmm_csr_dense(T::zero(), y, T::one(), Op::NoOp(self), Op::NoOp(x));
        Ok(())
    }
}

pub struct IdentityOperator;

impl<T: RealField> LinearOperator<T> for IdentityOperator {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), OperatorError> {
        y.copy_from(x);
        Ok(())
    }
}

/// Jacobi preconditioner `P = diag(A)^{-1}`.
///
/// Zero diagonal entries are treated as ones.
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner<T: RealField> {
    inv_diag: DVector<T>,
}

impl<T: RealField + Copy> JacobiPreconditioner<T> {
    pub fn from_csr(matrix: &CsrMatrix<T>) -> Self {
        let mut inv_diag = DVector::from_element(matrix.nrows(), T::one());
        for (i, row) in matrix.row_iter().enumerate() {
            let diag = row
                .col_indices()
                .iter()
                .zip(row.values())
                .filter(|(&j, _)| j == i)
                .fold(T::zero(), |acc, (_, &v)| acc + v);
            if diag != T::zero() {
                inv_diag[i] = T::one() / diag;
            }
        }
        Self { inv_diag }
    }
}

impl<T: RealField + Copy> LinearOperator<T> for JacobiPreconditioner<T> {
    fn apply(&self, y: &mut DVector<T>, x: &DVector<T>) -> Result<(), OperatorError> {
        y.copy_from(x);
        y.component_mul_assign(&self.inv_diag);
        Ok(())
    }
}

pub trait CgStoppingCriterion<T: RealField> {
    fn has_converged(&self, b_norm: T, iteration: usize, approx_residual: &DVector<T>) -> bool;
}

/// Relative residual tolerance ||r|| <= tol * ||b||.
///
/// Note that we use the *approximate* residual given by Conjugate-Gradient. For ill-conditioned
/// problems, it is possible that CG's residual converges, but the real residual does not.
#[derive(Debug, Clone)]
pub struct RelativeResidualCriterion<T: RealField> {
    tol: T,
}

impl<T: RealField> RelativeResidualCriterion<T> {
    pub fn new(tol: T) -> Self {
        Self { tol }
    }
}

impl Default for RelativeResidualCriterion<f64> {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl<T: RealField + Copy> CgStoppingCriterion<T> for RelativeResidualCriterion<T> {
    fn has_converged(&self, b_norm: T, _iteration: usize, approx_residual: &DVector<T>) -> bool {
        approx_residual.norm() <= self.tol * b_norm
    }
}

#[derive(Debug)]
pub struct ConjugateGradient<T, A, P, Criterion> {
    operator: A,
    preconditioner: P,
    stopping_criterion: Criterion,
    max_iter: Option<usize>,
    marker: PhantomData<T>,
}

impl<T: RealField> ConjugateGradient<T, (), IdentityOperator, ()> {
    pub fn new() -> Self {
        Self {
            operator: (),
            preconditioner: IdentityOperator,
            stopping_criterion: (),
            max_iter: None,
            marker: PhantomData,
        }
    }
}

impl<T: RealField> Default for ConjugateGradient<T, (), IdentityOperator, ()> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, P, Criterion> ConjugateGradient<T, (), P, Criterion> {
    pub fn with_operator<A>(self, operator: A) -> ConjugateGradient<T, A, P, Criterion> {
        ConjugateGradient {
            operator,
            preconditioner: self.preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
            marker: PhantomData,
        }
    }
}

impl<T, A, P, Criterion> ConjugateGradient<T, A, P, Criterion> {
    pub fn with_preconditioner<P2>(self, preconditioner: P2) -> ConjugateGradient<T, A, P2, Criterion> {
        ConjugateGradient {
            operator: self.operator,
            preconditioner,
            stopping_criterion: self.stopping_criterion,
            max_iter: self.max_iter,
            marker: PhantomData,
        }
    }

    pub fn with_max_iter(self, max_iter: usize) -> Self {
        Self {
            max_iter: Some(max_iter),
            ..self
        }
    }
}

impl<T, A, P> ConjugateGradient<T, A, P, ()> {
    pub fn with_stopping_criterion<Criterion>(
        self,
        stopping_criterion: Criterion,
    ) -> ConjugateGradient<T, A, P, Criterion> {
        ConjugateGradient {
            operator: self.operator,
            preconditioner: self.preconditioner,
            stopping_criterion,
            max_iter: self.max_iter,
            marker: PhantomData,
        }
    }
}

#[derive(Debug)]
#[non_exhaustive]
pub enum SolveErrorKind {
    OperatorError(OperatorError),
    PreconditionerError(OperatorError),
    IndefiniteOperator,
    IndefinitePreconditioner,
    MaxIterationsReached { max_iter: usize },
}

impl fmt::Display for SolveErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OperatorError(err) => write!(f, "Error applying operator: {err}"),
            Self::PreconditionerError(err) => write!(f, "Error applying preconditioner: {err}"),
            Self::IndefiniteOperator => write!(f, "Operator appears to be indefinite"),
            Self::IndefinitePreconditioner => write!(f, "Indefinite preconditioner"),
            Self::MaxIterationsReached { max_iter } => write!(f, "Max iterations ({max_iter}) reached."),
        }
    }
}

#[non_exhaustive]
#[derive(Debug)]
pub struct SolveError {
    pub output: CgOutput,
    pub kind: SolveErrorKind,
}

impl SolveError {
    fn new(output: CgOutput, kind: SolveErrorKind) -> Self {
        Self { output, kind }
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CG solve failed after {} iterations. ", self.output.num_iterations)?;
        write!(f, "Error: {}", self.kind)
    }
}

impl std::error::Error for SolveError {}

#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct CgOutput {
    /// Number of iterations of the solver.
    ///
    /// Corresponds to the number of updates made to the (initial) solution vector.
    pub num_iterations: usize,
}

impl<T, A, P, Criterion> ConjugateGradient<T, A, P, Criterion>
where
    T: RealField + Copy,
    A: LinearOperator<T>,
    P: LinearOperator<T>,
    Criterion: CgStoppingCriterion<T>,
{
    /// Solves `A x = b`, using the contents of `x` as the initial guess.
    ///
    /// On failure `x` holds the last iterate.
    pub fn solve_with_guess(&self, b: &DVector<T>, x: &mut DVector<T>) -> Result<CgOutput, SolveError> {
        assert_eq!(b.len(), x.len(), "rhs and solution must have equal length");
        let n = x.len();
        let mut output = CgOutput { num_iterations: 0 };
        let fail = |output: &CgOutput, kind| Err(SolveError::new(output.clone(), kind));

        let b_norm = b.norm();
        if b_norm == T::zero() {
            x.fill(T::zero());
            return Ok(output);
        }

        let mut residual = DVector::zeros(n);
        if let Err(err) = self.operator.apply(&mut residual, x) {
            return fail(&output, SolveErrorKind::OperatorError(err));
        }
        residual = b - residual;

        let mut z = DVector::zeros(n);
        if let Err(err) = self.preconditioner.apply(&mut z, &residual) {
            return fail(&output, SolveErrorKind::PreconditionerError(err));
        }
        let mut direction = z.clone();
        let mut rho = z.dot(&residual);
        let mut a_direction = DVector::zeros(n);

        while !self
            .stopping_criterion
            .has_converged(b_norm, output.num_iterations, &residual)
        {
            if let Some(max_iter) = self.max_iter.filter(|&max_iter| output.num_iterations >= max_iter) {
                return fail(&output, SolveErrorKind::MaxIterationsReached { max_iter });
            }
            if let Err(err) = self.operator.apply(&mut a_direction, &direction) {
                return fail(&output, SolveErrorKind::OperatorError(err));
            }
            let curvature = direction.dot(&a_direction);
            if curvature <= T::zero() {
                return fail(&output, SolveErrorKind::IndefiniteOperator);
            }
            if rho <= T::zero() {
                return fail(&output, SolveErrorKind::IndefinitePreconditioner);
            }

            let alpha = rho / curvature;
            x.axpy(alpha, &direction, T::one());
            residual.axpy(-alpha, &a_direction, T::one());
            output.num_iterations += 1;

            if let Err(err) = self.preconditioner.apply(&mut z, &residual) {
                return fail(&output, SolveErrorKind::PreconditionerError(err));
            }
            let rho_next = z.dot(&residual);
            let beta = rho_next / rho;
            direction *= beta;
            direction += &z;
            rho = rho_next;
        }
        Ok(output)
    }
}
