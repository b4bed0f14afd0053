//! The contract between assembly and a distributed linear algebra backend.
//!
//! Matrices and vectors are addressed by global degree of freedom. Each process owns a
//! contiguous block of rows, as produced by renumbering the node map of a [`Field`].
//! Contributions may target rows owned elsewhere; they are routed to their owner by the
//! collective `assemble`.
use crate::context::ProcessContext;
use crate::error::Result;
use crate::mesh::Field;
use crate::sparsity::SparsityPattern;
use nalgebra::{DMatrix, DVector};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::ops::Range;

mod reference;

pub use reference::{ReferenceMatrix, ReferenceSolver, ReferenceVector};

pub trait DistributedMatrix: Debug {
    /// Global rows owned by this process.
    fn owned_rows(&self) -> Range<usize>;

    fn n_global(&self) -> usize;

    /// Adds the dense `block` at the global positions `dof x dof`.
    fn add_values(&mut self, dof: &[usize], block: &DMatrix<f64>) -> Result<()>;

    /// Routes off-process contributions to their owners and finalizes the matrix. Collective.
    fn assemble(&mut self, ctx: &ProcessContext) -> Result<()>;
}

pub trait DistributedVector: Debug {
    fn owned_rows(&self) -> Range<usize>;

    fn n_global(&self) -> usize;

    fn add_values(&mut self, dof: &[usize], values: &DVector<f64>) -> Result<()>;

    fn assemble(&mut self, ctx: &ProcessContext) -> Result<()>;

    /// Values of the owned rows.
    fn owned_values(&self) -> &[f64];

    /// Values of every local degree of freedom of `field`, owned first, then ghosts,
    /// in the layout of [`Field::values`]. Collective.
    fn local_values(&self, ctx: &ProcessContext, field: &Field<'_>) -> Result<Vec<f64>>;
}

/// Outcome of a linear solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolveReport {
    pub iterations: usize,
    pub converged: bool,
}

/// A backend creating distributed matrices and vectors and solving systems built from them.
pub trait LinearSolver {
    type Matrix: DistributedMatrix;
    type Vector: DistributedVector;

    /// A zero matrix over the degrees of freedom of `field`, preallocated from `pattern`.
    /// Collective.
    fn create_matrix(&self, ctx: &ProcessContext, field: &Field<'_>, pattern: &SparsityPattern)
        -> Result<Self::Matrix>;

    /// A zero vector over the degrees of freedom of `field`. Collective.
    fn create_vector(&self, ctx: &ProcessContext, field: &Field<'_>) -> Result<Self::Vector>;

    /// Eliminates prescribed degrees of freedom symmetrically from an assembled system.
    ///
    /// `fixed` may hold any subset of the prescribed values on each process; their union is
    /// applied. Rows and columns of fixed unknowns are zeroed with a unit diagonal, their
    /// contribution is moved to the right-hand side, and `rhs` and `solution` receive the
    /// prescribed values. Collective.
    fn apply_fixed_dof(
        &self,
        ctx: &ProcessContext,
        fixed: &BTreeMap<usize, f64>,
        matrix: &mut Self::Matrix,
        rhs: &mut Self::Vector,
        solution: &mut Self::Vector,
    ) -> Result<()>;

    /// Solves `matrix * solution = rhs`, using `solution` as the initial guess.
    ///
    /// Non-convergence is reported, not raised: the last iterate is returned. Collective.
    fn solve(
        &self,
        ctx: &ProcessContext,
        matrix: &Self::Matrix,
        rhs: &Self::Vector,
        solution: &mut Self::Vector,
    ) -> Result<SolveReport>;
}
