//! A self-contained backend: contiguous row blocks per process and a conjugate gradient solve
//! of the system gathered on the root process.
use crate::config::SolverConfig;
use crate::context::{ProcessContext, Timer};
use crate::error::{check_size, Error, ErrorKind, Result};
use crate::index_map::{query_owners, send_data_to_owners};
use crate::la::{DistributedMatrix, DistributedVector, LinearSolver, SolveReport};
use crate::mesh::Field;
use crate::sparsity::SparsityPattern;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;
use parfem_sparse::cg::{ConjugateGradient, JacobiPreconditioner, RelativeResidualCriterion};
use parfem_sparse::csr::{apply_fixed_values_csr, csr_from_triplets};
use std::collections::BTreeMap;
use std::ops::Range;

/// Rank `r` owns rows `offsets[r]..offsets[r + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RowLayout {
    rank: usize,
    offsets: Vec<usize>,
}

impl RowLayout {
    fn new(ctx: &ProcessContext, n_owned: usize) -> Self {
        let mut offsets = Vec::with_capacity(ctx.n_procs() + 1);
        offsets.push(0);
        for count in ctx.all_gather(n_owned) {
            offsets.push(offsets[offsets.len() - 1] + count);
        }
        Self {
            rank: ctx.rank(),
            offsets,
        }
    }

    fn owned(&self) -> Range<usize> {
        self.offsets[self.rank]..self.offsets[self.rank + 1]
    }

    fn n_global(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    fn owner(&self, row: usize) -> Result<usize> {
        if row >= self.n_global() {
            return Err(Error::out_of_range(row, self.n_global()));
        }
        Ok(self.offsets.partition_point(|&offset| offset <= row) - 1)
    }

    fn split<T: Clone>(&self, values: &[T]) -> Vec<Vec<T>> {
        self.offsets
            .windows(2)
            .map(|range| values[range[0]..range[1]].to_vec())
            .collect()
    }
}

/// The owned rows of a distributed sparse matrix, stored with global column indices.
#[derive(Debug, Clone)]
pub struct ReferenceMatrix {
    layout: RowLayout,
    block: CsrMatrix<f64>,
    pending: Vec<(usize, usize, f64)>,
    stash: Vec<(usize, usize, f64)>,
    stash_owners: Vec<usize>,
}

impl ReferenceMatrix {
    fn new(layout: RowLayout, nnz_hint: usize) -> Self {
        let owned = layout.owned();
        Self {
            block: CsrMatrix::zeros(owned.len(), layout.n_global()),
            layout,
            pending: Vec::with_capacity(nnz_hint),
            stash: Vec::new(),
            stash_owners: Vec::new(),
        }
    }

    /// The assembled owned rows; row `i` is global row `owned_rows().start + i`.
    pub fn owned_block(&self) -> &CsrMatrix<f64> {
        &self.block
    }
}

impl DistributedMatrix for ReferenceMatrix {
    fn owned_rows(&self) -> Range<usize> {
        self.layout.owned()
    }

    fn n_global(&self) -> usize {
        self.layout.n_global()
    }

    fn add_values(&mut self, dof: &[usize], block: &DMatrix<f64>) -> Result<()> {
        check_size(dof.len(), block.nrows())?;
        check_size(dof.len(), block.ncols())?;
        let n_global = self.layout.n_global();
        if let Some(&bad) = dof.iter().find(|&&d| d >= n_global) {
            return Err(Error::out_of_range(bad, n_global));
        }
        for (a, &row) in dof.iter().enumerate() {
            let owner = self.layout.owner(row)?;
            for (b, &col) in dof.iter().enumerate() {
                let entry = (row, col, block[(a, b)]);
                if owner == self.layout.rank {
                    self.pending.push(entry);
                } else {
                    self.stash.push(entry);
                    self.stash_owners.push(owner);
                }
            }
        }
        Ok(())
    }

    fn assemble(&mut self, ctx: &ProcessContext) -> Result<()> {
        let owners = std::mem::take(&mut self.stash_owners);
        let received = send_data_to_owners(ctx, &owners, std::mem::take(&mut self.stash));
        self.pending.extend(received);

        let owned = self.layout.owned();
        let triplets: Vec<_> = self
            .pending
            .drain(..)
            .map(|(row, col, value)| (row - owned.start, col, value))
            .collect();
        let added = csr_from_triplets(owned.len(), self.layout.n_global(), &triplets);
        self.block = &self.block + &added;
        Ok(())
    }
}

/// The owned entries of a distributed vector.
#[derive(Debug, Clone)]
pub struct ReferenceVector {
    layout: RowLayout,
    values: Vec<f64>,
    stash: Vec<(usize, f64)>,
    stash_owners: Vec<usize>,
}

impl ReferenceVector {
    fn new(layout: RowLayout) -> Self {
        Self {
            values: vec![0.0; layout.owned().len()],
            layout,
            stash: Vec::new(),
            stash_owners: Vec::new(),
        }
    }

    pub fn set_owned_values(&mut self, values: &[f64]) -> Result<()> {
        check_size(self.values.len(), values.len())?;
        self.values.copy_from_slice(values);
        Ok(())
    }
}

impl DistributedVector for ReferenceVector {
    fn owned_rows(&self) -> Range<usize> {
        self.layout.owned()
    }

    fn n_global(&self) -> usize {
        self.layout.n_global()
    }

    fn add_values(&mut self, dof: &[usize], values: &DVector<f64>) -> Result<()> {
        check_size(dof.len(), values.len())?;
        let owned = self.layout.owned();
        for (&row, &value) in dof.iter().zip(values.iter()) {
            let owner = self.layout.owner(row)?;
            if owner == self.layout.rank {
                self.values[row - owned.start] += value;
            } else {
                self.stash.push((row, value));
                self.stash_owners.push(owner);
            }
        }
        Ok(())
    }

    fn assemble(&mut self, ctx: &ProcessContext) -> Result<()> {
        let owners = std::mem::take(&mut self.stash_owners);
        let received = send_data_to_owners(ctx, &owners, std::mem::take(&mut self.stash));
        let owned = self.layout.owned();
        for (row, value) in received {
            if !owned.contains(&row) {
                return Err(Error::out_of_range(row, owned.end));
            }
            self.values[row - owned.start] += value;
        }
        Ok(())
    }

    fn owned_values(&self) -> &[f64] {
        &self.values
    }

    fn local_values(&self, ctx: &ProcessContext, field: &Field<'_>) -> Result<Vec<f64>> {
        check_size(field.n_dof_owned(), self.values.len())?;
        let ghost_dof = field.get_ghost_dof();
        let owners = ghost_dof
            .iter()
            .map(|&dof| self.layout.owner(dof))
            .collect::<Result<Vec<_>>>()?;
        let offset = self.layout.owned().start;
        let ghost_values = query_owners(ctx, &owners, &ghost_dof, |&dof| {
            dof.checked_sub(offset).and_then(|i| self.values.get(i)).copied()
        });

        let mut local = self.values.clone();
        for (&dof, value) in ghost_dof.iter().zip(ghost_values) {
            local.push(value.ok_or_else(|| Error::out_of_range(dof, self.layout.n_global()))?);
        }
        Ok(local)
    }
}

/// Jacobi preconditioned conjugate gradient on the root process.
///
/// Suited to the symmetric positive definite systems of conduction and elasticity after
/// elimination of the fixed degrees of freedom.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSolver {
    config: SolverConfig,
}

impl ReferenceSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    fn solve_gathered(
        &self,
        ctx: &ProcessContext,
        n: usize,
        triplets: Vec<Vec<(usize, usize, f64)>>,
        rhs: Vec<Vec<f64>>,
        guess: Vec<Vec<f64>>,
    ) -> (Vec<f64>, SolveReport) {
        let triplets: Vec<_> = triplets.into_iter().flatten().collect();
        let a = csr_from_triplets(n, n, &triplets);
        let b = DVector::from_iterator(n, rhs.into_iter().flatten());
        let mut x = DVector::from_iterator(n, guess.into_iter().flatten());

        let preconditioner = JacobiPreconditioner::from_csr(&a);
        let result = ConjugateGradient::new()
            .with_operator(&a)
            .with_preconditioner(&preconditioner)
            .with_stopping_criterion(RelativeResidualCriterion::new(self.config.tolerance))
            .with_max_iter(self.config.max_iterations)
            .solve_with_guess(&b, &mut x);

        let report = match result {
            Ok(output) => SolveReport {
                iterations: output.num_iterations,
                converged: true,
            },
            Err(err) => {
                ctx.warn(format_args!("Linear solver did not converge: {err}"));
                SolveReport {
                    iterations: err.output.num_iterations,
                    converged: false,
                }
            }
        };
        ctx.info(format_args!("Linear solver iterations: {}", report.iterations));
        (x.as_slice().to_vec(), report)
    }
}

impl LinearSolver for ReferenceSolver {
    type Matrix = ReferenceMatrix;
    type Vector = ReferenceVector;

    fn create_matrix(
        &self,
        ctx: &ProcessContext,
        field: &Field<'_>,
        pattern: &SparsityPattern,
    ) -> Result<ReferenceMatrix> {
        check_size(field.n_dof_owned(), pattern.n_rows())?;
        let layout = RowLayout::new(ctx, field.n_dof_owned());
        check_size(field.n_dof_global(), layout.n_global())?;
        let nnz = pattern.nnz_diag() + pattern.nnz_off_diag();
        Ok(ReferenceMatrix::new(layout, nnz))
    }

    fn create_vector(&self, ctx: &ProcessContext, field: &Field<'_>) -> Result<ReferenceVector> {
        let layout = RowLayout::new(ctx, field.n_dof_owned());
        check_size(field.n_dof_global(), layout.n_global())?;
        Ok(ReferenceVector::new(layout))
    }

    fn apply_fixed_dof(
        &self,
        ctx: &ProcessContext,
        fixed: &BTreeMap<usize, f64>,
        matrix: &mut ReferenceMatrix,
        rhs: &mut ReferenceVector,
        solution: &mut ReferenceVector,
    ) -> Result<()> {
        if matrix.layout != rhs.layout || matrix.layout != solution.layout {
            return Err(Error::new(ErrorKind::SizeMismatch {
                expected: matrix.layout.n_global(),
                got: rhs.layout.n_global(),
            }));
        }
        let local: Vec<(usize, f64)> = fixed.iter().map(|(&dof, &value)| (dof, value)).collect();
        let all: BTreeMap<usize, f64> = ctx.all_gather(local).into_iter().flatten().collect();

        let owned = matrix.layout.owned();
        apply_fixed_values_csr(&mut matrix.block, owned.start, &all, &mut rhs.values);
        for (&dof, &value) in all.range(owned.clone()) {
            solution.values[dof - owned.start] = value;
        }
        Ok(())
    }

    fn solve(
        &self,
        ctx: &ProcessContext,
        matrix: &ReferenceMatrix,
        rhs: &ReferenceVector,
        solution: &mut ReferenceVector,
    ) -> Result<SolveReport> {
        let _timer = Timer::new(ctx, "Linear solve");
        check_size(matrix.layout.n_global(), rhs.layout.n_global())?;
        check_size(matrix.layout.n_global(), solution.layout.n_global())?;

        let offset = matrix.layout.owned().start;
        let triplets: Vec<_> = matrix
            .block
            .triplet_iter()
            .map(|(i, j, &v)| (i + offset, j, v))
            .collect();
        let triplets = ctx.gather_v(0, triplets);
        let rhs_parts = ctx.gather_v(0, rhs.values.clone());
        let guess_parts = ctx.gather_v(0, solution.values.clone());

        let mut parts = Vec::new();
        let mut root_report = None;
        if let (Some(triplets), Some(rhs_parts), Some(guess_parts)) = (triplets, rhs_parts, guess_parts) {
            let n = matrix.layout.n_global();
            let (x, report) = self.solve_gathered(ctx, n, triplets, rhs_parts, guess_parts);
            parts = matrix.layout.split(&x);
            root_report = Some(report);
        }

        solution.values = ctx.scatter_v(0, parts);
        Ok(ctx.broadcast(0, root_report))
    }
}
