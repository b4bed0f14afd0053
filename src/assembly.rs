//! Assembly of element contributions into distributed matrices, vectors and global integrals.
use crate::context::{ProcessContext, Timer};
use crate::error::{check_size, Result};
use crate::finite_element::{self, FiniteElement, MatrixKind, VectorKind};
use crate::functions::Function;
use crate::la::{DistributedMatrix, DistributedVector, LinearSolver};
use crate::mesh::Field;
use crate::sparsity::sparsity_pattern;

/// Geometry, degrees of freedom and current values of the cell of `element`.
fn element_inputs(element: &dyn FiniteElement, field: &Field<'_>) -> Result<(Vec<f64>, Vec<usize>, Vec<f64>)> {
    let cell = element.cell();
    let xpts = field.mesh().get_cell_xpts(cell)?;
    let dof = field.get_cell_dof(cell)?;
    let u = field.get_cell_values(cell)?;
    Ok((xpts, dof, u))
}

/// Integrates the matrix `kind` of every element and adds it into `matrix`, then assembles
/// `matrix`. Collective.
pub fn assemble_matrix(
    ctx: &ProcessContext,
    elements: &[Box<dyn FiniteElement + '_>],
    field: &Field<'_>,
    kind: MatrixKind,
    matrix: &mut dyn DistributedMatrix,
) -> Result<()> {
    let _timer = Timer::new(ctx, "Matrix assembly");
    for element in elements {
        let (xpts, dof, u) = element_inputs(element.as_ref(), field)?;
        let local = element.integrate_fe_matrix(kind, &xpts, &u)?;
        matrix.add_values(&dof, &local)?;
    }
    matrix.assemble(ctx)
}

/// Integrates the vector `kind` of every element and adds it into `vector`, then assembles
/// `vector`. Collective.
pub fn assemble_vector(
    ctx: &ProcessContext,
    elements: &[Box<dyn FiniteElement + '_>],
    field: &Field<'_>,
    kind: VectorKind,
    vector: &mut dyn DistributedVector,
) -> Result<()> {
    let _timer = Timer::new(ctx, "Vector assembly");
    for element in elements {
        let (xpts, dof, u) = element_inputs(element.as_ref(), field)?;
        let local = element.integrate_fe_vector(kind, &xpts, &u)?;
        vector.add_values(&dof, &local)?;
    }
    vector.assemble(ctx)
}

/// Integrates `func` over all elements of all processes. Collective.
pub fn assemble_function(
    ctx: &ProcessContext,
    elements: &[Box<dyn FiniteElement + '_>],
    field: &Field<'_>,
    func: &dyn Function,
) -> Result<Vec<f64>> {
    let _timer = Timer::new(ctx, "Function assembly");
    let mut total = vec![0.0; func.size(field.n_vars())];
    for element in elements {
        let (xpts, _, u) = element_inputs(element.as_ref(), field)?;
        let local = finite_element::integrate_function(element.as_ref(), func, &xpts, &u)?;
        check_size(total.len(), local.len())?;
        for (t, l) in total.iter_mut().zip(local.iter()) {
            *t += l;
        }
    }
    Ok(ctx.all_reduce_sum_slice(&total))
}

/// L2 projection of `func`, evaluated on the values of `field`, onto the nodal basis.
///
/// Assembles the consistent mass matrix and one right-hand side per component of `func`,
/// solves each system with `solver` and returns the nodal values as a field named
/// `Projection`. Collective.
pub fn project_function<'a, S: LinearSolver>(
    ctx: &ProcessContext,
    solver: &S,
    elements: &[Box<dyn FiniteElement + '_>],
    field: &Field<'a>,
    func: &dyn Function,
) -> Result<Field<'a>> {
    let _timer = Timer::new(ctx, "Function projection");
    let mesh = field.mesh();
    let size = func.size(field.n_vars());
    let mut projection = Field::new(ctx, mesh, "Projection", size, Vec::new())?;
    let scalar = Field::new(ctx, mesh, "Projection", 1, Vec::new())?;

    let pattern = sparsity_pattern(ctx, mesh, 1)?;
    let mut mass = solver.create_matrix(ctx, &scalar, &pattern)?;
    let mut rhs = (0..size)
        .map(|_| solver.create_vector(ctx, &scalar))
        .collect::<Result<Vec<_>>>()?;

    for element in elements {
        let (xpts, _, u) = element_inputs(element.as_ref(), field)?;
        let dof = scalar.get_cell_dof(element.cell())?;
        let (local_mass, local_rhs) = finite_element::project_function(element.as_ref(), func, &xpts, &u)?;
        mass.add_values(&dof, &local_mass)?;
        for (k, f) in rhs.iter_mut().enumerate() {
            f.add_values(&dof, &local_rhs.column(k).into_owned())?;
        }
    }
    mass.assemble(ctx)?;
    for f in &mut rhs {
        f.assemble(ctx)?;
    }

    let n_nodes = mesh.n_nodes_local();
    let mut values = vec![0.0; size * n_nodes];
    for (k, f) in rhs.iter().enumerate() {
        let mut x = solver.create_vector(ctx, &scalar)?;
        let report = solver.solve(ctx, &mass, f, &mut x)?;
        if !report.converged {
            ctx.warn(format_args!("Projection of {} component {k} did not converge", func.name()));
        }
        let nodal = x.local_values(ctx, &scalar)?;
        check_size(n_nodes, nodal.len())?;
        for (node, value) in nodal.into_iter().enumerate() {
            values[node * size + k] = value;
        }
    }
    projection.set_values(&values)?;
    Ok(projection)
}
