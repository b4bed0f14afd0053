use parfem::assembly::{assemble_matrix, assemble_vector};
use parfem::context::ProcessContext;
use parfem::finite_element::{FiniteElement, MatrixKind, VectorKind};
use parfem::la::{DistributedVector, LinearSolver, ReferenceSolver, SolveReport};
use parfem::mesh::Field;
use parfem::physics::constitutive::{PlaneConstitutive, ThermoMechanicalProperties};
use parfem::sparsity::sparsity_pattern;
use std::path::{Path, PathBuf};

mod unit_tests;

/// Output directory of a test, created on demand.
fn test_output_dir(test_name: &str) -> PathBuf {
    let dir = Path::new("data/unit_tests/").join(test_name);
    std::fs::create_dir_all(&dir).expect("Creating the output directory is a test failure");
    dir
}

/// A thin glass-like plate.
fn plate_material() -> PlaneConstitutive {
    let prop = ThermoMechanicalProperties {
        young_modulus: 5e9,
        poisson_ratio: 0.35,
        conductivity: 1.0,
        density: 2500.0,
        specific_heat: 800.0,
        thermal_expansion: 1e-5,
    };
    PlaneConstitutive::plane_stress(prop, 1e-3)
}

/// Assembles `K u = f` from the given elements, applies the fixed values of `field`, solves
/// and stores the solution in `field`. Collective.
fn solve_linear(
    ctx: &ProcessContext,
    field: &mut Field<'_>,
    stiffness: &[Box<dyn FiniteElement + '_>],
    loads: &[Box<dyn FiniteElement + '_>],
) -> SolveReport {
    let solver = ReferenceSolver::default();
    let pattern = sparsity_pattern(ctx, field.mesh(), field.n_vars()).unwrap();
    let mut k = solver.create_matrix(ctx, field, &pattern).unwrap();
    let mut f = solver.create_vector(ctx, field).unwrap();
    let mut u = solver.create_vector(ctx, field).unwrap();
    assemble_matrix(ctx, stiffness, field, MatrixKind::Stiffness, &mut k).unwrap();
    assemble_vector(ctx, loads, field, VectorKind::Load, &mut f).unwrap();
    solver
        .apply_fixed_dof(ctx, field.fixed_dof(), &mut k, &mut f, &mut u)
        .unwrap();
    let report = solver.solve(ctx, &k, &f, &mut u).unwrap();
    let values = u.local_values(ctx, field).unwrap();
    field.set_values(&values).unwrap();
    report
}
