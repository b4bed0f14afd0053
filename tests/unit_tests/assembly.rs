use crate::plate_material;
use parfem::assembly::{assemble_function, assemble_matrix, assemble_vector, project_function};
use parfem::comm::run_threaded;
use parfem::config::SolverConfig;
use parfem::context::ProcessContext;
use parfem::finite_element::{MatrixKind, VectorKind};
use parfem::functions::{FieldGradient, StructuralMass2D};
use parfem::la::{DistributedVector, LinearSolver, ReferenceSolver};
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_rectangle_mesh;
use parfem::mesh::{Field, Mesh, MeshData};
use parfem::physics::{create_domain_elements, Physics};
use parfem::sparsity::sparsity_pattern;
use parfem_sparse::csr::symmetry_defect;

fn plate_mesh() -> MeshData {
    create_rectangle_mesh(2.0, 1.0, 4, 3, true).unwrap()
}

fn plate_mass(ctx: &ProcessContext, data: &MeshData) -> f64 {
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner).unwrap();
    let material = plate_material();
    let field = Field::new(ctx, &mesh, "u", 2, Vec::new()).unwrap();
    let elements = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity2D(&material)).unwrap();
    assemble_function(ctx, &elements, &field, &StructuralMass2D).unwrap()[0]
}

#[test]
fn structural_mass_is_independent_of_the_partition() {
    let data = plate_mesh();
    let expected = 2500.0 * 1e-3 * 2.0;
    let serial = plate_mass(&ProcessContext::serial(), &data);
    assert!((serial - expected).abs() < 1e-10);
    for mass in run_threaded(3, |ctx| plate_mass(ctx, &data)) {
        assert!((mass - expected).abs() < 1e-10);
    }
}

#[test]
fn conduction_matrix_is_symmetric_and_annihilates_constants() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(plate_mesh()).unwrap();
    let material = plate_material();
    let field = Field::new(&ctx, &mesh, "T", 1, Vec::new()).unwrap();
    let elements = create_domain_elements(&mesh, "domain", &Physics::HeatConduction2D(&material)).unwrap();

    let solver = ReferenceSolver::default();
    let pattern = sparsity_pattern(&ctx, &mesh, 1).unwrap();
    let mut k = solver.create_matrix(&ctx, &field, &pattern).unwrap();
    assemble_matrix(&ctx, &elements, &field, MatrixKind::Stiffness, &mut k).unwrap();

    let block = k.owned_block();
    assert!(symmetry_defect(block) < 1e-12);
    for (i, row) in block.row_iter().enumerate() {
        let sum: f64 = row.values().iter().sum();
        assert!(sum.abs() < 1e-10, "row {i} sums to {sum}");
        assert!(row.nnz() <= pattern.row_nnz(i));
    }
}

#[test]
fn boundary_flux_sums_to_total_heat() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(plate_mesh()).unwrap();
    let field = Field::new(&ctx, &mesh, "T", 1, Vec::new()).unwrap();
    let flux = Physics::HeatFlux2D { flux: 3.0, thick: 0.5 };
    let elements = create_domain_elements(&mesh, "right", &flux).unwrap();

    let solver = ReferenceSolver::default();
    let mut f = solver.create_vector(&ctx, &field).unwrap();
    assemble_vector(&ctx, &elements, &field, VectorKind::Load, &mut f).unwrap();
    let total: f64 = f.owned_values().iter().sum();
    // Right edge has unit length
    assert!((total - 1.5).abs() < 1e-12);
}

fn projected_gradient(ctx: &ProcessContext, data: &MeshData) -> Vec<f64> {
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner).unwrap();
    let material = plate_material();
    let mut temperature = Field::new(ctx, &mesh, "T", 1, Vec::new()).unwrap();
    let values: Vec<f64> = mesh
        .xpts()
        .chunks_exact(3)
        .map(|x| 2.0 * x[0] - 3.0 * x[1] + 1.0)
        .collect();
    temperature.set_values(&values).unwrap();

    let elements = create_domain_elements(&mesh, "domain", &Physics::HeatConduction2D(&material)).unwrap();
    let solver = ReferenceSolver::new(SolverConfig {
        tolerance: 1e-12,
        ..Default::default()
    });
    let gradient = project_function(ctx, &solver, &elements, &temperature, &FieldGradient).unwrap();
    assert_eq!(gradient.n_vars(), 3);
    gradient.values().to_vec()
}

#[test]
fn projection_reproduces_a_constant_gradient() {
    let data = plate_mesh();
    let check = |values: &[f64]| {
        for node in values.chunks_exact(3) {
            assert!((node[0] - 2.0).abs() < 1e-8);
            assert!((node[1] + 3.0).abs() < 1e-8);
            assert!(node[2].abs() < 1e-8);
        }
    };
    check(&projected_gradient(&ProcessContext::serial(), &data));
    for values in run_threaded(2, |ctx| projected_gradient(ctx, &data)) {
        check(&values);
    }
}
