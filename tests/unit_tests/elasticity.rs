use crate::{plate_material, solve_linear};
use parfem::assembly::{assemble_function, assemble_matrix, project_function};
use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::finite_element::MatrixKind;
use parfem::functions::{Stress2D, StructuralMass2D, StructuralMass3D, VonMises2D};
use parfem::la::{LinearSolver, ReferenceSolver};
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::{create_box_mesh, create_rectangle_mesh};
use parfem::mesh::{Field, Mesh, MeshData};
use parfem::physics::constitutive::{SolidConstitutive, ThermoMechanicalProperties};
use parfem::physics::{create_domain_elements, Physics};
use parfem::sparsity::sparsity_pattern;
use parfem_sparse::csr::symmetry_defect;

const PRESSURE: f64 = 1e6;
const LENGTH: f64 = 4.0;

/// Plate on rollers along its left and bottom edges, compressed by a pressure on its right
/// edge. The exact solution is a uniform uniaxial stress `sxx = -p`.
fn compressed_plate(ctx: &ProcessContext, data: &MeshData) -> (Option<Vec<f64>>, Option<Vec<f64>>) {
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner).unwrap();
    let material = plate_material();
    let mut pressure = Field::new(ctx, &mesh, "P", 1, Vec::new()).unwrap();
    pressure.set_all(&[PRESSURE]).unwrap();

    let mut u = Field::new(ctx, &mesh, "u", 2, vec!["u_x".into(), "u_y".into()]).unwrap();
    u.add_fixed_dof("left", 0, 0.0).unwrap();
    u.add_fixed_dof("bottom", 1, 0.0).unwrap();
    let solid = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity2D(&material)).unwrap();
    let load = Physics::PressureLoad2D {
        pressure: &pressure,
        thick: material.thick,
    };
    let loads = create_domain_elements(&mesh, "right", &load).unwrap();
    let report = solve_linear(ctx, &mut u, &solid, &loads);
    assert!(report.converged);

    let stress = project_function(ctx, &ReferenceSolver::default(), &solid, &u, &Stress2D).unwrap();
    (u.gather_field_values(ctx), stress.gather_field_values(ctx))
}

#[test]
fn plate_under_pressure_has_uniaxial_stress() {
    let data = create_rectangle_mesh(LENGTH, 1.0, 8, 2, false).unwrap();
    let material = plate_material();
    let (e, nu) = (material.prop.young_modulus, material.prop.poisson_ratio);

    for n_procs in [1, 2] {
        let results = run_threaded(n_procs, |ctx| compressed_plate(ctx, &data));
        let (u, stress) = results.into_iter().next().unwrap();
        let (u, stress) = (u.unwrap(), stress.unwrap());
        for (node, x) in data.xpts.chunks_exact(3).enumerate() {
            let expected_ux = -PRESSURE * x[0] / e;
            let expected_uy = nu * PRESSURE * x[1] / e;
            assert!((u[2 * node] - expected_ux).abs() < 1e-4 * PRESSURE * LENGTH / e);
            assert!((u[2 * node + 1] - expected_uy).abs() < 1e-4 * PRESSURE * LENGTH / e);

            assert!((stress[3 * node] + PRESSURE).abs() < 1e-3 * PRESSURE);
            assert!(stress[3 * node + 1].abs() < 1e-3 * PRESSURE);
            assert!(stress[3 * node + 2].abs() < 1e-3 * PRESSURE);
        }
    }
}

#[test]
fn stiffness_is_symmetric_and_mass_is_exact() {
    let ctx = ProcessContext::serial();
    let mesh = Mesh::serial(create_rectangle_mesh(2.0, 1.5, 5, 3, true).unwrap()).unwrap();
    let material = plate_material();
    let u = Field::new(&ctx, &mesh, "u", 2, Vec::new()).unwrap();
    let solid = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity2D(&material)).unwrap();

    let solver = ReferenceSolver::default();
    let pattern = sparsity_pattern(&ctx, &mesh, 2).unwrap();
    let mut k = solver.create_matrix(&ctx, &u, &pattern).unwrap();
    assemble_matrix(&ctx, &solid, &u, MatrixKind::Stiffness, &mut k).unwrap();
    let scale = material.prop.young_modulus * material.thick;
    assert!(symmetry_defect(k.owned_block()) < 1e-12 * scale);

    let mut m = solver.create_matrix(&ctx, &u, &pattern).unwrap();
    assemble_matrix(&ctx, &solid, &u, MatrixKind::Mass, &mut m).unwrap();
    // Each displacement component carries the full mass
    let total: f64 = m.owned_block().values().iter().sum();
    let mass = material.prop.density * material.thick * 2.0 * 1.5;
    assert!((total - 2.0 * mass).abs() < 1e-10 * mass);

    let integrated = assemble_function(&ctx, &solid, &u, &StructuralMass2D).unwrap();
    assert!((integrated[0] - mass).abs() < 1e-10 * mass);
    let von_mises = assemble_function(&ctx, &solid, &u, &VonMises2D).unwrap();
    assert_eq!(von_mises, vec![0.0]);
}

#[test]
fn free_thermal_expansion_is_stress_free() {
    let ctx = ProcessContext::serial();
    let data = create_rectangle_mesh(LENGTH, 1.0, 4, 2, true).unwrap();
    let mesh = Mesh::serial(data.clone()).unwrap();
    let material = plate_material();
    let (t0, dt) = (20.0, 100.0);
    let mut temperature = Field::new(&ctx, &mesh, "T", 1, Vec::new()).unwrap();
    temperature.set_all(&[t0 + dt]).unwrap();

    let mut u = Field::new(&ctx, &mesh, "u", 2, Vec::new()).unwrap();
    u.add_fixed_dof("left", 0, 0.0).unwrap();
    u.add_fixed_dof("bottom", 1, 0.0).unwrap();
    let solid = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity2D(&material)).unwrap();
    let thermal = Physics::ThermalLoad2D {
        constitutive: &material,
        temperature: &temperature,
        t0,
    };
    let loads = create_domain_elements(&mesh, "domain", &thermal).unwrap();
    assert!(solve_linear(&ctx, &mut u, &solid, &loads).converged);

    let strain = material.prop.thermal_expansion * dt;
    for (node, x) in data.xpts.chunks_exact(3).enumerate() {
        assert!((u.values()[2 * node] - strain * x[0]).abs() < 1e-4 * strain * LENGTH);
        assert!((u.values()[2 * node + 1] - strain * x[1]).abs() < 1e-4 * strain * LENGTH);
    }
}

#[test]
fn bar_under_pressure_shortens() {
    let ctx = ProcessContext::serial();
    let data = create_box_mesh([LENGTH, 1.0, 1.0], [4, 1, 1]).unwrap();
    let mesh = Mesh::serial(data.clone()).unwrap();
    let prop = ThermoMechanicalProperties {
        young_modulus: 2e11,
        poisson_ratio: 0.3,
        density: 7800.0,
        ..Default::default()
    };
    let material = SolidConstitutive::new(prop);
    let mut pressure = Field::new(&ctx, &mesh, "P", 1, Vec::new()).unwrap();
    pressure.set_all(&[PRESSURE]).unwrap();

    // Symmetry planes on the three minimum faces leave a free uniaxial state
    let mut u = Field::new(&ctx, &mesh, "u", 3, Vec::new()).unwrap();
    u.add_fixed_dof("x_min", 0, 0.0).unwrap();
    u.add_fixed_dof("y_min", 1, 0.0).unwrap();
    u.add_fixed_dof("z_min", 2, 0.0).unwrap();
    let solid = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity3D(&material)).unwrap();
    let loads = create_domain_elements(&mesh, "x_max", &Physics::PressureLoad3D { pressure: &pressure }).unwrap();
    assert!(solve_linear(&ctx, &mut u, &solid, &loads).converged);

    let eps = PRESSURE / prop.young_modulus;
    for (node, x) in data.xpts.chunks_exact(3).enumerate() {
        let expected = [-eps * x[0], prop.poisson_ratio * eps * x[1], prop.poisson_ratio * eps * x[2]];
        for d in 0..3 {
            assert!((u.values()[3 * node + d] - expected[d]).abs() < 1e-4 * eps * LENGTH);
        }
    }

    let mass = assemble_function(&ctx, &solid, &u, &StructuralMass3D).unwrap();
    assert!((mass[0] - prop.density * LENGTH).abs() < 1e-8 * prop.density);
}
