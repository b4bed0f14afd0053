//! Steady conduction in a quarter annulus: the outer arc is held at zero and a unit heat flux
//! enters through the inner arc. The exact temperature is `T(r) = r_i q / k ln(r_o / r)`.
use crate::solve_linear;
use parfem::assembly::project_function;
use parfem::comm::run_threaded;
use parfem::context::ProcessContext;
use parfem::functions::FieldGradient;
use parfem::io::vtk::write_vtk;
use parfem::la::ReferenceSolver;
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_quarter_annulus_mesh;
use parfem::mesh::{Field, Mesh, MeshData};
use parfem::physics::constitutive::{PlaneConstitutive, ThermoMechanicalProperties};
use parfem::physics::{create_domain_elements, Physics};

const R_INNER: f64 = 1.0;
const R_OUTER: f64 = 2.0;
const N_RADIAL: usize = 16;
const N_ANGULAR: usize = 16;

fn exact_temperature(r: f64) -> f64 {
    R_INNER * (R_OUTER / r).ln()
}

struct Solution {
    temperature: Option<Vec<f64>>,
    gradient: Option<Vec<f64>>,
    converged: bool,
}

fn solve_annulus(ctx: &ProcessContext, data: &MeshData) -> Solution {
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner).unwrap();
    let prop = ThermoMechanicalProperties {
        conductivity: 1.0,
        ..Default::default()
    };
    let material = PlaneConstitutive::plane_stress(prop, 1.0);

    let mut field = Field::new(ctx, &mesh, "T", 1, vec!["temperature".into()]).unwrap();
    field.add_fixed_dof("outer", 0, 0.0).unwrap();
    let conduction = create_domain_elements(&mesh, "domain", &Physics::HeatConduction2D(&material)).unwrap();
    let flux = create_domain_elements(&mesh, "inner", &Physics::HeatFlux2D { flux: 1.0, thick: 1.0 }).unwrap();
    let report = solve_linear(ctx, &mut field, &conduction, &flux);

    let gradient = project_function(ctx, &ReferenceSolver::default(), &conduction, &field, &FieldGradient).unwrap();
    if ctx.n_procs() == 1 {
        let path = crate::test_output_dir("laplace").join("quarter_annulus.vtk");
        write_vtk(path, &mesh, &[&field, &gradient]).unwrap();
    }
    Solution {
        temperature: field.gather_field_values(ctx),
        gradient: gradient.gather_field_values(ctx),
        converged: report.converged,
    }
}

#[test]
fn serial_temperature_matches_the_logarithmic_profile() {
    let data = create_quarter_annulus_mesh(R_INNER, R_OUTER, N_RADIAL, N_ANGULAR).unwrap();
    let solution = solve_annulus(&ProcessContext::serial(), &data);
    assert!(solution.converged);
    let temperature = solution.temperature.unwrap();

    for (node, x) in data.xpts.chunks_exact(3).enumerate() {
        let r = x[0].hypot(x[1]);
        let exact = exact_temperature(r);
        assert!(
            (temperature[node] - exact).abs() < 1e-2 * exact_temperature(R_INNER),
            "node {node} at r = {r}: {} vs {exact}",
            temperature[node]
        );
    }

    // k dT/dn on the inner arc, with n pointing out of the domain, equals the inflow
    let gradient = solution.gradient.unwrap();
    let middle = N_ANGULAR / 2 * (N_RADIAL + 1);
    let x = &data.xpts[3 * middle..3 * middle + 3];
    let normal = [-x[0] / R_INNER, -x[1] / R_INNER];
    let normal_flux = gradient[3 * middle] * normal[0] + gradient[3 * middle + 1] * normal[1];
    assert!((normal_flux - 1.0).abs() < 0.1, "normal flux {normal_flux}");
}

#[test]
fn distributed_solution_matches_serial() {
    let data = create_quarter_annulus_mesh(R_INNER, R_OUTER, 8, 6).unwrap();
    let serial = solve_annulus(&ProcessContext::serial(), &data).temperature.unwrap();
    for n_procs in [2, 3] {
        let mut solutions = run_threaded(n_procs, |ctx| solve_annulus(ctx, &data));
        assert!(solutions.iter().all(|s| s.converged));
        assert!(solutions[1..].iter().all(|s| s.temperature.is_none()));
        let distributed = solutions.swap_remove(0).temperature.unwrap();
        util::assert_approx_slice_eq!(distributed, serial, abstol = 1e-6);
    }
}
