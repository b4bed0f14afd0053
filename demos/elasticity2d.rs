//! A heated plate on rollers, compressed from the right, solved on a group of threads.
//!
//! Usage: `elasticity2d [n_procs]`. Writes one VTK file per process to `data/elasticity2d/`.
use eyre::WrapErr;
use parfem::assembly::{assemble_function, assemble_matrix, assemble_vector, project_function};
use parfem::comm::run_threaded;
use parfem::context::{ProcessContext, Timer};
use parfem::finite_element::{MatrixKind, VectorKind};
use parfem::functions::{Stress2D, StructuralMass2D, VonMises2D};
use parfem::io::vtk::write_vtk;
use parfem::la::{DistributedVector, LinearSolver, ReferenceSolver};
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_rectangle_mesh;
use parfem::mesh::{Field, Mesh, MeshData};
use parfem::physics::constitutive::{PlaneConstitutive, ThermoMechanicalProperties};
use parfem::physics::{create_domain_elements, Physics};
use parfem::sparsity::sparsity_pattern;
use std::path::Path;

const T0: f64 = 20.0;

fn solve(ctx: &ProcessContext, data: &MeshData, out: &Path) -> eyre::Result<()> {
    let _timer = Timer::new(ctx, "Elasticity solve");
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner)?;

    let prop = ThermoMechanicalProperties {
        young_modulus: 70e9,
        poisson_ratio: 0.33,
        conductivity: 237.0,
        density: 2700.0,
        specific_heat: 900.0,
        thermal_expansion: 23e-6,
    };
    let material = PlaneConstitutive::plane_stress(prop, 2e-3);

    // Temperature rising linearly from left to right
    let mut temperature = Field::new(ctx, &mesh, "T", 1, Vec::new())?;
    let values: Vec<f64> = mesh.xpts().chunks_exact(3).map(|x| T0 + 50.0 * x[0]).collect();
    temperature.set_values(&values)?;
    let mut pressure = Field::new(ctx, &mesh, "P", 1, Vec::new())?;
    pressure.set_all(&[5e6])?;

    let mut u = Field::new(ctx, &mesh, "u", 2, vec!["u_x".into(), "u_y".into()])?;
    u.add_fixed_dof("left", 0, 0.0)?;
    u.add_fixed_dof("bottom", 1, 0.0)?;

    let solid = create_domain_elements(&mesh, "domain", &Physics::LinearElasticity2D(&material))?;
    let mut loads = create_domain_elements(
        &mesh,
        "domain",
        &Physics::ThermalLoad2D {
            constitutive: &material,
            temperature: &temperature,
            t0: T0,
        },
    )?;
    let right = Physics::PressureLoad2D {
        pressure: &pressure,
        thick: material.thick,
    };
    loads.extend(create_domain_elements(&mesh, "right", &right)?);

    let solver = ReferenceSolver::default();
    let pattern = sparsity_pattern(ctx, &mesh, 2)?;
    let mut k = solver.create_matrix(ctx, &u, &pattern)?;
    let mut f = solver.create_vector(ctx, &u)?;
    let mut x = solver.create_vector(ctx, &u)?;
    assemble_matrix(ctx, &solid, &u, MatrixKind::Stiffness, &mut k)?;
    assemble_vector(ctx, &loads, &u, VectorKind::Load, &mut f)?;
    solver.apply_fixed_dof(ctx, u.fixed_dof(), &mut k, &mut f, &mut x)?;
    let report = solver.solve(ctx, &k, &f, &mut x)?;
    if !report.converged {
        ctx.warn("displacements did not converge");
    }
    u.set_values(&x.local_values(ctx, &u)?)?;

    let mass = assemble_function(ctx, &solid, &u, &StructuralMass2D)?;
    let von_mises = assemble_function(ctx, &solid, &u, &VonMises2D)?;
    ctx.info(format_args!("Mass {:.4} kg, integrated von Mises stress {:.4e}", mass[0], von_mises[0]));

    let stress = project_function(ctx, &solver, &solid, &u, &Stress2D)?;
    write_vtk(
        out.join(format!("plate_{}.vtk", ctx.rank())),
        &mesh,
        &[&u, &temperature, &stress],
    )?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    let n_procs: usize = match std::env::args().nth(1) {
        Some(arg) => arg.parse().wrap_err("process count must be a positive integer")?,
        None => 2,
    };
    let out = Path::new("data/elasticity2d");
    std::fs::create_dir_all(out)?;

    let data = create_rectangle_mesh(0.4, 0.1, 80, 20, false)?;
    run_threaded(n_procs, |ctx| solve(ctx, &data, out))
        .into_iter()
        .collect()
}
