//! Steady heat conduction in a quarter annulus, solved on a group of threads.
//!
//! Usage: `laplace [n_procs] [config.json]`. Writes one VTK file per process and the gathered
//! temperature to `data/laplace/`.
use eyre::WrapErr;
use parfem::assembly::{assemble_matrix, assemble_vector, project_function};
use parfem::comm::ThreadCommunicator;
use parfem::config::Config;
use parfem::context::{ProcessContext, Timer};
use parfem::finite_element::{MatrixKind, VectorKind};
use parfem::functions::FieldGradient;
use parfem::io::native::write_field_values;
use parfem::io::vtk::write_vtk;
use parfem::la::{DistributedVector, LinearSolver, ReferenceSolver};
use parfem::mesh::partition::BlockPartitioner;
use parfem::mesh::procedural::create_quarter_annulus_mesh;
use parfem::mesh::{Field, Mesh, MeshData};
use parfem::physics::constitutive::{PlaneConstitutive, ThermoMechanicalProperties};
use parfem::physics::{create_domain_elements, Physics};
use parfem::sparsity::sparsity_pattern;
use std::path::Path;

fn solve(ctx: &ProcessContext, config: &Config, data: &MeshData, out: &Path) -> eyre::Result<()> {
    let _timer = Timer::new(ctx, "Laplace solve");
    let mesh = Mesh::distribute(ctx, data, &BlockPartitioner)?;
    mesh.info(ctx);

    let prop = ThermoMechanicalProperties {
        conductivity: 1.0,
        ..Default::default()
    };
    let material = PlaneConstitutive::plane_stress(prop, 1.0);
    let mut temperature = Field::new(ctx, &mesh, "T", 1, vec!["temperature".into()])?;
    temperature.add_fixed_dof("outer", 0, 0.0)?;
    let conduction = create_domain_elements(&mesh, "domain", &Physics::HeatConduction2D(&material))?;
    let flux = create_domain_elements(&mesh, "inner", &Physics::HeatFlux2D { flux: 1.0, thick: 1.0 })?;

    let solver = ReferenceSolver::new(config.solver.clone());
    let pattern = sparsity_pattern(ctx, &mesh, 1)?;
    let mut k = solver.create_matrix(ctx, &temperature, &pattern)?;
    let mut f = solver.create_vector(ctx, &temperature)?;
    let mut t = solver.create_vector(ctx, &temperature)?;
    assemble_matrix(ctx, &conduction, &temperature, MatrixKind::Stiffness, &mut k)?;
    assemble_vector(ctx, &flux, &temperature, VectorKind::Load, &mut f)?;
    solver.apply_fixed_dof(ctx, temperature.fixed_dof(), &mut k, &mut f, &mut t)?;
    let report = solver.solve(ctx, &k, &f, &mut t)?;
    ctx.info(format_args!(
        "Solver finished after {} iterations (converged: {})",
        report.iterations, report.converged
    ));
    temperature.set_values(&t.local_values(ctx, &temperature)?)?;

    let gradient = project_function(ctx, &solver, &conduction, &temperature, &FieldGradient)?;
    write_vtk(
        out.join(format!("annulus_{}.vtk", ctx.rank())),
        &mesh,
        &[&temperature, &gradient],
    )?;
    write_field_values(ctx, out.join("temperature"), &temperature, true)?;
    Ok(())
}

fn main() -> eyre::Result<()> {
    let mut args = std::env::args().skip(1);
    let n_procs: usize = match args.next() {
        Some(arg) => arg.parse().wrap_err("process count must be a positive integer")?,
        None => 2,
    };
    let config = match args.next() {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let out = Path::new("data/laplace");
    std::fs::create_dir_all(out)?;

    let data = create_quarter_annulus_mesh(1.0, 2.0, 32, 32)?;
    std::thread::scope(|scope| {
        let handles: Vec<_> = ThreadCommunicator::create_group(n_procs)
            .into_iter()
            .map(|comm| {
                let (config, data) = (&config, &data);
                scope.spawn(move || -> eyre::Result<()> {
                    let ctx = ProcessContext::with_log_config(Box::new(comm), &config.log)?;
                    let result = solve(&ctx, config, data, out);
                    ctx.abort_on_error(result);
                    Ok(())
                })
            })
            .collect();
        handles
            .into_iter()
            .try_for_each(|handle| handle.join().map_err(|_| eyre::eyre!("a process panicked"))?)
    })
}
