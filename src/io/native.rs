//! The native mesh directory format and nodal field files.
//!
//! - `cells`: `n_cells n_nodes nnz` header, then per cell
//!   `index type order region_tag node_0 ... node_k`
//! - `xpts`: `n_nodes` header, then 3 coordinates per node
//! - `regions`: `n_regions` header, then `name dim tag` per region
//!
//! Field files hold `n_vars` followed by one value tuple per global node.
use crate::connectivity::Connectivity;
use crate::context::ProcessContext;
use crate::io::{read_to_string, Tokens};
use crate::mesh::partition::Partitioner;
use crate::mesh::{Cell, Field, Mesh, MeshData, Region};
use eyre::{eyre, WrapErr};
use std::fmt::Write as _;
use std::path::Path;

pub fn read_cells(path: impl AsRef<Path>) -> eyre::Result<(Vec<Cell>, Connectivity)> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut tokens = Tokens::new(&text, path);
    let n_cells: usize = tokens.next("cell count")?;
    let n_nodes: usize = tokens.next("node count")?;
    let nnz: usize = tokens.next("connectivity size")?;

    let mut cells = Vec::with_capacity(n_cells);
    let mut cnt = Vec::with_capacity(n_cells);
    let mut idx = Vec::with_capacity(nnz);
    for _ in 0..n_cells {
        let index = tokens.next("cell index")?;
        let code = tokens.next("cell type")?;
        let order = tokens.next("cell order")?;
        let tag = tokens.next("region tag")?;
        let cell = Cell::from_code(index, code, order, tag)?;
        for _ in 0..cell.n_nodes() {
            idx.push(tokens.next("cell node")?);
        }
        cnt.push(cell.n_nodes());
        cells.push(cell);
    }
    if idx.len() != nnz {
        return Err(eyre!(
            "{} declares {nnz} connectivity entries but its cells hold {}",
            path.display(),
            idx.len()
        ));
    }
    let conn = Connectivity::new(n_nodes, cnt, idx).wrap_err_with(|| format!("invalid cells in {}", path.display()))?;
    Ok((cells, conn))
}

pub fn read_xpts(path: impl AsRef<Path>) -> eyre::Result<Vec<f64>> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut tokens = Tokens::new(&text, path);
    let n_nodes: usize = tokens.next("node count")?;
    (0..3 * n_nodes).map(|_| tokens.next("coordinate")).collect()
}

pub fn read_regions(path: impl AsRef<Path>) -> eyre::Result<Vec<Region>> {
    let path = path.as_ref();
    let text = read_to_string(path)?;
    let mut tokens = Tokens::new(&text, path);
    let n_regions: usize = tokens.next("region count")?;
    (0..n_regions)
        .map(|_| {
            let name: String = tokens.next("region name")?;
            let dim = tokens.next("region dimension")?;
            let tag = tokens.next("region tag")?;
            Ok(Region::new(name, dim, tag))
        })
        .collect()
}

/// Reads a complete mesh in global numbering.
pub fn read_mesh_data(dir: impl AsRef<Path>) -> eyre::Result<MeshData> {
    let dir = dir.as_ref();
    let (cells, conn) = read_cells(dir.join("cells"))?;
    let xpts = read_xpts(dir.join("xpts"))?;
    let regions = read_regions(dir.join("regions"))?;
    if xpts.len() != 3 * conn.n2() {
        return Err(eyre!(
            "{} holds {} nodes but the cells reference {}",
            dir.join("xpts").display(),
            xpts.len() / 3,
            conn.n2()
        ));
    }
    Ok(MeshData {
        cells,
        conn,
        xpts,
        regions,
    })
}

/// Reads a mesh directory on every process and keeps the part assigned by `partitioner`.
/// Collective.
pub fn read_mesh(ctx: &ProcessContext, dir: impl AsRef<Path>, partitioner: &dyn Partitioner) -> eyre::Result<Mesh> {
    let dir = dir.as_ref();
    let data = read_mesh_data(dir).wrap_err_with(|| format!("failed to read mesh from {}", dir.display()))?;
    Ok(Mesh::distribute(ctx, &data, partitioner)?)
}

/// The `cells` file of the local mesh, with local node indices.
pub fn format_cells(mesh: &Mesh) -> eyre::Result<String> {
    let conn = mesh.cell_node_conn();
    let mut out = String::new();
    writeln!(out, "{} {} {}", conn.n1(), conn.n2(), conn.nnz())?;
    for cell in mesh.cells() {
        write!(
            out,
            "{} {} {} {}",
            cell.idx(),
            cell.cell_type().code(),
            cell.order(),
            cell.tag()
        )?;
        for node in mesh.get_cell_nodes(cell)? {
            write!(out, " {node}")?;
        }
        writeln!(out)?;
    }
    Ok(out)
}

pub fn format_xpts(mesh: &Mesh) -> eyre::Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", mesh.n_nodes_local())?;
    for x in mesh.xpts().chunks_exact(3) {
        writeln!(out, "{} {} {}", x[0], x[1], x[2])?;
    }
    Ok(out)
}

pub fn format_regions(mesh: &Mesh) -> eyre::Result<String> {
    let mut out = String::new();
    writeln!(out, "{}", mesh.regions().len())?;
    for region in mesh.regions() {
        writeln!(out, "{} {} {}", region.name(), region.dim(), region.tag())?;
    }
    Ok(out)
}

fn write_file(path: &Path, contents: &str) -> eyre::Result<()> {
    std::fs::write(path, contents).wrap_err_with(|| format!("failed to write {}", path.display()))
}

/// Writes the local part of `mesh` into `dir`, which must exist.
pub fn write_mesh(dir: impl AsRef<Path>, mesh: &Mesh) -> eyre::Result<()> {
    let dir = dir.as_ref();
    write_file(&dir.join("xpts"), &format_xpts(mesh)?)?;
    write_file(&dir.join("cells"), &format_cells(mesh)?)?;
    write_file(&dir.join("regions"), &format_regions(mesh)?)
}

/// Reads nodal values in global node order and keeps those of the local nodes. Collective.
pub fn read_field_values(ctx: &ProcessContext, path: impl AsRef<Path>, field: &mut Field<'_>) -> eyre::Result<()> {
    let path = path.as_ref();
    let n_global = field.mesh().n_nodes_global(ctx);
    let text = read_to_string(path)?;
    let mut tokens = Tokens::new(&text, path);
    let n_vars: usize = tokens.next("variable count")?;
    if n_vars != field.n_vars() {
        return Err(eyre!(
            "{} holds {n_vars} variables per node but field {} has {}",
            path.display(),
            field.name(),
            field.n_vars()
        ));
    }

    let node_im = field.mesh().node_im();
    let mut values = vec![0.0; field.n_dof_local()];
    for global in 0..n_global {
        let tuple = (0..n_vars)
            .map(|_| tokens.next("field value"))
            .collect::<eyre::Result<Vec<f64>>>()?;
        if let Some(local) = node_im.global_to_local(global) {
            values[local * n_vars..(local + 1) * n_vars].copy_from_slice(&tuple);
        }
    }
    Ok(field.set_values(&values)?)
}

fn format_field(n_vars: usize, values: &[f64]) -> eyre::Result<String> {
    let mut out = String::new();
    writeln!(out, "{n_vars}")?;
    for tuple in values.chunks_exact(n_vars) {
        let line: Vec<String> = tuple.iter().map(f64::to_string).collect();
        writeln!(out, "{}", line.join(" "))?;
    }
    Ok(out)
}

/// Writes nodal values. Collective.
///
/// With `gather` the root writes all values to `path` in global node order. Otherwise every
/// process writes its local values, to `<path>_proc_<rank>` when there are several processes.
pub fn write_field_values(
    ctx: &ProcessContext,
    path: impl AsRef<Path>,
    field: &Field<'_>,
    gather: bool,
) -> eyre::Result<()> {
    let path = path.as_ref();
    if gather {
        if let Some(values) = field.gather_field_values(ctx) {
            write_file(path, &format_field(field.n_vars(), &values)?)?;
        }
        return Ok(());
    }

    let path = if ctx.n_procs() > 1 {
        path.with_file_name(format!(
            "{}_proc_{}",
            path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default(),
            ctx.rank()
        ))
    } else {
        path.to_path_buf()
    };
    write_file(&path, &format_field(field.n_vars(), field.values())?)
}
