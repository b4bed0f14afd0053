//! Distribution of a mesh over a process group.
//!
//! A [`Partitioner`] decides, on the root process, which rank owns each cell and node. This
//! module derives the ghost nodes of every part and scatters the resulting ownership packages,
//! from which each rank builds its cell and node [`IndexMap`]s.
use crate::connectivity::Connectivity;
use crate::context::ProcessContext;
use crate::error::{check_size, Error, ErrorKind, Result};
use crate::index_map::IndexMap;
use crate::mesh::{Mesh, MeshData};
use std::collections::BTreeSet;

/// Computes owners for a cell-to-node connectivity. Only invoked on the root process.
pub trait Partitioner {
    /// Returns `(cell_owners, node_owners)`, one rank in `0..n_parts` per cell and per node.
    fn compute_owners(&self, n_parts: usize, conn: &Connectivity) -> Result<(Vec<usize>, Vec<usize>)>;
}

/// Splits cells into contiguous blocks of nearly equal size.
///
/// A node is owned by the lowest-ranked part with a cell touching it, so every part owns only
/// nodes of its own cells.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlockPartitioner;

impl Partitioner for BlockPartitioner {
    fn compute_owners(&self, n_parts: usize, conn: &Connectivity) -> Result<(Vec<usize>, Vec<usize>)> {
        let n_cells = conn.n1();
        let cell_owners: Vec<usize> = (0..n_cells).map(|cell| cell * n_parts / n_cells.max(1)).collect();
        let node_to_cell = conn.invert();
        let node_owners = (0..conn.n2())
            .map(|node| {
                node_to_cell
                    .row(node)
                    .iter()
                    .map(|&cell| cell_owners[cell])
                    .min()
                    .unwrap_or(0)
            })
            .collect();
        Ok((cell_owners, node_owners))
    }
}

/// Ownership of one part: owned cells, owned nodes and ghost nodes with their owners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartPackage {
    pub cells: Vec<usize>,
    pub nodes: Vec<usize>,
    pub ghosts: Vec<usize>,
    pub ghost_owners: Vec<usize>,
}

/// For every part, the nodes referenced by its cells but owned by another part.
///
/// Returns `(node, owner)` pairs per part, sorted by node.
pub fn compute_ghost_nodes(
    n_parts: usize,
    conn: &Connectivity,
    cell_owners: &[usize],
    node_owners: &[usize],
) -> Vec<Vec<(usize, usize)>> {
    let mut ghosts: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n_parts];
    for (cell, &part) in cell_owners.iter().enumerate() {
        for &node in conn.row(cell) {
            if node_owners[node] != part {
                ghosts[part].insert(node);
            }
        }
    }
    ghosts
        .into_iter()
        .map(|nodes| nodes.into_iter().map(|node| (node, node_owners[node])).collect())
        .collect()
}

/// Groups the owner assignment into one package per part.
pub fn part_packages(
    n_parts: usize,
    conn: &Connectivity,
    cell_owners: &[usize],
    node_owners: &[usize],
) -> Result<Vec<PartPackage>> {
    check_size(conn.n1(), cell_owners.len())?;
    check_size(conn.n2(), node_owners.len())?;
    if let Some(&bad) = cell_owners.iter().chain(node_owners).find(|&&p| p >= n_parts) {
        return Err(Error::out_of_range(bad, n_parts));
    }

    let mut packages = vec![PartPackage::default(); n_parts];
    for (cell, &part) in cell_owners.iter().enumerate() {
        packages[part].cells.push(cell);
    }
    for (node, &part) in node_owners.iter().enumerate() {
        packages[part].nodes.push(node);
    }
    for (package, ghosts) in packages
        .iter_mut()
        .zip(compute_ghost_nodes(n_parts, conn, cell_owners, node_owners))
    {
        (package.ghosts, package.ghost_owners) = ghosts.into_iter().unzip();
    }
    Ok(packages)
}

/// Partitions the mesh on the root and scatters ownership. Collective.
///
/// `conn` is the global cell-to-node connectivity and is only read on the root. Returns the
/// local cell map (no ghosts) and node map (with ghosts) of the calling rank.
pub fn part_mesh(
    ctx: &ProcessContext,
    partitioner: &dyn Partitioner,
    conn: &Connectivity,
) -> Result<(IndexMap, IndexMap)> {
    let mut root_error = None;
    let send = if ctx.is_root() {
        let packages = partitioner
            .compute_owners(ctx.n_procs(), conn)
            .and_then(|(cell_owners, node_owners)| part_packages(ctx.n_procs(), conn, &cell_owners, &node_owners));
        match packages {
            Ok(packages) => packages.into_iter().map(|package| vec![package]).collect(),
            Err(err) => {
                root_error = Some(err);
                vec![Vec::new(); ctx.n_procs()]
            }
        }
    } else {
        Vec::new()
    };

    let received = ctx.scatter_v(0, send);
    if let Some(err) = root_error {
        return Err(err);
    }
    let package = received.into_iter().next().ok_or_else(|| {
        Error::new(ErrorKind::Partition {
            reason: "the root process failed to partition the mesh".to_string(),
        })
    })?;

    let cell_im = IndexMap::new(package.cells, Vec::new(), Vec::new())?;
    let node_im = IndexMap::new(package.nodes, package.ghosts, package.ghost_owners)?;
    Ok((cell_im, node_im))
}

impl Mesh {
    /// Distributes a mesh known to every process in global numbering. Collective.
    ///
    /// With a single process the mesh is used as is.
    pub fn distribute(ctx: &ProcessContext, data: &MeshData, partitioner: &dyn Partitioner) -> Result<Mesh> {
        if ctx.n_procs() == 1 {
            return Mesh::serial(data.clone());
        }
        let (cell_im, node_im) = part_mesh(ctx, partitioner, &data.conn)?;
        let local = data.localize(&cell_im, &node_im)?;
        Mesh::new(local.cells, local.conn, local.xpts, local.regions, cell_im, node_im)
    }
}
