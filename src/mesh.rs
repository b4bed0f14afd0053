//! The distributed mesh: cells, node coordinates, regions and ownership.
use crate::connectivity::Connectivity;
use crate::context::ProcessContext;
use crate::error::{check_size, Error, ErrorKind, Result};
use itertools::Itertools;

mod cell;
mod field;
mod region;

pub mod partition;
pub mod procedural;

pub use cell::{Cell, CellType};
pub use field::Field;
pub use region::Region;

use crate::index_map::IndexMap;

/// A mesh in global numbering, as read from file or generated, before distribution.
///
/// Cell `i` has global index `cells[i].idx()`, its nodes are global node indices and node `j`
/// has coordinates `xpts[3 * j..3 * j + 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub cells: Vec<Cell>,
    pub conn: Connectivity,
    pub xpts: Vec<f64>,
    pub regions: Vec<Region>,
}

impl MeshData {
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.xpts.len() / 3
    }

    /// Restricts the mesh to the cells and nodes known by the given index maps.
    ///
    /// Cells and nodes are stored in local index order and cell nodes are translated to local
    /// node indices. Fails if a kept cell references a node unknown to `node_im`.
    pub fn localize(&self, cell_im: &IndexMap, node_im: &IndexMap) -> Result<MeshData> {
        let mut local_cells: Vec<(usize, usize)> = self
            .cells
            .iter()
            .enumerate()
            .filter_map(|(pos, cell)| cell_im.global_to_local(cell.idx()).map(|local| (local, pos)))
            .collect();
        local_cells.sort_unstable();
        check_size(cell_im.n_local(), local_cells.len())?;

        let mut cells = Vec::with_capacity(local_cells.len());
        let mut rows = Vec::with_capacity(local_cells.len());
        for &(_, pos) in &local_cells {
            cells.push(self.cells[pos]);
            let row = self
                .conn
                .row(pos)
                .iter()
                .map(|&global| {
                    node_im
                        .global_to_local(global)
                        .ok_or_else(|| Error::out_of_range(global, node_im.n_local()))
                })
                .collect::<Result<Vec<_>>>()?;
            rows.push(row);
        }
        let conn = Connectivity::from_rows(node_im.n_local(), &rows)?;

        let mut xpts = Vec::with_capacity(3 * node_im.n_local());
        for local in 0..node_im.n_local() {
            let global = node_im.local_to_global(local)?;
            let coords = self
                .xpts
                .get(3 * global..3 * global + 3)
                .ok_or_else(|| Error::out_of_range(global, self.n_nodes()))?;
            xpts.extend_from_slice(coords);
        }

        Ok(MeshData {
            cells,
            conn,
            xpts,
            regions: self.regions.clone(),
        })
    }
}

/// The part of a distributed mesh known to one process.
///
/// Cell-to-node connectivity uses local node indices. Coordinates are stored with 3
/// components per node regardless of the physical dimension.
#[derive(Debug, Clone)]
pub struct Mesh {
    cells: Vec<Cell>,
    conn: Connectivity,
    xpts: Vec<f64>,
    regions: Vec<Region>,
    cell_im: IndexMap,
    node_im: IndexMap,
    dim: usize,
}

impl Mesh {
    pub fn new(
        cells: Vec<Cell>,
        conn: Connectivity,
        xpts: Vec<f64>,
        regions: Vec<Region>,
        cell_im: IndexMap,
        node_im: IndexMap,
    ) -> Result<Self> {
        check_size(cells.len(), conn.n1())?;
        check_size(cells.len(), cell_im.n_local())?;
        check_size(xpts.len() / 3, conn.n2())?;
        check_size(xpts.len() / 3, node_im.n_local())?;

        let dim = regions
            .iter()
            .map(Region::dim)
            .max()
            .or_else(|| cells.iter().map(Cell::dim).max())
            .unwrap_or(0);

        Ok(Self {
            cells,
            conn,
            xpts,
            regions,
            cell_im,
            node_im,
            dim,
        })
    }

    /// A mesh entirely owned by the calling process.
    pub fn serial(data: MeshData) -> Result<Self> {
        let cell_im = IndexMap::serial(data.cells.len());
        let node_im = IndexMap::serial(data.xpts.len() / 3);
        Self::new(data.cells, data.conn, data.xpts, data.regions, cell_im, node_im)
    }

    /// Physical dimension: the largest region dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn n_cells_local(&self) -> usize {
        self.cells.len()
    }

    pub fn n_cells_global(&self, ctx: &ProcessContext) -> usize {
        self.cell_im.n_global(ctx)
    }

    pub fn n_nodes_local(&self) -> usize {
        self.xpts.len() / 3
    }

    pub fn n_nodes_global(&self, ctx: &ProcessContext) -> usize {
        self.node_im.n_global(ctx)
    }

    pub fn xpts(&self) -> &[f64] {
        &self.xpts
    }

    /// Replaces the node coordinates, e.g. to move the mesh with a displacement field.
    pub fn set_xpts(&mut self, xpts: Vec<f64>) -> Result<()> {
        check_size(self.xpts.len(), xpts.len())?;
        self.xpts = xpts;
        Ok(())
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell_node_conn(&self) -> &Connectivity {
        &self.conn
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn cell_im(&self) -> &IndexMap {
        &self.cell_im
    }

    pub fn node_im(&self) -> &IndexMap {
        &self.node_im
    }

    pub fn get_region_by_name(&self, name: &str) -> Result<&Region> {
        self.regions
            .iter()
            .find(|region| region.name() == name)
            .ok_or_else(|| Error::new(ErrorKind::InvalidRegion { name: name.to_string() }))
    }

    /// Local cells of the named region.
    pub fn get_region_cells(&self, name: &str) -> Result<Vec<Cell>> {
        let tag = self.get_region_by_name(name)?.tag();
        Ok(self.cells.iter().filter(|cell| cell.tag() == tag).copied().collect())
    }

    /// Local indices of the nodes of the named region, each listed once.
    pub fn get_region_nodes(&self, name: &str) -> Result<Vec<usize>> {
        let tag = self.get_region_by_name(name)?.tag();
        let mut seen = vec![false; self.n_nodes_local()];
        let mut nodes = Vec::new();
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.tag() != tag {
                continue;
            }
            for &node in self.conn.row(i) {
                if !seen[node] {
                    seen[node] = true;
                    nodes.push(node);
                }
            }
        }
        Ok(nodes)
    }

    /// Local node indices of a cell, resolved through its global index.
    pub fn get_cell_nodes(&self, cell: &Cell) -> Result<&[usize]> {
        let local = self
            .cell_im
            .global_to_local(cell.idx())
            .ok_or_else(|| Error::out_of_range(cell.idx(), self.n_cells_local()))?;
        self.conn.get_row(local)
    }

    /// Coordinates of the nodes of a cell, 3 per node.
    pub fn get_cell_xpts(&self, cell: &Cell) -> Result<Vec<f64>> {
        let nodes = self.get_cell_nodes(cell)?;
        Ok(nodes
            .iter()
            .flat_map(|&node| self.xpts[3 * node..3 * node + 3].iter().copied())
            .collect())
    }

    /// Logs a summary of the local part of the mesh.
    pub fn info(&self, ctx: &ProcessContext) {
        ctx.info(format_args!(
            "Mesh: {} owned cells, {} ghost cells, {} owned nodes, {} ghost nodes",
            self.cell_im.n_owned(),
            self.cell_im.n_ghost(),
            self.node_im.n_owned(),
            self.node_im.n_ghost()
        ));
        ctx.info(format_args!(
            "Regions: {}",
            self.regions.iter().map(Region::name).join(", ")
        ));
    }
}
