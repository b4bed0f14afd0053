use crate::context::ProcessContext;
use crate::error::{check_size, Error, Result};
use crate::index_map::IndexMap;
use crate::mesh::{Cell, Mesh};
use std::collections::BTreeMap;

/// Nodal data with `n_vars` components per node, bound to a mesh.
///
/// Degrees of freedom are numbered `node * n_vars + var`, where `node` is the node's index in
/// the renumbered (globally contiguous) node map.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    mesh: &'a Mesh,
    name: String,
    n_vars: usize,
    components: Vec<String>,
    dof_im: IndexMap,
    n_global_nodes: usize,
    fixed_dof: BTreeMap<usize, f64>,
    values: Vec<f64>,
}

impl<'a> Field<'a> {
    /// Creates a zero-valued field. Collective.
    ///
    /// Component names default to `<name>_<i>`; otherwise there must be exactly `n_vars`.
    pub fn new(
        ctx: &ProcessContext,
        mesh: &'a Mesh,
        name: impl Into<String>,
        n_vars: usize,
        components: Vec<String>,
    ) -> Result<Self> {
        let name = name.into();
        if n_vars == 0 {
            return Err(Error::size_mismatch(1, 0));
        }
        let components = if components.is_empty() {
            (0..n_vars).map(|i| format!("{name}_{i}")).collect()
        } else {
            check_size(n_vars, components.len())?;
            components
        };

        let dof_im = mesh.node_im().renumber(ctx)?;
        let n_global_nodes = dof_im.n_global(ctx);
        let values = vec![0.0; n_vars * dof_im.n_local()];

        Ok(Self {
            mesh,
            name,
            n_vars,
            components,
            dof_im,
            n_global_nodes,
            fixed_dof: BTreeMap::new(),
            values,
        })
    }

    pub fn mesh(&self) -> &'a Mesh {
        self.mesh
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The renumbered node map the degrees of freedom are derived from.
    pub fn dof_im(&self) -> &IndexMap {
        &self.dof_im
    }

    pub fn n_dof_local(&self) -> usize {
        self.n_vars * self.dof_im.n_local()
    }

    pub fn n_dof_owned(&self) -> usize {
        self.n_vars * self.dof_im.n_owned()
    }

    pub fn n_dof_ghost(&self) -> usize {
        self.n_vars * self.dof_im.n_ghost()
    }

    pub fn n_dof_global(&self) -> usize {
        self.n_vars * self.n_global_nodes
    }

    /// All degrees of freedom of the given nodes, node-major.
    pub fn map_node_dof(&self, nodes: &[usize]) -> Vec<usize> {
        nodes
            .iter()
            .flat_map(|&node| (0..self.n_vars).map(move |var| node * self.n_vars + var))
            .collect()
    }

    /// Global degrees of freedom owned by this process.
    pub fn get_owned_dof(&self) -> Vec<usize> {
        self.map_node_dof(self.dof_im.owned_indices())
    }

    /// Global degrees of freedom of the ghost nodes.
    pub fn get_ghost_dof(&self) -> Vec<usize> {
        self.map_node_dof(self.dof_im.ghost_indices())
    }

    /// Global degrees of freedom of a cell, in element order.
    pub fn get_cell_dof(&self, cell: &Cell) -> Result<Vec<usize>> {
        let nodes = self
            .mesh
            .get_cell_nodes(cell)?
            .iter()
            .map(|&node| self.dof_im.local_to_global(node))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.map_node_dof(&nodes))
    }

    /// Values at the nodes of a cell, in element order.
    pub fn get_cell_values(&self, cell: &Cell) -> Result<Vec<f64>> {
        let nodes = self.mesh.get_cell_nodes(cell)?;
        Ok(nodes
            .iter()
            .flat_map(|&node| self.values[node * self.n_vars..(node + 1) * self.n_vars].iter().copied())
            .collect())
    }

    /// Prescribes `value` for component `var` at every local node of the named region.
    pub fn add_fixed_dof(&mut self, region: &str, var: usize, value: f64) -> Result<()> {
        if var >= self.n_vars {
            return Err(Error::out_of_range(var, self.n_vars));
        }
        for node in self.mesh.get_region_nodes(region)? {
            let global = self.dof_im.local_to_global(node)?;
            self.fixed_dof.insert(global * self.n_vars + var, value);
        }
        Ok(())
    }

    /// Fixed global degrees of freedom, ascending.
    pub fn get_fixed_dof(&self) -> Vec<usize> {
        self.fixed_dof.keys().copied().collect()
    }

    /// Prescribed values, in the order of [`get_fixed_dof`](Self::get_fixed_dof).
    pub fn get_fixed_dof_values(&self) -> Vec<f64> {
        self.fixed_dof.values().copied().collect()
    }

    pub fn fixed_dof(&self) -> &BTreeMap<usize, f64> {
        &self.fixed_dof
    }

    pub fn clear_fixed_dof(&mut self) {
        self.fixed_dof.clear();
    }

    /// Sets every node to the same `n_vars` component values.
    pub fn set_all(&mut self, values: &[f64]) -> Result<()> {
        check_size(self.n_vars, values.len())?;
        for chunk in self.values.chunks_exact_mut(self.n_vars) {
            chunk.copy_from_slice(values);
        }
        Ok(())
    }

    /// Sets all local values, owned nodes first, then ghosts.
    pub fn set_values(&mut self, values: &[f64]) -> Result<()> {
        check_size(self.values.len(), values.len())?;
        self.values.copy_from_slice(values);
        Ok(())
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Gathers the owned values of every process on the root, ordered by the mesh's global
    /// node numbering. Other ranks receive `None`. Collective.
    pub fn gather_field_values(&self, ctx: &ProcessContext) -> Option<Vec<f64>> {
        if ctx.n_procs() == 1 {
            return Some(self.values.clone());
        }

        let dof = self.map_node_dof(self.mesh.node_im().owned_indices());
        let owned = self.values[..self.n_dof_owned()].to_vec();
        let all_dof = ctx.gather_v(0, dof);
        let all_values = ctx.gather_v(0, owned);
        let (all_dof, all_values) = all_dof.zip(all_values)?;

        let mut gathered = vec![0.0; self.n_dof_global()];
        for (dof, values) in all_dof.iter().zip(&all_values) {
            for (&d, &v) in dof.iter().zip(values) {
                gathered[d] = v;
            }
        }
        Some(gathered)
    }
}
