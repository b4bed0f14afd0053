//! Non-zero counts per owned matrix row, for preallocating distributed matrices.
use crate::context::{ProcessContext, Timer};
use crate::error::{Error, Result};
use crate::index_map::send_data_to_owners;
use crate::mesh::Mesh;

/// Number of non-zeros per owned degree of freedom, split into the diagonal block (columns
/// owned by the same process) and the off-diagonal block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SparsityPattern {
    pub diag: Vec<usize>,
    pub off_diag: Vec<usize>,
}

impl SparsityPattern {
    pub fn n_rows(&self) -> usize {
        self.diag.len()
    }

    pub fn nnz_diag(&self) -> usize {
        self.diag.iter().sum()
    }

    pub fn nnz_off_diag(&self) -> usize {
        self.off_diag.iter().sum()
    }

    /// Total number of non-zeros in row `i`.
    pub fn row_nnz(&self, i: usize) -> usize {
        self.diag[i] + self.off_diag[i]
    }
}

/// Counts the non-zeros of each owned row of a matrix with `n_vars` variables per node.
///
/// Adjacencies seen only through ghost nodes are counted here and sent to the owner of the
/// ghost, so a row shared by several processes may be overestimated. Collective.
pub fn sparsity_pattern(ctx: &ProcessContext, mesh: &Mesh, n_vars: usize) -> Result<SparsityPattern> {
    let _timer = Timer::new(ctx, "Sparsity pattern calculation");

    let im = mesh.node_im().renumber(ctx)?;
    let conn = mesh.cell_node_conn().node_to_node();
    let n_owned = im.n_owned();

    let mut diag = vec![0; n_owned];
    let mut off_diag = vec![0; n_owned];
    for i in 0..n_owned {
        for &j in conn.row(i) {
            if j < n_owned {
                diag[i] += 1;
            } else {
                off_diag[i] += 1;
            }
        }
    }

    let mut owners = Vec::with_capacity(im.n_ghost());
    let mut ghost_counts = Vec::with_capacity(im.n_ghost());
    for (k, (&global, &owner_i)) in im.ghost_indices().iter().zip(im.ghost_owners()).enumerate() {
        let i = n_owned + k;
        let (mut d, mut o) = (0, 0);
        for &j in conn.row(i) {
            let owner_j = im.owner(ctx, j)?;
            if owner_i == owner_j {
                d += 1;
            } else {
                o += 1;
            }
        }
        owners.push(owner_i);
        ghost_counts.push((global, d, o));
    }

    let received = send_data_to_owners(ctx, &owners, ghost_counts);
    let mut unknown = None;
    for (global, d, o) in received {
        match im.global_to_local(global).filter(|&local| local < n_owned) {
            Some(local) => {
                diag[local] += d;
                off_diag[local] += o;
            }
            None => unknown = Some(global),
        }
    }
    if let Some(global) = unknown {
        return Err(Error::out_of_range(global, n_owned));
    }

    let expand = |counts: &[usize]| -> Vec<usize> {
        counts
            .iter()
            .flat_map(|&count| std::iter::repeat(count * n_vars).take(n_vars))
            .collect()
    };
    let pattern = SparsityPattern {
        diag: expand(&diag),
        off_diag: expand(&off_diag),
    };

    ctx.debug(format_args!(
        "Number of non-zeros, Diag: {} Off-Diag: {}",
        pattern.nnz_diag(),
        pattern.nnz_off_diag()
    ));
    Ok(pattern)
}
