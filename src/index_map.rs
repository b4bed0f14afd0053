//! Local/global index translation for distributed entities.
use crate::context::ProcessContext;
use crate::error::{Error, ErrorKind, Result};
use rustc_hash::FxHashMap;

/// Ownership of a locally known entity.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Ownership {
    /// Owned by the current process
    Owned,
    /// Ghost on the current process, owned by the given rank
    Ghost(usize),
}

/// Maps the local indices `[0, n_local)` of one process to global indices.
///
/// Local indices `[0, n_owned)` are owned by this process, the remaining `n_ghost` indices are
/// ghosts owned elsewhere. Each ghost records the rank of its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexMap {
    n_owned: usize,
    local_to_global: Vec<usize>,
    ghost_owners: Vec<usize>,
    global_to_local: FxHashMap<usize, usize>,
}

impl IndexMap {
    /// The serial map: `n` owned entities, identity numbering, no ghosts.
    pub fn serial(n: usize) -> Self {
        Self::from_parts((0..n).collect(), Vec::new(), Vec::new())
    }

    /// Builds a map from the owned global indices and the ghost global indices with their owners.
    pub fn new(owned: Vec<usize>, ghosts: Vec<usize>, ghost_owners: Vec<usize>) -> Result<Self> {
        if ghosts.len() != ghost_owners.len() {
            return Err(Error::size_mismatch(ghosts.len(), ghost_owners.len()));
        }
        Ok(Self::from_parts(owned, ghosts, ghost_owners))
    }

    fn from_parts(owned: Vec<usize>, ghosts: Vec<usize>, ghost_owners: Vec<usize>) -> Self {
        let n_owned = owned.len();
        let mut local_to_global = owned;
        local_to_global.extend(ghosts);
        let global_to_local = local_to_global
            .iter()
            .enumerate()
            .map(|(local, &global)| (global, local))
            .collect();
        Self {
            n_owned,
            local_to_global,
            ghost_owners,
            global_to_local,
        }
    }

    pub fn n_owned(&self) -> usize {
        self.n_owned
    }

    pub fn n_ghost(&self) -> usize {
        self.local_to_global.len() - self.n_owned
    }

    pub fn n_local(&self) -> usize {
        self.local_to_global.len()
    }

    /// Total number of owned entities over all processes. Collective unless serial.
    pub fn n_global(&self, ctx: &ProcessContext) -> usize {
        ctx.all_reduce_sum(self.n_owned)
    }

    pub fn owned_indices(&self) -> &[usize] {
        &self.local_to_global[..self.n_owned]
    }

    pub fn ghost_indices(&self) -> &[usize] {
        &self.local_to_global[self.n_owned..]
    }

    pub fn ghost_owners(&self) -> &[usize] {
        &self.ghost_owners
    }

    pub fn local_to_global(&self, idx: usize) -> Result<usize> {
        self.local_to_global
            .get(idx)
            .copied()
            .ok_or_else(|| Error::out_of_range(idx, self.n_local()))
    }

    /// Local index of a global index, or `None` if it is not known on this process.
    pub fn global_to_local(&self, idx: usize) -> Option<usize> {
        self.global_to_local.get(&idx).copied()
    }

    pub fn ownership(&self, local: usize) -> Result<Ownership> {
        if local < self.n_owned {
            Ok(Ownership::Owned)
        } else if local < self.n_local() {
            Ok(Ownership::Ghost(self.ghost_owners[local - self.n_owned]))
        } else {
            Err(Error::out_of_range(local, self.n_local()))
        }
    }

    /// Owning rank of a local index.
    pub fn owner(&self, ctx: &ProcessContext, local: usize) -> Result<usize> {
        Ok(match self.ownership(local)? {
            Ownership::Owned => ctx.rank(),
            Ownership::Ghost(owner) => owner,
        })
    }

    /// Produces a new map whose global numbering is contiguous per process.
    ///
    /// Rank `r` owns `[offset_r, offset_r + n_owned)` where `offset_r` is the number of entities
    /// owned by lower ranks. Ghost indices are translated by their owners. Collective.
    pub fn renumber(&self, ctx: &ProcessContext) -> Result<IndexMap> {
        if ctx.n_procs() == 1 {
            return Ok(IndexMap::serial(self.n_owned));
        }

        let counts = ctx.all_to_all(vec![self.n_owned; ctx.n_procs()]);
        let offset: usize = counts[..ctx.rank()].iter().sum();
        let owned: Vec<usize> = (offset..offset + self.n_owned).collect();

        // A ghost its owner does not own answers `None`. The exchange still completes on every
        // rank before the requester reports it.
        let renumbered = query_owners(ctx, &self.ghost_owners, self.ghost_indices(), |&global| {
            match self.global_to_local(global) {
                Some(local) if local < self.n_owned => Some(offset + local),
                _ => None,
            }
        });

        let mut ghosts = Vec::with_capacity(renumbered.len());
        for (&global, new) in self.ghost_indices().iter().zip(renumbered) {
            match new {
                Some(new) => ghosts.push(new),
                None => {
                    return Err(Error::new(ErrorKind::OutOfRange {
                        index: global,
                        len: self.n_local(),
                    }))
                }
            }
        }
        Ok(Self::from_parts(owned, ghosts, self.ghost_owners.clone()))
    }
}

/// Sends each query to the rank given in `owners`, answers it there and returns the answers
/// in request order. Collective.
pub(crate) fn query_owners<Q, A>(
    ctx: &ProcessContext,
    owners: &[usize],
    queries: &[Q],
    answer: impl Fn(&Q) -> A,
) -> Vec<A>
where
    Q: Clone + Send + 'static,
    A: Clone + Send + 'static,
{
    assert_eq!(owners.len(), queries.len());
    let mut send: Vec<Vec<Q>> = (0..ctx.n_procs()).map(|_| Vec::new()).collect();
    let mut positions = Vec::with_capacity(queries.len());
    for (query, &owner) in queries.iter().zip(owners) {
        positions.push((owner, send[owner].len()));
        send[owner].push(query.clone());
    }

    let received = ctx.all_to_all_v(send);
    let replies = received
        .iter()
        .map(|queries| queries.iter().map(&answer).collect())
        .collect();
    let answers: Vec<Vec<A>> = ctx.all_to_all_v(replies);

    positions
        .into_iter()
        .map(|(owner, pos)| answers[owner][pos].clone())
        .collect()
}

/// Routes each item of `data` to the rank given in `owners`. Returns everything this rank
/// received, ordered by source rank. Collective.
pub fn send_data_to_owners<T: Send + 'static>(ctx: &ProcessContext, owners: &[usize], data: Vec<T>) -> Vec<T> {
    assert_eq!(owners.len(), data.len());
    let mut send: Vec<Vec<T>> = (0..ctx.n_procs()).map(|_| Vec::new()).collect();
    for (item, &owner) in data.into_iter().zip(owners) {
        send[owner].push(item);
    }
    ctx.all_to_all_v(send).into_iter().flatten().collect()
}
