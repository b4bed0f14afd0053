//! Sparse incidence between two sets of entities, e.g. cells and nodes.
use crate::error::{check_size, Error, Result};
use serde::{Deserialize, Serialize};

/// A CSR-like incidence from `n1` row entities to `n2` column entities.
///
/// Row `i` lists the column entities `idx[ptr[i]..ptr[i] + cnt[i]]`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Connectivity {
    n1: usize,
    n2: usize,
    ptr: Vec<usize>,
    cnt: Vec<usize>,
    idx: Vec<usize>,
}

impl Connectivity {
    /// Builds a connectivity from per-row counts and the flat index array.
    pub fn new(n2: usize, cnt: Vec<usize>, idx: Vec<usize>) -> Result<Self> {
        check_size(cnt.iter().sum(), idx.len())?;
        if let Some(&bad) = idx.iter().find(|&&j| j >= n2) {
            return Err(Error::out_of_range(bad, n2));
        }
        let ptr = cnt
            .iter()
            .scan(0, |offset, &c| {
                let current = *offset;
                *offset += c;
                Some(current)
            })
            .collect();
        Ok(Self {
            n1: cnt.len(),
            n2,
            ptr,
            cnt,
            idx,
        })
    }

    pub fn from_rows<R: AsRef<[usize]>>(n2: usize, rows: &[R]) -> Result<Self> {
        let cnt = rows.iter().map(|row| row.as_ref().len()).collect();
        let idx = rows.iter().flat_map(|row| row.as_ref().iter().copied()).collect();
        Self::new(n2, cnt, idx)
    }

    pub fn n1(&self) -> usize {
        self.n1
    }

    pub fn n2(&self) -> usize {
        self.n2
    }

    pub fn ptr(&self) -> &[usize] {
        &self.ptr
    }

    pub fn cnt(&self) -> &[usize] {
        &self.cnt
    }

    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    pub fn nnz(&self) -> usize {
        self.idx.len()
    }

    /// The column entities of row `i`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= n1`.
    pub fn row(&self, i: usize) -> &[usize] {
        let start = self.ptr[i];
        &self.idx[start..start + self.cnt[i]]
    }

    pub fn get_row(&self, i: usize) -> Result<&[usize]> {
        if i < self.n1 {
            Ok(self.row(i))
        } else {
            Err(Error::out_of_range(i, self.n1))
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        (0..self.n1).map(move |i| self.row(i))
    }

    /// The transposed incidence, from column entities to row entities.
    pub fn invert(&self) -> Connectivity {
        let mut cnt = vec![0; self.n2];
        for &j in &self.idx {
            cnt[j] += 1;
        }

        let mut ptr = Vec::with_capacity(self.n2);
        let mut offset = 0;
        for &c in &cnt {
            ptr.push(offset);
            offset += c;
        }

        let mut cursor = ptr.clone();
        let mut idx = vec![0; self.idx.len()];
        for i in 0..self.n1 {
            for &j in self.row(i) {
                idx[cursor[j]] = i;
                cursor[j] += 1;
            }
        }

        Connectivity {
            n1: self.n2,
            n2: self.n1,
            ptr,
            cnt,
            idx,
        }
    }

    /// Node-to-node adjacency through shared cells, for a cell-to-node incidence.
    ///
    /// Every node is adjacent to itself. Neighbors appear once per row.
    pub fn node_to_node(&self) -> Connectivity {
        let node_to_cell = self.invert();
        let n_nodes = self.n2;

        // marker[k] == node means k was already counted for the current node
        let mut marker = vec![usize::MAX; n_nodes];
        let mut cnt = vec![0; n_nodes];
        for node in 0..n_nodes {
            for &cell in node_to_cell.row(node) {
                for &neighbor in self.row(cell) {
                    if marker[neighbor] != node {
                        marker[neighbor] = node;
                        cnt[node] += 1;
                    }
                }
            }
        }

        marker.fill(usize::MAX);
        let mut ptr = Vec::with_capacity(n_nodes);
        let mut idx = Vec::with_capacity(cnt.iter().sum());
        for node in 0..n_nodes {
            ptr.push(idx.len());
            for &cell in node_to_cell.row(node) {
                for &neighbor in self.row(cell) {
                    if marker[neighbor] != node {
                        marker[neighbor] = node;
                        idx.push(neighbor);
                    }
                }
            }
        }

        Connectivity {
            n1: n_nodes,
            n2: n_nodes,
            ptr,
            cnt,
            idx,
        }
    }
}
