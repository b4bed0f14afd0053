use serde::{Deserialize, Serialize};

/// A named group of cells sharing a tag and a dimension, e.g. a domain or a boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    name: String,
    dim: usize,
    tag: usize,
}

impl Region {
    pub fn new(name: impl Into<String>, dim: usize, tag: usize) -> Self {
        Self {
            name: name.into(),
            dim,
            tag,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn tag(&self) -> usize {
        self.tag
    }
}
