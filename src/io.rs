//! Reading and writing meshes and fields.
//!
//! The native format is a directory holding three line-oriented text files: `cells`, `xpts`
//! and `regions`. Gmsh files can be converted into it and results exported to legacy VTK.
pub mod msh;
pub mod native;
pub mod vtk;

use eyre::{eyre, WrapErr};
use std::path::Path;
use std::str::{FromStr, SplitWhitespace};

/// Whitespace separated tokens of a text file, parsed on demand.
pub(crate) struct Tokens<'a> {
    iter: SplitWhitespace<'a>,
    source: String,
}

impl<'a> Tokens<'a> {
    pub(crate) fn new(text: &'a str, source: &Path) -> Self {
        Self {
            iter: text.split_whitespace(),
            source: source.display().to_string(),
        }
    }

    pub(crate) fn next<T>(&mut self, what: &str) -> eyre::Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let token = self
            .iter
            .next()
            .ok_or_else(|| eyre!("unexpected end of {} while reading {what}", self.source))?;
        token
            .parse()
            .wrap_err_with(|| format!("invalid {what} '{token}' in {}", self.source))
    }
}

pub(crate) fn read_to_string(path: &Path) -> eyre::Result<String> {
    std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read {}", path.display()))
}
