//! Serial sparse linear algebra used by the reference `parfem` solver backend.

pub mod cg;
pub mod csr;

pub use nalgebra_sparse;
