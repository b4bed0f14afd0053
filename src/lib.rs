//! Distributed finite element assembly for thermal and structural problems.
//!
//! A mesh is partitioned across processes by a [`mesh::partition::Partitioner`], fields number
//! their degrees of freedom consistently across the partition, and element kernels from
//! [`physics`] are assembled into distributed matrices and vectors of a [`la::LinearSolver`]
//! backend. Processes communicate through the collectives of [`context::ProcessContext`].
pub mod assembly;
pub mod comm;
pub mod config;
pub mod connectivity;
pub mod context;
pub mod element;
pub mod error;
pub mod finite_element;
pub mod functions;
pub mod geometry;
pub mod index_map;
pub mod io;
pub mod la;
pub mod mesh;
pub mod physics;
pub mod quadrature;
pub mod sparsity;

mod small_matrix;

#[cfg(feature = "proptest")]
pub mod proptest;

pub extern crate nalgebra;
pub extern crate vtkio;
