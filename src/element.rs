//! Reference bases: shape functions, their natural gradients and quadrature rules.
//!
//! Every basis lives on a fixed reference cell and evaluates its shape functions at natural
//! coordinates padded to 3 components. Gradients are returned as `n_nodes x 3` matrices whose
//! columns beyond the reference dimension are zero.
use crate::error::{Error, ErrorKind, Result};
use crate::mesh::{Cell, CellType};
use crate::quadrature::{pad_points, Rule};
use nalgebra::{DVector, MatrixXx3, Vector3};
use std::fmt::Debug;

mod hexahedron;
mod lagrange;
mod prism;
mod simplex;

pub use hexahedron::Hex20Basis;
pub use lagrange::TensorLagrangeBasis;
pub use prism::Prism6Basis;
pub use simplex::SimplexLagrangeBasis;

/// Shape functions and quadrature on a reference cell.
pub trait Basis: Debug + Send + Sync {
    fn cell_type(&self) -> CellType;

    fn order(&self) -> usize;

    /// Dimension of the reference cell.
    fn dim(&self) -> usize {
        self.cell_type().dim()
    }

    fn n_nodes(&self) -> usize;

    fn quadrature(&self) -> &Quadrature;

    fn n_qpts(&self) -> usize {
        self.quadrature().len()
    }

    /// Weight of quadrature point `i`.
    fn qwt(&self, i: usize) -> f64 {
        self.quadrature().weights[i]
    }

    /// Natural coordinates of quadrature point `i`.
    fn qpt(&self, i: usize) -> Vector3<f64> {
        self.quadrature().points[i]
    }

    /// Values of all shape functions at `xi`.
    fn eval_shape(&self, xi: &Vector3<f64>) -> DVector<f64>;

    /// Natural gradients of all shape functions at `xi`, one row per node.
    fn eval_shape_grad(&self, xi: &Vector3<f64>) -> MatrixXx3<f64>;

    /// Natural coordinates of the nodes, in element order.
    fn reference_nodes(&self) -> Vec<Vector3<f64>>;
}

/// Quadrature points padded to 3D, with their weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Quadrature {
    pub weights: Vec<f64>,
    pub points: Vec<Vector3<f64>>,
}

impl Quadrature {
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl<const D: usize> From<Rule<D>> for Quadrature {
    fn from((weights, points): Rule<D>) -> Self {
        let points = pad_points(&points).into_iter().map(Vector3::from).collect();
        Self { weights, points }
    }
}

/// Selects a basis by reference cell type and polynomial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasisKey {
    pub cell_type: CellType,
    pub order: usize,
}

impl From<&Cell> for BasisKey {
    fn from(cell: &Cell) -> Self {
        Self {
            cell_type: cell.cell_type(),
            order: cell.order(),
        }
    }
}

/// Creates the basis for `key`, failing with an invalid-cell error if it is unsupported.
pub fn create_basis(key: BasisKey) -> Result<Box<dyn Basis>> {
    let BasisKey { cell_type, order } = key;
    let basis: Box<dyn Basis> = match (cell_type, order) {
        (CellType::Point, 1) => Box::new(PointBasis::default()),
        (CellType::Line | CellType::Quad, 1..=3) | (CellType::Hex, 1) => {
            Box::new(TensorLagrangeBasis::new(cell_type, order))
        }
        (CellType::Triangle | CellType::Tet, 1..=3) => Box::new(SimplexLagrangeBasis::new(cell_type, order)),
        (CellType::Hex, 2) => Box::new(Hex20Basis::new()),
        (CellType::Prism, 1) => Box::new(Prism6Basis::new()),
        _ => {
            return Err(Error::new(ErrorKind::InvalidCell {
                id: 0,
                cell_type: cell_type.code(),
                order,
            }))
        }
    };
    Ok(basis)
}

/// Creates the basis of a cell, reporting the cell's index if it is unsupported.
pub fn create_cell_basis(cell: &Cell) -> Result<Box<dyn Basis>> {
    create_basis(BasisKey::from(cell)).map_err(|_| {
        Error::new(ErrorKind::InvalidCell {
            id: cell.idx(),
            cell_type: cell.cell_type().code(),
            order: cell.order(),
        })
    })
}

/// The single-node basis of a point cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PointBasis {
    quadrature: Quadrature,
}

impl Default for PointBasis {
    fn default() -> Self {
        Self {
            quadrature: Quadrature {
                weights: vec![1.0],
                points: vec![Vector3::zeros()],
            },
        }
    }
}

impl Basis for PointBasis {
    fn cell_type(&self) -> CellType {
        CellType::Point
    }

    fn order(&self) -> usize {
        1
    }

    fn n_nodes(&self) -> usize {
        1
    }

    fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    fn eval_shape(&self, _xi: &Vector3<f64>) -> DVector<f64> {
        DVector::from_element(1, 1.0)
    }

    fn eval_shape_grad(&self, _xi: &Vector3<f64>) -> MatrixXx3<f64> {
        MatrixXx3::zeros(1)
    }

    fn reference_nodes(&self) -> Vec<Vector3<f64>> {
        vec![Vector3::zeros()]
    }
}
