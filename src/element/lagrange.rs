//! Tensor-product Lagrange bases on `[-1, 1]^d`: lines and quads of order 1-3, trilinear hexes.
use crate::element::{Basis, Quadrature};
use crate::mesh::CellType;
use crate::quadrature::tensor::{hexahedron_gauss, quadrilateral_gauss};
use crate::quadrature::univariate::gauss;
use nalgebra::{DVector, MatrixXx3, Vector3};

/// 1D interpolation points in Gmsh order: end points first, then interior points.
fn points_1d(order: usize) -> Vec<f64> {
    match order {
        1 => vec![-1.0, 1.0],
        2 => vec![-1.0, 1.0, 0.0],
        3 => vec![-1.0, 1.0, -1.0 / 3.0, 1.0 / 3.0],
        _ => unreachable!("tensor bases support orders 1 to 3"),
    }
}

/// Value of the 1D Lagrange polynomial of point `i` at `x`.
pub(crate) fn lagrange_1d(points: &[f64], i: usize, x: f64) -> f64 {
    points
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != i)
        .map(|(_, &xj)| (x - xj) / (points[i] - xj))
        .product()
}

/// Derivative of the 1D Lagrange polynomial of point `i` at `x`.
pub(crate) fn lagrange_1d_derivative(points: &[f64], i: usize, x: f64) -> f64 {
    let xi = points[i];
    (0..points.len())
        .filter(|&k| k != i)
        .map(|k| {
            let rest: f64 = (0..points.len())
                .filter(|&j| j != i && j != k)
                .map(|j| (x - points[j]) / (xi - points[j]))
                .product();
            rest / (xi - points[k])
        })
        .sum()
}

/// Per-node indices into [`points_1d`] along each axis, in Gmsh node order.
#[rustfmt::skip]
fn node_indices(cell_type: CellType, order: usize) -> Vec<[usize; 3]> {
    match (cell_type, order) {
        (CellType::Line, _) => (0..=order).map(|i| [i, 0, 0]).collect(),
        (CellType::Quad, 1) => vec![[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]],
        (CellType::Quad, 2) => vec![
            [0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0],
            [2, 0, 0], [1, 2, 0], [2, 1, 0], [0, 2, 0],
            [2, 2, 0],
        ],
        (CellType::Quad, 3) => vec![
            [0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0],
            [2, 0, 0], [3, 0, 0], [1, 2, 0], [1, 3, 0],
            [3, 1, 0], [2, 1, 0], [0, 3, 0], [0, 2, 0],
            [2, 2, 0], [3, 2, 0], [3, 3, 0], [2, 3, 0],
        ],
        (CellType::Hex, 1) => vec![
            [0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0],
            [0, 0, 1], [1, 0, 1], [1, 1, 1], [0, 1, 1],
        ],
        _ => unreachable!("no tensor basis for {cell_type:?} of order {order}"),
    }
}

/// Lagrange basis built from products of 1D Lagrange polynomials.
#[derive(Debug, Clone)]
pub struct TensorLagrangeBasis {
    cell_type: CellType,
    order: usize,
    points: Vec<f64>,
    nodes: Vec<[usize; 3]>,
    quadrature: Quadrature,
}

impl TensorLagrangeBasis {
    /// # Panics
    ///
    /// Panics unless `cell_type` is a line or quad with `order` in `1..=3`, or a hex of order 1.
    pub fn new(cell_type: CellType, order: usize) -> Self {
        let quadrature: Quadrature = match cell_type {
            CellType::Line => gauss(order + 1).into(),
            CellType::Quad => quadrilateral_gauss(order + 1).into(),
            _ => hexahedron_gauss(2).into(),
        };
        Self {
            cell_type,
            order,
            points: points_1d(order),
            nodes: node_indices(cell_type, order),
            quadrature,
        }
    }

    fn factor(&self, axis: usize, index: usize, xi: &Vector3<f64>) -> f64 {
        if axis < self.cell_type.dim() {
            lagrange_1d(&self.points, index, xi[axis])
        } else {
            1.0
        }
    }
}

impl Basis for TensorLagrangeBasis {
    fn cell_type(&self) -> CellType {
        self.cell_type
    }

    fn order(&self) -> usize {
        self.order
    }

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    fn eval_shape(&self, xi: &Vector3<f64>) -> DVector<f64> {
        DVector::from_iterator(
            self.nodes.len(),
            self.nodes
                .iter()
                .map(|idx| (0..3).map(|axis| self.factor(axis, idx[axis], xi)).product::<f64>()),
        )
    }

    fn eval_shape_grad(&self, xi: &Vector3<f64>) -> MatrixXx3<f64> {
        let dim = self.cell_type.dim();
        let mut grad = MatrixXx3::zeros(self.nodes.len());
        for (node, idx) in self.nodes.iter().enumerate() {
            for d in 0..dim {
                grad[(node, d)] = (0..dim)
                    .map(|axis| {
                        if axis == d {
                            lagrange_1d_derivative(&self.points, idx[axis], xi[axis])
                        } else {
                            lagrange_1d(&self.points, idx[axis], xi[axis])
                        }
                    })
                    .product();
            }
        }
        grad
    }

    fn reference_nodes(&self) -> Vec<Vector3<f64>> {
        let dim = self.cell_type.dim();
        self.nodes
            .iter()
            .map(|idx| Vector3::from_fn(|axis, _| if axis < dim { self.points[idx[axis]] } else { 0.0 }))
            .collect()
    }
}
