use crate::element::{Basis, Quadrature};
use crate::mesh::CellType;
use crate::quadrature::tensor::hexahedron_gauss;
use nalgebra::{DVector, MatrixXx3, Vector3};

/// Natural coordinates of the 20 nodes: corners, then edge midpoints in Gmsh order.
#[rustfmt::skip]
const HEX20_NODES: [[f64; 3]; 20] = [
    [-1.0, -1.0, -1.0],
    [ 1.0, -1.0, -1.0],
    [ 1.0,  1.0, -1.0],
    [-1.0,  1.0, -1.0],
    [-1.0, -1.0,  1.0],
    [ 1.0, -1.0,  1.0],
    [ 1.0,  1.0,  1.0],
    [-1.0,  1.0,  1.0],
    [ 0.0, -1.0, -1.0],
    [-1.0,  0.0, -1.0],
    [-1.0, -1.0,  0.0],
    [ 1.0,  0.0, -1.0],
    [ 1.0, -1.0,  0.0],
    [ 0.0,  1.0, -1.0],
    [ 1.0,  1.0,  0.0],
    [-1.0,  1.0,  0.0],
    [ 0.0, -1.0,  1.0],
    [-1.0,  0.0,  1.0],
    [ 1.0,  0.0,  1.0],
    [ 0.0,  1.0,  1.0],
];

/// The 20-node serendipity hexahedron on `[-1, 1]^3`.
///
/// With `a` the natural coordinates of a node, corner nodes use
/// `1/8 prod_i (1 + a_i xi_i) (sum_i a_i xi_i - 2)` and edge nodes
/// `1/4 prod_i (1 - (1 - a_i^2) xi_i^2) prod_i (1 + a_i xi_i)`.
#[derive(Debug, Clone)]
pub struct Hex20Basis {
    quadrature: Quadrature,
}

impl Default for Hex20Basis {
    fn default() -> Self {
        Self::new()
    }
}

impl Hex20Basis {
    pub fn new() -> Self {
        Self {
            quadrature: hexahedron_gauss(3).into(),
        }
    }
}

fn is_corner(a: &[f64; 3]) -> bool {
    a.iter().all(|&ai| ai != 0.0)
}

/// Value and gradient of the shape function of the node at `a`.
fn shape_and_gradient(a: &[f64; 3], xi: &Vector3<f64>) -> (f64, Vector3<f64>) {
    // Linear factors (1 + a_i xi_i) shared by both node kinds
    let lin = Vector3::from_fn(|i, _| 1.0 + a[i] * xi[i]);
    let lin_product = lin.product();
    let lin_grad = Vector3::from_fn(|i, _| {
        let others: f64 = (0..3).filter(|&j| j != i).map(|j| lin[j]).product();
        a[i] * others
    });

    if is_corner(a) {
        let f = a[0] * xi[0] + a[1] * xi[1] + a[2] * xi[2] - 2.0;
        let s = 1.0 / 8.0;
        let value = s * lin_product * f;
        let grad = Vector3::from_fn(|i, _| s * (a[i] * lin_product + f * lin_grad[i]));
        (value, grad)
    } else {
        let bubble = Vector3::from_fn(|i, _| 1.0 - (1.0 - a[i] * a[i]) * xi[i] * xi[i]);
        let h = bubble.product();
        let h_grad = Vector3::from_fn(|i, _| {
            let others: f64 = (0..3).filter(|&j| j != i).map(|j| bubble[j]).product();
            -2.0 * (1.0 - a[i] * a[i]) * xi[i] * others
        });
        let s = 1.0 / 4.0;
        let value = s * h * lin_product;
        let grad = Vector3::from_fn(|i, _| s * (h_grad[i] * lin_product + h * lin_grad[i]));
        (value, grad)
    }
}

impl Basis for Hex20Basis {
    fn cell_type(&self) -> CellType {
        CellType::Hex
    }

    fn order(&self) -> usize {
        2
    }

    fn n_nodes(&self) -> usize {
        20
    }

    fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    fn eval_shape(&self, xi: &Vector3<f64>) -> DVector<f64> {
        DVector::from_iterator(20, HEX20_NODES.iter().map(|a| shape_and_gradient(a, xi).0))
    }

    fn eval_shape_grad(&self, xi: &Vector3<f64>) -> MatrixXx3<f64> {
        let mut grad = MatrixXx3::zeros(20);
        for (node, a) in HEX20_NODES.iter().enumerate() {
            let (_, g) = shape_and_gradient(a, xi);
            grad.row_mut(node).copy_from(&g.transpose());
        }
        grad
    }

    fn reference_nodes(&self) -> Vec<Vector3<f64>> {
        HEX20_NODES.iter().map(|&a| Vector3::from(a)).collect()
    }
}
