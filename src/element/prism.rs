use crate::element::{Basis, Quadrature};
use crate::mesh::CellType;
use crate::quadrature::simplex::prism;
use nalgebra::{DVector, MatrixXx3, Vector3};

/// The 6-node wedge: linear triangle times linear interval.
///
/// Nodes 0-2 lie on the bottom face `zeta = -1`, nodes 3-5 above them on `zeta = 1`.
#[derive(Debug, Clone)]
pub struct Prism6Basis {
    quadrature: Quadrature,
}

impl Default for Prism6Basis {
    fn default() -> Self {
        Self::new()
    }
}

impl Prism6Basis {
    pub fn new() -> Self {
        Self {
            quadrature: prism(3, 2).into(),
        }
    }
}

fn triangle_shape(xi: &Vector3<f64>) -> [f64; 3] {
    [1.0 - xi[0] - xi[1], xi[0], xi[1]]
}

const TRIANGLE_GRAD: [[f64; 2]; 3] = [[-1.0, -1.0], [1.0, 0.0], [0.0, 1.0]];

impl Basis for Prism6Basis {
    fn cell_type(&self) -> CellType {
        CellType::Prism
    }

    fn order(&self) -> usize {
        1
    }

    fn n_nodes(&self) -> usize {
        6
    }

    fn quadrature(&self) -> &Quadrature {
        &self.quadrature
    }

    fn eval_shape(&self, xi: &Vector3<f64>) -> DVector<f64> {
        let tri = triangle_shape(xi);
        let axial = [0.5 * (1.0 - xi[2]), 0.5 * (1.0 + xi[2])];
        DVector::from_fn(6, |i, _| tri[i % 3] * axial[i / 3])
    }

    fn eval_shape_grad(&self, xi: &Vector3<f64>) -> MatrixXx3<f64> {
        let tri = triangle_shape(xi);
        let axial = [0.5 * (1.0 - xi[2]), 0.5 * (1.0 + xi[2])];
        let axial_grad = [-0.5, 0.5];
        let mut grad = MatrixXx3::zeros(6);
        for i in 0..6 {
            let (t, z) = (i % 3, i / 3);
            grad[(i, 0)] = TRIANGLE_GRAD[t][0] * axial[z];
            grad[(i, 1)] = TRIANGLE_GRAD[t][1] * axial[z];
            grad[(i, 2)] = tri[t] * axial_grad[z];
        }
        grad
    }

    fn reference_nodes(&self) -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.0, 0.0, -1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, -1.0),
            Vector3::new(0.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(0.0, 1.0, 1.0),
        ]
    }
}
