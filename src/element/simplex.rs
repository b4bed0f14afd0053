//! Lagrange bases of order 1-3 on the unit triangle and the unit tetrahedron.
//!
//! Shape functions are written in barycentric coordinates `L_0 = 1 - sum(xi)`, `L_k = xi_{k-1}`.
//! A node with multi-index `a` (summing to the order `p`) has the shape function
//! `prod_k phi_{a_k}(L_k)` with `phi_a(L) = prod_{m < a} (p L - m) / (m + 1)`.
use crate::element::{Basis, Quadrature};
use crate::mesh::CellType;
use crate::quadrature::simplex::{tetrahedron_4, tetrahedron_collapsed, triangle};
use nalgebra::{DVector, MatrixXx3, Vector3};

#[rustfmt::skip]
fn multi_indices(cell_type: CellType, order: usize) -> Vec<[usize; 4]> {
    match (cell_type, order) {
        (CellType::Triangle, 1) => vec![[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0]],
        (CellType::Triangle, 2) => vec![
            [2, 0, 0, 0], [0, 2, 0, 0], [0, 0, 2, 0],
            [1, 1, 0, 0], [0, 1, 1, 0], [1, 0, 1, 0],
        ],
        (CellType::Triangle, 3) => vec![
            [3, 0, 0, 0], [0, 3, 0, 0], [0, 0, 3, 0],
            [2, 1, 0, 0], [1, 2, 0, 0], [0, 2, 1, 0], [0, 1, 2, 0], [1, 0, 2, 0], [2, 0, 1, 0],
            [1, 1, 1, 0],
        ],
        (CellType::Tet, 1) => vec![[1, 0, 0, 0], [0, 1, 0, 0], [0, 0, 1, 0], [0, 0, 0, 1]],
        (CellType::Tet, 2) => vec![
            [2, 0, 0, 0], [0, 2, 0, 0], [0, 0, 2, 0], [0, 0, 0, 2],
            [1, 1, 0, 0], [0, 1, 1, 0], [1, 0, 1, 0], [1, 0, 0, 1], [0, 0, 1, 1], [0, 1, 0, 1],
        ],
        (CellType::Tet, 3) => vec![
            [3, 0, 0, 0], [0, 3, 0, 0], [0, 0, 3, 0], [0, 0, 0, 3],
            [2, 1, 0, 0], [1, 2, 0, 0], [0, 2, 1, 0], [0, 1, 2, 0],
            [1, 0, 2, 0], [2, 0, 1, 0], [1, 0, 0, 2], [2, 0, 0, 1],
            [0, 0, 1, 2], [0, 0, 2, 1], [0, 1, 0, 2], [0, 2, 0, 1],
            [1, 1, 1, 0], [1, 1, 0, 1], [1, 0, 1, 1], [0, 1, 1, 1],
        ],
        _ => unreachable!("no simplex basis for {cell_type:?} of order {order}"),
    }
}

/// `phi_a(L)` for a basis of order `p`.
fn phi(p: usize, a: usize, l: f64) -> f64 {
    (0..a).map(|m| (p as f64 * l - m as f64) / (m + 1) as f64).product()
}

/// Derivative of `phi_a` with respect to `L`.
fn phi_derivative(p: usize, a: usize, l: f64) -> f64 {
    let p = p as f64;
    (0..a)
        .map(|m| {
            let rest: f64 = (0..a)
                .filter(|&n| n != m)
                .map(|n| (p * l - n as f64) / (n + 1) as f64)
                .product();
            p / (m + 1) as f64 * rest
        })
        .sum()
}

/// Lagrange basis on a simplex, with nodes in Gmsh order.
#[derive(Debug, Clone)]
pub struct SimplexLagrangeBasis {
    cell_type: CellType,
    order: usize,
    nodes: Vec<[usize; 4]>,
    quadrature: Quadrature,
}

impl SimplexLagrangeBasis {
    /// # Panics
    ///
    /// Panics unless `cell_type` is a triangle or tet and `order` is in `1..=3`.
    pub fn new(cell_type: CellType, order: usize) -> Self {
        let quadrature: Quadrature = match (cell_type, order) {
            (CellType::Triangle, 1) => triangle(3).into(),
            (CellType::Triangle, 2) => triangle(4).into(),
            (CellType::Triangle, _) => triangle(6).into(),
            (_, 1) => tetrahedron_4().into(),
            (_, _) => tetrahedron_collapsed(order + 2).into(),
        };
        Self {
            cell_type,
            order,
            nodes: multi_indices(cell_type, order),
            quadrature,
        }
    }

    fn barycentric(&self, xi: &Vector3<f64>) -> [f64; 4] {
        let dim = self.cell_type.dim();
        let mut l = [0.0; 4];
        for k in 0..dim {
            l[k + 1] = xi[k];
        }
        l[0] = 1.0 - xi.iter().take(dim).sum::<f64>();
        l
    }
}

impl Basis for SimplexLagrangeBasis {
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
        let l = self.barycentric(xi);
        let p = self.order;
        DVector::from_iterator(
            self.nodes.len(),
            self.nodes
                .iter()
                .map(|a| (0..4).map(|k| phi(p, a[k], l[k])).product::<f64>()),
        )
    }

    fn eval_shape_grad(&self, xi: &Vector3<f64>) -> MatrixXx3<f64> {
        let l = self.barycentric(xi);
        let p = self.order;
        let dim = self.cell_type.dim();
        let mut grad = MatrixXx3::zeros(self.nodes.len());
        for (node, a) in self.nodes.iter().enumerate() {
            let values: [f64; 4] = std::array::from_fn(|k| phi(p, a[k], l[k]));
            let derivatives: [f64; 4] = std::array::from_fn(|k| phi_derivative(p, a[k], l[k]));
            let dn_dl = |k: usize| -> f64 {
                (0..4)
                    .map(|j| if j == k { derivatives[j] } else { values[j] })
                    .product()
            };
            // dL_0/dxi_j = -1 and dL_{j+1}/dxi_j = 1
            let dn_dl0 = dn_dl(0);
            for j in 0..dim {
                grad[(node, j)] = dn_dl(j + 1) - dn_dl0;
            }
        }
        grad
    }

    fn reference_nodes(&self) -> Vec<Vector3<f64>> {
        let p = self.order as f64;
        self.nodes
            .iter()
            .map(|a| Vector3::new(a[1] as f64 / p, a[2] as f64 / p, a[3] as f64 / p))
            .collect()
    }
}
