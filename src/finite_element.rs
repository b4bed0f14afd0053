//! The element-level contract: basis transformation and numerical integration.
use crate::element::Basis;
use crate::error::{check_size, Error, ErrorKind, Result};
use crate::functions::Function;
use crate::mesh::Cell;
use crate::small_matrix::LeadingBlock;
use nalgebra::{DMatrix, DVector, Matrix3, Matrix3xX, MatrixXx3, Vector3};
use std::fmt::Debug;

/// Basis data at one quadrature point of one element.
///
/// Jacobians are 3x3 even for lower-dimensional elements; entries beyond the reference and
/// physical dimensions are zero.
#[derive(Debug, Clone, PartialEq)]
pub struct FeData {
    pub qwt: f64,
    pub qpt: Vector3<f64>,
    pub det_j: f64,
    /// `dX/dxi`, rows are physical and columns natural coordinates.
    pub dxdxi: Matrix3<f64>,
    /// `dxi/dX`, the inverse or pseudo-inverse of `dxdxi`.
    pub dxidx: Matrix3<f64>,
    pub n: DVector<f64>,
    pub dn_dxi: MatrixXx3<f64>,
    pub dn_dx: MatrixXx3<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatrixKind {
    Mass,
    Damping,
    Stiffness,
    Jacobian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VectorKind {
    Load,
    Residual,
}

/// Elements whose constitutive law relates strains to stresses.
pub trait StressEvaluation {
    /// Stress in Voigt notation: `[sxx, syy, sxy]` in 2D, `[sxx, syy, szz, sxy, syz, sxz]` in 3D.
    fn stress(&self, data: &FeData, u: &[f64]) -> DVector<f64>;

    fn von_mises_stress(&self, data: &FeData, u: &[f64]) -> f64;
}

/// Elements with a mass per unit of their measure (per area for plane elements).
pub trait MassDensity {
    fn mass_density(&self) -> f64;
}

/// A cell paired with a basis and the physics evaluated on it.
///
/// The `evaluate_*` hooks return the integrand at one quadrature point. Each defaults to zero,
/// so an element only implements the matrices and vectors it contributes to.
pub trait FiniteElement: Debug + Send + Sync {
    fn cell(&self) -> &Cell;

    fn basis(&self) -> &dyn Basis;

    /// Number of variables per node.
    fn n_vars(&self) -> usize;

    /// Dimension of the space the element lives in, not necessarily the cell's dimension.
    fn physical_dim(&self) -> usize;

    fn n_dof(&self) -> usize {
        self.basis().n_nodes() * self.n_vars()
    }

    fn evaluate_mass_matrix(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(self.n_dof(), self.n_dof()))
    }

    fn evaluate_damping_matrix(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(self.n_dof(), self.n_dof()))
    }

    fn evaluate_stiffness_matrix(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(self.n_dof(), self.n_dof()))
    }

    fn evaluate_jacobian_matrix(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(DMatrix::zeros(self.n_dof(), self.n_dof()))
    }

    fn evaluate_load_vector(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(DVector::zeros(self.n_dof()))
    }

    fn evaluate_residual_vector(&self, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(DVector::zeros(self.n_dof()))
    }

    fn as_stress_evaluation(&self) -> Option<&dyn StressEvaluation> {
        None
    }

    fn as_mass_density(&self) -> Option<&dyn MassDensity> {
        None
    }

    /// Evaluates the basis at quadrature point `qpt_index` mapped onto the element's nodes.
    ///
    /// `xpts` holds 3 coordinates per node. Fails with a negative-Jacobian error if the mapping
    /// is degenerate or inverted.
    fn transform_basis(&self, qpt_index: usize, xpts: &[f64]) -> Result<FeData> {
        let basis = self.basis();
        let n_nodes = basis.n_nodes();
        check_size(3 * n_nodes, xpts.len())?;

        if basis.dim() == 0 {
            return Ok(FeData {
                qwt: 1.0,
                qpt: Vector3::zeros(),
                det_j: 1.0,
                dxdxi: Matrix3::zeros(),
                dxidx: Matrix3::zeros(),
                n: DVector::from_element(n_nodes, 1.0),
                dn_dxi: MatrixXx3::zeros(n_nodes),
                dn_dx: MatrixXx3::zeros(n_nodes),
            });
        }

        let qwt = basis.qwt(qpt_index);
        let qpt = basis.qpt(qpt_index);
        let n = basis.eval_shape(&qpt);
        let dn_dxi = basis.eval_shape_grad(&qpt);

        let x = Matrix3xX::from_column_slice(xpts);
        let dxdxi: Matrix3<f64> = &x * &dn_dxi;

        let negative_jacobian = || Error::new(ErrorKind::NegativeJacobian { cell: self.cell().idx() });
        let (dxidx, det_j) = if basis.dim() == self.physical_dim() {
            let det = dxdxi.leading_determinant(basis.dim());
            let inv = dxdxi.leading_inverse(basis.dim()).ok_or_else(negative_jacobian)?;
            (inv, det)
        } else {
            dxdxi.leading_pseudo_inverse(basis.dim()).ok_or_else(negative_jacobian)?
        };
        if det_j <= 0.0 {
            return Err(negative_jacobian());
        }

        let dn_dx = &dn_dxi * dxidx;
        Ok(FeData {
            qwt,
            qpt,
            det_j,
            dxdxi,
            dxidx,
            n,
            dn_dxi,
            dn_dx,
        })
    }

    /// Integrates the matrix of the given kind over the element.
    fn integrate_fe_matrix(&self, kind: MatrixKind, xpts: &[f64], u: &[f64]) -> Result<DMatrix<f64>> {
        let mut matrix = DMatrix::zeros(self.n_dof(), self.n_dof());
        for q in 0..self.basis().n_qpts() {
            let data = self.transform_basis(q, xpts)?;
            let integrand = match kind {
                MatrixKind::Mass => self.evaluate_mass_matrix(&data, xpts, u)?,
                MatrixKind::Damping => self.evaluate_damping_matrix(&data, xpts, u)?,
                MatrixKind::Stiffness => self.evaluate_stiffness_matrix(&data, xpts, u)?,
                MatrixKind::Jacobian => self.evaluate_jacobian_matrix(&data, xpts, u)?,
            };
            matrix += integrand * (data.qwt * data.det_j);
        }
        Ok(matrix)
    }

    /// Integrates the vector of the given kind over the element.
    fn integrate_fe_vector(&self, kind: VectorKind, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        let mut vector = DVector::zeros(self.n_dof());
        for q in 0..self.basis().n_qpts() {
            let data = self.transform_basis(q, xpts)?;
            let integrand = match kind {
                VectorKind::Load => self.evaluate_load_vector(&data, xpts, u)?,
                VectorKind::Residual => self.evaluate_residual_vector(&data, xpts, u)?,
            };
            vector += integrand * (data.qwt * data.det_j);
        }
        Ok(vector)
    }
}

/// Integrates `func` over `element`.
pub fn integrate_function(
    element: &dyn FiniteElement,
    func: &dyn Function,
    xpts: &[f64],
    u: &[f64],
) -> Result<DVector<f64>> {
    let size = func.size(element.n_vars());
    let mut total = DVector::zeros(size);
    for q in 0..element.basis().n_qpts() {
        let data = element.transform_basis(q, xpts)?;
        let value = func.evaluate(element, &data, xpts, u)?;
        check_size(size, value.len())?;
        total += value * (data.qwt * data.det_j);
    }
    Ok(total)
}

/// Local contributions to the L2 projection of `func` onto the nodal basis of `element`.
///
/// Returns the consistent mass matrix `int N_i N_j` and the right-hand sides
/// `int N_i f_k`, one column per component `k` of `func`.
pub fn project_function(
    element: &dyn FiniteElement,
    func: &dyn Function,
    xpts: &[f64],
    u: &[f64],
) -> Result<(DMatrix<f64>, DMatrix<f64>)> {
    let n_nodes = element.basis().n_nodes();
    let size = func.size(element.n_vars());
    let mut mass = DMatrix::zeros(n_nodes, n_nodes);
    let mut rhs = DMatrix::zeros(n_nodes, size);
    for q in 0..element.basis().n_qpts() {
        let data = element.transform_basis(q, xpts)?;
        let value = func.evaluate(element, &data, xpts, u)?;
        check_size(size, value.len())?;
        let scale = data.qwt * data.det_j;
        mass += &data.n * data.n.transpose() * scale;
        rhs += &data.n * value.transpose() * scale;
    }
    Ok((mass, rhs))
}

/// Fields shared by every element: the cell, its basis and the variable layout.
#[derive(Debug)]
pub struct ElementCore {
    cell: Cell,
    basis: Box<dyn Basis>,
    n_vars: usize,
    physical_dim: usize,
}

impl ElementCore {
    pub fn new(cell: Cell, n_vars: usize, physical_dim: usize) -> Result<Self> {
        let basis = crate::element::create_cell_basis(&cell)?;
        Ok(Self {
            cell,
            basis,
            n_vars,
            physical_dim,
        })
    }

    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    pub fn basis(&self) -> &dyn Basis {
        self.basis.as_ref()
    }

    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    pub fn physical_dim(&self) -> usize {
        self.physical_dim
    }

    pub fn n_nodes(&self) -> usize {
        self.basis.n_nodes()
    }

    pub fn n_dof(&self) -> usize {
        self.basis.n_nodes() * self.n_vars
    }
}

/// Implements the structural methods of [`FiniteElement`] by delegating to a `core` field.
macro_rules! delegate_element_core {
    () => {
        fn cell(&self) -> &$crate::mesh::Cell {
            self.core.cell()
        }

        fn basis(&self) -> &dyn $crate::element::Basis {
            self.core.basis()
        }

        fn n_vars(&self) -> usize {
            self.core.n_vars()
        }

        fn physical_dim(&self) -> usize {
            self.core.physical_dim()
        }
    };
}

pub(crate) use delegate_element_core;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::CellType;
    use matrixcompare::{assert_matrix_eq, assert_scalar_eq};

    /// Contributes the scalar mass matrix `N N^T`, whose entries sum to the cell measure.
    #[derive(Debug)]
    struct UnitDensity {
        core: ElementCore,
    }

    impl UnitDensity {
        fn new(cell_type: CellType, order: usize, physical_dim: usize) -> Self {
            let cell = Cell::new(7, cell_type, order, 1).unwrap();
            Self {
                core: ElementCore::new(cell, 1, physical_dim).unwrap(),
            }
        }

        /// Reference nodes mapped by `x -> a x`.
        fn mapped_nodes(&self, a: &Matrix3<f64>) -> Vec<f64> {
            self.basis()
                .reference_nodes()
                .iter()
                .flat_map(|xi| (a * xi).iter().copied().collect::<Vec<_>>())
                .collect()
        }

        fn measure(&self, xpts: &[f64]) -> Result<f64> {
            let mass = self.integrate_fe_matrix(MatrixKind::Mass, xpts, &[])?;
            Ok(mass.sum())
        }
    }

    impl FiniteElement for UnitDensity {
        delegate_element_core!();

        fn evaluate_mass_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
            Ok(&data.n * data.n.transpose())
        }
    }

    fn reference_measure(cell_type: CellType) -> f64 {
        match cell_type {
            CellType::Line => 2.0,
            CellType::Triangle => 0.5,
            CellType::Quad => 4.0,
            CellType::Tet => 1.0 / 6.0,
            CellType::Hex => 8.0,
            CellType::Prism => 1.0,
            CellType::Point => 1.0,
        }
    }

    #[test]
    fn reference_cells_map_onto_themselves() {
        let keys = [
            (CellType::Line, 1, 1),
            (CellType::Triangle, 2, 2),
            (CellType::Quad, 1, 2),
            (CellType::Tet, 3, 3),
            (CellType::Hex, 1, 3),
            (CellType::Prism, 1, 3),
        ];
        for (cell_type, order, dim) in keys {
            let element = UnitDensity::new(cell_type, order, dim);
            let xpts = element.mapped_nodes(&Matrix3::identity());
            let mut identity = Matrix3::zeros();
            for d in 0..dim {
                identity[(d, d)] = 1.0;
            }
            for q in 0..element.basis().n_qpts() {
                let data = element.transform_basis(q, &xpts).unwrap();
                assert_scalar_eq!(data.det_j, 1.0, comp = abs, tol = 1e-12);
                assert_matrix_eq!(data.dxdxi, identity, comp = abs, tol = 1e-12);
                assert_matrix_eq!(data.dxidx, identity, comp = abs, tol = 1e-12);
                assert_matrix_eq!(data.dn_dx, data.dn_dxi, comp = abs, tol = 1e-12);
            }
            let measure = element.measure(&xpts).unwrap();
            assert_scalar_eq!(measure, reference_measure(cell_type), comp = abs, tol = 1e-12);
        }
    }

    #[test]
    fn integrating_one_gives_the_exact_volume() {
        // Sheared and stretched, with determinant 3
        let a = Matrix3::new(2.0, 0.5, 0.0, 0.0, 3.0, 0.25, 0.0, 0.0, 0.5);
        let keys = [
            (CellType::Tet, 1),
            (CellType::Tet, 2),
            (CellType::Tet, 3),
            (CellType::Hex, 1),
            (CellType::Hex, 2),
            (CellType::Prism, 1),
        ];
        for (cell_type, order) in keys {
            let element = UnitDensity::new(cell_type, order, 3);
            let measure = element.measure(&element.mapped_nodes(&a)).unwrap();
            let expected = 3.0 * reference_measure(cell_type);
            assert_scalar_eq!(measure, expected, comp = abs, tol = 1e-11 * expected);
        }

        let tet = UnitDensity::new(CellType::Tet, 2, 3);
        let doubled = tet.mapped_nodes(&(Matrix3::identity() * 2.0));
        assert_scalar_eq!(tet.measure(&doubled).unwrap(), 8.0 / 6.0, comp = abs, tol = 1e-12);
    }

    #[test]
    fn embedded_cells_use_the_generalized_measure() {
        // Segment along (3, 4, 0) with reference length 2
        let line = UnitDensity::new(CellType::Line, 2, 3);
        let a = Matrix3::new(3.0, 0.0, 0.0, 4.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let xpts = line.mapped_nodes(&a);
        let data = line.transform_basis(0, &xpts).unwrap();
        assert_scalar_eq!(data.det_j, 5.0, comp = abs, tol = 1e-12);
        assert_scalar_eq!(line.measure(&xpts).unwrap(), 10.0, comp = abs, tol = 1e-12);

        // Triangle in the plane z = x + y
        let tri = UnitDensity::new(CellType::Triangle, 1, 3);
        let a = Matrix3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 1.0, 0.0);
        let xpts = tri.mapped_nodes(&a);
        for q in 0..tri.basis().n_qpts() {
            let data = tri.transform_basis(q, &xpts).unwrap();
            assert_scalar_eq!(data.det_j, 3.0_f64.sqrt(), comp = abs, tol = 1e-12);
            let left_inverse = data.dxidx * data.dxdxi;
            assert_matrix_eq!(
                left_inverse.fixed_view::<2, 2>(0, 0),
                nalgebra::Matrix2::identity(),
                comp = abs,
                tol = 1e-12
            );
        }
        assert_scalar_eq!(tri.measure(&xpts).unwrap(), 0.5 * 3.0_f64.sqrt(), comp = abs, tol = 1e-12);
    }

    #[test]
    fn inverted_and_degenerate_cells_are_rejected() {
        let is_negative_jacobian = |result: Result<f64>| {
            matches!(
                result.map_err(|err| err.kind().clone()),
                Err(ErrorKind::NegativeJacobian { cell: 7 })
            )
        };
        let mirror = Matrix3::new(-1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        let keys = [(CellType::Triangle, 1, 2), (CellType::Quad, 2, 2), (CellType::Hex, 1, 3)];
        for (cell_type, order, dim) in keys {
            let element = UnitDensity::new(cell_type, order, dim);
            assert!(is_negative_jacobian(element.measure(&element.mapped_nodes(&mirror))));
        }

        // Clockwise node order
        let tri = UnitDensity::new(CellType::Triangle, 1, 2);
        let clockwise = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];
        assert!(is_negative_jacobian(tri.measure(&clockwise)));

        let collinear = [0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 2.0, 2.0, 0.0];
        assert!(is_negative_jacobian(tri.measure(&collinear)));
        let embedded = UnitDensity::new(CellType::Triangle, 1, 3);
        assert!(is_negative_jacobian(embedded.measure(&collinear)));

        // Hexahedron with its bottom and top faces swapped
        let hex = UnitDensity::new(CellType::Hex, 1, 3);
        let nodes = hex.mapped_nodes(&Matrix3::identity());
        let swapped: Vec<f64> = nodes[12..].iter().chain(&nodes[..12]).copied().collect();
        assert!(is_negative_jacobian(hex.measure(&swapped)));
    }
}
