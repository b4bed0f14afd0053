//! Linear thermo-elastic constitutive models.
use nalgebra::{DMatrix, DVector, MatrixXx3};
use serde::{Deserialize, Serialize};

/// Isotropic thermal and mechanical material constants.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermoMechanicalProperties {
    pub young_modulus: f64,
    pub poisson_ratio: f64,
    pub conductivity: f64,
    pub density: f64,
    pub specific_heat: f64,
    pub thermal_expansion: f64,
}

/// Strain-displacement and stress-strain relations of a linear thermo-elastic material.
///
/// Strains and stresses use Voigt notation with engineering shear strains.
pub trait ThermoElastic {
    fn prop(&self) -> &ThermoMechanicalProperties;

    /// Number of displacement components per node.
    fn n_dim(&self) -> usize;

    /// The elasticity matrix `D`.
    fn stress_strain_matrix(&self) -> DMatrix<f64>;

    /// The matrix `B` with `strain = B u` for nodal displacements `u`.
    fn strain_displacement_matrix(&self, dn_dx: &MatrixXx3<f64>) -> DMatrix<f64>;

    /// Free thermal strain for nodal temperature changes `dt`.
    fn thermal_strain(&self, n: &DVector<f64>, dt: &[f64]) -> DVector<f64>;

    /// Von Mises equivalent of a stress vector.
    fn von_mises(&self, stress: &DVector<f64>) -> f64;

    fn strain(&self, dn_dx: &MatrixXx3<f64>, u: &[f64]) -> DVector<f64> {
        self.strain_displacement_matrix(dn_dx) * DVector::from_column_slice(u)
    }

    fn stress(&self, dn_dx: &MatrixXx3<f64>, u: &[f64]) -> DVector<f64> {
        self.stress_strain_matrix() * self.strain(dn_dx, u)
    }

    /// Integrand of the equivalent nodal load of a thermal strain, `B^T D eps_th`.
    fn thermal_load(&self, n: &DVector<f64>, dn_dx: &MatrixXx3<f64>, dt: &[f64]) -> DVector<f64> {
        let b = self.strain_displacement_matrix(dn_dx);
        b.transpose() * self.stress_strain_matrix() * self.thermal_strain(n, dt)
    }
}

fn interpolate(n: &DVector<f64>, values: &[f64]) -> f64 {
    n.iter().zip(values).map(|(ni, vi)| ni * vi).sum()
}

fn von_mises_3d(sxx: f64, syy: f64, szz: f64, sxy: f64, syz: f64, sxz: f64) -> f64 {
    let normal = (sxx - syy).powi(2) + (syy - szz).powi(2) + (szz - sxx).powi(2);
    let shear = 6.0 * (sxy * sxy + syz * syz + sxz * sxz);
    (0.5 * (normal + shear)).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaneKind {
    PlaneStress,
    PlaneStrain,
}

/// Two-dimensional idealization of a plate of thickness `thick`.
///
/// The elasticity matrix is per unit thickness, elements scale their integrands by `thick`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneConstitutive {
    pub prop: ThermoMechanicalProperties,
    pub thick: f64,
    pub kind: PlaneKind,
}

impl PlaneConstitutive {
    pub fn new(prop: ThermoMechanicalProperties, thick: f64, kind: PlaneKind) -> Self {
        Self { prop, thick, kind }
    }

    pub fn plane_stress(prop: ThermoMechanicalProperties, thick: f64) -> Self {
        Self::new(prop, thick, PlaneKind::PlaneStress)
    }
}

impl ThermoElastic for PlaneConstitutive {
    fn prop(&self) -> &ThermoMechanicalProperties {
        &self.prop
    }

    fn n_dim(&self) -> usize {
        2
    }

    fn stress_strain_matrix(&self) -> DMatrix<f64> {
        let (e, nu) = (self.prop.young_modulus, self.prop.poisson_ratio);
        let mut d = DMatrix::zeros(3, 3);
        match self.kind {
            PlaneKind::PlaneStress => {
                let c = e / (1.0 - nu * nu);
                d[(0, 0)] = c;
                d[(0, 1)] = c * nu;
                d[(1, 0)] = c * nu;
                d[(1, 1)] = c;
                d[(2, 2)] = c * (1.0 - nu) * 0.5;
            }
            PlaneKind::PlaneStrain => {
                let c = e / ((1.0 - 2.0 * nu) * (1.0 + nu));
                d[(0, 0)] = c * (1.0 - nu);
                d[(0, 1)] = c * nu;
                d[(1, 0)] = c * nu;
                d[(1, 1)] = c * (1.0 - nu);
                d[(2, 2)] = c * (1.0 - 2.0 * nu) * 0.5;
            }
        }
        d
    }

    fn strain_displacement_matrix(&self, dn_dx: &MatrixXx3<f64>) -> DMatrix<f64> {
        let n_nodes = dn_dx.nrows();
        let mut b = DMatrix::zeros(3, 2 * n_nodes);
        for i in 0..n_nodes {
            let (dx, dy) = (dn_dx[(i, 0)], dn_dx[(i, 1)]);
            b[(0, 2 * i)] = dx;
            b[(1, 2 * i + 1)] = dy;
            b[(2, 2 * i)] = dy;
            b[(2, 2 * i + 1)] = dx;
        }
        b
    }

    fn thermal_strain(&self, n: &DVector<f64>, dt: &[f64]) -> DVector<f64> {
        let coeff = match self.kind {
            PlaneKind::PlaneStress => 1.0,
            PlaneKind::PlaneStrain => 1.0 + self.prop.poisson_ratio,
        };
        let eps = coeff * self.prop.thermal_expansion * interpolate(n, dt);
        DVector::from_column_slice(&[eps, eps, 0.0])
    }

    fn von_mises(&self, stress: &DVector<f64>) -> f64 {
        let (sxx, syy, sxy) = (stress[0], stress[1], stress[2]);
        let szz = match self.kind {
            PlaneKind::PlaneStress => 0.0,
            PlaneKind::PlaneStrain => self.prop.poisson_ratio * (sxx + syy),
        };
        von_mises_3d(sxx, syy, szz, sxy, 0.0, 0.0)
    }
}

/// Fully three-dimensional isotropic solid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolidConstitutive {
    pub prop: ThermoMechanicalProperties,
}

impl SolidConstitutive {
    pub fn new(prop: ThermoMechanicalProperties) -> Self {
        Self { prop }
    }
}

impl ThermoElastic for SolidConstitutive {
    fn prop(&self) -> &ThermoMechanicalProperties {
        &self.prop
    }

    fn n_dim(&self) -> usize {
        3
    }

    fn stress_strain_matrix(&self) -> DMatrix<f64> {
        let (e, nu) = (self.prop.young_modulus, self.prop.poisson_ratio);
        let c1 = e / ((1.0 + nu) * (1.0 - 2.0 * nu));
        let c2 = (1.0 - 2.0 * nu) / 2.0;
        let mut d = DMatrix::zeros(6, 6);
        for i in 0..3 {
            for j in 0..3 {
                d[(i, j)] = if i == j { (1.0 - nu) * c1 } else { nu * c1 };
            }
            d[(i + 3, i + 3)] = c1 * c2;
        }
        d
    }

    fn strain_displacement_matrix(&self, dn_dx: &MatrixXx3<f64>) -> DMatrix<f64> {
        let n_nodes = dn_dx.nrows();
        let mut b = DMatrix::zeros(6, 3 * n_nodes);
        for i in 0..n_nodes {
            let (dx, dy, dz) = (dn_dx[(i, 0)], dn_dx[(i, 1)], dn_dx[(i, 2)]);
            let c = 3 * i;
            b[(0, c)] = dx;
            b[(1, c + 1)] = dy;
            b[(2, c + 2)] = dz;
            b[(3, c)] = dy;
            b[(3, c + 1)] = dx;
            b[(4, c + 1)] = dz;
            b[(4, c + 2)] = dy;
            b[(5, c)] = dz;
            b[(5, c + 2)] = dx;
        }
        b
    }

    fn thermal_strain(&self, n: &DVector<f64>, dt: &[f64]) -> DVector<f64> {
        let eps = self.prop.thermal_expansion * interpolate(n, dt);
        DVector::from_column_slice(&[eps, eps, eps, 0.0, 0.0, 0.0])
    }

    fn von_mises(&self, s: &DVector<f64>) -> f64 {
        von_mises_3d(s[0], s[1], s[2], s[3], s[4], s[5])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matrixcompare::assert_scalar_eq;

    fn steel() -> ThermoMechanicalProperties {
        ThermoMechanicalProperties {
            young_modulus: 200e9,
            poisson_ratio: 0.3,
            density: 7800.0,
            thermal_expansion: 1.2e-5,
            ..Default::default()
        }
    }

    #[test]
    fn uniaxial_plane_stress_has_von_mises_equal_to_axial_stress() {
        let plane = PlaneConstitutive::plane_stress(steel(), 1e-3);
        let stress = DVector::from_column_slice(&[100.0, 0.0, 0.0]);
        assert_scalar_eq!(plane.von_mises(&stress), 100.0, comp = abs, tol = 1e-12);
    }

    #[test]
    fn pure_shear_von_mises() {
        let solid = SolidConstitutive::new(steel());
        let stress = DVector::from_column_slice(&[0.0, 0.0, 0.0, 10.0, 0.0, 0.0]);
        assert_scalar_eq!(solid.von_mises(&stress), 10.0 * 3f64.sqrt(), comp = abs, tol = 1e-12);
    }

    #[test]
    fn free_thermal_expansion_is_stress_free_in_3d() {
        // A uniform temperature rise imposed as displacement u = alpha dT x gives zero stress
        let solid = SolidConstitutive::new(steel());
        let dn_dx = MatrixXx3::from_row_slice(&[-1.0, -1.0, -1.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let s = solid.prop.thermal_expansion * 10.0;
        let u = [0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, s, 0.0, 0.0, 0.0, s];
        let n = DVector::from_element(4, 0.25);
        let strain = solid.strain(&dn_dx, &u);
        let thermal = solid.thermal_strain(&n, &[10.0; 4]);
        assert!((strain - thermal).norm() < 1e-15);
    }

    #[test]
    fn properties_deserialize_with_defaults() {
        let prop: ThermoMechanicalProperties =
            serde_json::from_str(r#"{ "young_modulus": 5e9, "poisson_ratio": 0.35 }"#).unwrap();
        assert_eq!(prop.young_modulus, 5e9);
        assert_eq!(prop.density, 0.0);
    }
}
