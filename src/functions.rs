//! Quantities derived from a solved field, evaluated per element at quadrature points.
//!
//! A function asks the element for the capability it needs. Elements that lack it, or live
//! in the wrong dimension, contribute zeros.
use crate::error::{check_size, Result};
use crate::finite_element::{FeData, FiniteElement};
use nalgebra::DVector;
use std::fmt::Debug;

/// A vector-valued quantity evaluated at one quadrature point of an element.
pub trait Function: Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Number of components for an element with `n_vars` variables per node.
    fn size(&self, n_vars: usize) -> usize;

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>>;
}

/// Physical gradient of every variable: component `3 * var + d` holds `d var / d x_d`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldGradient;

impl Function for FieldGradient {
    fn name(&self) -> &str {
        "FieldGradient"
    }

    fn size(&self, n_vars: usize) -> usize {
        3 * n_vars
    }

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, _xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        let n_vars = element.n_vars();
        let n_nodes = data.dn_dx.nrows();
        check_size(n_nodes * n_vars, u.len())?;
        let mut grad = DVector::zeros(3 * n_vars);
        for var in 0..n_vars {
            for d in 0..3 {
                grad[3 * var + d] = (0..n_nodes).map(|k| data.dn_dx[(k, d)] * u[k * n_vars + var]).sum();
            }
        }
        Ok(grad)
    }
}

fn stress_of(element: &dyn FiniteElement, dim: usize, data: &FeData, u: &[f64]) -> Option<DVector<f64>> {
    if element.physical_dim() != dim {
        return None;
    }
    element.as_stress_evaluation().map(|s| s.stress(data, u))
}

fn von_mises_of(element: &dyn FiniteElement, dim: usize, data: &FeData, u: &[f64]) -> Option<f64> {
    if element.physical_dim() != dim {
        return None;
    }
    element.as_stress_evaluation().map(|s| s.von_mises_stress(data, u))
}

fn mass_density_of(element: &dyn FiniteElement, dim: usize) -> Option<f64> {
    if element.physical_dim() != dim {
        return None;
    }
    element.as_mass_density().map(|m| m.mass_density())
}

/// Plane stress components `[sxx, syy, sxy]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stress2D;

impl Function for Stress2D {
    fn name(&self) -> &str {
        "Stress2D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        3
    }

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, _xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        Ok(stress_of(element, 2, data, u).unwrap_or_else(|| DVector::zeros(3)))
    }
}

/// Stress components `[sxx, syy, szz, sxy, syz, sxz]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stress3D;

impl Function for Stress3D {
    fn name(&self) -> &str {
        "Stress3D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        6
    }

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, _xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        Ok(stress_of(element, 3, data, u).unwrap_or_else(|| DVector::zeros(6)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VonMises2D;

impl Function for VonMises2D {
    fn name(&self) -> &str {
        "VonMises2D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        1
    }

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, _xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        let value = von_mises_of(element, 2, data, u).unwrap_or(0.0);
        Ok(DVector::from_element(1, value))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct VonMises3D;

impl Function for VonMises3D {
    fn name(&self) -> &str {
        "VonMises3D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        1
    }

    fn evaluate(&self, element: &dyn FiniteElement, data: &FeData, _xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        let value = von_mises_of(element, 3, data, u).unwrap_or(0.0);
        Ok(DVector::from_element(1, value))
    }
}

/// Mass per unit area of plane elements; integrates to the total mass.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralMass2D;

impl Function for StructuralMass2D {
    fn name(&self) -> &str {
        "StructuralMass2D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        1
    }

    fn evaluate(&self, element: &dyn FiniteElement, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(DVector::from_element(1, mass_density_of(element, 2).unwrap_or(0.0)))
    }
}

/// Mass per unit volume of solid elements.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralMass3D;

impl Function for StructuralMass3D {
    fn name(&self) -> &str {
        "StructuralMass3D"
    }

    fn size(&self, _n_vars: usize) -> usize {
        1
    }

    fn evaluate(&self, element: &dyn FiniteElement, _data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(DVector::from_element(1, mass_density_of(element, 3).unwrap_or(0.0)))
    }
}
