//! Concrete physics: constitutive models, element formulations and their per-region creation.
use crate::error::Result;
use crate::finite_element::{FeData, FiniteElement};
use crate::mesh::{Cell, Field, Mesh};
use nalgebra::DVector;

pub mod constitutive;
pub mod solid;
pub mod thermal;

use constitutive::{PlaneConstitutive, SolidConstitutive};
use solid::{
    InertialLoad2D, InertialLoad3D, LinearElasticity2D, LinearElasticity3D, PressureLoad2D, PressureLoad3D,
    ThermalLoad2D, ThermalLoad3D,
};
use thermal::{HeatConduction2D, HeatConduction3D, HeatConvection2D, HeatConvection3D, HeatFlux2D, HeatFlux3D};

/// The element formulation to create on every cell of a region, with its parameters.
#[derive(Debug, Clone, Copy)]
pub enum Physics<'a> {
    HeatConduction2D(&'a PlaneConstitutive),
    HeatConduction3D(&'a SolidConstitutive),
    HeatFlux2D { flux: f64, thick: f64 },
    HeatFlux3D { flux: f64 },
    HeatConvection2D { htc: f64, t_bulk: f64, thick: f64 },
    HeatConvection3D { htc: f64, t_bulk: f64 },
    LinearElasticity2D(&'a PlaneConstitutive),
    LinearElasticity3D(&'a SolidConstitutive),
    InertialLoad2D { constitutive: &'a PlaneConstitutive, g: [f64; 2] },
    InertialLoad3D { constitutive: &'a SolidConstitutive, g: [f64; 3] },
    PressureLoad2D { pressure: &'a Field<'a>, thick: f64 },
    PressureLoad3D { pressure: &'a Field<'a> },
    ThermalLoad2D { constitutive: &'a PlaneConstitutive, temperature: &'a Field<'a>, t0: f64 },
    ThermalLoad3D { constitutive: &'a SolidConstitutive, temperature: &'a Field<'a>, t0: f64 },
}

impl<'a> Physics<'a> {
    /// Creates the element of this formulation on a single cell.
    pub fn create_element(&self, cell: Cell) -> Result<Box<dyn FiniteElement + 'a>> {
        let element: Box<dyn FiniteElement + 'a> = match *self {
            Self::HeatConduction2D(c) => Box::new(HeatConduction2D::new(cell, c)?),
            Self::HeatConduction3D(c) => Box::new(HeatConduction3D::new(cell, c)?),
            Self::HeatFlux2D { flux, thick } => Box::new(HeatFlux2D::new(cell, flux, thick)?),
            Self::HeatFlux3D { flux } => Box::new(HeatFlux3D::new(cell, flux)?),
            Self::HeatConvection2D { htc, t_bulk, thick } => Box::new(HeatConvection2D::new(cell, htc, t_bulk, thick)?),
            Self::HeatConvection3D { htc, t_bulk } => Box::new(HeatConvection3D::new(cell, htc, t_bulk)?),
            Self::LinearElasticity2D(c) => Box::new(LinearElasticity2D::new(cell, c)?),
            Self::LinearElasticity3D(c) => Box::new(LinearElasticity3D::new(cell, c)?),
            Self::InertialLoad2D { constitutive, g } => Box::new(InertialLoad2D::new(cell, constitutive, g)?),
            Self::InertialLoad3D { constitutive, g } => Box::new(InertialLoad3D::new(cell, constitutive, g)?),
            Self::PressureLoad2D { pressure, thick } => Box::new(PressureLoad2D::new(cell, pressure, thick)?),
            Self::PressureLoad3D { pressure } => Box::new(PressureLoad3D::new(cell, pressure)?),
            Self::ThermalLoad2D {
                constitutive,
                temperature,
                t0,
            } => Box::new(ThermalLoad2D::new(cell, constitutive, temperature, t0)?),
            Self::ThermalLoad3D {
                constitutive,
                temperature,
                t0,
            } => Box::new(ThermalLoad3D::new(cell, constitutive, temperature, t0)?),
        };
        Ok(element)
    }
}

/// Creates one element of the given formulation for every local cell of the named region.
pub fn create_domain_elements<'a>(
    mesh: &Mesh,
    region: &str,
    physics: &Physics<'a>,
) -> Result<Vec<Box<dyn FiniteElement + 'a>>> {
    mesh.get_region_cells(region)?
        .into_iter()
        .map(|cell| physics.create_element(cell))
        .collect()
}

/// Sums the load integrands of the elements attached to an element with `n_dof` DOF.
pub(crate) fn sum_loads(
    loads: &[Box<dyn FiniteElement + '_>],
    n_dof: usize,
    data: &FeData,
    xpts: &[f64],
    u: &[f64],
) -> Result<DVector<f64>> {
    let mut total = DVector::zeros(n_dof);
    for load in loads {
        total += load.evaluate_load_vector(data, xpts, u)?;
    }
    Ok(total)
}
