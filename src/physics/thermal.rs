//! Heat transfer elements: conduction in the domain, prescribed flux and convection on boundaries.
use crate::error::Result;
use crate::finite_element::{delegate_element_core, ElementCore, FeData, FiniteElement, MassDensity};
use crate::mesh::Cell;
use crate::physics::constitutive::{PlaneConstitutive, SolidConstitutive};
use crate::physics::sum_loads;
use nalgebra::{DMatrix, DVector};

/// `scale * N N^T`
fn scaled_mass(data: &FeData, scale: f64) -> DMatrix<f64> {
    &data.n * data.n.transpose() * scale
}

/// `scale * sum_d dN/dx_d dN/dx_d^T` over the first `dim` physical directions.
fn scaled_laplacian(data: &FeData, dim: usize, scale: f64) -> DMatrix<f64> {
    let grad = data.dn_dx.columns(0, dim);
    &grad * grad.transpose() * scale
}

/// Transient heat conduction in a plate.
#[derive(Debug)]
pub struct HeatConduction2D<'a> {
    core: ElementCore,
    constitutive: &'a PlaneConstitutive,
    loads: Vec<Box<dyn FiniteElement + 'a>>,
}

impl<'a> HeatConduction2D<'a> {
    pub fn new(cell: Cell, constitutive: &'a PlaneConstitutive) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 2)?,
            constitutive,
            loads: Vec::new(),
        })
    }

    pub fn constitutive(&self) -> &PlaneConstitutive {
        self.constitutive
    }

    /// Adds a heat source evaluated on the same cell.
    pub fn add_heat_load(&mut self, load: Box<dyn FiniteElement + 'a>) {
        self.loads.push(load);
    }
}

impl FiniteElement for HeatConduction2D<'_> {
    delegate_element_core!();

    fn evaluate_mass_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        let c = self.constitutive;
        Ok(scaled_mass(data, c.prop.density * c.prop.specific_heat * c.thick))
    }

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        let c = self.constitutive;
        Ok(scaled_laplacian(data, 2, c.prop.conductivity * c.thick))
    }

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        sum_loads(&self.loads, self.core.n_dof(), data, xpts, u)
    }

    fn as_mass_density(&self) -> Option<&dyn MassDensity> {
        Some(self)
    }
}

impl MassDensity for HeatConduction2D<'_> {
    fn mass_density(&self) -> f64 {
        self.constitutive.prop.density * self.constitutive.thick
    }
}

/// Transient heat conduction in a solid.
#[derive(Debug)]
pub struct HeatConduction3D<'a> {
    core: ElementCore,
    constitutive: &'a SolidConstitutive,
    loads: Vec<Box<dyn FiniteElement + 'a>>,
}

impl<'a> HeatConduction3D<'a> {
    pub fn new(cell: Cell, constitutive: &'a SolidConstitutive) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 3)?,
            constitutive,
            loads: Vec::new(),
        })
    }

    pub fn constitutive(&self) -> &SolidConstitutive {
        self.constitutive
    }

    pub fn add_heat_load(&mut self, load: Box<dyn FiniteElement + 'a>) {
        self.loads.push(load);
    }
}

impl FiniteElement for HeatConduction3D<'_> {
    delegate_element_core!();

    fn evaluate_mass_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        let prop = &self.constitutive.prop;
        Ok(scaled_mass(data, prop.density * prop.specific_heat))
    }

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(scaled_laplacian(data, 3, self.constitutive.prop.conductivity))
    }

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        sum_loads(&self.loads, self.core.n_dof(), data, xpts, u)
    }

    fn as_mass_density(&self) -> Option<&dyn MassDensity> {
        Some(self)
    }
}

impl MassDensity for HeatConduction3D<'_> {
    fn mass_density(&self) -> f64 {
        self.constitutive.prop.density
    }
}

/// Prescribed heat flux into a plate edge.
#[derive(Debug)]
pub struct HeatFlux2D {
    core: ElementCore,
    flux: f64,
    thick: f64,
}

impl HeatFlux2D {
    pub fn new(cell: Cell, flux: f64, thick: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 2)?,
            flux,
            thick,
        })
    }
}

impl FiniteElement for HeatFlux2D {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(&data.n * (self.thick * self.flux))
    }
}

/// Prescribed heat flux into a solid surface.
#[derive(Debug)]
pub struct HeatFlux3D {
    core: ElementCore,
    flux: f64,
}

impl HeatFlux3D {
    pub fn new(cell: Cell, flux: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 3)?,
            flux,
        })
    }
}

impl FiniteElement for HeatFlux3D {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(&data.n * self.flux)
    }
}

/// Convective exchange `htc (T_bulk - T)` across a plate edge.
#[derive(Debug)]
pub struct HeatConvection2D {
    core: ElementCore,
    htc: f64,
    t_bulk: f64,
    thick: f64,
}

impl HeatConvection2D {
    pub fn new(cell: Cell, htc: f64, t_bulk: f64, thick: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 2)?,
            htc,
            t_bulk,
            thick,
        })
    }
}

impl FiniteElement for HeatConvection2D {
    delegate_element_core!();

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(scaled_mass(data, self.thick * self.htc))
    }

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(&data.n * (self.thick * self.htc * self.t_bulk))
    }
}

/// Convective exchange `htc (T_bulk - T)` across a solid surface.
#[derive(Debug)]
pub struct HeatConvection3D {
    core: ElementCore,
    htc: f64,
    t_bulk: f64,
}

impl HeatConvection3D {
    pub fn new(cell: Cell, htc: f64, t_bulk: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 1, 3)?,
            htc,
            t_bulk,
        })
    }
}

impl FiniteElement for HeatConvection3D {
    delegate_element_core!();

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(scaled_mass(data, self.htc))
    }

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        Ok(&data.n * (self.htc * self.t_bulk))
    }
}
