//! Linear elasticity and the loads acting on elastic bodies.
use crate::error::{check_size, Result};
use crate::finite_element::{
    delegate_element_core, ElementCore, FeData, FiniteElement, MassDensity, StressEvaluation,
};
use crate::mesh::{Cell, Field};
use crate::physics::constitutive::{PlaneConstitutive, SolidConstitutive, ThermoElastic};
use crate::physics::sum_loads;
use nalgebra::{DMatrix, DVector};

/// Block-diagonal mass integrand `scale * N_i N_j I` for `n_dim` displacement components.
fn vector_mass(data: &FeData, n_dim: usize, scale: f64) -> DMatrix<f64> {
    let n_nodes = data.n.len();
    let mut m = DMatrix::zeros(n_dim * n_nodes, n_dim * n_nodes);
    for i in 0..n_nodes {
        for j in 0..n_nodes {
            let value = scale * data.n[i] * data.n[j];
            for d in 0..n_dim {
                m[(n_dim * i + d, n_dim * j + d)] = value;
            }
        }
    }
    m
}

/// Load integrand `N_i t` for a constant traction or body force `t`.
fn vector_load(data: &FeData, force: &[f64]) -> DVector<f64> {
    let n_dim = force.len();
    DVector::from_fn(n_dim * data.n.len(), |row, _| data.n[row / n_dim] * force[row % n_dim])
}

/// Load integrand of a pressure `p` acting against the unit normal of the cell.
fn pressure_load(data: &FeData, n_dim: usize, pressure: &[f64], normal: &[f64], scale: f64) -> Result<DVector<f64>> {
    check_size(data.n.len(), pressure.len())?;
    let p: f64 = data.n.iter().zip(pressure).map(|(n, p)| n * p).sum();
    let force: Vec<f64> = normal.iter().take(n_dim).map(|n| -scale * p * n).collect();
    Ok(vector_load(data, &force))
}

/// Temperature changes `T - t0` at the nodes of `cell`.
fn temperature_change(temperature: &Field<'_>, cell: &Cell, t0: f64) -> Result<Vec<f64>> {
    Ok(temperature
        .get_cell_values(cell)?
        .into_iter()
        .map(|t| t - t0)
        .collect())
}

/// Plane stress or plane strain linear elasticity with two displacement components per node.
#[derive(Debug)]
pub struct LinearElasticity2D<'a> {
    core: ElementCore,
    constitutive: &'a PlaneConstitutive,
    loads: Vec<Box<dyn FiniteElement + 'a>>,
}

impl<'a> LinearElasticity2D<'a> {
    pub fn new(cell: Cell, constitutive: &'a PlaneConstitutive) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 2, 2)?,
            constitutive,
            loads: Vec::new(),
        })
    }

    pub fn constitutive(&self) -> &PlaneConstitutive {
        self.constitutive
    }

    /// Adds a body force from the acceleration `g`.
    pub fn add_inertial_load(&mut self, g: [f64; 2]) -> Result<()> {
        let load = InertialLoad2D::new(*self.core.cell(), self.constitutive, g)?;
        self.loads.push(Box::new(load));
        Ok(())
    }

    /// Adds the load from thermal expansion relative to the reference temperature `t0`.
    pub fn add_thermal_load(&mut self, temperature: &'a Field<'a>, t0: f64) -> Result<()> {
        let load = ThermalLoad2D::new(*self.core.cell(), self.constitutive, temperature, t0)?;
        self.loads.push(Box::new(load));
        Ok(())
    }
}

impl FiniteElement for LinearElasticity2D<'_> {
    delegate_element_core!();

    fn evaluate_mass_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(vector_mass(data, 2, self.mass_density()))
    }

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        let c = self.constitutive;
        let b = c.strain_displacement_matrix(&data.dn_dx);
        Ok(b.transpose() * c.stress_strain_matrix() * b * c.thick)
    }

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        sum_loads(&self.loads, self.core.n_dof(), data, xpts, u)
    }

    fn as_stress_evaluation(&self) -> Option<&dyn StressEvaluation> {
        Some(self)
    }

    fn as_mass_density(&self) -> Option<&dyn MassDensity> {
        Some(self)
    }
}

impl StressEvaluation for LinearElasticity2D<'_> {
    fn stress(&self, data: &FeData, u: &[f64]) -> DVector<f64> {
        self.constitutive.stress(&data.dn_dx, u)
    }

    fn von_mises_stress(&self, data: &FeData, u: &[f64]) -> f64 {
        self.constitutive.von_mises(&self.stress(data, u))
    }
}

impl MassDensity for LinearElasticity2D<'_> {
    fn mass_density(&self) -> f64 {
        self.constitutive.prop.density * self.constitutive.thick
    }
}

/// Three-dimensional linear elasticity.
#[derive(Debug)]
pub struct LinearElasticity3D<'a> {
    core: ElementCore,
    constitutive: &'a SolidConstitutive,
    loads: Vec<Box<dyn FiniteElement + 'a>>,
}

impl<'a> LinearElasticity3D<'a> {
    pub fn new(cell: Cell, constitutive: &'a SolidConstitutive) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 3, 3)?,
            constitutive,
            loads: Vec::new(),
        })
    }

    pub fn constitutive(&self) -> &SolidConstitutive {
        self.constitutive
    }

    pub fn add_inertial_load(&mut self, g: [f64; 3]) -> Result<()> {
        let load = InertialLoad3D::new(*self.core.cell(), self.constitutive, g)?;
        self.loads.push(Box::new(load));
        Ok(())
    }

    pub fn add_thermal_load(&mut self, temperature: &'a Field<'a>, t0: f64) -> Result<()> {
        let load = ThermalLoad3D::new(*self.core.cell(), self.constitutive, temperature, t0)?;
        self.loads.push(Box::new(load));
        Ok(())
    }
}

impl FiniteElement for LinearElasticity3D<'_> {
    delegate_element_core!();

    fn evaluate_mass_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        Ok(vector_mass(data, 3, self.mass_density()))
    }

    fn evaluate_stiffness_matrix(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DMatrix<f64>> {
        let c = self.constitutive;
        let b = c.strain_displacement_matrix(&data.dn_dx);
        Ok(b.transpose() * c.stress_strain_matrix() * b)
    }

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], u: &[f64]) -> Result<DVector<f64>> {
        sum_loads(&self.loads, self.core.n_dof(), data, xpts, u)
    }

    fn as_stress_evaluation(&self) -> Option<&dyn StressEvaluation> {
        Some(self)
    }

    fn as_mass_density(&self) -> Option<&dyn MassDensity> {
        Some(self)
    }
}

impl StressEvaluation for LinearElasticity3D<'_> {
    fn stress(&self, data: &FeData, u: &[f64]) -> DVector<f64> {
        self.constitutive.stress(&data.dn_dx, u)
    }

    fn von_mises_stress(&self, data: &FeData, u: &[f64]) -> f64 {
        self.constitutive.von_mises(&self.stress(data, u))
    }
}

impl MassDensity for LinearElasticity3D<'_> {
    fn mass_density(&self) -> f64 {
        self.constitutive.prop.density
    }
}

/// Body force `rho * thick * g` on a plate.
#[derive(Debug)]
pub struct InertialLoad2D<'a> {
    core: ElementCore,
    constitutive: &'a PlaneConstitutive,
    g: [f64; 2],
}

impl<'a> InertialLoad2D<'a> {
    pub fn new(cell: Cell, constitutive: &'a PlaneConstitutive, g: [f64; 2]) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 2, 2)?,
            constitutive,
            g,
        })
    }
}

impl FiniteElement for InertialLoad2D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let scale = self.constitutive.prop.density * self.constitutive.thick;
        Ok(vector_load(data, &self.g.map(|g| scale * g)))
    }
}

/// Body force `rho * g` on a solid.
#[derive(Debug)]
pub struct InertialLoad3D<'a> {
    core: ElementCore,
    constitutive: &'a SolidConstitutive,
    g: [f64; 3],
}

impl<'a> InertialLoad3D<'a> {
    pub fn new(cell: Cell, constitutive: &'a SolidConstitutive, g: [f64; 3]) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 3, 3)?,
            constitutive,
            g,
        })
    }
}

impl FiniteElement for InertialLoad3D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let rho = self.constitutive.prop.density;
        Ok(vector_load(data, &self.g.map(|g| rho * g)))
    }
}

/// Pressure on a plate edge, interpolated from a nodal field and acting against the edge normal.
#[derive(Debug)]
pub struct PressureLoad2D<'a> {
    core: ElementCore,
    pressure: &'a Field<'a>,
    thick: f64,
}

impl<'a> PressureLoad2D<'a> {
    pub fn new(cell: Cell, pressure: &'a Field<'a>, thick: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 2, 2)?,
            pressure,
            thick,
        })
    }
}

impl FiniteElement for PressureLoad2D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let cell = self.core.cell();
        let p = self.pressure.get_cell_values(cell)?;
        let normal = cell.face_normal(-1, xpts)?;
        pressure_load(data, 2, &p, normal.as_slice(), self.thick)
    }
}

/// Pressure on a solid surface, interpolated from a nodal field.
#[derive(Debug)]
pub struct PressureLoad3D<'a> {
    core: ElementCore,
    pressure: &'a Field<'a>,
}

impl<'a> PressureLoad3D<'a> {
    pub fn new(cell: Cell, pressure: &'a Field<'a>) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 3, 3)?,
            pressure,
        })
    }
}

impl FiniteElement for PressureLoad3D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let cell = self.core.cell();
        let p = self.pressure.get_cell_values(cell)?;
        let normal = cell.face_normal(-1, xpts)?;
        pressure_load(data, 3, &p, normal.as_slice(), 1.0)
    }
}

/// Equivalent load of the thermal expansion of a plate.
#[derive(Debug)]
pub struct ThermalLoad2D<'a> {
    core: ElementCore,
    constitutive: &'a PlaneConstitutive,
    temperature: &'a Field<'a>,
    t0: f64,
}

impl<'a> ThermalLoad2D<'a> {
    pub fn new(cell: Cell, constitutive: &'a PlaneConstitutive, temperature: &'a Field<'a>, t0: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 2, 2)?,
            constitutive,
            temperature,
            t0,
        })
    }
}

impl FiniteElement for ThermalLoad2D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let dt = temperature_change(self.temperature, self.core.cell(), self.t0)?;
        let c = self.constitutive;
        Ok(c.thermal_load(&data.n, &data.dn_dx, &dt) * c.thick)
    }
}

/// Equivalent load of the thermal expansion of a solid.
#[derive(Debug)]
pub struct ThermalLoad3D<'a> {
    core: ElementCore,
    constitutive: &'a SolidConstitutive,
    temperature: &'a Field<'a>,
    t0: f64,
}

impl<'a> ThermalLoad3D<'a> {
    pub fn new(cell: Cell, constitutive: &'a SolidConstitutive, temperature: &'a Field<'a>, t0: f64) -> Result<Self> {
        Ok(Self {
            core: ElementCore::new(cell, 3, 3)?,
            constitutive,
            temperature,
            t0,
        })
    }
}

impl FiniteElement for ThermalLoad3D<'_> {
    delegate_element_core!();

    fn evaluate_load_vector(&self, data: &FeData, _xpts: &[f64], _u: &[f64]) -> Result<DVector<f64>> {
        let dt = temperature_change(self.temperature, self.core.cell(), self.t0)?;
        Ok(self.constitutive.thermal_load(&data.n, &data.dn_dx, &dt))
    }
}
