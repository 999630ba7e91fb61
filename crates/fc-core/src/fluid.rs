use crate::numeric::ensure_positive;
use crate::units::{Density, KinVisc, constants, kgpm3, m2ps};
use crate::FcResult;

/// Working fluid of a hydraulic network (incompressible, isothermal).
#[derive(Clone, Debug, PartialEq)]
pub struct Fluid {
    pub name: String,
    pub density: Density,
    pub kinematic_viscosity: KinVisc,
}

impl Fluid {
    /// Create a fluid, rejecting non-positive density or viscosity.
    pub fn new(name: impl Into<String>, density_kgpm3: f64, viscosity_m2ps: f64) -> FcResult<Self> {
        ensure_positive(density_kgpm3, "fluid density")?;
        ensure_positive(viscosity_m2ps, "fluid viscosity")?;
        Ok(Self {
            name: name.into(),
            density: kgpm3(density_kgpm3),
            kinematic_viscosity: m2ps(viscosity_m2ps),
        })
    }

    /// Water at 20 °C.
    pub fn water() -> Self {
        Self {
            name: "Water".to_string(),
            density: kgpm3(constants::RHO_REF_KGPM3),
            kinematic_viscosity: m2ps(constants::NU_WATER_M2PS),
        }
    }

    pub fn density_kgpm3(&self) -> f64 {
        self.density.value
    }

    pub fn viscosity_m2ps(&self) -> f64 {
        self.kinematic_viscosity.value
    }

    /// Viscosity relative to water at 20 °C.
    pub fn relative_viscosity(&self) -> f64 {
        self.viscosity_m2ps() / constants::NU_WATER_M2PS
    }

    /// Specific gravity relative to the reference water density.
    pub fn relative_density(&self) -> f64 {
        self.density_kgpm3() / constants::RHO_REF_KGPM3
    }
}

impl Default for Fluid {
    fn default() -> Self {
        Self::water()
    }
}

impl std::fmt::Display for Fluid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (density={} kg/m³, viscosity={:e} m²/s)",
            self.name,
            self.density_kgpm3(),
            self.viscosity_m2ps()
        )
    }
}
