//! Project schema definitions.

use fc_core::{Fluid, FcResult, UnitContext, constants};
use fc_equipment::EquipmentDef;
use fc_solver::SolverConfig;
use serde::{Deserialize, Serialize};

pub const LATEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub fluid: FluidDef,
    /// Display units chosen by the user; results are stored in SI regardless.
    #[serde(default)]
    pub units: UnitContext,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub equipment: Vec<EquipmentEntry>,
    #[serde(default)]
    pub pipes: Vec<PipeRunDef>,
    #[serde(default)]
    pub connections: Vec<ConnectionDef>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: LATEST_VERSION,
            name: name.into(),
            fluid: FluidDef::default(),
            units: UnitContext::default(),
            solver: SolverConfig::default(),
            equipment: Vec::new(),
            pipes: Vec::new(),
            connections: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    pub name: String,
    pub density_kgpm3: f64,
    pub viscosity_m2ps: f64,
}

impl Default for FluidDef {
    fn default() -> Self {
        Self {
            name: "water".to_string(),
            density_kgpm3: constants::RHO_REF_KGPM3,
            viscosity_m2ps: constants::NU_WATER_M2PS,
        }
    }
}

impl FluidDef {
    pub fn to_fluid(&self) -> FcResult<Fluid> {
        Fluid::new(self.name.clone(), self.density_kgpm3, self.viscosity_m2ps)
    }
}

/// One equipment: its id plus the tagged property bag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EquipmentEntry {
    pub id: String,
    #[serde(flatten)]
    pub def: EquipmentDef,
}

/// A port on an equipment, written as the short port name (`P1`, `P2`, ...).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub equipment: String,
    pub port: String,
}

impl PortRef {
    pub fn new(equipment: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            equipment: equipment.into(),
            port: port.into(),
        }
    }

    /// Full port id, `{equipment}_{port}`.
    pub fn port_id(&self) -> String {
        format!("{}_{}", self.equipment, self.port)
    }

    /// 1-based port index parsed from `Pn`.
    pub fn index(&self) -> Option<usize> {
        self.port.strip_prefix('P')?.parse().ok()
    }
}

/// Direct port-to-port connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionDef {
    pub from: PortRef,
    pub to: PortRef,
}

fn default_roughness_mm() -> f64 {
    0.1
}

/// A pipe drawn between two equipment ports. It becomes a pipe equipment
/// whose P1 joins `start` and whose P2 joins `end`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipeRunDef {
    pub id: String,
    pub start: PortRef,
    pub end: PortRef,
    pub length_m: f64,
    pub diameter_m: f64,
    #[serde(default = "default_roughness_mm")]
    pub roughness_mm: f64,
    #[serde(default)]
    pub elevation: f64,
}

impl PipeRunDef {
    pub fn equipment_def(&self) -> EquipmentDef {
        EquipmentDef::Pipe {
            length_m: self.length_m,
            diameter_m: self.diameter_m,
            roughness_mm: self.roughness_mm,
            elevation: self.elevation,
        }
    }
}
