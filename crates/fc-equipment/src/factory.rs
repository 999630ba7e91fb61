//! Property-bag definitions and the factory that turns them into equipment.
//!
//! Every field is in SI units except where the name says otherwise
//! (`roughness_mm`, `kv` in m³/h). Pump curves are given as
//! `(flow m³/s, pressure rise Pa)` pairs and converted to head with the
//! density of the working fluid.

use fc_core::converter::{pressure_to_head, zeta_from_kv};
use fc_core::{Fluid, m, m3ps, mm, pa};
use serde::{Deserialize, Serialize};

use crate::common::HydraulicEquivalent;
use crate::boundary::{FlowRateBoundary, PressureBoundary};
use crate::equipment::{Equipment, EquipmentKind};
use crate::error::{EquipmentError, EquipmentResult};
use crate::pipe::PipeConnection;
use crate::pump::Pump;
use crate::resistance::HydraulicResistance;
use crate::tee::Tee;
use crate::three_way::ThreeWayValve;
use crate::valve::{Valve, ValveLaw};

fn default_speed() -> f64 {
    1.0
}

fn default_opening() -> f64 {
    100.0
}

/// Parameters of one equipment, tagged by kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EquipmentDef {
    Pump {
        curve_points: Vec<(f64, f64)>,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default)]
        elevation: f64,
    },
    PressureBoundary {
        pressure_pa: f64,
        #[serde(default)]
        elevation: f64,
    },
    FlowRateBoundary {
        flow_rate_m3s: f64,
        #[serde(default)]
        elevation: f64,
    },
    /// Give either `zeta` or `kv`.
    HydraulicResistance {
        diameter_m: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        zeta: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        kv: Option<f64>,
        #[serde(default)]
        check_valve: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opening: Option<f64>,
        #[serde(default)]
        elevation: f64,
    },
    Valve {
        diameter_m: f64,
        kv: f64,
        #[serde(default = "default_opening")]
        opening: f64,
        #[serde(default)]
        control_type: ValveLaw,
        #[serde(default)]
        elevation: f64,
    },
    ThreeWayValve {
        diameter_m: f64,
        kv: f64,
        #[serde(default = "default_opening")]
        opening: f64,
        #[serde(default)]
        control_type: ValveLaw,
        #[serde(default)]
        elevation: f64,
    },
    Pipe {
        length_m: f64,
        diameter_m: f64,
        roughness_mm: f64,
        #[serde(default)]
        elevation: f64,
    },
    Tee {
        diameter_m: f64,
        #[serde(default)]
        elevation: f64,
    },
}

impl EquipmentDef {
    pub fn kind(&self) -> EquipmentKind {
        match self {
            EquipmentDef::Pump { .. } => EquipmentKind::Pump,
            EquipmentDef::PressureBoundary { .. } => EquipmentKind::PressureBoundary,
            EquipmentDef::FlowRateBoundary { .. } => EquipmentKind::FlowRateBoundary,
            EquipmentDef::HydraulicResistance { .. } => EquipmentKind::HydraulicResistance,
            EquipmentDef::Valve { .. } => EquipmentKind::Valve,
            EquipmentDef::ThreeWayValve { .. } => EquipmentKind::ThreeWayValve,
            EquipmentDef::Pipe { .. } => EquipmentKind::Pipe,
            EquipmentDef::Tee { .. } => EquipmentKind::Tee,
        }
    }

    /// Build the equipment `id` from this definition.
    pub fn build(&self, id: &str, fluid: &Fluid) -> EquipmentResult<Equipment> {
        let eq: Equipment = match self {
            EquipmentDef::Pump {
                curve_points,
                speed,
                elevation,
            } => {
                let curve = curve_points
                    .iter()
                    .map(|&(q, dp)| (m3ps(q), pressure_to_head(pa(dp), m(0.0), fluid)))
                    .collect();
                Pump::new(id, curve, m(*elevation))?
                    .with_speed(*speed)?
                    .into()
            }
            EquipmentDef::PressureBoundary {
                pressure_pa,
                elevation,
            } => PressureBoundary::new(id, pa(*pressure_pa), m(*elevation))?.into(),
            EquipmentDef::FlowRateBoundary {
                flow_rate_m3s,
                elevation,
            } => FlowRateBoundary::new(id, m3ps(*flow_rate_m3s), m(*elevation))?.into(),
            EquipmentDef::HydraulicResistance {
                diameter_m,
                zeta,
                kv,
                check_valve,
                opening,
                elevation,
            } => {
                let zeta = match (zeta, kv) {
                    (Some(z), None) => *z,
                    (None, Some(kv)) => zeta_from_kv(*kv, m(*diameter_m), fluid)?,
                    _ => {
                        return Err(EquipmentError::construction(format!(
                            "hydraulic resistance '{id}': give exactly one of zeta or kv"
                        )));
                    }
                };
                let mut r = HydraulicResistance::new(id, m(*diameter_m), zeta, m(*elevation))?;
                if *check_valve {
                    r = r.with_check_valve();
                }
                if let Some(o) = opening {
                    r = r.with_opening(*o)?;
                }
                r.into()
            }
            EquipmentDef::Valve {
                diameter_m,
                kv,
                opening,
                control_type,
                elevation,
            } => Valve::new(
                id,
                m(*diameter_m),
                *kv,
                *opening,
                *control_type,
                m(*elevation),
            )?
            .into(),
            EquipmentDef::ThreeWayValve {
                diameter_m,
                kv,
                opening,
                control_type,
                elevation,
            } => ThreeWayValve::new(
                id,
                m(*diameter_m),
                *kv,
                *opening,
                *control_type,
                m(*elevation),
            )?
            .into(),
            EquipmentDef::Pipe {
                length_m,
                diameter_m,
                roughness_mm,
                elevation,
            } => PipeConnection::new(
                id,
                m(*length_m),
                m(*diameter_m),
                mm(*roughness_mm),
                m(*elevation),
            )?
            .into(),
            EquipmentDef::Tee {
                diameter_m,
                elevation,
            } => Tee::new(id, m(*diameter_m), m(*elevation))?.into(),
        };
        tracing::debug!(equipment = %eq.core().id(), kind = %self.kind(), "equipment built");
        Ok(eq)
    }
}
