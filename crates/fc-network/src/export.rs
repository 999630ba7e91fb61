//! Serialization of a network for an external steady-state solver.
//!
//! Two forms are offered, both with Darcy-Weisbach headloss:
//! - a serde [`SolverModel`] (JSON friendly) carrying SI values, so its flows
//!   are in m³/s ([`MODEL_FLOW_UNITS`]);
//! - an EPANET-style INP text deck whose flows are converted to m³/h
//!   ([`INP_FLOW_UNITS`]), the metric unit every EPANET release accepts.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::component::{Junction, Link, LinkStatus, Node, Pipe, Pump, Reservoir, Valve};
use crate::network::HydraulicNetwork;

/// Hydraulic options travelling with the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    pub headloss: String,
    pub flow_units: String,
    /// Kinematic viscosity relative to water at 20 °C.
    pub viscosity: f64,
    pub specific_gravity: f64,
}

/// Flat, solver-facing snapshot of a [`HydraulicNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverModel {
    pub options: SolverOptions,
    pub junctions: Vec<Junction>,
    pub reservoirs: Vec<Reservoir>,
    pub pipes: Vec<Pipe>,
    pub pumps: Vec<Pump>,
    pub valves: Vec<Valve>,
}

impl SolverModel {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Flow unit of every flow in a [`SolverModel`].
pub const MODEL_FLOW_UNITS: &str = "CMS";
/// Flow unit of every flow in an INP deck.
pub const INP_FLOW_UNITS: &str = "CMH";

const M3S_TO_CMH: f64 = 3600.0;
const M_TO_MM: f64 = 1000.0;

impl HydraulicNetwork {
    /// Snapshot the network into the serde exchange model.
    pub fn to_solver_model(&self) -> SolverModel {
        let mut model = SolverModel {
            options: SolverOptions {
                headloss: "D-W".to_string(),
                flow_units: MODEL_FLOW_UNITS.to_string(),
                viscosity: self.fluid().relative_viscosity(),
                specific_gravity: self.fluid().relative_density(),
            },
            junctions: Vec::new(),
            reservoirs: Vec::new(),
            pipes: Vec::new(),
            pumps: Vec::new(),
            valves: Vec::new(),
        };
        for node in self.nodes() {
            match node {
                Node::Junction(j) => model.junctions.push(j.clone()),
                Node::Reservoir(r) => model.reservoirs.push(r.clone()),
            }
        }
        for link in self.links() {
            match link {
                Link::Pipe(p) => model.pipes.push(p.clone()),
                Link::Pump(p) => model.pumps.push(p.clone()),
                Link::Valve(v) => model.valves.push(v.clone()),
            }
        }
        model
    }

    /// Render the network as an INP deck for a single steady snapshot.
    pub fn to_inp(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_inp(&mut out);
        out
    }

    fn write_inp(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "[TITLE]")?;
        writeln!(out, "flowcad export")?;
        writeln!(out)?;

        writeln!(out, "[JUNCTIONS]")?;
        writeln!(out, ";ID\tElev\tDemand")?;
        for node in self.nodes() {
            if let Node::Junction(j) = node {
                writeln!(out, "{}\t{}\t{}", j.id, j.elevation_m, j.demand_m3s * M3S_TO_CMH)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[RESERVOIRS]")?;
        writeln!(out, ";ID\tHead")?;
        for node in self.nodes() {
            if let Node::Reservoir(r) = node {
                writeln!(out, "{}\t{}", r.id, r.head_m)?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[PIPES]")?;
        writeln!(out, ";ID\tNode1\tNode2\tLength\tDiameter\tRoughness\tMinorLoss\tStatus")?;
        for link in self.links() {
            if let Link::Pipe(p) = link {
                let status = if p.check_valve {
                    "CV".to_string()
                } else {
                    p.status.to_string()
                };
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    p.id,
                    p.start_node,
                    p.end_node,
                    p.length_m,
                    p.diameter_m * M_TO_MM,
                    p.roughness_m * M_TO_MM,
                    p.minor_loss,
                    status
                )?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[PUMPS]")?;
        writeln!(out, ";ID\tNode1\tNode2\tParameters")?;
        for link in self.links() {
            if let Link::Pump(p) = link {
                writeln!(
                    out,
                    "{}\t{}\t{}\tHEAD {}\tSPEED {}",
                    p.id,
                    p.start_node,
                    p.end_node,
                    p.curve_name(),
                    p.speed
                )?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[VALVES]")?;
        writeln!(out, ";ID\tNode1\tNode2\tDiameter\tType\tSetting\tMinorLoss")?;
        for link in self.links() {
            if let Link::Valve(v) = link {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                    v.id,
                    v.start_node,
                    v.end_node,
                    v.diameter_m * M_TO_MM,
                    v.valve_type.code(),
                    v.setting,
                    v.minor_loss
                )?;
            }
        }
        writeln!(out)?;

        writeln!(out, "[STATUS]")?;
        for link in self.links() {
            match link {
                Link::Pump(p) if p.status == LinkStatus::Closed => {
                    writeln!(out, "{}\tClosed", p.id)?
                }
                Link::Valve(v) if v.status != LinkStatus::Active => {
                    writeln!(out, "{}\t{}", v.id, v.status)?
                }
                _ => {}
            }
        }
        writeln!(out)?;

        writeln!(out, "[CURVES]")?;
        writeln!(out, ";ID\tFlow\tHead")?;
        for link in self.links() {
            if let Link::Pump(p) = link {
                for pt in &p.curve {
                    writeln!(out, "{}\t{}\t{}", p.curve_name(), pt.flow_m3s * M3S_TO_CMH, pt.head_m)?;
                }
            }
        }
        writeln!(out)?;

        writeln!(out, "[OPTIONS]")?;
        writeln!(out, "Units\t{INP_FLOW_UNITS}")?;
        writeln!(out, "Headloss\tD-W")?;
        writeln!(out, "Specific Gravity\t{}", self.fluid().relative_density())?;
        writeln!(out, "Viscosity\t{}", self.fluid().relative_viscosity())?;
        writeln!(out)?;

        writeln!(out, "[TIMES]")?;
        writeln!(out, "Duration\t0")?;
        writeln!(out)?;

        writeln!(out, "[END]")?;
        Ok(())
    }
}
