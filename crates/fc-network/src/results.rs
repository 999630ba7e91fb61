//! Steady-state result tables returned by a solver.

use std::collections::HashMap;

use fc_core::converter::head_to_pressure;
use fc_core::{LinkId, NodeId, Pressure, m};
use serde::{Deserialize, Serialize};

use crate::network::HydraulicNetwork;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeResult {
    pub head_m: f64,
    /// Gauge pressure, ρ g (H - z) with the network fluid density.
    pub pressure_pa: f64,
    /// Net outflow at the node; negative means injection.
    pub demand_m3s: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    /// Positive from start node to end node.
    pub flowrate_m3s: f64,
    pub velocity_mps: f64,
    /// Head drop from start to end node (negative across a pump).
    pub headloss_m: f64,
    /// Darcy friction factor; zero for pumps and valves.
    pub friction_factor: f64,
}

/// One snapshot of node and link results keyed by primitive id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    pub nodes: HashMap<NodeId, NodeResult>,
    pub links: HashMap<LinkId, LinkResult>,
    /// Iterations the solver needed, if it reports them.
    #[serde(default)]
    pub iterations: usize,
}

impl SimulationResults {
    pub fn node(&self, id: &str) -> Option<&NodeResult> {
        self.nodes.get(id)
    }

    pub fn link(&self, id: &str) -> Option<&LinkResult> {
        self.links.get(id)
    }
}

/// A network together with the results solved on it.
#[derive(Debug, Clone)]
pub struct SolvedNetwork {
    pub network: HydraulicNetwork,
    pub results: SimulationResults,
}

impl SolvedNetwork {
    pub fn new(network: HydraulicNetwork, results: SimulationResults) -> Self {
        Self { network, results }
    }

    pub fn node_result(&self, id: &str) -> Option<&NodeResult> {
        self.results.node(id)
    }

    pub fn link_result(&self, id: &str) -> Option<&LinkResult> {
        self.results.link(id)
    }

    /// Pressure equivalent of a head difference in the solved fluid.
    pub fn head_difference_to_pressure(&self, dh_m: f64) -> Pressure {
        head_to_pressure(m(dh_m), m(0.0), self.network.fluid())
    }
}
