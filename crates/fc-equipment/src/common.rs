//! Pieces shared by every equipment kind.

use std::collections::{BTreeMap, HashMap};

use fc_core::{
    Fluid, Length, NodeId, PortId, Pressure, Velocity, VolumeRate, m, m3ps, mps, normalize_id, pa,
    port_id,
};
use fc_network::{HydraulicComponent, Junction, NodeResult, SolvedNetwork};

use crate::error::{EquipmentError, EquipmentResult};
use crate::port::Port;

/// Port id → solver node id, as recorded by the connection registry.
pub type PortNodeMap = HashMap<PortId, NodeId>;

/// Result name → SI value. Absent results are simply not present.
pub type ResultBag = BTreeMap<&'static str, f64>;

/// Everything an equipment needs to emit its equivalent circuit.
#[derive(Debug, Clone, Copy)]
pub struct TranslationContext<'a> {
    pub port_nodes: &'a PortNodeMap,
    pub fluid: &'a Fluid,
}

/// Length of the short pipes used to model point devices.
pub const NEGLIGIBLE_LENGTH_M: f64 = 0.01;

/// Identity and ports of one equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentCore {
    id: String,
    ports: BTreeMap<PortId, Port>,
}

impl EquipmentCore {
    /// Create an equipment with ports `{id}_P1` .. `{id}_P{port_count}`.
    pub fn new(id: &str, port_count: usize) -> EquipmentResult<Self> {
        let id = normalize_id(id, "equipment")?;
        let mut ports = BTreeMap::new();
        for i in 1..=port_count {
            let port = Port::new(&port_id(&id, i), &id)?;
            ports.insert(port.id().to_string(), port);
        }
        Ok(Self { id, ports })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ports(&self) -> impl Iterator<Item = &Port> {
        self.ports.values()
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }

    pub fn port(&self, id: &str) -> Option<&Port> {
        self.ports.get(id)
    }

    pub(crate) fn port_mut(&mut self, id: &str) -> Option<&mut Port> {
        self.ports.get_mut(id)
    }

    /// Port by 1-based position.
    pub fn port_at(&self, index: usize) -> Option<&Port> {
        self.ports.get(&port_id(&self.id, index))
    }

    pub fn is_fully_connected(&self) -> bool {
        self.ports.values().all(Port::is_connected)
    }

    /// Solver node of the `index`-th port, or a translation error if unmapped.
    pub fn node_for(&self, port_nodes: &PortNodeMap, index: usize) -> EquipmentResult<NodeId> {
        let pid = port_id(&self.id, index);
        port_nodes.get(&pid).cloned().ok_or_else(|| {
            EquipmentError::translation(format!(
                "port '{pid}' of '{}' has no solver node (is it connected?)",
                self.id
            ))
        })
    }

    /// Junction at the node of the `index`-th port.
    pub fn port_junction(
        &self,
        port_nodes: &PortNodeMap,
        index: usize,
        elevation: Length,
    ) -> EquipmentResult<Junction> {
        Ok(Junction::new(self.node_for(port_nodes, index)?, elevation.value))
    }

    /// Copy the solved state of the `index`-th port's node onto the port.
    ///
    /// Clears the port and returns `None` when the port is unmapped or the
    /// node has no result.
    pub fn harvest_port(
        &mut self,
        index: usize,
        solved: &SolvedNetwork,
        port_nodes: &PortNodeMap,
    ) -> Option<NodeResult> {
        let pid = port_id(&self.id, index);
        let result = port_nodes
            .get(&pid)
            .and_then(|node| solved.node_result(node))
            .copied();
        if let Some(port) = self.ports.get_mut(&pid) {
            match result {
                Some(r) => {
                    port.pressure = Some(pa(r.pressure_pa));
                    port.head = Some(m(r.head_m));
                }
                None => port.clear_results(),
            }
        }
        result
    }

    pub fn clear_port_results(&mut self) {
        for port in self.ports.values_mut() {
            port.clear_results();
        }
    }

    /// Put `pressure_i` / `head_i` of every port into `bag`.
    pub fn fill_port_results(&self, bag: &mut ResultBag) {
        const PRESSURE: [&str; 3] = ["pressure_1", "pressure_2", "pressure_3"];
        const HEAD: [&str; 3] = ["head_1", "head_2", "head_3"];
        for i in 0..self.ports.len().min(3) {
            if let Some(port) = self.port_at(i + 1) {
                if let Some(p) = port.pressure {
                    bag.insert(PRESSURE[i], p.value);
                }
                if let Some(h) = port.head {
                    bag.insert(HEAD[i], h.value);
                }
            }
        }
    }

    /// Port problems plus ownership and key consistency.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for (key, port) in &self.ports {
            problems.extend(port.validate());
            if key != port.id() {
                problems.push(format!(
                    "equipment '{}': port stored under '{key}' has id '{}'",
                    self.id,
                    port.id()
                ));
            }
            if port.owner() != self.id {
                problems.push(format!(
                    "equipment '{}': port '{}' is owned by '{}'",
                    self.id,
                    port.id(),
                    port.owner()
                ));
            }
        }
        problems
    }
}

/// Results of anything modelled as a single flow-carrying link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkResults {
    pub flowrate: Option<VolumeRate>,
    pub velocity: Option<Velocity>,
    /// Head loss per unit length (Pa/m); only for links with a physical length.
    pub headloss_gradient: Option<f64>,
    pub friction_factor: Option<f64>,
    /// Pressure-equivalent head drop between the two ports.
    pub total_headloss: Option<Pressure>,
}

impl LinkResults {
    /// Read the result of `link_id`; everything is cleared if it is missing.
    pub fn harvest(&mut self, link_id: &str, length_m: Option<f64>, solved: &SolvedNetwork) {
        match solved.link_result(link_id) {
            Some(r) => {
                let drop = solved.head_difference_to_pressure(r.headloss_m);
                self.flowrate = Some(m3ps(r.flowrate_m3s));
                self.velocity = Some(mps(r.velocity_mps));
                self.headloss_gradient = length_m.filter(|l| *l > 0.0).map(|l| drop.value / l);
                self.friction_factor = Some(r.friction_factor);
                self.total_headloss = Some(drop);
            }
            None => self.clear(),
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn fill(&self, bag: &mut ResultBag) {
        if let Some(q) = self.flowrate {
            bag.insert("flow_rate", q.value);
        }
        if let Some(v) = self.velocity {
            bag.insert("velocity", v.value);
        }
        if let Some(h) = self.headloss_gradient {
            bag.insert("headloss", h);
        }
        if let Some(f) = self.friction_factor {
            bag.insert("friction_factor", f);
        }
        if let Some(t) = self.total_headloss {
            bag.insert("total_headloss", t.value);
        }
    }
}

/// Behaviour every equipment kind provides.
pub trait HydraulicEquivalent {
    fn core(&self) -> &EquipmentCore;

    /// Minimal set of solver primitives reproducing this equipment.
    ///
    /// Pure function of the current parameters and the port → node mapping.
    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>>;

    /// Pull this equipment's results out of a solved network.
    ///
    /// Any result whose node or link is missing is reset to absent.
    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap);

    /// Reset every result field to absent.
    fn clear_results(&mut self);

    /// Non-port results in SI units.
    fn fill_results(&self, bag: &mut ResultBag);

    /// Parameter problems beyond the structural port checks.
    fn validate_parameters(&self) -> Vec<String> {
        Vec::new()
    }

    fn id(&self) -> &str {
        self.core().id()
    }

    fn validate(&self) -> Vec<String> {
        let mut problems = self.core().validate();
        problems.extend(self.validate_parameters());
        problems
    }

    /// All available results, port values included.
    fn result_bag(&self) -> ResultBag {
        let mut bag = ResultBag::new();
        self.fill_results(&mut bag);
        self.core().fill_port_results(&mut bag);
        bag
    }
}
