//! Three-leg tee used to split or merge flow.

use fc_core::{Length, VolumeRate, internal_id, m3ps, mm};
use fc_network::{HydraulicComponent, Junction, Pipe, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, NEGLIGIBLE_LENGTH_M, PortNodeMap, ResultBag,
    TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};

/// Roughness of the internal legs of a tee (mm).
pub(crate) const LEG_ROUGHNESS_MM: f64 = 1e-7;

/// Signed flow through each of three legs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BranchFlows(pub [Option<VolumeRate>; 3]);

impl BranchFlows {
    /// Read the flows of three links; missing links yield `None`.
    pub(crate) fn harvest(&mut self, link_ids: [&str; 3], solved: &SolvedNetwork) {
        for (slot, id) in self.0.iter_mut().zip(link_ids) {
            *slot = solved.link_result(id).map(|r| m3ps(r.flowrate_m3s));
        }
    }

    pub(crate) fn clear(&mut self) {
        self.0 = [None; 3];
    }

    pub(crate) fn fill(&self, bag: &mut ResultBag) {
        const KEYS: [&str; 3] = ["flow_rate_1", "flow_rate_2", "flow_rate_3"];
        for (key, q) in KEYS.iter().zip(&self.0) {
            if let Some(q) = q {
                bag.insert(key, q.value);
            }
        }
    }

    /// Sum of the three flows, when all are known.
    pub fn sum(&self) -> Option<VolumeRate> {
        let [a, b, c] = self.0;
        Some(a? + b? + c?)
    }
}

/// Tee: an internal mid junction with one negligible-loss leg per port.
///
/// Leg `i` runs from the node of port `Pi` to the mid junction, so each
/// branch flow is positive when fluid enters the tee through that port.
#[derive(Debug, Clone, PartialEq)]
pub struct Tee {
    pub(crate) core: EquipmentCore,
    pub diameter: Length,
    pub elevation: Length,
    pub flows: BranchFlows,
}

impl Tee {
    /// Create a new tee with three ports.
    pub fn new(id: &str, diameter: Length, elevation: Length) -> EquipmentResult<Self> {
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "tee '{id}': diameter must be positive"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 3)?,
            diameter,
            elevation,
            flows: BranchFlows::default(),
        })
    }

    pub fn mid_node(&self) -> String {
        internal_id(self.core.id(), "Mid")
    }

    pub fn leg_id(&self, index: usize) -> String {
        internal_id(self.core.id(), &format!("Pipe{index}"))
    }
}

impl HydraulicEquivalent for Tee {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let mid = Junction::new(self.mid_node(), self.elevation.value);
        let mut parts = Vec::with_capacity(7);
        let mut legs = Vec::with_capacity(3);
        for i in 1..=3 {
            let j = self.core.port_junction(ctx.port_nodes, i, self.elevation)?;
            legs.push(Pipe::new(
                self.leg_id(i),
                j.id.clone(),
                mid.id.clone(),
                NEGLIGIBLE_LENGTH_M,
                self.diameter.value,
                mm(LEG_ROUGHNESS_MM).value,
            ));
            parts.push(j.into());
        }
        parts.push(mid.into());
        parts.extend(legs.into_iter().map(HydraulicComponent::from));
        Ok(parts)
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        let ids = [self.leg_id(1), self.leg_id(2), self.leg_id(3)];
        self.flows
            .harvest([ids[0].as_str(), ids[1].as_str(), ids[2].as_str()], solved);
        for i in 1..=3 {
            self.core.harvest_port(i, solved, port_nodes);
        }
    }

    fn clear_results(&mut self) {
        self.flows.clear();
        self.core.clear_port_results();
    }

    fn fill_results(&self, bag: &mut ResultBag) {
        self.flows.fill(bag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{Fluid, m};

    #[test]
    fn emits_mid_junction_and_three_legs() {
        let tee = Tee::new("T", m(0.1), m(0.0)).unwrap();
        let map: PortNodeMap = (1..=3)
            .map(|i| (format!("T_P{i}"), format!("n{i}")))
            .collect();
        let fluid = Fluid::water();
        let parts = tee
            .generate_hydraulic_representation(&TranslationContext {
                port_nodes: &map,
                fluid: &fluid,
            })
            .unwrap();
        let ids: Vec<&str> = parts.iter().map(HydraulicComponent::id).collect();
        assert_eq!(ids, ["n1", "n2", "n3", "T_Mid", "T_Pipe1", "T_Pipe2", "T_Pipe3"]);
    }

    #[test]
    fn branch_sum_needs_all_three() {
        let mut flows = BranchFlows::default();
        assert!(flows.sum().is_none());
        flows.0 = [Some(m3ps(0.02)), Some(m3ps(-0.01)), Some(m3ps(-0.01))];
        assert!(flows.sum().unwrap().value.abs() < 1e-15);
    }
}
