//! Three-way mixing/diverting valve.

use fc_core::{Length, internal_id, mm};
use fc_network::{HydraulicComponent, Junction, Pipe, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, NEGLIGIBLE_LENGTH_M, PortNodeMap, ResultBag,
    TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};
use crate::tee::{BranchFlows, LEG_ROUGHNESS_MM};
use crate::valve::{ValveLaw, checked_opening, throttle_link};

/// Inlet P1 feeds an internal mid junction which splits into two throttled
/// branches: towards P2 at `opening` and towards P3 at `100 - opening`.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreeWayValve {
    pub(crate) core: EquipmentCore,
    pub diameter: Length,
    /// Rated Kv of each branch (m³/h at 100 kPa)
    pub kv_rated: f64,
    opening: f64,
    law: ValveLaw,
    pub elevation: Length,
    /// Flows through the inlet leg, branch 2 and branch 3.
    pub flows: BranchFlows,
}

impl ThreeWayValve {
    /// Create a new three-way valve. Only the linear law is supported.
    pub fn new(
        id: &str,
        diameter: Length,
        kv_rated: f64,
        opening: f64,
        law: ValveLaw,
        elevation: Length,
    ) -> EquipmentResult<Self> {
        if law != ValveLaw::Linear {
            return Err(EquipmentError::NotImplemented {
                what: format!("three-way valve '{id}': {} control law", law.name()),
            });
        }
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "three-way valve '{id}': diameter must be positive"
            )));
        }
        if !(kv_rated.is_finite() && kv_rated > 0.0) {
            return Err(EquipmentError::construction(format!(
                "three-way valve '{id}': rated Kv must be positive"
            )));
        }
        let opening = checked_opening(id, opening)?;
        Ok(Self {
            core: EquipmentCore::new(id, 3)?,
            diameter,
            kv_rated,
            opening,
            law,
            elevation,
            flows: BranchFlows::default(),
        })
    }

    pub fn opening(&self) -> f64 {
        self.opening
    }

    pub fn law(&self) -> ValveLaw {
        self.law
    }

    pub fn set_opening(&mut self, opening: f64) -> EquipmentResult<()> {
        self.opening = checked_opening(self.core.id(), opening)?;
        Ok(())
    }

    /// Opening of the branch towards port 2 or 3.
    pub fn branch_opening(&self, port: usize) -> f64 {
        if port == 2 {
            self.opening
        } else {
            100.0 - self.opening
        }
    }

    fn link_ids(&self) -> [String; 3] {
        let id = self.core.id();
        [
            internal_id(id, "Pipe1"),
            internal_id(id, "V2"),
            internal_id(id, "V3"),
        ]
    }
}

impl HydraulicEquivalent for ThreeWayValve {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let [inlet_id, v2_id, v3_id] = self.link_ids();
        let j1 = self.core.port_junction(ctx.port_nodes, 1, self.elevation)?;
        let j2 = self.core.port_junction(ctx.port_nodes, 2, self.elevation)?;
        let j3 = self.core.port_junction(ctx.port_nodes, 3, self.elevation)?;
        let mid = Junction::new(internal_id(self.core.id(), "Mid"), self.elevation.value);

        let inlet = Pipe::new(
            inlet_id,
            j1.id.clone(),
            mid.id.clone(),
            NEGLIGIBLE_LENGTH_M,
            self.diameter.value,
            mm(LEG_ROUGHNESS_MM).value,
        );
        let mut branches = Vec::with_capacity(2);
        for (link_id, port, node) in [(v2_id, 2, &j2.id), (v3_id, 3, &j3.id)] {
            let opening = self.branch_opening(port);
            branches.push(throttle_link(
                link_id,
                mid.id.clone(),
                node.clone(),
                self.diameter,
                self.kv_rated * self.law.kv_fraction(opening),
                self.law.status(opening),
                ctx.fluid,
            )?);
        }

        let mut parts: Vec<HydraulicComponent> =
            vec![j1.into(), j2.into(), j3.into(), mid.into(), inlet.into()];
        parts.extend(branches.into_iter().map(HydraulicComponent::from));
        Ok(parts)
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        let [a, b, c] = self.link_ids();
        self.flows.harvest([a.as_str(), b.as_str(), c.as_str()], solved);
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
    use fc_network::{Link, LinkStatus};

    #[test]
    fn non_linear_laws_not_implemented() {
        for law in [ValveLaw::EqualPercentage, ValveLaw::Binary] {
            let err = ThreeWayValve::new("TW", m(0.1), 50.0, 30.0, law, m(0.0)).unwrap_err();
            assert!(matches!(err, EquipmentError::NotImplemented { .. }));
        }
    }

    #[test]
    fn branches_are_complementary() {
        let tw = ThreeWayValve::new("TW", m(0.1), 50.0, 30.0, ValveLaw::Linear, m(0.0)).unwrap();
        assert_eq!(tw.branch_opening(2), 30.0);
        assert_eq!(tw.branch_opening(3), 70.0);

        let map: PortNodeMap = (1..=3)
            .map(|i| (format!("TW_P{i}"), format!("n{i}")))
            .collect();
        let fluid = Fluid::water();
        let parts = tw
            .generate_hydraulic_representation(&TranslationContext {
                port_nodes: &map,
                fluid: &fluid,
            })
            .unwrap();
        let ids: Vec<&str> = parts.iter().map(HydraulicComponent::id).collect();
        assert_eq!(ids, ["n1", "n2", "n3", "TW_Mid", "TW_Pipe1", "TW_V2", "TW_V3"]);

        let settings: Vec<f64> = parts
            .iter()
            .filter_map(|c| match c {
                HydraulicComponent::Link(Link::Valve(v)) => Some(v.setting),
                _ => None,
            })
            .collect();
        // less open branch has the larger loss coefficient
        assert!(settings[0] > settings[1]);
    }

    #[test]
    fn fully_turned_valve_closes_one_branch() {
        let tw = ThreeWayValve::new("TW", m(0.1), 50.0, 100.0, ValveLaw::Linear, m(0.0)).unwrap();
        assert_eq!(ValveLaw::Linear.status(tw.branch_opening(2)), LinkStatus::Open);
        assert_eq!(ValveLaw::Linear.status(tw.branch_opening(3)), LinkStatus::Closed);
    }
}
