//! Centrifugal pump equipment.

use fc_core::{Length, Pressure, VolumeRate, m3ps};
use fc_network::{CurvePoint, HydraulicComponent, Pump as PumpLink, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, PortNodeMap, ResultBag, TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};

/// Pump between an inlet port (P1) and an outlet port (P2).
///
/// Translated to two junctions bridged by a pump link carrying the stored
/// head/flow curve and speed multiplier.
#[derive(Debug, Clone, PartialEq)]
pub struct Pump {
    pub(crate) core: EquipmentCore,
    /// (flow, head) points ordered by increasing flow.
    pub curve: Vec<(VolumeRate, Length)>,
    /// Relative speed (1.0 = nominal)
    pub speed: f64,
    pub elevation: Length,

    pub flowrate: Option<VolumeRate>,
    /// Pressure-equivalent head gain (outlet minus inlet).
    pub head_gain: Option<Pressure>,
}

impl Pump {
    /// Create a new pump at nominal speed.
    pub fn new(
        id: &str,
        curve: Vec<(VolumeRate, Length)>,
        elevation: Length,
    ) -> EquipmentResult<Self> {
        if curve.is_empty() {
            return Err(EquipmentError::construction(format!(
                "pump '{id}': head curve needs at least one point"
            )));
        }
        if curve
            .iter()
            .any(|(q, h)| !q.value.is_finite() || !h.value.is_finite() || q.value < 0.0)
        {
            return Err(EquipmentError::construction(format!(
                "pump '{id}': curve points must be finite with non-negative flow"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 2)?,
            curve,
            speed: 1.0,
            elevation,
            flowrate: None,
            head_gain: None,
        })
    }

    /// Set the relative speed used for affinity scaling.
    pub fn with_speed(mut self, speed: f64) -> EquipmentResult<Self> {
        if !(speed.is_finite() && speed > 0.0) {
            return Err(EquipmentError::construction(format!(
                "pump '{}': speed must be positive",
                self.core.id()
            )));
        }
        self.speed = speed;
        Ok(self)
    }
}

impl HydraulicEquivalent for Pump {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let inlet = self.core.port_junction(ctx.port_nodes, 1, self.elevation)?;
        let outlet = self.core.port_junction(ctx.port_nodes, 2, self.elevation)?;
        let curve = self
            .curve
            .iter()
            .map(|(q, h)| CurvePoint::new(q.value, h.value))
            .collect();
        let link = PumpLink::new(self.core.id(), inlet.id.clone(), outlet.id.clone(), curve)
            .with_speed(self.speed);
        Ok(vec![inlet.into(), outlet.into(), link.into()])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.flowrate = solved
            .link_result(self.core.id())
            .map(|r| m3ps(r.flowrate_m3s));
        let n1 = self.core.harvest_port(1, solved, port_nodes);
        let n2 = self.core.harvest_port(2, solved, port_nodes);
        self.head_gain = match (n1, n2) {
            (Some(a), Some(b)) => Some(solved.head_difference_to_pressure(b.head_m - a.head_m)),
            _ => None,
        };
    }

    fn clear_results(&mut self) {
        self.flowrate = None;
        self.head_gain = None;
        self.core.clear_port_results();
    }

    fn fill_results(&self, bag: &mut ResultBag) {
        if let Some(q) = self.flowrate {
            bag.insert("flow_rate", q.value);
        }
        if let Some(g) = self.head_gain {
            bag.insert("head_gain", g.value);
        }
    }

    fn validate_parameters(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.curve.windows(2).any(|w| w[1].0 <= w[0].0) {
            problems.push(format!(
                "pump '{}': curve flows must be strictly increasing",
                self.core.id()
            ));
        }
        problems
    }
}
