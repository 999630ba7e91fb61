//! Boundary conditions: imposed pressure or imposed flow at a single port.

use fc_core::converter::pressure_to_head;
use fc_core::{Length, Pressure, VolumeRate};
use fc_network::{HydraulicComponent, Reservoir, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, PortNodeMap, ResultBag, TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};

/// Fixed pressure at elevation, translated to a reservoir of equivalent head.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureBoundary {
    pub(crate) core: EquipmentCore,
    /// Gauge pressure
    pub pressure: Pressure,
    pub elevation: Length,
}

impl PressureBoundary {
    /// Create a new pressure boundary with a single port.
    pub fn new(id: &str, pressure: Pressure, elevation: Length) -> EquipmentResult<Self> {
        if !pressure.value.is_finite() || !elevation.value.is_finite() {
            return Err(EquipmentError::construction(format!(
                "pressure boundary '{id}': pressure and elevation must be finite"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 1)?,
            pressure,
            elevation,
        })
    }
}

impl HydraulicEquivalent for PressureBoundary {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let node = self.core.node_for(ctx.port_nodes, 1)?;
        let head = pressure_to_head(self.pressure, self.elevation, ctx.fluid);
        Ok(vec![
            Reservoir::new(node, head.value, self.elevation.value).into(),
        ])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.core.harvest_port(1, solved, port_nodes);
    }

    fn clear_results(&mut self) {
        self.core.clear_port_results();
    }

    fn fill_results(&self, _bag: &mut ResultBag) {}
}

/// Imposed volumetric flow; positive injects fluid into the network.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowRateBoundary {
    pub(crate) core: EquipmentCore,
    pub flowrate: VolumeRate,
    pub elevation: Length,
}

impl FlowRateBoundary {
    /// Create a new flow boundary with a single port.
    pub fn new(id: &str, flowrate: VolumeRate, elevation: Length) -> EquipmentResult<Self> {
        if !flowrate.value.is_finite() || !elevation.value.is_finite() {
            return Err(EquipmentError::construction(format!(
                "flow boundary '{id}': flow rate and elevation must be finite"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 1)?,
            flowrate,
            elevation,
        })
    }
}

impl HydraulicEquivalent for FlowRateBoundary {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        // Negative demand is an injection.
        let junction = self
            .core
            .port_junction(ctx.port_nodes, 1, self.elevation)?
            .with_demand(-self.flowrate.value);
        Ok(vec![junction.into()])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.core.harvest_port(1, solved, port_nodes);
    }

    fn clear_results(&mut self) {
        self.core.clear_port_results();
    }

    fn fill_results(&self, _bag: &mut ResultBag) {}
}
