//! Straight pipe between two equipment.

use fc_core::Length;
use fc_network::{HydraulicComponent, Pipe, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, LinkResults, PortNodeMap, ResultBag, TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};

/// Pipe from P1 to P2 with Darcy-Weisbach friction.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeConnection {
    pub(crate) core: EquipmentCore,
    pub length: Length,
    pub diameter: Length,
    /// Absolute wall roughness
    pub roughness: Length,
    pub elevation: Length,
    pub results: LinkResults,
}

impl PipeConnection {
    /// Create a new pipe. Length and diameter must be positive, roughness non-negative.
    pub fn new(
        id: &str,
        length: Length,
        diameter: Length,
        roughness: Length,
        elevation: Length,
    ) -> EquipmentResult<Self> {
        if !(length.value.is_finite() && length.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "pipe '{id}': length must be positive"
            )));
        }
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "pipe '{id}': diameter must be positive"
            )));
        }
        if !(roughness.value.is_finite() && roughness.value >= 0.0) {
            return Err(EquipmentError::construction(format!(
                "pipe '{id}': roughness must be non-negative"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 2)?,
            length,
            diameter,
            roughness,
            elevation,
            results: LinkResults::default(),
        })
    }
}

impl HydraulicEquivalent for PipeConnection {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let j1 = self.core.port_junction(ctx.port_nodes, 1, self.elevation)?;
        let j2 = self.core.port_junction(ctx.port_nodes, 2, self.elevation)?;
        let pipe = Pipe::new(
            self.core.id(),
            j1.id.clone(),
            j2.id.clone(),
            self.length.value,
            self.diameter.value,
            self.roughness.value,
        );
        Ok(vec![j1.into(), j2.into(), pipe.into()])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.results
            .harvest(self.core.id(), Some(self.length.value), solved);
        self.core.harvest_port(1, solved, port_nodes);
        self.core.harvest_port(2, solved, port_nodes);
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.core.clear_port_results();
    }

    fn fill_results(&self, bag: &mut ResultBag) {
        self.results.fill(bag);
    }
}
