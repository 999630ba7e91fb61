//! Singular-loss device (heat exchanger, strainer, simple valve, ...).

use fc_core::{Length, mm};
use fc_network::{HydraulicComponent, LinkStatus, Pipe, SolvedNetwork};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, LinkResults, NEGLIGIBLE_LENGTH_M, PortNodeMap, ResultBag,
    TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};
use crate::valve::{BINARY_THRESHOLD, checked_opening};

/// Roughness of the short pipe standing in for a singular loss (mm).
const RESISTANCE_ROUGHNESS_MM: f64 = 1e-6;

/// A point loss ζ between P1 and P2, modelled as a very short smooth pipe.
#[derive(Debug, Clone, PartialEq)]
pub struct HydraulicResistance {
    pub(crate) core: EquipmentCore,
    pub diameter: Length,
    /// Minor-loss coefficient
    pub zeta: f64,
    pub elevation: Length,
    /// Blocks reverse flow; always open in the forward direction.
    pub check_valve: bool,
    /// Opening (%) for controllable devices; `None` for fixed ones.
    opening: Option<f64>,
    pub results: LinkResults,
}

impl HydraulicResistance {
    /// Create a new fixed resistance.
    pub fn new(id: &str, diameter: Length, zeta: f64, elevation: Length) -> EquipmentResult<Self> {
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "resistance '{id}': diameter must be positive"
            )));
        }
        if !(zeta.is_finite() && zeta >= 0.0) {
            return Err(EquipmentError::construction(format!(
                "resistance '{id}': zeta must be non-negative"
            )));
        }
        Ok(Self {
            core: EquipmentCore::new(id, 2)?,
            diameter,
            zeta,
            elevation,
            check_valve: false,
            opening: None,
            results: LinkResults::default(),
        })
    }

    /// Mark the device as a check valve.
    pub fn with_check_valve(mut self) -> Self {
        self.check_valve = true;
        self
    }

    /// Make the device controllable by an on/off opening.
    pub fn with_opening(mut self, opening: f64) -> EquipmentResult<Self> {
        self.opening = Some(checked_opening(self.core.id(), opening)?);
        Ok(self)
    }

    pub fn opening(&self) -> Option<f64> {
        self.opening
    }

    /// Open unless a controllable device is below the 50 % threshold.
    pub fn status(&self) -> LinkStatus {
        if self.check_valve {
            return LinkStatus::Open;
        }
        match self.opening {
            Some(o) if o < BINARY_THRESHOLD => LinkStatus::Closed,
            _ => LinkStatus::Open,
        }
    }
}

impl HydraulicEquivalent for HydraulicResistance {
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
            NEGLIGIBLE_LENGTH_M,
            self.diameter.value,
            mm(RESISTANCE_ROUGHNESS_MM).value,
        )
        .with_minor_loss(self.zeta)
        .with_status(self.status())
        .with_check_valve(self.check_valve);
        Ok(vec![j1.into(), j2.into(), pipe.into()])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.results
            .harvest(self.core.id(), Some(NEGLIGIBLE_LENGTH_M), solved);
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

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{Fluid, m};
    use fc_network::Link;

    #[test]
    fn status_rules() {
        let fixed = HydraulicResistance::new("R", m(0.1), 2.0, m(0.0)).unwrap();
        assert_eq!(fixed.status(), LinkStatus::Open);

        let shut = fixed.clone().with_opening(20.0).unwrap();
        assert_eq!(shut.status(), LinkStatus::Closed);
        let open = fixed.clone().with_opening(50.0).unwrap();
        assert_eq!(open.status(), LinkStatus::Open);

        let cv = fixed.with_opening(10.0).unwrap().with_check_valve();
        assert_eq!(cv.status(), LinkStatus::Open);
    }

    #[test]
    fn emits_short_pipe_with_minor_loss() {
        let r = HydraulicResistance::new("HX", m(0.08), 4.5, m(0.0))
            .unwrap()
            .with_check_valve();
        let map = PortNodeMap::from([
            ("HX_P1".to_string(), "a".to_string()),
            ("HX_P2".to_string(), "b".to_string()),
        ]);
        let fluid = Fluid::water();
        let parts = r
            .generate_hydraulic_representation(&TranslationContext {
                port_nodes: &map,
                fluid: &fluid,
            })
            .unwrap();
        let HydraulicComponent::Link(Link::Pipe(p)) = &parts[2] else {
            panic!("expected pipe");
        };
        assert_eq!(p.length_m, NEGLIGIBLE_LENGTH_M);
        assert_eq!(p.minor_loss, 4.5);
        assert!(p.check_valve);
        assert!((p.roughness_m - 1e-9).abs() < 1e-15);
    }

    #[test]
    fn negative_zeta_rejected() {
        assert!(HydraulicResistance::new("R", m(0.1), -1.0, m(0.0)).is_err());
        assert!(HydraulicResistance::new("R", m(0.0), 1.0, m(0.0)).is_err());
    }
}
