//! Progressive two-way valve and its opening characteristics.

use fc_core::converter::zeta_from_kv;
use fc_core::{Fluid, Length, ensure_in_range};
use fc_network::{HydraulicComponent, LinkStatus, SolvedNetwork, Valve as ValveLink, ValveType};
use serde::{Deserialize, Serialize};

use crate::common::{
    EquipmentCore, HydraulicEquivalent, LinkResults, PortNodeMap, ResultBag, TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};

/// Opening fraction below which the equal-percentage law turns linear.
pub const EQUAL_PERCENTAGE_SWITCH: f64 = 0.4;
/// Rangeability exponent of the equal-percentage law.
pub const EQUAL_PERCENTAGE_EXPONENT: f64 = 3.0;
/// Opening (%) at or above which a binary valve is open.
pub const BINARY_THRESHOLD: f64 = 50.0;

/// Valve inherent characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValveLaw {
    /// Kv = Kv_rated * opening
    #[default]
    Linear,
    /// Kv = Kv_rated * e^(n (x - 1)) above the switch point, linear below it
    EqualPercentage,
    /// Fully open at or above 50 %, closed otherwise
    Binary,
}

impl ValveLaw {
    /// Kv_eff / Kv_rated for an opening in percent.
    pub fn kv_fraction(self, opening_pct: f64) -> f64 {
        let x = opening_pct.clamp(0.0, 100.0) / 100.0;
        match self {
            ValveLaw::Linear => x,
            ValveLaw::EqualPercentage => {
                let exp = |x: f64| (EQUAL_PERCENTAGE_EXPONENT * (x - 1.0)).exp();
                if x < EQUAL_PERCENTAGE_SWITCH {
                    exp(EQUAL_PERCENTAGE_SWITCH) * x / EQUAL_PERCENTAGE_SWITCH
                } else {
                    exp(x)
                }
            }
            ValveLaw::Binary => {
                if opening_pct >= BINARY_THRESHOLD {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Link status for an opening in percent.
    pub fn status(self, opening_pct: f64) -> LinkStatus {
        match self {
            ValveLaw::Binary if opening_pct >= BINARY_THRESHOLD => LinkStatus::Open,
            ValveLaw::Binary => LinkStatus::Closed,
            _ if opening_pct <= 0.0 => LinkStatus::Closed,
            _ if opening_pct >= 100.0 => LinkStatus::Open,
            _ => LinkStatus::Active,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ValveLaw::Linear => "linear",
            ValveLaw::EqualPercentage => "equal_percentage",
            ValveLaw::Binary => "binary",
        }
    }
}

/// Reject an opening outside [0, 100] (or non-finite); the clamp after it is only a guard.
pub fn checked_opening(id: &str, opening_pct: f64) -> EquipmentResult<f64> {
    ensure_in_range(opening_pct, 0.0, 100.0, "valve opening")
        .map(|o| o.clamp(0.0, 100.0))
        .map_err(|e| EquipmentError::construction(format!("valve '{id}': {e}")))
}

/// Emit a throttle valve link for an opening and characteristic.
pub(crate) fn throttle_link(
    id: String,
    start: String,
    end: String,
    diameter: Length,
    kv_eff: f64,
    status: LinkStatus,
    fluid: &Fluid,
) -> EquipmentResult<ValveLink> {
    let zeta = zeta_from_kv(kv_eff, diameter, fluid)?;
    Ok(
        ValveLink::new(id, start, end, diameter.value, ValveType::Tcv, zeta)
            .with_minor_loss(zeta)
            .with_status(status),
    )
}

/// Two-way control valve between P1 and P2.
#[derive(Debug, Clone, PartialEq)]
pub struct Valve {
    pub(crate) core: EquipmentCore,
    pub diameter: Length,
    /// Rated flow coefficient (m³/h at 100 kPa)
    pub kv_rated: f64,
    /// Opening, 0 (closed) to 100 (fully open)
    opening: f64,
    pub law: ValveLaw,
    pub elevation: Length,
    pub results: LinkResults,
}

impl Valve {
    /// Create a new valve; the opening must lie in [0, 100].
    pub fn new(
        id: &str,
        diameter: Length,
        kv_rated: f64,
        opening: f64,
        law: ValveLaw,
        elevation: Length,
    ) -> EquipmentResult<Self> {
        if !(diameter.value.is_finite() && diameter.value > 0.0) {
            return Err(EquipmentError::construction(format!(
                "valve '{id}': diameter must be positive"
            )));
        }
        if !(kv_rated.is_finite() && kv_rated > 0.0) {
            return Err(EquipmentError::construction(format!(
                "valve '{id}': rated Kv must be positive"
            )));
        }
        let opening = checked_opening(id, opening)?;
        Ok(Self {
            core: EquipmentCore::new(id, 2)?,
            diameter,
            kv_rated,
            opening,
            law,
            elevation,
            results: LinkResults::default(),
        })
    }

    pub fn opening(&self) -> f64 {
        self.opening
    }

    /// Change the opening; invalid values leave the valve untouched.
    pub fn set_opening(&mut self, opening: f64) -> EquipmentResult<()> {
        self.opening = checked_opening(self.core.id(), opening)?;
        Ok(())
    }

    pub fn kv_effective(&self) -> f64 {
        self.kv_rated * self.law.kv_fraction(self.opening)
    }

    pub fn status(&self) -> LinkStatus {
        self.law.status(self.opening)
    }

    /// Loss coefficient equivalent to the effective Kv.
    pub fn zeta(&self, fluid: &Fluid) -> EquipmentResult<f64> {
        Ok(zeta_from_kv(self.kv_effective(), self.diameter, fluid)?)
    }
}

impl HydraulicEquivalent for Valve {
    fn core(&self) -> &EquipmentCore {
        &self.core
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        let j1 = self.core.port_junction(ctx.port_nodes, 1, self.elevation)?;
        let j2 = self.core.port_junction(ctx.port_nodes, 2, self.elevation)?;
        let link = throttle_link(
            self.core.id().to_string(),
            j1.id.clone(),
            j2.id.clone(),
            self.diameter,
            self.kv_effective(),
            self.status(),
            ctx.fluid,
        )?;
        Ok(vec![j1.into(), j2.into(), link.into()])
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        self.results.harvest(self.core.id(), None, solved);
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
    use fc_core::m;

    fn valve(opening: f64, law: ValveLaw) -> Valve {
        Valve::new("V", m(0.1), 100.0, opening, law, m(0.0)).unwrap()
    }

    #[test]
    fn linear_law_endpoints_and_midpoint() {
        let closed = valve(0.0, ValveLaw::Linear);
        assert_eq!(closed.status(), LinkStatus::Closed);
        assert_eq!(closed.kv_effective(), 0.0);

        let open = valve(100.0, ValveLaw::Linear);
        assert_eq!(open.status(), LinkStatus::Open);
        assert_eq!(open.kv_effective(), 100.0);

        let half = valve(50.0, ValveLaw::Linear);
        assert_eq!(half.status(), LinkStatus::Active);
        assert!((half.kv_effective() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn equal_percentage_is_continuous_at_switch() {
        let law = ValveLaw::EqualPercentage;
        let below = law.kv_fraction(39.999_999);
        let above = law.kv_fraction(40.0);
        assert!((below - above).abs() < 1e-6);
        assert!((law.kv_fraction(100.0) - 1.0).abs() < 1e-12);
        assert_eq!(law.kv_fraction(0.0), 0.0);
        // e^(3 * (0.7 - 1))
        assert!((law.kv_fraction(70.0) - (-0.9f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn binary_threshold() {
        assert_eq!(ValveLaw::Binary.status(49.9), LinkStatus::Closed);
        assert_eq!(ValveLaw::Binary.status(50.0), LinkStatus::Open);
        assert_eq!(ValveLaw::Binary.kv_fraction(49.9), 0.0);
        assert_eq!(ValveLaw::Binary.kv_fraction(75.0), 1.0);
    }

    #[test]
    fn out_of_range_opening_rejected() {
        for bad in [-1.0, 100.5, f64::NAN] {
            let err = Valve::new("V", m(0.1), 100.0, bad, ValveLaw::Linear, m(0.0)).unwrap_err();
            assert!(matches!(err, EquipmentError::Construction { .. }));
        }
        let mut v = valve(30.0, ValveLaw::Linear);
        assert!(v.set_opening(120.0).is_err());
        assert_eq!(v.opening(), 30.0);
    }

    #[test]
    fn smaller_opening_means_larger_zeta() {
        let fluid = Fluid::water();
        let z30 = valve(30.0, ValveLaw::Linear).zeta(&fluid).unwrap();
        let z80 = valve(80.0, ValveLaw::Linear).zeta(&fluid).unwrap();
        assert!(z30 > z80);
    }

    #[test]
    fn law_serde_names() {
        let law: ValveLaw = serde_json::from_str("\"equal_percentage\"").unwrap();
        assert_eq!(law, ValveLaw::EqualPercentage);
        assert_eq!(law.name(), "equal_percentage");
    }
}
