//! Closed set of equipment kinds.

use std::fmt;
use std::str::FromStr;

use fc_network::{HydraulicComponent, SolvedNetwork};

use crate::boundary::{FlowRateBoundary, PressureBoundary};
use crate::common::{
    EquipmentCore, HydraulicEquivalent, PortNodeMap, ResultBag, TranslationContext,
};
use crate::error::{EquipmentError, EquipmentResult};
use crate::pipe::PipeConnection;
use crate::pump::Pump;
use crate::resistance::HydraulicResistance;
use crate::tee::Tee;
use crate::three_way::ThreeWayValve;
use crate::valve::Valve;

/// Equipment kind selector, as written in property bags and project files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipmentKind {
    Pump,
    PressureBoundary,
    FlowRateBoundary,
    HydraulicResistance,
    Valve,
    ThreeWayValve,
    Pipe,
    Tee,
}

impl EquipmentKind {
    pub const ALL: [EquipmentKind; 8] = [
        EquipmentKind::Pump,
        EquipmentKind::PressureBoundary,
        EquipmentKind::FlowRateBoundary,
        EquipmentKind::HydraulicResistance,
        EquipmentKind::Valve,
        EquipmentKind::ThreeWayValve,
        EquipmentKind::Pipe,
        EquipmentKind::Tee,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EquipmentKind::Pump => "pump",
            EquipmentKind::PressureBoundary => "pressure_boundary",
            EquipmentKind::FlowRateBoundary => "flow_rate_boundary",
            EquipmentKind::HydraulicResistance => "hydraulic_resistance",
            EquipmentKind::Valve => "valve",
            EquipmentKind::ThreeWayValve => "three_way_valve",
            EquipmentKind::Pipe => "pipe",
            EquipmentKind::Tee => "tee",
        }
    }

    pub fn port_count(self) -> usize {
        match self {
            EquipmentKind::PressureBoundary | EquipmentKind::FlowRateBoundary => 1,
            EquipmentKind::ThreeWayValve | EquipmentKind::Tee => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for EquipmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EquipmentKind {
    type Err = EquipmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        EquipmentKind::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| EquipmentError::translation(format!("unknown equipment type '{s}'")))
    }
}

/// One equipment instance of any kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Equipment {
    Pump(Pump),
    PressureBoundary(PressureBoundary),
    FlowRateBoundary(FlowRateBoundary),
    HydraulicResistance(HydraulicResistance),
    Valve(Valve),
    ThreeWayValve(ThreeWayValve),
    Pipe(PipeConnection),
    Tee(Tee),
}

macro_rules! dispatch {
    ($self:expr, $eq:ident => $body:expr) => {
        match $self {
            Equipment::Pump($eq) => $body,
            Equipment::PressureBoundary($eq) => $body,
            Equipment::FlowRateBoundary($eq) => $body,
            Equipment::HydraulicResistance($eq) => $body,
            Equipment::Valve($eq) => $body,
            Equipment::ThreeWayValve($eq) => $body,
            Equipment::Pipe($eq) => $body,
            Equipment::Tee($eq) => $body,
        }
    };
}

macro_rules! impl_from_kind {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Equipment {
                fn from(eq: $ty) -> Self {
                    Equipment::$variant(eq)
                }
            }
        )*
    };
}

impl_from_kind!(
    Pump(Pump),
    PressureBoundary(PressureBoundary),
    FlowRateBoundary(FlowRateBoundary),
    HydraulicResistance(HydraulicResistance),
    Valve(Valve),
    ThreeWayValve(ThreeWayValve),
    Pipe(PipeConnection),
    Tee(Tee),
);

impl Equipment {
    pub fn kind(&self) -> EquipmentKind {
        match self {
            Equipment::Pump(_) => EquipmentKind::Pump,
            Equipment::PressureBoundary(_) => EquipmentKind::PressureBoundary,
            Equipment::FlowRateBoundary(_) => EquipmentKind::FlowRateBoundary,
            Equipment::HydraulicResistance(_) => EquipmentKind::HydraulicResistance,
            Equipment::Valve(_) => EquipmentKind::Valve,
            Equipment::ThreeWayValve(_) => EquipmentKind::ThreeWayValve,
            Equipment::Pipe(_) => EquipmentKind::Pipe,
            Equipment::Tee(_) => EquipmentKind::Tee,
        }
    }

    /// Ports are only rewired through [`crate::NetworkEquipment`].
    pub(crate) fn core_mut(&mut self) -> &mut EquipmentCore {
        dispatch!(self, eq => &mut eq.core)
    }

    /// Boundaries fix node state (head or demand) and are translated first so
    /// their node wins the merge of a shared connection node.
    pub fn is_boundary(&self) -> bool {
        matches!(
            self,
            Equipment::PressureBoundary(_) | Equipment::FlowRateBoundary(_)
        )
    }
}

impl HydraulicEquivalent for Equipment {
    fn core(&self) -> &EquipmentCore {
        dispatch!(self, eq => eq.core())
    }

    fn generate_hydraulic_representation(
        &self,
        ctx: &TranslationContext<'_>,
    ) -> EquipmentResult<Vec<HydraulicComponent>> {
        dispatch!(self, eq => eq.generate_hydraulic_representation(ctx))
    }

    fn get_simulation_results(&mut self, solved: &SolvedNetwork, port_nodes: &PortNodeMap) {
        dispatch!(self, eq => eq.get_simulation_results(solved, port_nodes))
    }

    fn clear_results(&mut self) {
        dispatch!(self, eq => eq.clear_results())
    }

    fn fill_results(&self, bag: &mut ResultBag) {
        dispatch!(self, eq => eq.fill_results(bag))
    }

    fn validate_parameters(&self) -> Vec<String> {
        dispatch!(self, eq => eq.validate_parameters())
    }
}

impl fmt::Display for Equipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} '{}'", self.kind(), self.id())?;
        for port in self.core().ports() {
            writeln!(f, "  {port}")?;
        }
        for (name, value) in self.result_bag() {
            writeln!(f, "  {name} = {value:.6}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fc_core::{bar, m};

    #[test]
    fn kind_names_parse_back() {
        for kind in EquipmentKind::ALL {
            assert_eq!(kind.name().parse::<EquipmentKind>().unwrap(), kind);
        }
        assert!(matches!(
            "turbine".parse::<EquipmentKind>(),
            Err(EquipmentError::Translation { .. })
        ));
    }

    #[test]
    fn dispatch_reaches_variant() {
        let eq: Equipment = PressureBoundary::new("BC", bar(1.0), m(0.0)).unwrap().into();
        assert_eq!(eq.kind(), EquipmentKind::PressureBoundary);
        assert_eq!(eq.id(), "BC");
        assert!(eq.is_boundary());
        assert_eq!(eq.core().port_count(), eq.kind().port_count());
        assert!(eq.validate().is_empty());
        assert!(eq.result_bag().is_empty());
    }
}
