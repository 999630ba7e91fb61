//! fc-equipment: user-level hydraulic equipment and its translation to solver primitives.
//!
//! Equipment owns ports and knows two things:
//! - how to emit its equivalent circuit of junctions, reservoirs, pipes,
//!   pumps and valves ([`HydraulicEquivalent::generate_hydraulic_representation`])
//! - how to read its own results back from a solved network
//!   ([`HydraulicEquivalent::get_simulation_results`])
//!
//! [`NetworkEquipment`] holds the equipment graph and the port connection registry.
//!
//! # Example
//!
//! ```no_run
//! use fc_core::{Fluid, bar, m, mm};
//! use fc_equipment::{NetworkEquipment, PipeConnection, PressureBoundary};
//!
//! let mut net = NetworkEquipment::new("demo").unwrap();
//! net.add_equipment(PressureBoundary::new("High", bar(3.0), m(0.0)).unwrap()).unwrap();
//! net.add_equipment(PipeConnection::new("Pipe1", m(20.0), m(0.15), mm(0.1), m(0.0)).unwrap()).unwrap();
//! net.add_equipment(PressureBoundary::new("Low", bar(1.0), m(0.0)).unwrap()).unwrap();
//! net.connect_equipments("High", "High_P1", "Pipe1", "Pipe1_P1").unwrap();
//! net.connect_equipments("Pipe1", "Pipe1_P2", "Low", "Low_P1").unwrap();
//!
//! assert!(net.validate_flowcad().is_empty());
//! let hydraulic = net.to_hydraulic_network(&Fluid::water()).unwrap();
//! assert_eq!(hydraulic.link_count(), 1);
//! ```

pub mod boundary;
pub mod common;
pub mod equipment;
pub mod error;
pub mod factory;
pub mod network;
pub mod pipe;
pub mod port;
pub mod pump;
pub mod resistance;
pub mod tee;
pub mod three_way;
pub mod valve;

pub use boundary::{FlowRateBoundary, PressureBoundary};
pub use common::{
    EquipmentCore, HydraulicEquivalent, LinkResults, NEGLIGIBLE_LENGTH_M, PortNodeMap, ResultBag,
    TranslationContext,
};
pub use equipment::{Equipment, EquipmentKind};
pub use error::{EquipmentError, EquipmentResult};
pub use factory::EquipmentDef;
pub use network::NetworkEquipment;
pub use pipe::PipeConnection;
pub use port::{Port, PortPeer};
pub use pump::Pump;
pub use resistance::HydraulicResistance;
pub use tee::{BranchFlows, Tee};
pub use three_way::ThreeWayValve;
pub use valve::{Valve, ValveLaw};
