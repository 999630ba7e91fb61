//! fc-network: solver-facing hydraulic primitives and the network container.
//!
//! Equipment translation emits [`HydraulicComponent`]s which are merged into a
//! [`HydraulicNetwork`]. A solver consumes the network and returns
//! [`SimulationResults`]; the pair travels back as a [`SolvedNetwork`].

pub mod component;
pub mod error;
pub mod export;
pub mod network;
pub mod results;

pub use component::{
    CurvePoint, HydraulicComponent, Junction, Link, LinkStatus, Node, Pipe, Pump, Reservoir,
    Valve, ValveType,
};
pub use error::{NetworkError, NetworkResult};
pub use export::{INP_FLOW_UNITS, MODEL_FLOW_UNITS, SolverModel, SolverOptions};
pub use network::HydraulicNetwork;
pub use results::{LinkResult, NodeResult, SimulationResults, SolvedNetwork};
