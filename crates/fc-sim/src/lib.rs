//! fc-sim: simulation runs over an equipment network.
//!
//! [`SimulationManager`] owns the [`NetworkEquipment`](fc_equipment::NetworkEquipment),
//! rebuilds the hydraulic network from scratch on every run, hands it to a
//! [`HydraulicSolver`](fc_solver::HydraulicSolver) and writes the results back
//! onto the equipment only when every stage succeeded.

pub mod error;
pub mod manager;
pub mod progress;

pub use error::{SimError, SimResult};
pub use manager::{RunReport, SimOptions, SimulationManager};
pub use progress::{SimProgressEvent, SimState, SolveProgress};
