//! fc-solver: the steady-state solver boundary.
//!
//! [`HydraulicSolver`] is the seam between the translation engine and
//! whatever computes the hydraulic snapshot. [`NewtonSolver`] is the built-in
//! implementation: Darcy-Weisbach pipes, quadratic minor losses, pump curves
//! with affinity scaling, throttle valves and check valves.

pub mod cancel;
pub mod config;
pub mod error;
pub mod laws;
pub mod newton;
pub mod steady;

pub use cancel::CancelToken;
pub use config::SolverConfig;
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult};
pub use steady::NewtonSolver;

use fc_network::{HydraulicNetwork, SimulationResults};

/// A steady-state hydraulic solver.
///
/// Implementations must not keep partial state between calls; a failed solve
/// returns an error and no results.
pub trait HydraulicSolver: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Solve one steady snapshot of `network`.
    fn solve(
        &self,
        network: &HydraulicNetwork,
        cancel: &CancelToken,
    ) -> SolverResult<SimulationResults>;

    /// Like [`solve`](Self::solve), reporting `(iteration, residual norm)`
    /// as the solver goes. Solvers without iterations report nothing.
    fn solve_with_progress(
        &self,
        network: &HydraulicNetwork,
        cancel: &CancelToken,
        on_iteration: &mut dyn FnMut(usize, f64),
    ) -> SolverResult<SimulationResults> {
        let _ = on_iteration;
        self.solve(network, cancel)
    }
}
