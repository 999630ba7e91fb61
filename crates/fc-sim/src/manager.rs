//! One-at-a-time simulation runs over a shared equipment network.
//!
//! A run goes Idle → Assembling → Validating → Solving → Harvesting → Idle.
//! Equipment results are written only in the Harvesting stage, after the
//! solver has succeeded, so an aborted run never leaves a mix of old and new
//! values behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use fc_core::Fluid;
use fc_equipment::NetworkEquipment;
use fc_network::SolvedNetwork;
use fc_solver::{CancelToken, HydraulicSolver, NewtonSolver, SolverConfig};
use tracing::{info, warn};

use crate::error::{SimError, SimResult};
use crate::progress::{SimProgressEvent, SimState, SolveProgress};

/// Options for [`SimulationManager`].
#[derive(Debug, Clone)]
pub struct SimOptions {
    /// Used to build the default solver.
    pub solver: SolverConfig,
    pub fluid: Fluid,
    /// Clear equipment results when a run aborts instead of keeping the last ones.
    pub clear_on_abort: bool,
    /// Abort on parameter problems found while validating. Unconnected ports
    /// always abort.
    pub strict_validation: bool,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            fluid: Fluid::water(),
            clear_on_abort: false,
            strict_validation: true,
        }
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub solved: SolvedNetwork,
    pub iterations: usize,
    pub elapsed_wall_s: f64,
}

/// Owns the equipment network and serialises runs and edits on it.
pub struct SimulationManager {
    network: Mutex<NetworkEquipment>,
    solver: Box<dyn HydraulicSolver>,
    options: SimOptions,
    state: Mutex<SimState>,
    running: AtomicBool,
    cancel: CancelToken,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn emit_progress(
    progress_cb: &mut Option<&mut dyn FnMut(SimProgressEvent)>,
    event: SimProgressEvent,
) {
    if let Some(cb) = progress_cb.as_deref_mut() {
        cb(event);
    }
}

/// Marks a run in flight; dropping it consumes any pending cancel and
/// returns the manager to Idle.
struct RunGuard<'a> {
    manager: &'a SimulationManager,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.manager.cancel.reset();
        self.manager.set_state(SimState::Idle);
        self.manager.running.store(false, Ordering::Release);
    }
}

impl SimulationManager {
    /// Manager using the built-in Newton solver configured from `options`.
    pub fn new(network: NetworkEquipment, options: SimOptions) -> Self {
        let solver = NewtonSolver::new(options.solver.clone());
        Self::with_solver(network, solver, options)
    }

    pub fn with_solver(
        network: NetworkEquipment,
        solver: impl HydraulicSolver + 'static,
        options: SimOptions,
    ) -> Self {
        Self {
            network: Mutex::new(network),
            solver: Box::new(solver),
            options,
            state: Mutex::new(SimState::Idle),
            running: AtomicBool::new(false),
            cancel: CancelToken::new(),
        }
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn solver_name(&self) -> &str {
        self.solver.name()
    }

    pub fn state(&self) -> SimState {
        *lock(&self.state)
    }

    fn set_state(&self, state: SimState) {
        *lock(&self.state) = state;
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Token that aborts the run in flight when cancelled.
    ///
    /// A cancel issued while no run is in flight aborts the next run before
    /// it translates anything. Every run, however it ends, clears the token.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Read the network. Blocks while a run holds it; do not call from a
    /// progress callback.
    pub fn read_network<R>(&self, f: impl FnOnce(&NetworkEquipment) -> R) -> R {
        f(&lock(&self.network))
    }

    /// Edit the network. Refused while a run is in flight.
    pub fn edit_network<R>(&self, f: impl FnOnce(&mut NetworkEquipment) -> R) -> SimResult<R> {
        if self.is_running() {
            return Err(SimError::Busy);
        }
        Ok(f(&mut lock(&self.network)))
    }

    pub fn into_network(self) -> NetworkEquipment {
        self.network
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn run(&self) -> SimResult<RunReport> {
        self.run_with_progress(None)
    }

    /// Run the whole pipeline, streaming progress events to `progress_cb`.
    pub fn run_with_progress(
        &self,
        mut progress_cb: Option<&mut dyn FnMut(SimProgressEvent)>,
    ) -> SimResult<RunReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("run refused: another run is in progress");
            return Err(SimError::Busy);
        }
        let _guard = RunGuard { manager: self };

        let started = Instant::now();
        let mut network = lock(&self.network);
        match self.execute(&mut network, started, &mut progress_cb) {
            Ok(report) => Ok(report),
            Err(e) => {
                warn!(network = %network.id(), error = %e, "simulation run aborted");
                if self.options.clear_on_abort {
                    network.clear_results();
                    warn!(network = %network.id(), "equipment results cleared");
                }
                Err(e)
            }
        }
    }

    fn enter(
        &self,
        state: SimState,
        started: Instant,
        progress_cb: &mut Option<&mut dyn FnMut(SimProgressEvent)>,
        message: impl Into<String>,
    ) {
        self.set_state(state);
        emit_progress(
            progress_cb,
            SimProgressEvent::stage(state, started.elapsed().as_secs_f64(), message),
        );
    }

    fn check_cancel(&self) -> SimResult<()> {
        if self.cancel.is_cancelled() {
            return Err(SimError::Cancelled);
        }
        Ok(())
    }

    fn execute(
        &self,
        network: &mut NetworkEquipment,
        started: Instant,
        progress_cb: &mut Option<&mut dyn FnMut(SimProgressEvent)>,
    ) -> SimResult<RunReport> {
        self.check_cancel()?;
        self.enter(
            SimState::Assembling,
            started,
            progress_cb,
            "Translating equipment network",
        );
        let unconnected = network.validate_flowcad();
        if !unconnected.is_empty() {
            return Err(SimError::Validation {
                problems: unconnected,
            });
        }
        let hydraulic = network.to_hydraulic_network(&self.options.fluid)?;
        self.check_cancel()?;

        self.enter(
            SimState::Validating,
            started,
            progress_cb,
            "Validating hydraulic network",
        );
        let mut problems = network.validate();
        problems.extend(hydraulic.validate());
        if !problems.is_empty() {
            if self.options.strict_validation {
                return Err(SimError::Validation { problems });
            }
            for problem in &problems {
                warn!(%problem, "validation problem ignored");
            }
        }
        self.check_cancel()?;

        self.enter(
            SimState::Solving,
            started,
            progress_cb,
            format!("Solving with {}", self.solver.name()),
        );
        info!(
            network = %network.id(),
            nodes = hydraulic.node_count(),
            links = hydraulic.link_count(),
            solver = self.solver.name(),
            "simulation run started"
        );
        let results = self.solver.solve_with_progress(
            &hydraulic,
            &self.cancel,
            &mut |iteration: usize, residual_norm: f64| {
                emit_progress(
                    progress_cb,
                    SimProgressEvent {
                        stage: SimState::Solving,
                        elapsed_wall_s: started.elapsed().as_secs_f64(),
                        message: None,
                        solve: Some(SolveProgress {
                            iteration: Some(iteration),
                            residual_norm: Some(residual_norm),
                        }),
                    },
                )
            },
        )?;
        self.check_cancel()?;

        self.enter(
            SimState::Harvesting,
            started,
            progress_cb,
            "Writing results to equipment",
        );
        let iterations = results.iterations;
        let solved = SolvedNetwork::new(hydraulic, results);
        network.get_results_from_hydraulic_network(&solved);

        let elapsed_wall_s = started.elapsed().as_secs_f64();
        info!(network = %network.id(), iterations, elapsed_wall_s, "simulation run finished");
        Ok(RunReport {
            solved,
            iterations,
            elapsed_wall_s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_network_fails_validation() {
        let manager = SimulationManager::new(
            NetworkEquipment::new("empty").unwrap(),
            SimOptions::default(),
        );
        let err = manager.run().unwrap_err();
        let SimError::Validation { problems } = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(problems.iter().any(|p| p.contains("no nodes")));
        assert_eq!(manager.state(), SimState::Idle);
        assert!(!manager.is_running());
    }

    #[test]
    fn solver_cancel_maps_to_cancelled() {
        let err: SimError = fc_solver::SolverError::Cancelled.into();
        assert!(matches!(err, SimError::Cancelled));
    }
}
