//! Error types for simulation runs.

use fc_equipment::EquipmentError;
use fc_solver::SolverError;
use thiserror::Error;

/// Why a run was refused or aborted. Results are never partially written.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("A simulation run is already in progress")]
    Busy,

    #[error("Assembly failed: {0}")]
    Assembly(#[from] EquipmentError),

    #[error("Validation failed: {}", problems.join("; "))]
    Validation { problems: Vec<String> },

    #[error("Solver error: {0}")]
    Solver(SolverError),

    #[error("Run cancelled")]
    Cancelled,
}

pub type SimResult<T> = Result<T, SimError>;

impl From<SolverError> for SimError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::Cancelled => SimError::Cancelled,
            other => SimError::Solver(other),
        }
    }
}
