//! Error types for solver operations.

use fc_core::FcError;
use fc_network::NetworkError;
use thiserror::Error;

/// Errors that can occur while solving a hydraulic network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Unsupported: {what}")]
    Unsupported { what: String },

    #[error("Solve cancelled")]
    Cancelled,

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for FcError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { .. } => FcError::InvalidArg {
                what: "problem setup",
            },
            SolverError::ConvergenceFailed { .. } => FcError::InvalidArg {
                what: "convergence",
            },
            SolverError::Numeric { .. } => FcError::InvalidArg { what: "numeric" },
            SolverError::Unsupported { .. } => FcError::InvalidArg {
                what: "unsupported",
            },
            SolverError::Cancelled => FcError::InvalidArg { what: "cancelled" },
            SolverError::Network(n) => n.into(),
        }
    }
}
