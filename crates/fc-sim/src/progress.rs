//! Run stages and progress events.

use std::fmt;

/// Where the manager is in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SimState {
    #[default]
    Idle,
    Assembling,
    Validating,
    Solving,
    Harvesting,
}

impl fmt::Display for SimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SimState::Idle => "idle",
            SimState::Assembling => "assembling",
            SimState::Validating => "validating",
            SimState::Solving => "solving",
            SimState::Harvesting => "harvesting",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolveProgress {
    pub iteration: Option<usize>,
    pub residual_norm: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SimProgressEvent {
    pub stage: SimState,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
    pub solve: Option<SolveProgress>,
}

impl SimProgressEvent {
    pub fn stage(stage: SimState, elapsed_wall_s: f64, message: impl Into<String>) -> Self {
        Self {
            stage,
            elapsed_wall_s,
            message: Some(message.into()),
            solve: None,
        }
    }

    pub fn iteration(&self) -> Option<usize> {
        self.solve.as_ref().and_then(|s| s.iteration)
    }
}
