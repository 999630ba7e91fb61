use serde::{Deserialize, Serialize};

/// Steady solver configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum Newton iterations
    pub max_iterations: usize,
    /// Largest acceptable head-balance residual on a link (m)
    pub head_tol: f64,
    /// Largest acceptable continuity residual at a junction (m³/s)
    pub flow_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Linear resistance given to closed links (m per m³/s)
    pub closed_resistance: f64,
    /// Flow below which link derivatives are evaluated at this magnitude (m³/s)
    pub min_flow: f64,
    /// Initial flow guess for every link (m³/s)
    pub initial_flow: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            head_tol: 1e-6,
            flow_tol: 1e-9,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
            closed_resistance: 1e8,
            min_flow: 1e-6,
            initial_flow: 1e-3,
        }
    }
}
