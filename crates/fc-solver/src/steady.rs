//! Built-in steady-state solver.
//!
//! Unknowns are the flow in every link and the head at every junction;
//! reservoir heads are fixed. The equations are one head balance per link
//! and one continuity balance per junction.

use nalgebra::{DMatrix, DVector};
use tracing::{debug, info, warn};

use fc_core::converter::head_to_pressure;
use fc_core::{Tolerances, m, nearly_equal};
use fc_network::{HydraulicNetwork, LinkResult, Node, NodeResult, SimulationResults};

use crate::cancel::CancelToken;
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::laws::{LinkLaw, link_velocity};
use crate::newton::{NewtonConfig, newton_solve};
use crate::HydraulicSolver;

/// Newton-Raphson solver over link flows and junction heads.
#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    pub config: SolverConfig,
}

impl NewtonSolver {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

/// Index bookkeeping shared by the residual and Jacobian closures.
struct Layout {
    /// For each node: column of its head unknown, or its fixed head.
    heads: Vec<HeadSlot>,
    /// `(start node, end node)` positions per link.
    ends: Vec<(usize, usize)>,
    demands: Vec<f64>,
    laws: Vec<LinkLaw>,
    /// Continuity rows are multiplied by this so both row kinds share one tolerance.
    flow_scale: f64,
    min_flow: f64,
}

#[derive(Clone, Copy)]
enum HeadSlot {
    Unknown(usize),
    Fixed(f64),
}

impl Layout {
    fn head(&self, x: &DVector<f64>, node: usize) -> f64 {
        match self.heads[node] {
            HeadSlot::Unknown(col) => x[col],
            HeadSlot::Fixed(h) => h,
        }
    }

    fn residual(&self, x: &DVector<f64>) -> DVector<f64> {
        let mut r = DVector::zeros(x.len());
        for (i, (&(s, e), law)) in self.ends.iter().zip(&self.laws).enumerate() {
            let q = x[i];
            r[i] = self.head(x, s) - self.head(x, e) - law.headloss(q);
        }
        for (node, slot) in self.heads.iter().enumerate() {
            if let HeadSlot::Unknown(col) = *slot {
                r[col] = -self.demands[node];
            }
        }
        for (i, &(s, e)) in self.ends.iter().enumerate() {
            let q = x[i];
            if let HeadSlot::Unknown(col) = self.heads[s] {
                r[col] -= q;
            }
            if let HeadSlot::Unknown(col) = self.heads[e] {
                r[col] += q;
            }
        }
        for slot in &self.heads {
            if let HeadSlot::Unknown(col) = *slot {
                r[col] *= self.flow_scale;
            }
        }
        r
    }

    fn jacobian(&self, x: &DVector<f64>) -> DMatrix<f64> {
        let n = x.len();
        let mut jac = DMatrix::zeros(n, n);
        for (i, (&(s, e), law)) in self.ends.iter().zip(&self.laws).enumerate() {
            jac[(i, i)] = -law.slope(x[i], self.min_flow);
            if let HeadSlot::Unknown(col) = self.heads[s] {
                jac[(i, col)] += 1.0;
                jac[(col, i)] -= self.flow_scale;
            }
            if let HeadSlot::Unknown(col) = self.heads[e] {
                jac[(i, col)] -= 1.0;
                jac[(col, i)] += self.flow_scale;
            }
        }
        jac
    }
}

impl HydraulicSolver for NewtonSolver {
    fn name(&self) -> &str {
        "newton"
    }

    fn solve(
        &self,
        network: &HydraulicNetwork,
        cancel: &CancelToken,
    ) -> SolverResult<SimulationResults> {
        self.solve_with_progress(network, cancel, &mut |_: usize, _: f64| {})
    }

    fn solve_with_progress(
        &self,
        network: &HydraulicNetwork,
        cancel: &CancelToken,
        on_iteration: &mut dyn FnMut(usize, f64),
    ) -> SolverResult<SimulationResults> {
        let cfg = &self.config;

        let floating = network.groups_without_reservoir();
        if let Some(group) = floating.first() {
            let ids: Vec<&str> = group.iter().map(|&i| network.nodes()[i].id()).collect();
            return Err(SolverError::ProblemSetup {
                what: format!("no reservoir reachable from nodes [{}]", ids.join(", ")),
            });
        }

        let n_links = network.link_count();
        let mut heads = Vec::with_capacity(network.node_count());
        let mut demands = Vec::with_capacity(network.node_count());
        let mut next_col = n_links;
        let mut fixed_sum = 0.0;
        let mut fixed_count = 0usize;
        for node in network.nodes() {
            match node {
                Node::Junction(j) => {
                    heads.push(HeadSlot::Unknown(next_col));
                    demands.push(j.demand_m3s);
                    next_col += 1;
                }
                Node::Reservoir(r) => {
                    heads.push(HeadSlot::Fixed(r.head_m));
                    demands.push(0.0);
                    fixed_sum += r.head_m;
                    fixed_count += 1;
                }
            }
        }

        let mut ends = Vec::with_capacity(n_links);
        let mut laws = Vec::with_capacity(n_links);
        for link in network.links() {
            let position = |id: &str| {
                network
                    .node_position(id)
                    .ok_or_else(|| SolverError::ProblemSetup {
                        what: format!("link '{}' refers to unknown node '{id}'", link.id()),
                    })
            };
            ends.push((position(link.start_node())?, position(link.end_node())?));
            laws.push(LinkLaw::from_link(link, network.fluid(), cfg)?);
        }

        let layout = Layout {
            heads,
            ends,
            demands,
            laws,
            flow_scale: cfg.head_tol / cfg.flow_tol,
            min_flow: cfg.min_flow,
        };

        let n = next_col;
        let initial_head = if fixed_count > 0 {
            fixed_sum / fixed_count as f64
        } else {
            0.0
        };
        let x = DVector::from_fn(n, |i, _| {
            if i < n_links {
                cfg.initial_flow
            } else {
                initial_head
            }
        });

        info!(
            nodes = network.node_count(),
            links = n_links,
            unknowns = n,
            "steady solve started"
        );

        let (x, iterations) = if n == 0 {
            (x, 0)
        } else {
            let newton_cfg = NewtonConfig {
                max_iterations: cfg.max_iterations,
                abs_tol: cfg.head_tol,
                line_search_beta: cfg.line_search_beta,
                max_line_search_iters: cfg.max_line_search_iters,
            };
            let result = newton_solve(
                x,
                |x| layout.residual(x),
                |x| layout.jacobian(x),
                &newton_cfg,
                cancel,
                |iter, res| {
                    debug!(iteration = iter, residual = res, "newton residual");
                    on_iteration(iter, res);
                },
            )?;
            (result.x, result.iterations)
        };

        info!(iterations, "steady solve converged");
        let results = collect_results(network, &layout, &x, iterations);
        if !mass_balanced(&results, cfg) {
            warn!(iterations, "converged solution does not conserve mass");
        }
        Ok(results)
    }
}

/// Net demand over all nodes (reservoirs included) vanishes within the
/// continuity tolerance.
fn mass_balanced(results: &SimulationResults, cfg: &SolverConfig) -> bool {
    let total: f64 = results.nodes.values().map(|n| n.demand_m3s).sum();
    let tol = Tolerances {
        abs: cfg.flow_tol * results.nodes.len().max(1) as f64,
        ..Tolerances::default()
    };
    nearly_equal(total, 0.0, tol)
}

fn collect_results(
    network: &HydraulicNetwork,
    layout: &Layout,
    x: &DVector<f64>,
    iterations: usize,
) -> SimulationResults {
    let mut results = SimulationResults {
        iterations,
        ..SimulationResults::default()
    };

    let mut net_inflow = vec![0.0; network.node_count()];
    for (i, link) in network.links().iter().enumerate() {
        let q = x[i];
        let (s, e) = layout.ends[i];
        net_inflow[s] -= q;
        net_inflow[e] += q;
        results.links.insert(
            link.id().to_string(),
            LinkResult {
                flowrate_m3s: q,
                velocity_mps: link_velocity(link, q),
                headloss_m: layout.head(x, s) - layout.head(x, e),
                friction_factor: layout.laws[i].friction_factor(q),
            },
        );
    }

    for (i, node) in network.nodes().iter().enumerate() {
        let head = layout.head(x, i);
        let demand = match node {
            Node::Junction(j) => j.demand_m3s,
            Node::Reservoir(_) => net_inflow[i],
        };
        results.nodes.insert(
            node.id().to_string(),
            NodeResult {
                head_m: head,
                pressure_pa: head_to_pressure(m(head), m(node.elevation_m()), network.fluid()).value,
                demand_m3s: demand,
            },
        );
    }
    results
}
