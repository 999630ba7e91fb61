//! Integration test for the built-in steady solver on a branched network.

use fc_network::{HydraulicNetwork, Junction, Link, Node, Pipe, Reservoir, Valve, ValveType};
use fc_solver::{CancelToken, HydraulicSolver, NewtonSolver, SolverError};

fn branched() -> HydraulicNetwork {
    // R1 (40 m) -> J -> { R2 (20 m), R3 (10 m) }
    let mut net = HydraulicNetwork::default();
    net.add_node(Node::Reservoir(Reservoir::new("R1", 40.0, 0.0))).unwrap();
    net.add_node(Node::Junction(Junction::new("J", 0.0))).unwrap();
    net.add_node(Node::Reservoir(Reservoir::new("R2", 20.0, 0.0))).unwrap();
    net.add_node(Node::Reservoir(Reservoir::new("R3", 10.0, 0.0))).unwrap();
    net.add_link(Link::Pipe(Pipe::new("P1", "R1", "J", 100.0, 0.15, 1e-4))).unwrap();
    net.add_link(Link::Pipe(Pipe::new("P2", "J", "R2", 50.0, 0.1, 1e-4))).unwrap();
    net.add_link(Link::Valve(Valve::new("V3", "J", "R3", 0.1, ValveType::Tcv, 10.0))).unwrap();
    net
}

#[test]
fn flows_balance_at_junction() {
    let net = branched();
    let res = NewtonSolver::default().solve(&net, &CancelToken::new()).unwrap();

    let q1 = res.link("P1").unwrap().flowrate_m3s;
    let q2 = res.link("P2").unwrap().flowrate_m3s;
    let q3 = res.link("V3").unwrap().flowrate_m3s;
    assert!(q1 > 0.0);
    assert!((q1 - q2 - q3).abs() < 1e-8, "q1={q1} q2={q2} q3={q3}");

    let hj = res.node("J").unwrap().head_m;
    assert!(hj < 40.0 && hj > 10.0);
    // Friction factor reported for pipes only
    assert!(res.link("P1").unwrap().friction_factor > 0.0);
    assert_eq!(res.link("V3").unwrap().friction_factor, 0.0);
}

#[test]
fn active_pressure_valve_is_unsupported() {
    let mut net = HydraulicNetwork::default();
    net.add_node(Node::Reservoir(Reservoir::new("R1", 40.0, 0.0))).unwrap();
    net.add_node(Node::Reservoir(Reservoir::new("R2", 20.0, 0.0))).unwrap();
    net.add_link(Link::Valve(Valve::new("V", "R1", "R2", 0.1, ValveType::Prv, 30.0))).unwrap();
    let err = NewtonSolver::default().solve(&net, &CancelToken::new()).unwrap_err();
    assert!(matches!(err, SolverError::Unsupported { .. }));
}
