//! Integration test for equipment translation, solving and result harvesting.

use fc_core::converter::mce_to_pa;
use fc_core::{Fluid, bar, m, mm};
use fc_equipment::{
    Equipment, EquipmentDef, HydraulicEquivalent, NetworkEquipment, PipeConnection,
    PressureBoundary, Tee, ValveLaw,
};
use fc_network::{HydraulicNetwork, SolvedNetwork};
use fc_solver::{CancelToken, HydraulicSolver, NewtonSolver};
use uom::si::volume_rate::liter_per_second;

fn series_network() -> NetworkEquipment {
    let mut net = NetworkEquipment::new("Series").unwrap();
    net.add_equipment(PressureBoundary::new("High", bar(3.0), m(10.0)).unwrap())
        .unwrap();
    net.add_equipment(PressureBoundary::new("Low", bar(1.0), m(10.0)).unwrap())
        .unwrap();
    for id in ["Pipe1", "Pipe2"] {
        net.add_equipment(PipeConnection::new(id, m(20.0), m(0.15), mm(110.0), m(10.0)).unwrap())
            .unwrap();
    }
    net.connect_equipments("High", "High_P1", "Pipe1", "Pipe1_P1")
        .unwrap();
    net.connect_equipments("Pipe1", "Pipe1_P2", "Pipe2", "Pipe2_P1")
        .unwrap();
    net.connect_equipments("Pipe2", "Pipe2_P2", "Low", "Low_P1")
        .unwrap();
    net
}

fn solve(hydraulic: HydraulicNetwork) -> SolvedNetwork {
    let results = NewtonSolver::default()
        .solve(&hydraulic, &CancelToken::new())
        .unwrap();
    SolvedNetwork::new(hydraulic, results)
}

fn run(net: &mut NetworkEquipment) {
    run_with(net, &Fluid::water());
}

fn run_with(net: &mut NetworkEquipment, fluid: &Fluid) {
    let hydraulic = net.to_hydraulic_network(fluid).unwrap();
    let solved = solve(hydraulic);
    net.get_results_from_hydraulic_network(&solved);
}

fn pipe(net: &NetworkEquipment, id: &str) -> PipeConnection {
    match net.get(id) {
        Some(Equipment::Pipe(p)) => p.clone(),
        other => panic!("expected pipe '{id}', got {other:?}"),
    }
}

#[test]
fn series_pipes_share_connection_nodes() {
    let net = series_network();
    assert!(net.validate_flowcad().is_empty());
    assert!(net.validate().is_empty());

    let hydraulic = net.to_hydraulic_network(&Fluid::water()).unwrap();
    // Each connection is one node: High_P1/Pipe1_P1, Pipe1_P2/Pipe2_P1, Pipe2_P2/Low_P1
    assert_eq!(hydraulic.node_count(), 3);
    assert_eq!(hydraulic.link_count(), 2);
    assert!(hydraulic.node("High_P1_to_Pipe1_P1").unwrap().is_reservoir());
    assert!(hydraulic.node("Pipe2_P2_to_Low_P1").unwrap().is_reservoir());
    assert!(!hydraulic.node("Pipe1_P2_to_Pipe2_P1").unwrap().is_reservoir());
    assert!(hydraulic.validate().is_empty());
}

#[test]
fn flow_runs_from_high_to_low_pressure() {
    let mut net = series_network();
    run(&mut net);

    let p1 = pipe(&net, "Pipe1");
    let p2 = pipe(&net, "Pipe2");
    let q1 = p1.results.flowrate.unwrap();
    let q2 = p2.results.flowrate.unwrap();
    assert!(q1.get::<liter_per_second>() > 0.0);
    assert!((q1.value - q2.value).abs() < 1e-8);

    // Both pipes together drop the full 2 bar
    let total = p1.results.total_headloss.unwrap().value + p2.results.total_headloss.unwrap().value;
    assert!((total - 2.0e5).abs() < 1.0, "total head loss {total} Pa");

    // Gradient is head loss per metre of pipe
    let grad = p1.results.headloss_gradient.unwrap();
    assert!((grad * 20.0 - p1.results.total_headloss.unwrap().value).abs() < 1e-6);

    // Port pressure at the high boundary is 3 bar gauge
    let high = net.get("High").unwrap();
    let p = high.core().port("High_P1").unwrap().pressure.unwrap();
    assert!((p.value - 3.0e5).abs() < 1.0);
    let bag = high.result_bag();
    assert!((bag["head_1"] - (10.0 + 3.0e5 / mce_to_pa(1.0))).abs() < 1e-6);
}

#[test]
fn boundary_pressures_survive_a_lighter_fluid() {
    let oil = Fluid::new("Oil", 800.0, 1.0e-5).unwrap();
    let mut net = series_network();
    run_with(&mut net, &oil);

    let high = net.get("High").unwrap();
    let p = high.core().port("High_P1").unwrap().pressure.unwrap();
    assert!((p.value - 3.0e5).abs() < 1.0, "high port pressure {} Pa", p.value);
    let low = net.get("Low").unwrap();
    let p = low.core().port("Low_P1").unwrap().pressure.unwrap();
    assert!((p.value - 1.0e5).abs() < 1.0, "low port pressure {} Pa", p.value);

    let total = pipe(&net, "Pipe1").results.total_headloss.unwrap().value
        + pipe(&net, "Pipe2").results.total_headloss.unwrap().value;
    assert!((total - 2.0e5).abs() < 1.0, "total head loss {total} Pa");
}

#[test]
fn tee_conserves_mass() {
    let fluid = Fluid::water();
    let mut net = NetworkEquipment::new("Branch").unwrap();
    let defs = [
        ("Src", EquipmentDef::PressureBoundary { pressure_pa: 4.0e5, elevation: 0.0 }),
        ("SinkA", EquipmentDef::PressureBoundary { pressure_pa: 1.0e5, elevation: 0.0 }),
        ("SinkB", EquipmentDef::PressureBoundary { pressure_pa: 1.5e5, elevation: 0.0 }),
        ("T", EquipmentDef::Tee { diameter_m: 0.1, elevation: 0.0 }),
    ];
    for (id, def) in &defs {
        net.add_equipment(def.build(id, &fluid).unwrap()).unwrap();
    }
    for (i, id) in ["L1", "L2", "L3"].into_iter().enumerate() {
        let len = 30.0 + 10.0 * i as f64;
        net.add_equipment(PipeConnection::new(id, m(len), m(0.1), mm(0.05), m(0.0)).unwrap())
            .unwrap();
    }
    net.connect_equipments("Src", "Src_P1", "L1", "L1_P1").unwrap();
    net.connect_equipments("L1", "L1_P2", "T", "T_P1").unwrap();
    net.connect_equipments("T", "T_P2", "L2", "L2_P1").unwrap();
    net.connect_equipments("L2", "L2_P2", "SinkA", "SinkA_P1").unwrap();
    net.connect_equipments("T", "T_P3", "L3", "L3_P1").unwrap();
    net.connect_equipments("L3", "L3_P2", "SinkB", "SinkB_P1").unwrap();
    assert!(net.validate().is_empty());

    run(&mut net);

    let Some(Equipment::Tee(tee)) = net.get("T") else {
        panic!("tee missing");
    };
    let [q1, q2, q3] = tee.flows.0.map(|q| q.unwrap().value);
    assert!(q1 > 0.0, "source leg flows into the tee");
    assert!(q2 < 0.0 && q3 < 0.0, "both outlets flow out of the tee");
    assert!(tee.flows.sum().unwrap().value.abs() < 1e-7);
    assert_eq!(tee.result_bag().len(), 9);
}

#[test]
fn edited_equipment_is_cleared_then_repopulated() {
    let mut net = series_network();
    run(&mut net);
    let q_before = pipe(&net, "Pipe1").results.flowrate.unwrap().value;

    net.edit_equipment("Pipe2", |eq| {
        if let Equipment::Pipe(p) = eq {
            p.diameter = m(0.1);
        }
        Ok(())
    })
    .unwrap();
    let edited = pipe(&net, "Pipe2");
    assert!(edited.results.flowrate.is_none());
    assert!(edited.result_bag().is_empty());

    run(&mut net);
    let q_after = pipe(&net, "Pipe1").results.flowrate.unwrap().value;
    assert!(q_after < q_before, "narrower pipe must reduce the flow");
    assert!(pipe(&net, "Pipe2").results.flowrate.is_some());
}

#[test]
fn results_cleared_when_missing_from_solved_network() {
    let mut net = series_network();
    run(&mut net);

    // A solved network that lacks every id of this equipment graph
    let empty = SolvedNetwork::new(HydraulicNetwork::default(), Default::default());
    net.get_results_from_hydraulic_network(&empty);
    for eq in net.equipment() {
        assert!(eq.result_bag().is_empty(), "{} kept stale results", eq.id());
    }
}

#[test]
fn valve_throttles_series_flow() {
    let fluid = Fluid::water();
    let flow_at = |opening: f64| {
        let mut net = series_network();
        net.disconnect("Pipe1", "Pipe1_P2").unwrap();
        let valve = EquipmentDef::Valve {
            diameter_m: 0.15,
            kv: 200.0,
            opening,
            control_type: ValveLaw::Linear,
            elevation: 10.0,
        };
        net.add_equipment(valve.build("V", &fluid).unwrap()).unwrap();
        net.connect_equipments("Pipe1", "Pipe1_P2", "V", "V_P1").unwrap();
        net.connect_equipments("V", "V_P2", "Pipe2", "Pipe2_P1").unwrap();
        run(&mut net);
        pipe(&net, "Pipe1").results.flowrate.unwrap().value
    };
    let q_open = flow_at(100.0);
    let q_half = flow_at(50.0);
    let q_shut = flow_at(0.0);
    assert!(q_open > q_half);
    assert!(q_half > q_shut);
    assert!(q_shut.abs() < 1e-3);
}
