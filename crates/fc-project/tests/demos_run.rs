//! Integration test that loads, builds and runs the demo projects.

use std::path::PathBuf;

use fc_equipment::{Equipment, HydraulicEquivalent};
use fc_project::{build_network, load_yaml};
use fc_sim::{SimOptions, SimulationManager};

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn options(project: &fc_project::Project) -> SimOptions {
    SimOptions {
        solver: project.solver.clone(),
        fluid: project.fluid.to_fluid().unwrap(),
        ..SimOptions::default()
    }
}

#[test]
fn series_demo_flows_downhill() {
    let project = load_yaml(&demo("series.yaml")).unwrap();
    let network = build_network(&project).unwrap();
    assert!(network.validate().is_empty());
    assert_eq!(network.len(), 4);

    let hydraulic = network.to_hydraulic_network(&project.fluid.to_fluid().unwrap()).unwrap();
    assert_eq!(hydraulic.node_count(), 3);
    assert_eq!(hydraulic.link_count(), 2);

    let manager = SimulationManager::new(network, options(&project));
    manager.run().unwrap();
    let network = manager.into_network();
    let Some(Equipment::Pipe(pipe)) = network.get("Pipe1") else {
        panic!("Pipe1 missing");
    };
    assert!(pipe.results.flowrate.unwrap().value > 0.0);
}

#[test]
fn pumped_branch_demo_runs() {
    let project = load_yaml(&demo("pumped_branch.yaml")).unwrap();
    assert_eq!(project.solver.max_iterations, 100);
    let network = build_network(&project).unwrap();
    assert!(network.validate_flowcad().is_empty());

    let manager = SimulationManager::new(network, options(&project));
    manager.run().unwrap();
    let bag = manager.read_network(|net| net.get("Pump1").unwrap().result_bag());
    assert!(bag["flow_rate"] > 0.0);
    assert!(bag["head_gain"] > 0.0);
}
