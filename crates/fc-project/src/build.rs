//! Assemble an equipment network from a project.

use fc_equipment::NetworkEquipment;
use tracing::debug;

use crate::schema::Project;
use crate::validate::validate_project;
use crate::ProjectResult;

/// Build every equipment, the drawn pipes and all connections.
pub fn build_network(project: &Project) -> ProjectResult<NetworkEquipment> {
    validate_project(project)?;
    let fluid = project.fluid.to_fluid()?;
    let mut network = NetworkEquipment::new(&project.name)?;

    for entry in &project.equipment {
        network.add_equipment(entry.def.build(&entry.id, &fluid)?)?;
    }
    for pipe in &project.pipes {
        network.add_equipment(pipe.equipment_def().build(&pipe.id, &fluid)?)?;
    }

    for conn in &project.connections {
        network.connect_equipments(
            &conn.from.equipment,
            &conn.from.port_id(),
            &conn.to.equipment,
            &conn.to.port_id(),
        )?;
    }
    for pipe in &project.pipes {
        let p1 = format!("{}_P1", pipe.id);
        let p2 = format!("{}_P2", pipe.id);
        network.connect_equipments(&pipe.start.equipment, &pipe.start.port_id(), &pipe.id, &p1)?;
        network.connect_equipments(&pipe.id, &p2, &pipe.end.equipment, &pipe.end.port_id())?;
    }

    debug!(
        project = %project.name,
        equipment = network.len(),
        connections = network.connections().len() / 2,
        "equipment network built"
    );
    Ok(network)
}
