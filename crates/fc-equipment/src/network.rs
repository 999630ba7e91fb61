//! Equipment graph: equipment instances plus the port connection registry.

use std::collections::HashMap;
use std::fmt;

use fc_core::{Fluid, connection_name, normalize_id};
use fc_network::{HydraulicNetwork, SolvedNetwork};
use tracing::debug;

use crate::common::{HydraulicEquivalent, PortNodeMap, TranslationContext};
use crate::equipment::Equipment;
use crate::error::{EquipmentError, EquipmentResult};
use crate::port::{Port, PortPeer};

/// User-assembled network of equipment connected port to port.
///
/// The connection registry (port id → connection name) is only changed
/// together with the ports it describes, so the two never disagree.
#[derive(Debug, Clone, Default)]
pub struct NetworkEquipment {
    id: String,
    equipment: Vec<Equipment>,
    index: HashMap<String, usize>,
    connections: PortNodeMap,
}

impl NetworkEquipment {
    pub fn new(id: &str) -> EquipmentResult<Self> {
        Ok(Self {
            id: normalize_id(id, "network")?,
            ..Self::default()
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn len(&self) -> usize {
        self.equipment.len()
    }

    pub fn is_empty(&self) -> bool {
        self.equipment.is_empty()
    }

    /// Equipment in insertion order.
    pub fn equipment(&self) -> &[Equipment] {
        &self.equipment
    }

    pub fn get(&self, id: &str) -> Option<&Equipment> {
        self.index.get(id).map(|&i| &self.equipment[i])
    }

    /// Port id → connection name of every connected port.
    pub fn connections(&self) -> &PortNodeMap {
        &self.connections
    }

    /// Add an equipment; ids must be unique within the network.
    pub fn add_equipment(&mut self, equipment: impl Into<Equipment>) -> EquipmentResult<()> {
        let equipment = equipment.into();
        let id = equipment.id().to_string();
        if self.index.contains_key(&id) {
            return Err(EquipmentError::construction(format!(
                "equipment '{id}' already exists in network '{}'",
                self.id
            )));
        }
        self.index.insert(id, self.equipment.len());
        self.equipment.push(equipment);
        Ok(())
    }

    fn position(&self, id: &str) -> EquipmentResult<usize> {
        self.index.get(id).copied().ok_or_else(|| {
            EquipmentError::connection(format!(
                "equipment '{id}' does not exist in network '{}'",
                self.id
            ))
        })
    }

    fn check_free_port(&self, eq_index: usize, port: &str) -> EquipmentResult<()> {
        let eq = &self.equipment[eq_index];
        let p = eq.core().port(port).ok_or_else(|| {
            EquipmentError::connection(format!(
                "port '{port}' does not belong to equipment '{}'",
                eq.id()
            ))
        })?;
        if let Some(peer) = p.peer() {
            return Err(EquipmentError::connection(format!(
                "port '{port}' of equipment '{}' is already connected to '{}'",
                eq.id(),
                peer.port
            )));
        }
        Ok(())
    }

    /// Connect `port_a` of `eq_a` to `port_b` of `eq_b`.
    ///
    /// Both ports must exist on the stated equipment and be free. On success
    /// the canonical connection name is returned; on failure nothing changes.
    pub fn connect_equipments(
        &mut self,
        eq_a: &str,
        port_a: &str,
        eq_b: &str,
        port_b: &str,
    ) -> EquipmentResult<String> {
        let ia = self.position(eq_a)?;
        let ib = self.position(eq_b)?;
        if port_a == port_b {
            return Err(EquipmentError::connection(format!(
                "port '{port_a}' cannot be connected to itself"
            )));
        }
        self.check_free_port(ia, port_a)?;
        self.check_free_port(ib, port_b)?;

        self.port_mut(ia, port_a)?.connect(eq_b, port_b)?;
        if let Err(e) = self.port_mut(ib, port_b).and_then(|p| p.connect(eq_a, port_a)) {
            self.port_mut(ia, port_a)?.disconnect();
            return Err(e);
        }

        let name = connection_name(port_a, port_b);
        self.connections.insert(port_a.to_string(), name.clone());
        self.connections.insert(port_b.to_string(), name.clone());
        debug!(network = %self.id, connection = %name, "ports connected");
        Ok(name)
    }

    fn port_mut(&mut self, eq_index: usize, port: &str) -> EquipmentResult<&mut Port> {
        let eq = &mut self.equipment[eq_index];
        let owner = eq.id().to_string();
        eq.core_mut().port_mut(port).ok_or_else(|| {
            EquipmentError::connection(format!(
                "port '{port}' does not belong to equipment '{owner}'"
            ))
        })
    }

    /// Disconnect a port and its peer. Disconnecting a free port is a no-op.
    pub fn disconnect(&mut self, eq: &str, port: &str) -> EquipmentResult<()> {
        let i = self.position(eq)?;
        let peer = self.port_mut(i, port)?.peer().cloned();
        self.port_mut(i, port)?.disconnect();
        self.connections.remove(port);
        if let Some(peer) = peer {
            if let Some(j) = self.index.get(&peer.equipment).copied() {
                if let Ok(p) = self.port_mut(j, &peer.port) {
                    p.disconnect();
                }
            }
            self.connections.remove(&peer.port);
        }
        Ok(())
    }

    /// One message per unconnected port.
    pub fn validate_flowcad(&self) -> Vec<String> {
        self.equipment
            .iter()
            .flat_map(|eq| {
                eq.core()
                    .ports()
                    .filter(|p| !p.is_connected())
                    .map(move |p| {
                        format!("port '{}' of equipment '{}' is not connected", p.id(), eq.id())
                    })
            })
            .collect()
    }

    /// Unconnected ports, per-equipment problems and registry consistency.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = self.validate_flowcad();
        for eq in &self.equipment {
            problems.extend(eq.validate());
            for port in eq.core().ports() {
                if port.is_connected() != self.connections.contains_key(port.id()) {
                    problems.push(format!(
                        "port '{}' disagrees with the connection registry",
                        port.id()
                    ));
                }
            }
        }
        problems
    }

    /// Translate every equipment and merge the primitives into one network.
    ///
    /// Boundaries go first; a node shared by two equipment is inserted by the
    /// first one and ignored afterwards.
    pub fn to_hydraulic_network(&self, fluid: &Fluid) -> EquipmentResult<HydraulicNetwork> {
        let ctx = TranslationContext {
            port_nodes: &self.connections,
            fluid,
        };
        let mut network = HydraulicNetwork::new(fluid.clone());
        let ordered = self
            .equipment
            .iter()
            .filter(|eq| eq.is_boundary())
            .chain(self.equipment.iter().filter(|eq| !eq.is_boundary()));
        for eq in ordered {
            let parts = eq.generate_hydraulic_representation(&ctx)?;
            debug!(equipment = %eq.id(), kind = %eq.kind(), parts = parts.len(), "translated");
            for part in parts {
                network.merge_component(part)?;
            }
        }
        Ok(network)
    }

    /// Let every equipment pull its results from a solved network.
    pub fn get_results_from_hydraulic_network(&mut self, solved: &SolvedNetwork) {
        for eq in &mut self.equipment {
            eq.get_simulation_results(solved, &self.connections);
        }
    }

    pub fn clear_results(&mut self) {
        for eq in &mut self.equipment {
            eq.clear_results();
        }
    }

    /// Edit one equipment's parameters. Its results are cleared first, since
    /// they no longer describe the edited equipment.
    ///
    /// The edit may not change the kind, id, ports or connections of the
    /// equipment. If it does, or if `edit` fails, the equipment is restored
    /// exactly as it was, results included.
    pub fn edit_equipment<F>(&mut self, id: &str, edit: F) -> EquipmentResult<()>
    where
        F: FnOnce(&mut Equipment) -> EquipmentResult<()>,
    {
        let i = self.position(id)?;
        let before = self.equipment[i].clone();
        let eq = &mut self.equipment[i];
        eq.clear_results();
        let outcome = edit(eq).and_then(|()| check_same_identity(&before, eq));
        if let Err(e) = outcome {
            debug!(equipment = %before.id(), error = %e, "edit rolled back");
            self.equipment[i] = before;
            return Err(e);
        }
        Ok(())
    }
}

fn wiring(eq: &Equipment) -> Vec<(&str, &str, Option<&PortPeer>)> {
    eq.core()
        .ports()
        .map(|p| (p.id(), p.owner(), p.peer()))
        .collect()
}

fn check_same_identity(before: &Equipment, after: &Equipment) -> EquipmentResult<()> {
    if before.kind() != after.kind() || before.id() != after.id() {
        return Err(EquipmentError::construction(format!(
            "editing '{}' may not replace it with {} '{}'",
            before.id(),
            after.kind(),
            after.id()
        )));
    }
    if wiring(before) != wiring(after) {
        return Err(EquipmentError::construction(format!(
            "editing '{}' may not change its ports or connections",
            before.id()
        )));
    }
    Ok(())
}

impl fmt::Display for NetworkEquipment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Equipment network '{}'", self.id)?;
        for eq in &self.equipment {
            write!(f, "{eq}")?;
        }
        let mut conns: Vec<_> = self.connections.iter().collect();
        conns.sort();
        writeln!(f, "Connections:")?;
        for (port, name) in conns {
            writeln!(f, "  {port} -> {name}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PipeConnection, PressureBoundary};
    use fc_core::{bar, m, mm};

    fn series() -> NetworkEquipment {
        let mut net = NetworkEquipment::new("N").unwrap();
        net.add_equipment(PressureBoundary::new("A", bar(2.0), m(0.0)).unwrap())
            .unwrap();
        net.add_equipment(PipeConnection::new("P", m(10.0), m(0.1), mm(0.05), m(0.0)).unwrap())
            .unwrap();
        net
    }

    #[test]
    fn duplicate_equipment_rejected() {
        let mut net = series();
        let err = net
            .add_equipment(PressureBoundary::new("A", bar(1.0), m(0.0)).unwrap())
            .unwrap_err();
        assert!(matches!(err, EquipmentError::Construction { .. }));
        assert_eq!(net.len(), 2);
    }

    #[test]
    fn connect_records_both_sides() {
        let mut net = series();
        let name = net.connect_equipments("A", "A_P1", "P", "P_P1").unwrap();
        assert_eq!(name, "A_P1_to_P_P1");
        assert_eq!(net.connections()["A_P1"], name);
        assert_eq!(net.connections()["P_P1"], name);
        let peer = net.get("P").unwrap().core().port("P_P1").unwrap().peer().unwrap();
        assert_eq!(peer.equipment, "A");
        assert_eq!(net.validate_flowcad(), ["port 'P_P2' of equipment 'P' is not connected"]);
    }

    #[test]
    fn failed_connect_leaves_no_trace() {
        let mut net = series();
        net.connect_equipments("A", "A_P1", "P", "P_P1").unwrap();
        let before = net.clone();

        // occupied port
        assert!(net.connect_equipments("P", "P_P2", "A", "A_P1").is_err());
        // port owned by another equipment
        assert!(net.connect_equipments("A", "P_P2", "P", "P_P1").is_err());
        // unknown equipment
        assert!(net.connect_equipments("Z", "Z_P1", "P", "P_P2").is_err());
        // self
        assert!(net.connect_equipments("P", "P_P2", "P", "P_P2").is_err());

        assert_eq!(net.equipment(), before.equipment());
        assert_eq!(net.connections(), before.connections());
        assert!(net.validate().iter().all(|p| p.contains("not connected")));
    }

    #[test]
    fn disconnect_frees_both_ports() {
        let mut net = series();
        net.connect_equipments("A", "A_P1", "P", "P_P1").unwrap();
        net.disconnect("P", "P_P1").unwrap();
        assert!(net.connections().is_empty());
        assert!(!net.get("A").unwrap().core().is_fully_connected());
        net.disconnect("P", "P_P1").unwrap();
        net.connect_equipments("P", "P_P1", "A", "A_P1").unwrap();
    }

    #[test]
    fn edit_cannot_swap_in_another_equipment() {
        let mut net = series();
        net.connect_equipments("A", "A_P1", "P", "P_P1").unwrap();
        let before = net.clone();

        let err = net
            .edit_equipment("P", |eq| {
                *eq = PipeConnection::new("Other", m(1.0), m(0.1), mm(0.05), m(0.0))?.into();
                Ok(())
            })
            .unwrap_err();
        assert!(matches!(err, EquipmentError::Construction { .. }));
        assert_eq!(net.equipment(), before.equipment());
        assert_eq!(net.get("P").unwrap().id(), "P");

        // The id is still free, so the network stays unique by id
        net.add_equipment(PipeConnection::new("Other", m(1.0), m(0.1), mm(0.05), m(0.0)).unwrap())
            .unwrap();
        assert!(net
            .add_equipment(PipeConnection::new("P", m(1.0), m(0.1), mm(0.05), m(0.0)).unwrap())
            .is_err());
    }

    #[test]
    fn edit_cannot_drop_connections() {
        let mut net = series();
        net.connect_equipments("A", "A_P1", "P", "P_P1").unwrap();
        let before = net.clone();

        // Same kind and id, but with fresh unconnected ports
        let err = net
            .edit_equipment("P", |eq| {
                *eq = PipeConnection::new("P", m(5.0), m(0.1), mm(0.05), m(0.0))?.into();
                Ok(())
            })
            .unwrap_err();
        assert!(err.to_string().contains("ports or connections"));
        assert_eq!(net.equipment(), before.equipment());
        assert_eq!(net.connections(), before.connections());
        assert!(net.validate().iter().all(|p| p.contains("not connected")));
    }

    #[test]
    fn failed_edit_keeps_parameters() {
        let mut net = series();
        let err = net
            .edit_equipment("P", |eq| {
                if let Equipment::Pipe(p) = eq {
                    p.length = m(99.0);
                }
                Err(EquipmentError::construction("rejected"))
            })
            .unwrap_err();
        assert!(matches!(err, EquipmentError::Construction { .. }));
        let Some(Equipment::Pipe(p)) = net.get("P") else {
            panic!("pipe missing");
        };
        assert_eq!(p.length, m(10.0));
    }

    #[test]
    fn unconnected_port_fails_translation() {
        let net = series();
        let err = net.to_hydraulic_network(&Fluid::water()).unwrap_err();
        assert!(matches!(err, EquipmentError::Translation { .. }));
    }
}
