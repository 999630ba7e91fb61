//! Connection terminals owned by equipment.

use std::fmt;

use fc_core::{EquipmentId, Length, PortId, Pressure, normalize_id};

use crate::error::{EquipmentError, EquipmentResult};

/// The other end of a connected port. Ids only, never references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortPeer {
    pub equipment: EquipmentId,
    pub port: PortId,
}

/// A typed connection terminal owned by exactly one equipment.
#[derive(Debug, Clone, PartialEq)]
pub struct Port {
    id: PortId,
    owner: EquipmentId,
    peer: Option<PortPeer>,
    /// Gauge pressure from the last successful run.
    pub pressure: Option<Pressure>,
    /// Total head from the last successful run.
    pub head: Option<Length>,
}

impl Port {
    /// Create a free port; both ids are trimmed and must be non-empty.
    pub fn new(id: &str, owner: &str) -> EquipmentResult<Self> {
        Ok(Self {
            id: normalize_id(id, "port")?,
            owner: normalize_id(owner, "port owner")?,
            peer: None,
            pressure: None,
            head: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the owning equipment; fixed at construction.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn peer(&self) -> Option<&PortPeer> {
        self.peer.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Record a peer on this side only.
    ///
    /// Fails if the port is already connected, if either id is empty, or if
    /// the peer is this very port. Keeping both sides in agreement is the
    /// caller's job.
    pub(crate) fn connect(&mut self, peer_equipment: &str, peer_port: &str) -> EquipmentResult<()> {
        if let Some(existing) = &self.peer {
            return Err(EquipmentError::connection(format!(
                "port '{}' is already connected to '{}'",
                self.id, existing.port
            )));
        }
        let equipment = peer_equipment.trim();
        let port = peer_port.trim();
        if equipment.is_empty() || port.is_empty() {
            return Err(EquipmentError::connection(format!(
                "port '{}': peer equipment and port ids must be non-empty",
                self.id
            )));
        }
        if port == self.id && equipment == self.owner {
            return Err(EquipmentError::connection(format!(
                "port '{}' cannot be connected to itself",
                self.id
            )));
        }
        self.peer = Some(PortPeer {
            equipment: equipment.to_string(),
            port: port.to_string(),
        });
        Ok(())
    }

    /// Forget the peer. Always succeeds.
    pub(crate) fn disconnect(&mut self) {
        self.peer = None;
    }

    pub fn clear_results(&mut self) {
        self.pressure = None;
        self.head = None;
    }

    /// Problems with this port's state; empty when consistent.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.id.trim().is_empty() {
            problems.push("port has no id".to_string());
        }
        if self.owner.trim().is_empty() {
            problems.push(format!("port '{}' has no owner equipment", self.id));
        }
        if let Some(peer) = &self.peer {
            if peer.equipment.trim().is_empty() || peer.port.trim().is_empty() {
                problems.push(format!(
                    "port '{}' is marked connected but its peer ids are missing",
                    self.id
                ));
            }
            if peer.port == self.id && peer.equipment == self.owner {
                problems.push(format!("port '{}' is connected to itself", self.id));
            }
        }
        problems
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.peer {
            Some(peer) => write!(
                f,
                "Port({} of {} -> {} of {})",
                self.id, self.owner, peer.port, peer.equipment
            ),
            None => write!(f, "Port({} of {}, free)", self.id, self.owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_port_is_free() {
        let p = Port::new(" Pipe1_P1 ", "Pipe1").unwrap();
        assert_eq!(p.id(), "Pipe1_P1");
        assert!(!p.is_connected());
        assert!(p.validate().is_empty());
    }

    #[test]
    fn empty_ids_rejected() {
        assert!(matches!(
            Port::new("", "E"),
            Err(EquipmentError::Construction { .. })
        ));
        assert!(Port::new("E_P1", "  ").is_err());
    }

    #[test]
    fn double_connect_fails_and_keeps_state() {
        let mut p = Port::new("A_P1", "A").unwrap();
        p.connect("B", "B_P1").unwrap();
        let before = p.clone();
        let err = p.connect("C", "C_P1").unwrap_err();
        assert!(matches!(err, EquipmentError::Connection { .. }));
        assert_eq!(p, before);
    }

    #[test]
    fn self_connection_fails() {
        let mut p = Port::new("A_P1", "A").unwrap();
        assert!(p.connect("A", "A_P1").is_err());
        assert!(!p.is_connected());
    }

    #[test]
    fn empty_peer_fails() {
        let mut p = Port::new("A_P1", "A").unwrap();
        assert!(p.connect("", "B_P1").is_err());
        assert!(p.connect("B", " ").is_err());
        assert!(!p.is_connected());
    }

    #[test]
    fn disconnect_is_idempotent() {
        let mut p = Port::new("A_P1", "A").unwrap();
        p.disconnect();
        p.connect("B", "B_P1").unwrap();
        p.disconnect();
        p.disconnect();
        assert!(!p.is_connected());
        assert!(p.validate().is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn connect_then_disconnect_restores_free_state(
                eq in "[A-Za-z][A-Za-z0-9]{0,8}",
                peer in "[A-Za-z][A-Za-z0-9]{0,8}",
                n in 1usize..4,
            ) {
                let mut p = Port::new(&format!("{eq}_P1"), &eq).unwrap();
                let peer_port = format!("{peer}_P{n}");
                let connected = p.connect(&peer, &peer_port);
                // only the exact same port may be refused
                prop_assert_eq!(connected.is_ok(), !(peer == eq && n == 1));
                p.disconnect();
                prop_assert!(!p.is_connected());
                prop_assert!(p.validate().is_empty());
            }
        }
    }
}
