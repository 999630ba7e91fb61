//! String identifiers and the naming rules used to derive them.
//!
//! Equipment and ports are named by the user (or by the canvas), while solver
//! node and link ids are derived deterministically from those names:
//! - port `n` of equipment `E` is `E_Pn`
//! - internal nodes / links use a fixed suffix (`E_Mid`, `E_Pipe1`, ...)
//! - the node shared by two connected ports is `A_to_B` (connection name)

use crate::{FcError, FcResult};

/// Domain-specific ID aliases for clarity (no runtime cost).
pub type EquipmentId = String;
pub type PortId = String;
pub type NodeId = String;
pub type LinkId = String;

/// Trim an identifier and reject it if nothing is left.
pub fn normalize_id(raw: &str, what: &'static str) -> FcResult<String> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(FcError::EmptyId { what });
    }
    Ok(id.to_string())
}

/// Id of the `index`-th port (1-based) of an equipment.
pub fn port_id(equipment: &str, index: usize) -> PortId {
    format!("{equipment}_P{index}")
}

/// Id of an internal primitive owned by an equipment (`E_Mid`, `E_Pipe1`, ...).
pub fn internal_id(equipment: &str, suffix: &str) -> String {
    format!("{equipment}_{suffix}")
}

/// Canonical name of a port-to-port connection; also the id of the shared solver node.
pub fn connection_name(port_a: &str, port_b: &str) -> NodeId {
    format!("{port_a}_to_{port_b}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_rejects_empty() {
        assert_eq!(normalize_id("  Pump1 ", "equipment").unwrap(), "Pump1");
        assert!(matches!(
            normalize_id("   ", "equipment"),
            Err(FcError::EmptyId { what: "equipment" })
        ));
    }

    #[test]
    fn derived_names() {
        assert_eq!(port_id("Pipe1", 2), "Pipe1_P2");
        assert_eq!(internal_id("Te1", "Mid"), "Te1_Mid");
        assert_eq!(connection_name("Pipe1_P2", "Pipe2_P1"), "Pipe1_P2_to_Pipe2_P1");
    }
}
