//! Project validation logic.

use std::collections::{HashMap, HashSet};

use crate::schema::{LATEST_VERSION, PortRef, Project};

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let fluid = &project.fluid;
    for (field, value) in [
        ("fluid.density_kgpm3", fluid.density_kgpm3),
        ("fluid.viscosity_m2ps", fluid.viscosity_m2ps),
    ] {
        if !(value.is_finite() && value > 0.0) {
            return Err(ValidationError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
                reason: "must be positive".to_string(),
            });
        }
    }

    // id -> number of ports
    let mut ports: HashMap<&str, usize> = HashMap::new();
    let ids = project
        .equipment
        .iter()
        .map(|e| (e.id.as_str(), e.def.kind().port_count()))
        .chain(project.pipes.iter().map(|p| (p.id.as_str(), 2)));
    for (id, count) in ids {
        if id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "equipment.id".to_string(),
                value: format!("'{id}'"),
                reason: "must not be empty".to_string(),
            });
        }
        if ports.insert(id, count).is_some() {
            return Err(ValidationError::DuplicateId {
                id: id.to_string(),
                context: "equipment and pipes".to_string(),
            });
        }
    }

    let mut used = HashSet::new();
    let mut use_port = |port: &PortRef, context: &str| -> Result<(), ValidationError> {
        let count = ports.get(port.equipment.as_str()).copied().ok_or_else(|| {
            ValidationError::MissingReference {
                id: port.equipment.clone(),
                context: context.to_string(),
            }
        })?;
        if !port.index().is_some_and(|i| (1..=count).contains(&i)) {
            return Err(ValidationError::MissingReference {
                id: port.port_id(),
                context: context.to_string(),
            });
        }
        if !used.insert(port.port_id()) {
            return Err(ValidationError::DuplicateId {
                id: port.port_id(),
                context: format!("{context} (port already connected)"),
            });
        }
        Ok(())
    };

    for pipe in &project.pipes {
        let context = format!("pipe '{}'", pipe.id);
        use_port(&pipe.start, &context)?;
        use_port(&pipe.end, &context)?;
        use_port(&PortRef::new(pipe.id.as_str(), "P1"), &context)?;
        use_port(&PortRef::new(pipe.id.as_str(), "P2"), &context)?;
    }
    for conn in &project.connections {
        let context = format!("connection {} -> {}", conn.from.port_id(), conn.to.port_id());
        use_port(&conn.from, &context)?;
        use_port(&conn.to, &context)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ConnectionDef, EquipmentEntry, PipeRunDef};
    use fc_equipment::EquipmentDef;

    fn boundary(id: &str) -> EquipmentEntry {
        EquipmentEntry {
            id: id.to_string(),
            def: EquipmentDef::PressureBoundary {
                pressure_pa: 1e5,
                elevation: 0.0,
            },
        }
    }

    fn project() -> Project {
        let mut p = Project::new("test");
        p.equipment = vec![boundary("A"), boundary("B")];
        p.pipes = vec![PipeRunDef {
            id: "L".to_string(),
            start: PortRef::new("A", "P1"),
            end: PortRef::new("B", "P1"),
            length_m: 10.0,
            diameter_m: 0.1,
            roughness_mm: 0.1,
            elevation: 0.0,
        }];
        p
    }

    #[test]
    fn valid_project_passes() {
        validate_project(&project()).unwrap();
    }

    #[test]
    fn duplicate_equipment_id() {
        let mut p = project();
        p.equipment.push(boundary("A"));
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn port_out_of_range() {
        let mut p = project();
        p.pipes[0].end = PortRef::new("B", "P2");
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn port_used_twice() {
        let mut p = project();
        p.connections.push(ConnectionDef {
            from: PortRef::new("A", "P1"),
            to: PortRef::new("L", "P1"),
        });
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut p = project();
        p.version = LATEST_VERSION + 1;
        assert!(matches!(
            validate_project(&p),
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }
}
