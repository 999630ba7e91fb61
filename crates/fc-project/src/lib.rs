//! fc-project: project file format, validation and network assembly.

use std::path::Path;

use tracing::debug;

pub mod build;
pub mod schema;
pub mod validate;

pub use build::build_network;
pub use schema::*;
pub use validate::{ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Equipment error: {0}")]
    Equipment(#[from] fc_equipment::EquipmentError),

    #[error("Invalid fluid: {0}")]
    Fluid(#[from] fc_core::FcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// `.json` files are JSON; anything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Yaml,
        }
    }

    fn parse(self, content: &str) -> ProjectResult<Project> {
        Ok(match self {
            Format::Yaml => serde_yaml::from_str(content)?,
            Format::Json => serde_json::from_str(content)?,
        })
    }

    fn render(self, project: &Project) -> ProjectResult<String> {
        Ok(match self {
            Format::Yaml => serde_yaml::to_string(project)?,
            Format::Json => serde_json::to_string_pretty(project)?,
        })
    }
}

/// Read and validate a project in the given format.
pub fn load_as(path: &Path, format: Format) -> ProjectResult<Project> {
    let project = format.parse(&std::fs::read_to_string(path)?)?;
    validate_project(&project)?;
    debug!(
        path = %path.display(),
        ?format,
        equipment = project.equipment.len(),
        pipes = project.pipes.len(),
        "project loaded"
    );
    Ok(project)
}

/// Validate, then write. An invalid project never reaches the disk.
pub fn save_as(path: &Path, project: &Project, format: Format) -> ProjectResult<()> {
    validate_project(project)?;
    std::fs::write(path, format.render(project)?)?;
    Ok(())
}

pub fn load(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::from_path(path))
}

pub fn load_yaml(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::Yaml)
}

pub fn save_yaml(path: &Path, project: &Project) -> ProjectResult<()> {
    save_as(path, project, Format::Yaml)
}

pub fn load_json(path: &Path) -> ProjectResult<Project> {
    load_as(path, Format::Json)
}

pub fn save_json(path: &Path, project: &Project) -> ProjectResult<()> {
    save_as(path, project, Format::Json)
}
