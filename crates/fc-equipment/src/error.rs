//! Error types for equipment construction, connection and translation.

use fc_core::FcError;
use fc_network::NetworkError;
use thiserror::Error;

/// Structural errors raised by the equipment layer.
///
/// Validation problems are not errors: `validate()` style operations return a
/// list of messages instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EquipmentError {
    /// Empty or invalid id, or a parameter outside its admissible range.
    #[error("Construction error: {what}")]
    Construction { what: String },

    /// Illegal connection: unknown equipment/port, occupied port, self-connection.
    #[error("Connection error: {what}")]
    Connection { what: String },

    /// The equipment graph could not be turned into a hydraulic network.
    #[error("Translation error: {what}")]
    Translation { what: String },

    /// A control law or option that this equipment kind does not support.
    #[error("Not implemented: {what}")]
    NotImplemented { what: String },
}

pub type EquipmentResult<T> = Result<T, EquipmentError>;

impl EquipmentError {
    pub(crate) fn construction(what: impl Into<String>) -> Self {
        EquipmentError::Construction { what: what.into() }
    }

    pub(crate) fn connection(what: impl Into<String>) -> Self {
        EquipmentError::Connection { what: what.into() }
    }

    pub(crate) fn translation(what: impl Into<String>) -> Self {
        EquipmentError::Translation { what: what.into() }
    }
}

impl From<FcError> for EquipmentError {
    fn from(e: FcError) -> Self {
        EquipmentError::Construction {
            what: e.to_string(),
        }
    }
}

impl From<NetworkError> for EquipmentError {
    fn from(e: NetworkError) -> Self {
        EquipmentError::Translation {
            what: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_become_construction_errors() {
        let err: EquipmentError = FcError::EmptyId { what: "equipment" }.into();
        assert!(matches!(err, EquipmentError::Construction { .. }));
        assert!(err.to_string().contains("equipment"));
    }

    #[test]
    fn network_errors_become_translation_errors() {
        let err: EquipmentError = NetworkError::DuplicateLink { id: "P".into() }.into();
        assert!(matches!(err, EquipmentError::Translation { .. }));
    }
}
