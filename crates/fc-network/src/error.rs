//! Network-specific error types.

use fc_core::FcError;
use thiserror::Error;

pub type NetworkResult<T> = Result<T, NetworkError>;

/// Structural errors raised while building a [`crate::HydraulicNetwork`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Duplicate node id '{id}'")]
    DuplicateNode { id: String },

    #[error("Duplicate link id '{id}'")]
    DuplicateLink { id: String },

    #[error("Link '{link}' refers to non-existent node '{node}'")]
    MissingEndpoint { link: String, node: String },

    #[error("Empty {what} id")]
    EmptyId { what: &'static str },

    #[error("Unknown node '{id}'")]
    UnknownNode { id: String },
}

impl From<NetworkError> for FcError {
    fn from(err: NetworkError) -> Self {
        match err {
            NetworkError::EmptyId { what } => FcError::EmptyId { what },
            _ => FcError::Invariant {
                what: "hydraulic network structure",
            },
        }
    }
}
