use thiserror::Error;

pub type FcResult<T> = Result<T, FcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FcError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Value out of range for {what}: {value} (expected {min}..={max})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Empty identifier: {what}")]
    EmptyId { what: &'static str },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
