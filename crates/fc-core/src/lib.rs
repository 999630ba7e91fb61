//! fc-core: stable foundation for flowcad.
//!
//! Contains:
//! - units (uom SI types + constructors, reference constants)
//! - numeric (Real + tolerances + float helpers)
//! - ids (string identifiers and the naming rules that derive them)
//! - fluid (density / viscosity of the working fluid)
//! - converter (pressure/head and minor-loss coefficient math)
//! - display (user-facing pressure and flow units)
//! - error (shared error types)

pub mod converter;
pub mod display;
pub mod error;
pub mod fluid;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use display::{FlowUnit, PressureUnit, UnitContext};
pub use error::{FcError, FcResult};
pub use fluid::Fluid;
pub use ids::*;
pub use numeric::*;
pub use units::*;
