//! User-facing display units for results and inputs.
//!
//! Everything in the core is stored in SI (Pa, m³/s). A [`UnitContext`] is
//! passed explicitly to whatever needs to show values to a user or read
//! values typed by one; it holds no global state and knows nothing about
//! where preferences are persisted.

use crate::{FcError, FcResult};
use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pressure units available for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum PressureUnit {
    #[cfg_attr(feature = "serde", serde(rename = "bar"))]
    Bar,
    #[cfg_attr(feature = "serde", serde(rename = "kPa"))]
    KPa,
    #[cfg_attr(feature = "serde", serde(rename = "Pa"))]
    Pa,
    /// Meters of water column.
    #[cfg_attr(feature = "serde", serde(rename = "mCE"))]
    MCe,
}

impl PressureUnit {
    pub const ALL: [PressureUnit; 4] = [Self::Bar, Self::KPa, Self::Pa, Self::MCe];

    /// Multiplier from Pa to this unit.
    pub fn factor_from_si(self) -> f64 {
        match self {
            Self::Bar => 1e-5,
            Self::KPa => 1e-3,
            Self::Pa => 1.0,
            Self::MCe => 1.0 / (1000.0 * 9.81),
        }
    }

    /// Multiplier from this unit to Pa.
    pub fn factor_to_si(self) -> f64 {
        match self {
            Self::Bar => 1e5,
            Self::KPa => 1e3,
            Self::Pa => 1.0,
            Self::MCe => 1000.0 * 9.81,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::KPa => "kPa",
            Self::Pa => "Pa",
            Self::MCe => "mCE",
        }
    }
}

/// Volumetric flow units available for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FlowUnit {
    #[cfg_attr(feature = "serde", serde(rename = "m3/s"))]
    M3PerS,
    #[cfg_attr(feature = "serde", serde(rename = "m3/h"))]
    M3PerH,
    #[cfg_attr(feature = "serde", serde(rename = "L/s"))]
    LPerS,
    #[cfg_attr(feature = "serde", serde(rename = "L/min"))]
    LPerMin,
    #[cfg_attr(feature = "serde", serde(rename = "L/h"))]
    LPerH,
}

impl FlowUnit {
    pub const ALL: [FlowUnit; 5] = [
        Self::M3PerS,
        Self::M3PerH,
        Self::LPerS,
        Self::LPerMin,
        Self::LPerH,
    ];

    /// Multiplier from m³/s to this unit.
    pub fn factor_from_si(self) -> f64 {
        match self {
            Self::M3PerS => 1.0,
            Self::M3PerH => 3600.0,
            Self::LPerS => 1000.0,
            Self::LPerMin => 60_000.0,
            Self::LPerH => 3_600_000.0,
        }
    }

    /// Multiplier from this unit to m³/s.
    pub fn factor_to_si(self) -> f64 {
        1.0 / self.factor_from_si()
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::M3PerS => "m³/s",
            Self::M3PerH => "m³/h",
            Self::LPerS => "L/s",
            Self::LPerMin => "L/min",
            Self::LPerH => "L/h",
        }
    }
}

impl fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl fmt::Display for FlowUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for PressureUnit {
    type Err = FcError;

    fn from_str(s: &str) -> FcResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(Self::Bar),
            "kpa" => Ok(Self::KPa),
            "pa" => Ok(Self::Pa),
            "mce" | "mwc" | "m" => Ok(Self::MCe),
            _ => Err(FcError::InvalidArg {
                what: "unknown pressure unit",
            }),
        }
    }
}

impl FromStr for FlowUnit {
    type Err = FcError;

    fn from_str(s: &str) -> FcResult<Self> {
        let key = s.trim().to_ascii_lowercase().replace('³', "3");
        match key.as_str() {
            "m3/s" | "m3s" => Ok(Self::M3PerS),
            "m3/h" | "m3h" => Ok(Self::M3PerH),
            "l/s" | "ls" => Ok(Self::LPerS),
            "l/min" | "lmin" => Ok(Self::LPerMin),
            "l/h" | "lh" => Ok(Self::LPerH),
            _ => Err(FcError::InvalidArg {
                what: "unknown flow unit",
            }),
        }
    }
}

/// Display preferences threaded through formatting calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UnitContext {
    pub pressure: PressureUnit,
    pub flow: FlowUnit,
}

impl Default for UnitContext {
    fn default() -> Self {
        Self {
            pressure: PressureUnit::KPa,
            flow: FlowUnit::M3PerS,
        }
    }
}

impl UnitContext {
    pub fn new(pressure: PressureUnit, flow: FlowUnit) -> Self {
        Self { pressure, flow }
    }

    pub fn display_pressure(&self, pressure_pa: Option<f64>) -> Option<f64> {
        pressure_pa.map(|p| p * self.pressure.factor_from_si())
    }

    pub fn display_flow(&self, flow_m3s: Option<f64>) -> Option<f64> {
        flow_m3s.map(|q| q * self.flow.factor_from_si())
    }

    /// Format a pressure stored in Pa, or `"N/A"` when absent.
    pub fn format_pressure(&self, pressure_pa: Option<f64>, precision: usize) -> String {
        match self.display_pressure(pressure_pa) {
            Some(v) => format!("{v:.precision$} {}", self.pressure),
            None => "N/A".to_string(),
        }
    }

    /// Format a flow stored in m³/s, or `"N/A"` when absent.
    pub fn format_flow(&self, flow_m3s: Option<f64>, precision: usize) -> String {
        match self.display_flow(flow_m3s) {
            Some(v) => format!("{v:.precision$} {}", self.flow),
            None => "N/A".to_string(),
        }
    }

    /// Convert a pressure typed in the display unit back to Pa.
    pub fn input_pressure_to_pa(&self, value: f64) -> f64 {
        value * self.pressure.factor_to_si()
    }

    /// Convert a flow typed in the display unit back to m³/s.
    pub fn input_flow_to_m3s(&self, value: f64) -> f64 {
        value * self.flow.factor_to_si()
    }

    /// Update both units from their names; leaves `self` untouched on error.
    pub fn set_from_names(&mut self, pressure: &str, flow: &str) -> FcResult<()> {
        let p = pressure.parse()?;
        let f = flow.parse()?;
        self.pressure = p;
        self.flow = f;
        Ok(())
    }
}
