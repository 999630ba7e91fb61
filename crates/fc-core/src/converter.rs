//! Pressure/head conversions and minor-loss coefficient derivation.
//!
//! Conversions to and from meters of water column (mCE) always use the
//! reference density and `g = 9.81 m/s²`; `pressure_to_head` and
//! `head_to_pressure` use the density of the supplied fluid.

use crate::fluid::Fluid;
use crate::numeric::ensure_positive;
use crate::units::{Length, Pressure, VolumeRate, constants, m, m3ps, pa};
use crate::FcResult;

use std::f64::consts::PI;

#[inline]
fn rho_g(fluid: &Fluid) -> f64 {
    fluid.density_kgpm3() * constants::G_MPS2
}

#[inline]
fn rho_g_ref() -> f64 {
    constants::RHO_REF_KGPM3 * constants::G_MPS2
}

/// H = P / (ρ g) + z
pub fn pressure_to_head(pressure: Pressure, elevation: Length, fluid: &Fluid) -> Length {
    m(pressure.value / rho_g(fluid) + elevation.value)
}

/// P = ρ g (H - z)
pub fn head_to_pressure(head: Length, elevation: Length, fluid: &Fluid) -> Pressure {
    pa(rho_g(fluid) * (head.value - elevation.value))
}

/// Meters of water column to pascal.
#[inline]
pub fn mce_to_pa(mce: f64) -> f64 {
    mce * rho_g_ref()
}

#[inline]
pub fn mce_to_kpa(mce: f64) -> f64 {
    mce_to_pa(mce) / 1e3
}

#[inline]
pub fn mce_to_bar(mce: f64) -> f64 {
    mce_to_pa(mce) / 1e5
}

#[inline]
pub fn pa_to_mce(p_pa: f64) -> f64 {
    p_pa / rho_g_ref()
}

/// Pressure expressed as meters of the given fluid (no elevation offset).
#[inline]
pub fn pressure_to_fluid_column(p_pa: f64, fluid: &Fluid) -> f64 {
    p_pa / rho_g(fluid)
}

#[inline]
pub fn m3h_to_m3s(flow_m3h: f64) -> f64 {
    flow_m3h / 3600.0
}

/// Mean velocity of a flow through a circular section.
pub fn velocity_in(flow: VolumeRate, diameter: Length) -> f64 {
    let d = diameter.value;
    4.0 * flow.value.abs() / (PI * d * d)
}

/// ζ = 2 Δp / (ρ v²) with v taken from the nominal flow through `diameter`.
///
/// Returns 0 when the nominal velocity is zero.
pub fn zeta_from_nominal_conditions(
    flow: VolumeRate,
    pressure_drop: Pressure,
    diameter: Length,
    fluid: &Fluid,
) -> FcResult<f64> {
    ensure_positive(diameter.value, "diameter")?;
    let v = velocity_in(flow, diameter);
    if v == 0.0 {
        return Ok(0.0);
    }
    Ok(2.0 * pressure_drop.value / (fluid.density_kgpm3() * v * v))
}

/// ζ from a Kv expressed in m³/h at a 100 kPa reference drop.
pub fn zeta_from_kv(kv_m3h: f64, diameter: Length, fluid: &Fluid) -> FcResult<f64> {
    zeta_from_nominal_conditions(
        m3ps(m3h_to_m3s(kv_m3h)),
        pa(constants::KV_REFERENCE_DP_PA),
        diameter,
        fluid,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::bar;

    #[test]
    fn one_bar_is_about_ten_meters() {
        let h = pressure_to_head(bar(1.0), m(0.0), &Fluid::water());
        assert!((h.value - 10.193_679_918).abs() < 1e-6);
    }

    #[test]
    fn head_pressure_inverse() {
        let w = Fluid::water();
        let p = head_to_pressure(m(25.0), m(5.0), &w);
        let h = pressure_to_head(p, m(5.0), &w);
        assert!((h.value - 25.0).abs() < 1e-9);
    }

    #[test]
    fn mce_conversions_agree() {
        assert!((mce_to_pa(1.0) - 9810.0).abs() < 1e-9);
        assert!((mce_to_kpa(1.0) - 9.81).abs() < 1e-12);
        assert!((mce_to_bar(10.0) - 0.981).abs() < 1e-12);
        assert!((pa_to_mce(mce_to_pa(3.3)) - 3.3).abs() < 1e-12);
    }

    #[test]
    fn zeta_zero_for_no_flow() {
        let z = zeta_from_nominal_conditions(m3ps(0.0), pa(1e5), m(0.1), &Fluid::water()).unwrap();
        assert_eq!(z, 0.0);
    }

    #[test]
    fn zeta_from_kv_matches_formula() {
        let d = 0.1;
        let kv = 100.0;
        let v = 4.0 * (kv / 3600.0) / (PI * d * d);
        let expected = 2.0 * 1e5 / (1000.0 * v * v);
        let z = zeta_from_kv(kv, m(d), &Fluid::water()).unwrap();
        assert!((z - expected).abs() < 1e-9 * expected);
    }

    #[test]
    fn zeta_rejects_bad_diameter() {
        assert!(zeta_from_kv(10.0, m(0.0), &Fluid::water()).is_err());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn zeta_from_kv_decreases_with_kv(
                kv in 0.1f64..1000.0,
                dk in 0.01f64..100.0,
                d in 0.01f64..1.0,
            ) {
                let w = Fluid::water();
                let z1 = zeta_from_kv(kv, m(d), &w).unwrap();
                let z2 = zeta_from_kv(kv + dk, m(d), &w).unwrap();
                prop_assert!(z2 < z1);
            }
        }
    }
}
