// fc-core/src/units.rs

use uom::si::f64::{
    Area as UomArea, KinematicViscosity as UomKinematicViscosity, Length as UomLength,
    MassDensity as UomMassDensity, Pressure as UomPressure, Velocity as UomVelocity,
    VolumeRate as UomVolumeRate,
};

// Public canonical unit types (SI, f64)
pub type Area = UomArea;
pub type Density = UomMassDensity;
pub type KinVisc = UomKinematicViscosity;
pub type Length = UomLength;
pub type Pressure = UomPressure;
pub type Velocity = UomVelocity;
pub type VolumeRate = UomVolumeRate;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn kpa(v: f64) -> Pressure {
    use uom::si::pressure::kilopascal;
    Pressure::new::<kilopascal>(v)
}

#[inline]
pub fn bar(v: f64) -> Pressure {
    use uom::si::pressure::bar;
    Pressure::new::<bar>(v)
}

#[inline]
pub fn m(v: f64) -> Length {
    use uom::si::length::meter;
    Length::new::<meter>(v)
}

#[inline]
pub fn mm(v: f64) -> Length {
    use uom::si::length::millimeter;
    Length::new::<millimeter>(v)
}

#[inline]
pub fn m3ps(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_second;
    VolumeRate::new::<cubic_meter_per_second>(v)
}

#[inline]
pub fn m3ph(v: f64) -> VolumeRate {
    use uom::si::volume_rate::cubic_meter_per_hour;
    VolumeRate::new::<cubic_meter_per_hour>(v)
}

#[inline]
pub fn kgpm3(v: f64) -> Density {
    use uom::si::mass_density::kilogram_per_cubic_meter;
    Density::new::<kilogram_per_cubic_meter>(v)
}

#[inline]
pub fn m2ps(v: f64) -> KinVisc {
    use uom::si::kinematic_viscosity::square_meter_per_second;
    KinVisc::new::<square_meter_per_second>(v)
}

#[inline]
pub fn mps(v: f64) -> Velocity {
    use uom::si::velocity::meter_per_second;
    Velocity::new::<meter_per_second>(v)
}

pub mod constants {
    /// Gravitational acceleration used by every pressure/head conversion.
    pub const G_MPS2: f64 = 9.81;

    /// Reference water density for meters-of-water-column conversions.
    pub const RHO_REF_KGPM3: f64 = 1000.0;

    /// Reference pressure drop at which Kv is defined.
    pub const KV_REFERENCE_DP_PA: f64 = 100_000.0;

    /// Kinematic viscosity of water at 20 °C, used to express relative viscosity.
    pub const NU_WATER_M2PS: f64 = 1.004e-6;
}
