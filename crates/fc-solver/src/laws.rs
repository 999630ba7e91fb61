//! Head-loss laws of the solver links.
//!
//! Every law gives the head drop `h(q)` from start node to end node for a
//! signed flow `q` (m³/s). Pumps have a negative drop (head gain).

use std::f64::consts::PI;

use fc_core::constants::G_MPS2;
use fc_core::Fluid;
use fc_network::{CurvePoint, Link, LinkStatus, Pipe, Pump, Valve, ValveType};

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};

const RE_LAMINAR: f64 = 2000.0;
const RE_TURBULENT: f64 = 4000.0;
const MIN_SLOPE: f64 = 1e-6;

/// Darcy friction factor: 64/Re when laminar, Swamee-Jain when turbulent,
/// linear blend in between.
pub fn darcy_friction_factor(re: f64, relative_roughness: f64) -> f64 {
    if re <= 0.0 {
        return 0.0;
    }
    if re < RE_LAMINAR {
        return 64.0 / re;
    }
    let turbulent = |re: f64| {
        let arg = relative_roughness / 3.7 + 5.74 / re.powf(0.9);
        0.25 / arg.log10().powi(2)
    };
    if re < RE_TURBULENT {
        let f_lam = 64.0 / RE_LAMINAR;
        let f_turb = turbulent(RE_TURBULENT);
        let t = (re - RE_LAMINAR) / (RE_TURBULENT - RE_LAMINAR);
        return f_lam + t * (f_turb - f_lam);
    }
    turbulent(re)
}

/// Coefficient `k` of a quadratic loss `h = k q|q|` for a loss coefficient ζ.
pub fn quadratic_coefficient(zeta: f64, diameter_m: f64) -> f64 {
    8.0 * zeta / (G_MPS2 * PI * PI * diameter_m.powi(4))
}

#[inline]
fn area(diameter_m: f64) -> f64 {
    PI * diameter_m * diameter_m / 4.0
}

/// Pump head gain as a function of flow at unit speed.
#[derive(Debug, Clone, PartialEq)]
pub enum PumpCurve {
    /// `h = a - b q^c`, the single design point form.
    Power { a: f64, b: f64, c: f64 },
    /// Piecewise linear through the points, extended along the end segments.
    Table(Vec<CurvePoint>),
}

impl PumpCurve {
    pub fn from_points(points: &[CurvePoint]) -> SolverResult<Self> {
        match points {
            [] => Err(SolverError::ProblemSetup {
                what: "pump curve has no points".to_string(),
            }),
            [p] => {
                if p.flow_m3s <= 0.0 || p.head_m <= 0.0 {
                    return Err(SolverError::ProblemSetup {
                        what: "single-point pump curve needs positive flow and head".to_string(),
                    });
                }
                Ok(PumpCurve::Power {
                    a: 4.0 / 3.0 * p.head_m,
                    b: p.head_m / (3.0 * p.flow_m3s * p.flow_m3s),
                    c: 2.0,
                })
            }
            many => {
                if many.windows(2).any(|w| w[1].flow_m3s <= w[0].flow_m3s) {
                    return Err(SolverError::ProblemSetup {
                        what: "pump curve flows must be strictly increasing".to_string(),
                    });
                }
                Ok(PumpCurve::Table(many.to_vec()))
            }
        }
    }

    pub fn shutoff_head(&self) -> f64 {
        self.gain(0.0)
    }

    /// Head gain for a non-negative flow at unit speed.
    pub fn gain(&self, q: f64) -> f64 {
        match self {
            PumpCurve::Power { a, b, c } => a - b * q.max(0.0).powf(*c),
            PumpCurve::Table(points) => {
                let seg = points
                    .windows(2)
                    .position(|w| q <= w[1].flow_m3s)
                    .unwrap_or(points.len() - 2);
                let (p0, p1) = (points[seg], points[seg + 1]);
                let slope = (p1.head_m - p0.head_m) / (p1.flow_m3s - p0.flow_m3s);
                p0.head_m + slope * (q - p0.flow_m3s)
            }
        }
    }
}

/// Head-loss law for one link.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkLaw {
    Pipe {
        length_m: f64,
        diameter_m: f64,
        roughness_m: f64,
        minor_k: f64,
        viscosity_m2ps: f64,
        /// Resistance applied to reverse flow when the pipe has a check valve.
        check_valve: Option<f64>,
    },
    Pump {
        curve: PumpCurve,
        speed: f64,
        reverse_resistance: f64,
    },
    /// `h = k q|q|`
    Quadratic { k: f64 },
    /// `h = r q`
    Closed { r: f64 },
}

impl LinkLaw {
    pub fn from_link(link: &Link, fluid: &Fluid, config: &SolverConfig) -> SolverResult<Self> {
        let closed = LinkLaw::Closed {
            r: config.closed_resistance,
        };
        if link.status() == LinkStatus::Closed {
            return Ok(closed);
        }
        match link {
            Link::Pipe(p) => Ok(Self::pipe(p, fluid, config)),
            Link::Pump(p) => Self::pump(p, config),
            Link::Valve(v) => Self::valve(v, config),
        }
    }

    fn pipe(p: &Pipe, fluid: &Fluid, config: &SolverConfig) -> Self {
        LinkLaw::Pipe {
            length_m: p.length_m,
            diameter_m: p.diameter_m,
            roughness_m: p.roughness_m,
            minor_k: quadratic_coefficient(p.minor_loss, p.diameter_m),
            viscosity_m2ps: fluid.viscosity_m2ps(),
            check_valve: p.check_valve.then_some(config.closed_resistance),
        }
    }

    fn pump(p: &Pump, config: &SolverConfig) -> SolverResult<Self> {
        if !(p.speed.is_finite() && p.speed > 0.0) {
            return Err(SolverError::ProblemSetup {
                what: format!("pump '{}' has non-positive speed", p.id),
            });
        }
        Ok(LinkLaw::Pump {
            curve: PumpCurve::from_points(&p.curve)?,
            speed: p.speed,
            reverse_resistance: config.closed_resistance,
        })
    }

    fn valve(v: &Valve, config: &SolverConfig) -> SolverResult<Self> {
        let zeta = match (v.status, v.valve_type) {
            (LinkStatus::Closed, _) => {
                return Ok(LinkLaw::Closed {
                    r: config.closed_resistance,
                });
            }
            (LinkStatus::Open, _) => v.minor_loss,
            (LinkStatus::Active, ValveType::Tcv) => v.setting,
            (LinkStatus::Active, other) => {
                return Err(SolverError::Unsupported {
                    what: format!("active {} valve '{}'", other.code(), v.id),
                });
            }
        };
        Ok(LinkLaw::Quadratic {
            k: quadratic_coefficient(zeta, v.diameter_m),
        })
    }

    /// Head drop from start to end node for flow `q`.
    pub fn headloss(&self, q: f64) -> f64 {
        match self {
            LinkLaw::Pipe {
                check_valve: Some(r),
                ..
            } if q < 0.0 => r * q,
            LinkLaw::Pipe {
                length_m,
                diameter_m,
                roughness_m,
                minor_k,
                viscosity_m2ps,
                ..
            } => {
                let v = q / area(*diameter_m);
                let re = v.abs() * diameter_m / viscosity_m2ps;
                let friction = if re < RE_LAMINAR {
                    // Hagen-Poiseuille, written without Re to stay defined at q = 0.
                    32.0 * viscosity_m2ps * length_m * v / (G_MPS2 * diameter_m * diameter_m)
                } else {
                    let f = darcy_friction_factor(re, roughness_m / diameter_m);
                    f * length_m / diameter_m * v * v.abs() / (2.0 * G_MPS2)
                };
                friction + minor_k * q * q.abs()
            }
            LinkLaw::Pump {
                curve,
                speed,
                reverse_resistance,
            } => {
                // Affinity laws: h(q, s) = s² h(q / s, 1)
                if q < 0.0 {
                    -(speed * speed * curve.shutoff_head() - reverse_resistance * q)
                } else {
                    -(speed * speed * curve.gain(q / speed))
                }
            }
            LinkLaw::Quadratic { k } => k * q * q.abs(),
            LinkLaw::Closed { r } => r * q,
        }
    }

    /// `dh/dq`, evaluated at `min_flow` when `|q|` is smaller and never below a small floor.
    pub fn slope(&self, q: f64, min_flow: f64) -> f64 {
        if let LinkLaw::Closed { r } = self {
            return *r;
        }
        let q_eval = if q.abs() < min_flow {
            if q < 0.0 { -min_flow } else { min_flow }
        } else {
            q
        };
        let dq = (q_eval.abs() * 1e-6).max(1e-10);
        let d = (self.headloss(q_eval + dq) - self.headloss(q_eval - dq)) / (2.0 * dq);
        if d.is_finite() { d.max(MIN_SLOPE) } else { MIN_SLOPE }
    }

    /// Darcy friction factor at flow `q`; zero for anything that is not an open pipe.
    pub fn friction_factor(&self, q: f64) -> f64 {
        match self {
            LinkLaw::Pipe {
                check_valve: Some(_),
                ..
            } if q < 0.0 => 0.0,
            LinkLaw::Pipe {
                diameter_m,
                roughness_m,
                viscosity_m2ps,
                ..
            } => {
                let v = q / area(*diameter_m);
                let re = v.abs() * diameter_m / viscosity_m2ps;
                darcy_friction_factor(re, roughness_m / diameter_m)
            }
            _ => 0.0,
        }
    }
}

/// Mean velocity through a link, signed like the flow; zero for pumps.
pub fn link_velocity(link: &Link, q: f64) -> f64 {
    match link.diameter_m() {
        Some(d) if d > 0.0 => q / area(d),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laminar_friction() {
        assert!((darcy_friction_factor(1000.0, 0.0) - 0.064).abs() < 1e-12);
        assert_eq!(darcy_friction_factor(0.0, 0.001), 0.0);
    }

    #[test]
    fn turbulent_friction_reasonable() {
        // Smooth pipe at Re = 1e5 is close to 0.018
        let f = darcy_friction_factor(1e5, 0.0);
        assert!((f - 0.018).abs() < 0.001, "f = {f}");
        // Rougher pipe loses more
        assert!(darcy_friction_factor(1e5, 0.01) > f);
    }

    #[test]
    fn transition_is_continuous() {
        let below = darcy_friction_factor(RE_LAMINAR - 1e-6, 1e-4);
        let above = darcy_friction_factor(RE_LAMINAR + 1e-6, 1e-4);
        assert!((below - above).abs() < 1e-6);
    }

    #[test]
    fn single_point_pump_curve() {
        let curve = PumpCurve::from_points(&[CurvePoint::new(0.02, 30.0)]).unwrap();
        assert!((curve.gain(0.02) - 30.0).abs() < 1e-9);
        assert!((curve.shutoff_head() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn table_pump_curve_interpolates() {
        let curve = PumpCurve::from_points(&[
            CurvePoint::new(0.0, 40.0),
            CurvePoint::new(0.01, 35.0),
            CurvePoint::new(0.02, 25.0),
        ])
        .unwrap();
        assert!((curve.gain(0.005) - 37.5).abs() < 1e-9);
        assert!((curve.gain(0.015) - 30.0).abs() < 1e-9);
        // extrapolates along the last segment
        assert!((curve.gain(0.03) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn bad_pump_curves_rejected() {
        assert!(PumpCurve::from_points(&[]).is_err());
        assert!(PumpCurve::from_points(&[CurvePoint::new(0.0, 10.0)]).is_err());
        assert!(
            PumpCurve::from_points(&[CurvePoint::new(0.02, 10.0), CurvePoint::new(0.01, 20.0)])
                .is_err()
        );
    }

    #[test]
    fn pump_speed_scales_head() {
        let law = LinkLaw::Pump {
            curve: PumpCurve::from_points(&[CurvePoint::new(0.02, 30.0)]).unwrap(),
            speed: 0.5,
            reverse_resistance: 1e8,
        };
        // at q = 0 the gain is s² times the shutoff head
        assert!((law.headloss(0.0) + 0.25 * 40.0).abs() < 1e-9);
    }

    #[test]
    fn pipe_headloss_is_odd_and_increasing() {
        let law = LinkLaw::Pipe {
            length_m: 20.0,
            diameter_m: 0.15,
            roughness_m: 1e-4,
            minor_k: 0.0,
            viscosity_m2ps: 1.004e-6,
            check_valve: None,
        };
        assert_eq!(law.headloss(0.0), 0.0);
        assert!((law.headloss(0.03) + law.headloss(-0.03)).abs() < 1e-12);
        assert!(law.headloss(0.03) > law.headloss(0.01));
        assert!(law.slope(0.0, 1e-6) > 0.0);
    }

    #[test]
    fn check_valve_blocks_reverse_flow() {
        let law = LinkLaw::Pipe {
            length_m: 0.01,
            diameter_m: 0.1,
            roughness_m: 1e-9,
            minor_k: 10.0,
            viscosity_m2ps: 1e-6,
            check_valve: Some(1e8),
        };
        assert!((law.headloss(-1e-3) + 1e5).abs() < 1e-6);
        assert!(law.headloss(1e-3) > 0.0);
    }

    proptest::proptest! {
        #[test]
        fn friction_grows_with_roughness(re in 1.0f64..1e7, eps in 0.0f64..0.05, extra in 0.0f64..0.05) {
            let smooth = darcy_friction_factor(re, eps);
            let rough = darcy_friction_factor(re, eps + extra);
            proptest::prop_assert!(smooth.is_finite() && smooth > 0.0);
            proptest::prop_assert!(rough >= smooth - 1e-12);
        }
    }
}
