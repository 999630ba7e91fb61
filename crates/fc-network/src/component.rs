//! Solver-facing primitives.
//!
//! All quantities are plain SI `f64` with the unit in the field name: this is
//! the exchange format handed to a steady-state solver, not a modelling API.

use fc_core::{LinkId, NodeId};
use serde::{Deserialize, Serialize};

/// Open/closed/active state of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    #[default]
    Open,
    Closed,
    /// Valve regulated by its setting.
    Active,
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::Open => f.write_str("Open"),
            LinkStatus::Closed => f.write_str("Closed"),
            LinkStatus::Active => f.write_str("Active"),
        }
    }
}

/// Valve kinds understood by the solver boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValveType {
    /// Pressure reducing.
    Prv,
    /// Pressure sustaining.
    Psv,
    /// Pressure breaker.
    Pbv,
    /// Flow control.
    Fcv,
    /// Throttle control: setting is a minor-loss coefficient.
    Tcv,
    /// General purpose (head-loss curve).
    Gpv,
}

impl ValveType {
    pub fn code(self) -> &'static str {
        match self {
            ValveType::Prv => "PRV",
            ValveType::Psv => "PSV",
            ValveType::Pbv => "PBV",
            ValveType::Fcv => "FCV",
            ValveType::Tcv => "TCV",
            ValveType::Gpv => "GPV",
        }
    }
}

/// Node with a net demand. Negative demand injects flow into the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Junction {
    pub id: NodeId,
    pub elevation_m: f64,
    #[serde(default)]
    pub demand_m3s: f64,
}

impl Junction {
    pub fn new(id: impl Into<NodeId>, elevation_m: f64) -> Self {
        Self {
            id: id.into(),
            elevation_m,
            demand_m3s: 0.0,
        }
    }

    pub fn with_demand(mut self, demand_m3s: f64) -> Self {
        self.demand_m3s = demand_m3s;
        self
    }
}

/// Node with a fixed, externally imposed head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reservoir {
    pub id: NodeId,
    pub head_m: f64,
    #[serde(default)]
    pub elevation_m: f64,
}

impl Reservoir {
    pub fn new(id: impl Into<NodeId>, head_m: f64, elevation_m: f64) -> Self {
        Self {
            id: id.into(),
            head_m,
            elevation_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipe {
    pub id: LinkId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub length_m: f64,
    pub diameter_m: f64,
    /// Absolute roughness (Darcy-Weisbach).
    pub roughness_m: f64,
    #[serde(default)]
    pub minor_loss: f64,
    #[serde(default)]
    pub status: LinkStatus,
    #[serde(default)]
    pub check_valve: bool,
}

impl Pipe {
    pub fn new(
        id: impl Into<LinkId>,
        start_node: impl Into<NodeId>,
        end_node: impl Into<NodeId>,
        length_m: f64,
        diameter_m: f64,
        roughness_m: f64,
    ) -> Self {
        Self {
            id: id.into(),
            start_node: start_node.into(),
            end_node: end_node.into(),
            length_m,
            diameter_m,
            roughness_m,
            minor_loss: 0.0,
            status: LinkStatus::Open,
            check_valve: false,
        }
    }

    pub fn with_minor_loss(mut self, zeta: f64) -> Self {
        self.minor_loss = zeta;
        self
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_check_valve(mut self, check_valve: bool) -> Self {
        self.check_valve = check_valve;
        self
    }
}

/// One point of a pump head/flow characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub flow_m3s: f64,
    pub head_m: f64,
}

impl CurvePoint {
    pub fn new(flow_m3s: f64, head_m: f64) -> Self {
        Self { flow_m3s, head_m }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pump {
    pub id: LinkId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    /// Ordered by increasing flow.
    pub curve: Vec<CurvePoint>,
    /// Relative speed multiplier (affinity laws).
    #[serde(default = "default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub status: LinkStatus,
}

fn default_speed() -> f64 {
    1.0
}

impl Pump {
    pub fn new(
        id: impl Into<LinkId>,
        start_node: impl Into<NodeId>,
        end_node: impl Into<NodeId>,
        curve: Vec<CurvePoint>,
    ) -> Self {
        Self {
            id: id.into(),
            start_node: start_node.into(),
            end_node: end_node.into(),
            curve,
            speed: 1.0,
            status: LinkStatus::Open,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Name of the head curve this pump references at the solver boundary.
    pub fn curve_name(&self) -> String {
        format!("{}_curve", self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Valve {
    pub id: LinkId,
    pub start_node: NodeId,
    pub end_node: NodeId,
    pub diameter_m: f64,
    pub valve_type: ValveType,
    /// Control setting; for a TCV this is the loss coefficient ζ.
    pub setting: f64,
    /// Loss coefficient used while the valve is fully open.
    #[serde(default)]
    pub minor_loss: f64,
    #[serde(default)]
    pub status: LinkStatus,
}

impl Valve {
    pub fn new(
        id: impl Into<LinkId>,
        start_node: impl Into<NodeId>,
        end_node: impl Into<NodeId>,
        diameter_m: f64,
        valve_type: ValveType,
        setting: f64,
    ) -> Self {
        Self {
            id: id.into(),
            start_node: start_node.into(),
            end_node: end_node.into(),
            diameter_m,
            valve_type,
            setting,
            minor_loss: 0.0,
            status: LinkStatus::Active,
        }
    }

    pub fn with_minor_loss(mut self, zeta: f64) -> Self {
        self.minor_loss = zeta;
        self
    }

    pub fn with_status(mut self, status: LinkStatus) -> Self {
        self.status = status;
        self
    }
}

/// Solver node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Junction(Junction),
    Reservoir(Reservoir),
}

impl Node {
    pub fn id(&self) -> &str {
        match self {
            Node::Junction(j) => &j.id,
            Node::Reservoir(r) => &r.id,
        }
    }

    pub fn elevation_m(&self) -> f64 {
        match self {
            Node::Junction(j) => j.elevation_m,
            Node::Reservoir(r) => r.elevation_m,
        }
    }

    pub fn is_reservoir(&self) -> bool {
        matches!(self, Node::Reservoir(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Junction(_) => "junction",
            Node::Reservoir(_) => "reservoir",
        }
    }
}

/// Solver link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Link {
    Pipe(Pipe),
    Pump(Pump),
    Valve(Valve),
}

impl Link {
    pub fn id(&self) -> &str {
        match self {
            Link::Pipe(p) => &p.id,
            Link::Pump(p) => &p.id,
            Link::Valve(v) => &v.id,
        }
    }

    pub fn start_node(&self) -> &str {
        match self {
            Link::Pipe(p) => &p.start_node,
            Link::Pump(p) => &p.start_node,
            Link::Valve(v) => &v.start_node,
        }
    }

    pub fn end_node(&self) -> &str {
        match self {
            Link::Pipe(p) => &p.end_node,
            Link::Pump(p) => &p.end_node,
            Link::Valve(v) => &v.end_node,
        }
    }

    pub fn status(&self) -> LinkStatus {
        match self {
            Link::Pipe(p) => p.status,
            Link::Pump(p) => p.status,
            Link::Valve(v) => v.status,
        }
    }

    /// Flow-carrying diameter, if the link has one.
    pub fn diameter_m(&self) -> Option<f64> {
        match self {
            Link::Pipe(p) => Some(p.diameter_m),
            Link::Pump(_) => None,
            Link::Valve(v) => Some(v.diameter_m),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Link::Pipe(_) => "pipe",
            Link::Pump(_) => "pump",
            Link::Valve(_) => "valve",
        }
    }
}

/// Any primitive an equipment can emit.
#[derive(Debug, Clone, PartialEq)]
pub enum HydraulicComponent {
    Node(Node),
    Link(Link),
}

impl HydraulicComponent {
    pub fn id(&self) -> &str {
        match self {
            HydraulicComponent::Node(n) => n.id(),
            HydraulicComponent::Link(l) => l.id(),
        }
    }

    pub fn is_node(&self) -> bool {
        matches!(self, HydraulicComponent::Node(_))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            HydraulicComponent::Node(n) => n.kind_name(),
            HydraulicComponent::Link(l) => l.kind_name(),
        }
    }
}

macro_rules! impl_into_component {
    ($ty:ident, $outer:ident, $inner:ident) => {
        impl From<$ty> for HydraulicComponent {
            fn from(v: $ty) -> Self {
                HydraulicComponent::$outer($outer::$inner(v))
            }
        }
    };
}

impl_into_component!(Junction, Node, Junction);
impl_into_component!(Reservoir, Node, Reservoir);
impl_into_component!(Pipe, Link, Pipe);
impl_into_component!(Pump, Link, Pump);
impl_into_component!(Valve, Link, Valve);

impl From<Node> for HydraulicComponent {
    fn from(n: Node) -> Self {
        HydraulicComponent::Node(n)
    }
}

impl From<Link> for HydraulicComponent {
    fn from(l: Link) -> Self {
        HydraulicComponent::Link(l)
    }
}
