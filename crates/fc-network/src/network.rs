//! The hydraulic network container.

use std::collections::HashMap;
use std::fmt;

use fc_core::Fluid;
use petgraph::unionfind::UnionFind;
use tracing::trace;

use crate::component::{HydraulicComponent, Link, LinkStatus, Node};
use crate::error::{NetworkError, NetworkResult};

/// Nodes and links keyed by id, plus the fluid they carry.
///
/// Invariants:
/// - node ids are unique, link ids are unique
/// - a link is only accepted once both of its endpoints exist
///
/// Insertion order is preserved so that solver indexing and exports are
/// deterministic.
#[derive(Debug, Clone)]
pub struct HydraulicNetwork {
    fluid: Fluid,
    nodes: Vec<Node>,
    links: Vec<Link>,
    node_index: HashMap<String, usize>,
    link_index: HashMap<String, usize>,
}

impl Default for HydraulicNetwork {
    fn default() -> Self {
        Self::new(Fluid::water())
    }
}

impl HydraulicNetwork {
    /// Create an empty network carrying `fluid`.
    pub fn new(fluid: Fluid) -> Self {
        Self {
            fluid,
            nodes: Vec::new(),
            links: Vec::new(),
            node_index: HashMap::new(),
            link_index: HashMap::new(),
        }
    }

    pub fn fluid(&self) -> &Fluid {
        &self.fluid
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.link_index.get(id).map(|&i| &self.links[i])
    }

    /// Position of a node in [`Self::nodes`].
    pub fn node_position(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn contains_link(&self, id: &str) -> bool {
        self.link_index.contains_key(id)
    }

    /// Add a node; fails if the id is empty or already taken.
    pub fn add_node(&mut self, node: Node) -> NetworkResult<()> {
        let id = node.id().to_string();
        if id.is_empty() {
            return Err(NetworkError::EmptyId { what: "node" });
        }
        if self.node_index.contains_key(&id) {
            return Err(NetworkError::DuplicateNode { id });
        }
        self.node_index.insert(id, self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Add a link; both endpoints must already be present.
    pub fn add_link(&mut self, link: Link) -> NetworkResult<()> {
        let id = link.id().to_string();
        if id.is_empty() {
            return Err(NetworkError::EmptyId { what: "link" });
        }
        if self.link_index.contains_key(&id) {
            return Err(NetworkError::DuplicateLink { id });
        }
        for endpoint in [link.start_node(), link.end_node()] {
            if !self.node_index.contains_key(endpoint) {
                return Err(NetworkError::MissingEndpoint {
                    link: id,
                    node: endpoint.to_string(),
                });
            }
        }
        self.link_index.insert(id, self.links.len());
        self.links.push(link);
        Ok(())
    }

    pub fn add_component(&mut self, component: HydraulicComponent) -> NetworkResult<()> {
        match component {
            HydraulicComponent::Node(n) => self.add_node(n),
            HydraulicComponent::Link(l) => self.add_link(l),
        }
    }

    /// Merge a component emitted by an equipment translation.
    ///
    /// A node whose id is already present is skipped (first writer wins) and
    /// `Ok(false)` is returned; links keep the strict [`Self::add_link`] rules.
    pub fn merge_component(&mut self, component: HydraulicComponent) -> NetworkResult<bool> {
        match component {
            HydraulicComponent::Node(n) if self.contains_node(n.id()) => {
                trace!(node = n.id(), "shared node already present");
                Ok(false)
            }
            other => self.add_component(other).map(|()| true),
        }
    }

    /// Indices (into [`Self::nodes`]) of each connected group with no reservoir.
    ///
    /// Such a group has no head reference and cannot be solved.
    pub fn groups_without_reservoir(&self) -> Vec<Vec<usize>> {
        let mut uf = UnionFind::<usize>::new(self.nodes.len());
        for link in &self.links {
            if let (Some(a), Some(b)) = (
                self.node_position(link.start_node()),
                self.node_position(link.end_node()),
            ) {
                uf.union(a, b);
            }
        }

        let mut groups: Vec<(usize, Vec<usize>, bool)> = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let root = uf.find(i);
            match groups.iter_mut().find(|(r, _, _)| *r == root) {
                Some((_, members, has_res)) => {
                    members.push(i);
                    *has_res |= node.is_reservoir();
                }
                None => groups.push((root, vec![i], node.is_reservoir())),
            }
        }

        groups
            .into_iter()
            .filter(|(_, _, has_res)| !has_res)
            .map(|(_, members, _)| members)
            .collect()
    }

    /// Advisory list of problems the solver would trip over. Never fails.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.nodes.is_empty() {
            problems.push("network has no nodes".to_string());
        }

        for node in &self.nodes {
            if !node.elevation_m().is_finite() {
                problems.push(format!("node '{}': elevation is not finite", node.id()));
            }
            match node {
                Node::Junction(j) if !j.demand_m3s.is_finite() => {
                    problems.push(format!("junction '{}': demand is not finite", j.id));
                }
                Node::Reservoir(r) if !r.head_m.is_finite() => {
                    problems.push(format!("reservoir '{}': head is not finite", r.id));
                }
                _ => {}
            }
        }

        for link in &self.links {
            let id = link.id();
            if link.start_node() == link.end_node() {
                problems.push(format!("link '{id}': start and end node are the same"));
            }
            if let Some(d) = link.diameter_m() {
                if !(d.is_finite() && d > 0.0) {
                    problems.push(format!("link '{id}': diameter must be positive"));
                }
            }
            match link {
                Link::Pipe(p) => {
                    if !(p.length_m.is_finite() && p.length_m > 0.0) {
                        problems.push(format!("pipe '{id}': length must be positive"));
                    }
                    if !(p.roughness_m.is_finite() && p.roughness_m >= 0.0) {
                        problems.push(format!("pipe '{id}': roughness must be non-negative"));
                    }
                    if !(p.minor_loss.is_finite() && p.minor_loss >= 0.0) {
                        problems.push(format!("pipe '{id}': minor loss must be non-negative"));
                    }
                    if p.status == LinkStatus::Active {
                        problems.push(format!("pipe '{id}': status cannot be active"));
                    }
                }
                Link::Pump(p) => {
                    if p.curve.is_empty() {
                        problems.push(format!("pump '{id}': head curve is empty"));
                    }
                    if p.curve.iter().any(|pt| !(pt.flow_m3s.is_finite() && pt.flow_m3s >= 0.0)) {
                        problems.push(format!("pump '{id}': curve flows must be non-negative"));
                    }
                    if p.curve.iter().any(|pt| !pt.head_m.is_finite()) {
                        problems.push(format!("pump '{id}': curve heads must be finite"));
                    }
                    if p.curve.windows(2).any(|w| w[1].flow_m3s <= w[0].flow_m3s) {
                        problems.push(format!("pump '{id}': curve flows must be increasing"));
                    }
                    if !(p.speed.is_finite() && p.speed > 0.0) {
                        problems.push(format!("pump '{id}': speed must be positive"));
                    }
                }
                Link::Valve(v) => {
                    if !v.setting.is_finite() {
                        problems.push(format!("valve '{id}': setting is not finite"));
                    }
                }
            }
        }

        for group in self.groups_without_reservoir() {
            let ids: Vec<&str> = group.iter().map(|&i| self.nodes[i].id()).collect();
            problems.push(format!(
                "nodes [{}] are not connected to any reservoir",
                ids.join(", ")
            ));
        }

        problems
    }
}

impl fmt::Display for HydraulicNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "HydraulicNetwork: {} nodes, {} links, fluid {}",
            self.nodes.len(),
            self.links.len(),
            self.fluid
        )?;
        for node in &self.nodes {
            match node {
                Node::Junction(j) => writeln!(
                    f,
                    "  junction  {} z={} m demand={} m³/s",
                    j.id, j.elevation_m, j.demand_m3s
                )?,
                Node::Reservoir(r) => {
                    writeln!(f, "  reservoir {} head={} m", r.id, r.head_m)?
                }
            }
        }
        for link in &self.links {
            writeln!(
                f,
                "  {:<9} {} {} -> {} [{}]",
                link.kind_name(),
                link.id(),
                link.start_node(),
                link.end_node(),
                link.status()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{CurvePoint, Junction, Pipe, Pump, Reservoir};

    fn two_node_net() -> HydraulicNetwork {
        let mut net = HydraulicNetwork::default();
        net.add_node(Node::Reservoir(Reservoir::new("R", 10.0, 0.0))).unwrap();
        net.add_node(Node::Junction(Junction::new("J", 0.0))).unwrap();
        net
    }

    #[test]
    fn duplicate_node_rejected() {
        let mut net = two_node_net();
        let err = net.add_node(Node::Junction(Junction::new("J", 1.0))).unwrap_err();
        assert_eq!(err, NetworkError::DuplicateNode { id: "J".into() });
        assert_eq!(net.node_count(), 2);
    }

    #[test]
    fn link_requires_endpoints() {
        let mut net = two_node_net();
        let err = net
            .add_link(Link::Pipe(Pipe::new("P", "R", "X", 1.0, 0.1, 0.0)))
            .unwrap_err();
        assert!(matches!(err, NetworkError::MissingEndpoint { .. }));
        assert_eq!(net.link_count(), 0);

        net.add_link(Link::Pipe(Pipe::new("P", "R", "J", 1.0, 0.1, 0.0))).unwrap();
        assert!(net.contains_link("P"));
        let err = net
            .add_link(Link::Pipe(Pipe::new("P", "J", "R", 1.0, 0.1, 0.0)))
            .unwrap_err();
        assert!(matches!(err, NetworkError::DuplicateLink { .. }));
    }

    #[test]
    fn merge_keeps_first_node() {
        let mut net = two_node_net();
        let inserted = net.merge_component(Junction::new("J", 99.0).into()).unwrap();
        assert!(!inserted);
        assert_eq!(net.node("J").map(Node::elevation_m), Some(0.0));
        assert!(net.merge_component(Junction::new("K", 1.0).into()).unwrap());
    }

    #[test]
    fn empty_id_rejected() {
        let mut net = HydraulicNetwork::default();
        assert_eq!(
            net.add_node(Node::Junction(Junction::new("", 0.0))),
            Err(NetworkError::EmptyId { what: "node" })
        );
    }

    #[test]
    fn floating_group_is_reported() {
        let mut net = two_node_net();
        net.add_link(Link::Pipe(Pipe::new("P", "R", "J", 1.0, 0.1, 0.0))).unwrap();
        net.add_node(Node::Junction(Junction::new("A", 0.0))).unwrap();
        net.add_node(Node::Junction(Junction::new("B", 0.0))).unwrap();
        net.add_link(Link::Pipe(Pipe::new("AB", "A", "B", 1.0, 0.1, 0.0))).unwrap();

        let groups = net.groups_without_reservoir();
        assert_eq!(groups, vec![vec![2, 3]]);
        let problems = net.validate();
        assert!(problems.iter().any(|p| p.contains("[A, B]")));
    }

    #[test]
    fn validate_flags_bad_parameters() {
        let mut net = two_node_net();
        net.add_link(Link::Pipe(Pipe::new("P", "R", "J", 0.0, -0.1, -1.0))).unwrap();
        net.add_link(Link::Pump(Pump::new("Pu", "J", "R", Vec::new()))).unwrap();
        let problems = net.validate();
        assert!(problems.iter().any(|p| p.contains("length must be positive")));
        assert!(problems.iter().any(|p| p.contains("diameter must be positive")));
        assert!(problems.iter().any(|p| p.contains("roughness")));
        assert!(problems.iter().any(|p| p.contains("head curve is empty")));
    }

    #[test]
    fn clean_network_validates() {
        let mut net = two_node_net();
        net.add_link(Link::Pump(Pump::new(
            "Pu",
            "R",
            "J",
            vec![CurvePoint::new(0.0, 30.0), CurvePoint::new(0.02, 20.0)],
        )))
        .unwrap();
        assert!(net.validate().is_empty(), "{:?}", net.validate());
    }

    proptest::proptest! {
        #[test]
        fn merging_keeps_one_node_per_id(ids in proptest::collection::vec(0u8..6, 0..30)) {
            let mut net = HydraulicNetwork::default();
            let mut fresh = 0;
            for i in &ids {
                let node = Node::Junction(Junction::new(format!("N{i}"), 0.0));
                if net.merge_component(node.into()).unwrap() {
                    fresh += 1;
                }
            }
            let mut distinct = ids.clone();
            distinct.sort_unstable();
            distinct.dedup();
            proptest::prop_assert_eq!(net.node_count(), distinct.len());
            proptest::prop_assert_eq!(fresh, distinct.len());
        }
    }
}
