//! Nets: the transitive closure of directly wired pins.
//!
//! A [`NetMap`] is built once per compiled function with a union-find over
//! every link in the graph. Terminals are registered per net, so every pin of
//! a net resolves to the same terminal.

use kismet_core::{Graph, PinId};
use petgraph::unionfind::UnionFind;
use rustc_hash::FxHashMap;

/// Identity of a net within one [`NetMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetId(pub u32);

/// Pin to net assignment for one graph.
#[derive(Debug)]
pub struct NetMap {
    index: FxHashMap<PinId, usize>,
    sets: UnionFind<usize>,
}

impl NetMap {
    /// Group the pins of `graph` into nets.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(graph: &Graph) -> Self {
        let mut index = FxHashMap::default();
        for pin in graph.nodes().iter().flat_map(|n| n.pins.iter()) {
            let next = index.len();
            index.entry(pin.id).or_insert(next);
        }

        let mut sets = UnionFind::new(index.len());
        for pin in graph.nodes().iter().flat_map(|n| n.pins.iter()) {
            for other in &pin.links {
                if let (Some(&a), Some(&b)) = (index.get(&pin.id), index.get(other)) {
                    sets.union(a, b);
                }
            }
        }

        Self { index, sets }
    }

    /// Net containing `pin`, or `None` for a pin not in the graph.
    pub fn net_of(&self, pin: PinId) -> Option<NetId> {
        self.index
            .get(&pin)
            .map(|&i| NetId(self.sets.find(i) as u32))
    }

    pub fn same_net(&self, a: PinId, b: PinId) -> bool {
        match (self.net_of(a), self.net_of(b)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Number of pins covered.
    pub fn pin_count(&self) -> usize {
        self.index.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kismet_core::{GraphId, GraphKind, Location, NodeConfig, NodeKind, PinTemplate, PinType};

    fn node(graph: &mut Graph, pins: Vec<PinTemplate>) -> Vec<PinId> {
        let id = graph.add_node_with_pins(NodeKind::Tunnel, NodeConfig::default(), Location::default(), pins);
        graph.node(id).unwrap().pins.iter().map(|p| p.id).collect()
    }

    #[test]
    fn fan_out_forms_one_net() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let source = node(&mut graph, vec![PinTemplate::output("out", PinType::int())]);
        let a = node(&mut graph, vec![PinTemplate::input("in", PinType::int())]);
        let b = node(&mut graph, vec![PinTemplate::input("in", PinType::int())]);
        let lonely = node(&mut graph, vec![PinTemplate::input("in", PinType::int())]);
        graph.link(source[0], a[0]).unwrap();
        graph.link(source[0], b[0]).unwrap();

        let nets = NetMap::build(&graph);
        assert_eq!(nets.pin_count(), 4);
        assert!(nets.same_net(a[0], b[0]));
        assert!(nets.same_net(source[0], b[0]));
        assert!(!nets.same_net(source[0], lonely[0]));
    }

    #[test]
    fn unknown_pin_has_no_net() {
        let graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let nets = NetMap::build(&graph);
        assert_eq!(nets.net_of(PinId(9)), None);
        assert!(!nets.same_net(PinId(9), PinId(9)));
    }
}
