//! Graphs and blueprints.
//!
//! A [`Graph`] owns its nodes; pins are owned by nodes and refer to each other
//! by [`PinId`]. Links are stored on both ends and kept symmetric by every
//! edit. A [`Blueprint`] owns the graphs edited for one blueprint asset.
//!
//! # Example
//!
//! ```
//! use kismet_core::{Graph, GraphId, GraphKind, Location, NodeConfig, NodeKind, PinTemplate, PinType};
//!
//! let mut graph = Graph::new(GraphId(0), "EventGraph", GraphKind::Ubergraph);
//! let a = graph.add_node_with_pins(
//!     NodeKind::Tunnel,
//!     NodeConfig::default(),
//!     Location::default(),
//!     vec![PinTemplate::output("out", PinType::int())],
//! );
//! let b = graph.add_node_with_pins(
//!     NodeKind::Tunnel,
//!     NodeConfig::default(),
//!     Location::default(),
//!     vec![PinTemplate::input("in", PinType::int())],
//! );
//! let out = graph.find_pin(a, "out").unwrap().id;
//! let input = graph.find_pin(b, "in").unwrap().id;
//! graph.link(out, input).unwrap();
//! assert_eq!(graph.linked_pins(input), &[out]);
//! ```

use rustc_hash::FxHashMap;

use crate::{
    GraphError, GraphResult, Location, MetadataProvider, Node, NodeConfig, NodeId, NodeKind,
    ObjectId, Pin, PinDirection, PinId, PinTemplate, PinType, TypeHash, default_pins,
};

/// Graph identity within a blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GraphId(pub u32);

/// Role of a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphKind {
    /// Event graph.
    Ubergraph,
    Function,
    Macro,
    Animation,
    Construction,
}

/// Schema governing which nodes a graph accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    K2,
    /// Animation schema, a specialisation of K2.
    Animation,
    Material,
}

/// A node graph.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub id: GraphId,
    pub name: String,
    pub kind: GraphKind,
    pub schema: SchemaKind,
    /// Only pure nodes may be placed (e.g. const function graphs).
    pub pure_only: bool,
    nodes: Vec<Node>,
    pin_owners: FxHashMap<PinId, NodeId>,
    next_node: u32,
    next_pin: u32,
}

impl Graph {
    pub fn new(id: GraphId, name: impl Into<String>, kind: GraphKind) -> Self {
        let schema = match kind {
            GraphKind::Animation => SchemaKind::Animation,
            _ => SchemaKind::K2,
        };
        Self {
            id,
            name: name.into(),
            kind,
            schema,
            pure_only: false,
            nodes: Vec::new(),
            pin_owners: FxHashMap::default(),
            next_node: 0,
            next_pin: 0,
        }
    }

    pub fn with_schema(mut self, schema: SchemaKind) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_pure_only(mut self) -> Self {
        self.pure_only = true;
        self
    }

    /// Whether impure (exec) nodes may be placed in this graph.
    pub fn supports_impure(&self) -> bool {
        !self.pure_only && self.kind != GraphKind::Animation
    }

    // ==========================================================================
    // Nodes
    // ==========================================================================

    /// Nodes in placement order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Place a node with its default pin layout.
    pub fn add_node(
        &mut self,
        kind: NodeKind,
        config: NodeConfig,
        location: Location,
        metadata: &dyn MetadataProvider,
    ) -> NodeId {
        let pins = default_pins(kind, &config, metadata);
        self.add_node_with_pins(kind, config, location, pins)
    }

    /// Place a node with an explicit pin layout.
    pub fn add_node_with_pins(
        &mut self,
        kind: NodeKind,
        config: NodeConfig,
        location: Location,
        pins: Vec<PinTemplate>,
    ) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        let pins = pins
            .into_iter()
            .map(|template| {
                let pin_id = self.alloc_pin();
                self.pin_owners.insert(pin_id, id);
                Pin::new(pin_id, template)
            })
            .collect();
        self.nodes.push(Node {
            id,
            kind,
            config,
            location,
            pins,
        });
        id
    }

    /// Remove a node, breaking all of its links first.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<Node> {
        let pin_ids: Vec<PinId> = self
            .node(id)
            .ok_or(GraphError::NodeNotFound(id))?
            .pins
            .iter()
            .map(|p| p.id)
            .collect();
        for pin in &pin_ids {
            self.break_links(*pin)?;
            self.pin_owners.remove(pin);
        }
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(GraphError::NodeNotFound(id))?;
        Ok(self.nodes.remove(index))
    }

    fn alloc_pin(&mut self) -> PinId {
        let id = PinId(self.next_pin);
        self.next_pin += 1;
        id
    }

    // ==========================================================================
    // Pins
    // ==========================================================================

    /// Append a pin to an existing node.
    pub fn add_pin(&mut self, node: NodeId, template: PinTemplate) -> GraphResult<PinId> {
        if self.node(node).is_none() {
            return Err(GraphError::NodeNotFound(node));
        }
        let pin_id = self.alloc_pin();
        self.pin_owners.insert(pin_id, node);
        if let Some(n) = self.node_mut(node) {
            n.pins.push(Pin::new(pin_id, template));
        }
        Ok(pin_id)
    }

    /// Remove a pin, breaking its links.
    pub fn remove_pin(&mut self, pin: PinId) -> GraphResult<Pin> {
        let owner = self.pin_owner(pin).ok_or(GraphError::PinNotFound(pin))?;
        self.break_links(pin)?;
        self.pin_owners.remove(&pin);
        let node = self.node_mut(owner).ok_or(GraphError::NodeNotFound(owner))?;
        let index = node
            .pins
            .iter()
            .position(|p| p.id == pin)
            .ok_or(GraphError::PinNotFound(pin))?;
        Ok(node.pins.remove(index))
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.node(self.pin_owner(id)?)?.pin(id)
    }

    fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        let owner = self.pin_owner(id)?;
        self.node_mut(owner)?.pins.iter_mut().find(|p| p.id == id)
    }

    /// Node owning `pin`.
    pub fn pin_owner(&self, pin: PinId) -> Option<NodeId> {
        self.pin_owners.get(&pin).copied()
    }

    pub fn find_pin(&self, node: NodeId, name: &str) -> Option<&Pin> {
        self.node(node)?.find_pin(name)
    }

    /// Pin of `node` named `name`, or an error naming what is missing.
    pub fn require_pin(&self, node: NodeId, name: &str) -> GraphResult<PinId> {
        self.find_pin(node, name)
            .map(|p| p.id)
            .ok_or_else(|| GraphError::PinNameNotFound {
                node,
                name: name.to_string(),
            })
    }

    /// Pins wired to `pin`.
    pub fn linked_pins(&self, pin: PinId) -> &[PinId] {
        self.pin(pin).map(|p| p.links.as_slice()).unwrap_or(&[])
    }

    /// Set the unlinked value of an input pin.
    pub fn set_default(&mut self, pin: PinId, value: crate::Literal) -> GraphResult<()> {
        let pin = self.pin_mut(pin).ok_or(GraphError::PinNotFound(pin))?;
        pin.default = Some(value);
        Ok(())
    }

    // ==========================================================================
    // Links
    // ==========================================================================

    /// Wire two pins of opposite direction on different nodes.
    pub fn link(&mut self, a: PinId, b: PinId) -> GraphResult<()> {
        let owner_a = self.pin_owner(a).ok_or(GraphError::PinNotFound(a))?;
        let owner_b = self.pin_owner(b).ok_or(GraphError::PinNotFound(b))?;
        if owner_a == owner_b {
            return Err(GraphError::SameNode { a, b });
        }
        let dir_a = self.pin(a).ok_or(GraphError::PinNotFound(a))?.direction;
        let dir_b = self.pin(b).ok_or(GraphError::PinNotFound(b))?.direction;
        if dir_a == dir_b {
            return Err(GraphError::SameDirection { a, b });
        }
        if let Some(pin) = self.pin_mut(a)
            && !pin.links.contains(&b)
        {
            pin.links.push(b);
        }
        if let Some(pin) = self.pin_mut(b)
            && !pin.links.contains(&a)
        {
            pin.links.push(a);
        }
        Ok(())
    }

    /// Remove a single link.
    pub fn unlink(&mut self, a: PinId, b: PinId) {
        if let Some(pin) = self.pin_mut(a) {
            pin.links.retain(|p| *p != b);
        }
        if let Some(pin) = self.pin_mut(b) {
            pin.links.retain(|p| *p != a);
        }
    }

    /// Remove every link of `pin`.
    pub fn break_links(&mut self, pin: PinId) -> GraphResult<()> {
        let links = self
            .pin(pin)
            .ok_or(GraphError::PinNotFound(pin))?
            .links
            .clone();
        for other in links {
            self.unlink(pin, other);
        }
        Ok(())
    }

    /// Move all links (and the default value) from `from` to `to`.
    pub fn move_links(&mut self, from: PinId, to: PinId) -> GraphResult<()> {
        let source = self.pin(from).ok_or(GraphError::PinNotFound(from))?;
        let links = source.links.clone();
        let default = source.default.clone();
        self.break_links(from)?;
        for other in links {
            self.link(to, other)?;
        }
        if let Some(value) = default {
            self.set_default(to, value)?;
        }
        Ok(())
    }

    // ==========================================================================
    // Editable output lists
    // ==========================================================================

    /// Append an exec output to a sequence or multi-gate node.
    pub fn add_exec_output(&mut self, node: NodeId) -> GraphResult<PinId> {
        let n = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        let prefix = exec_output_prefix(n.kind).ok_or(GraphError::UnsupportedPinEdit(node))?;
        let count = n
            .outputs()
            .filter(|p| p.is_exec() && p.name.starts_with(prefix))
            .count();
        let id = self.add_pin(
            node,
            PinTemplate::output(format!("{prefix}{count}"), PinType::exec()),
        )?;
        if let Some(n) = self.node_mut(node) {
            n.config.pin_count = count + 1;
        }
        Ok(id)
    }

    /// Remove a numbered exec output of a sequence or multi-gate node and
    /// renumber the rest so names stay contiguous. Links follow their pins.
    /// Any other pin of the node is refused.
    pub fn remove_exec_output(&mut self, node: NodeId, pin: PinId) -> GraphResult<()> {
        let n = self.node(node).ok_or(GraphError::NodeNotFound(node))?;
        let prefix = exec_output_prefix(n.kind).ok_or(GraphError::UnsupportedPinEdit(node))?;
        let numbered = n
            .outputs()
            .filter(|p| p.is_exec() && p.name.starts_with(prefix))
            .count();
        let editable = n
            .pin(pin)
            .is_some_and(|p| p.is_output() && p.is_exec() && p.name.starts_with(prefix));
        if numbered <= 1 || !editable {
            return Err(GraphError::UnsupportedPinEdit(node));
        }
        self.remove_pin(pin)?;

        let Some(n) = self.node_mut(node) else {
            return Err(GraphError::NodeNotFound(node));
        };
        let mut index = 0;
        for p in n.pins.iter_mut() {
            if p.is_output() && p.is_exec() && p.name.starts_with(prefix) {
                p.name = format!("{prefix}{index}");
                index += 1;
            }
        }
        n.config.pin_count = index;
        Ok(())
    }
}

/// Name prefix of the editable exec outputs of `kind`.
pub fn exec_output_prefix(kind: NodeKind) -> Option<&'static str> {
    match kind {
        NodeKind::ExecutionSequence => Some("then_"),
        NodeKind::MultiGate => Some("out_"),
        _ => None,
    }
}

/// Where an existing node lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub graph: GraphId,
    pub node: NodeId,
}

/// The editable graphs of one blueprint asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    /// Hash of the matching [`BlueprintInfo`](crate::BlueprintInfo).
    pub info: TypeHash,
    graphs: Vec<Graph>,
    next_graph: u32,
}

impl Blueprint {
    pub fn new(info: TypeHash) -> Self {
        Self {
            info,
            graphs: Vec::new(),
            next_graph: 0,
        }
    }

    /// Create a new, empty graph.
    pub fn add_graph(&mut self, name: impl Into<String>, kind: GraphKind) -> GraphId {
        let id = GraphId(self.next_graph);
        self.next_graph += 1;
        self.graphs.push(Graph::new(id, name, kind));
        id
    }

    pub fn graphs(&self) -> &[Graph] {
        &self.graphs
    }

    pub fn graph(&self, id: GraphId) -> Option<&Graph> {
        self.graphs.iter().find(|g| g.id == id)
    }

    pub fn graph_mut(&mut self, id: GraphId) -> Option<&mut Graph> {
        self.graphs.iter_mut().find(|g| g.id == id)
    }

    pub fn find_graph(&self, name: &str) -> Option<&Graph> {
        self.graphs.iter().find(|g| g.name == name)
    }

    /// Existing event node implementing `function`.
    pub fn find_event_node(&self, function: TypeHash) -> Option<NodeRef> {
        self.find_node(|n| n.kind == NodeKind::Event && n.config.function == Some(function))
    }

    /// Existing bound event node for `delegate` on `component`, bound to `object`.
    /// Without a component the delegate belongs to the blueprint's own actor.
    pub fn find_bound_event_node(
        &self,
        delegate: TypeHash,
        component: Option<TypeHash>,
        object: Option<ObjectId>,
    ) -> Option<NodeRef> {
        self.find_node(|n| {
            matches!(n.kind, NodeKind::ComponentBoundEvent | NodeKind::ActorBoundEvent)
                && n.config.property == Some(delegate)
                && n.config.bound_property == component
                && n.config.bound_object == object
        })
    }

    fn find_node(&self, pred: impl Fn(&Node) -> bool) -> Option<NodeRef> {
        self.graphs.iter().find_map(|g| {
            g.nodes().iter().find(|n| pred(n)).map(|n| NodeRef {
                graph: g.id,
                node: n.id,
            })
        })
    }

    /// Number of nodes across all graphs.
    pub fn node_count(&self) -> usize {
        self.graphs.iter().map(|g| g.nodes().len()).sum()
    }
}

/// Direction-checked lookup used by handlers: the pin of `node` named `name`
/// facing `direction`.
pub fn find_directed_pin<'g>(
    graph: &'g Graph,
    node: NodeId,
    name: &str,
    direction: PinDirection,
) -> Option<&'g Pin> {
    graph.node(node)?.find_pin_dir(name, direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Literal, MetadataRegistry};

    fn sequence(graph: &mut Graph, outputs: usize) -> NodeId {
        let metadata = MetadataRegistry::new();
        let config = NodeConfig {
            pin_count: outputs,
            ..NodeConfig::default()
        };
        graph.add_node(NodeKind::ExecutionSequence, config, Location::default(), &metadata)
    }

    fn sink(graph: &mut Graph) -> (NodeId, PinId) {
        let node = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![PinTemplate::input("execute", PinType::exec())],
        );
        let pin = graph.find_pin(node, "execute").unwrap().id;
        (node, pin)
    }

    fn output_names(graph: &Graph, node: NodeId) -> Vec<String> {
        graph
            .node(node)
            .unwrap()
            .outputs()
            .map(|p| p.name.clone())
            .collect()
    }

    #[test]
    fn link_is_symmetric() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 2);
        let (_, input) = sink(&mut graph);
        let then0 = graph.find_pin(seq, "then_0").unwrap().id;

        graph.link(then0, input).unwrap();
        assert_eq!(graph.linked_pins(then0), &[input]);
        assert_eq!(graph.linked_pins(input), &[then0]);

        graph.unlink(input, then0);
        assert!(graph.linked_pins(then0).is_empty());
    }

    #[test]
    fn link_rejects_same_direction() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 2);
        let a = graph.find_pin(seq, "then_0").unwrap().id;
        let (_, input) = sink(&mut graph);
        let other = sequence(&mut graph, 2);
        let b = graph.find_pin(other, "then_0").unwrap().id;

        assert_eq!(graph.link(a, b), Err(GraphError::SameDirection { a, b }));
        let own_input = graph.find_pin(seq, "execute").unwrap().id;
        assert_eq!(
            graph.link(a, own_input),
            Err(GraphError::SameNode { a, b: own_input })
        );
        assert!(graph.link(a, input).is_ok());
    }

    #[test]
    fn sequence_compaction_keeps_links() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 4);
        let (_, target2) = sink(&mut graph);
        let (_, target3) = sink(&mut graph);
        let then1 = graph.find_pin(seq, "then_1").unwrap().id;
        let then2 = graph.find_pin(seq, "then_2").unwrap().id;
        let then3 = graph.find_pin(seq, "then_3").unwrap().id;
        graph.link(then2, target2).unwrap();
        graph.link(then3, target3).unwrap();

        graph.remove_exec_output(seq, then1).unwrap();

        assert_eq!(output_names(&graph, seq), vec!["then_0", "then_1", "then_2"]);
        assert_eq!(graph.find_pin(seq, "then_1").unwrap().id, then2);
        assert_eq!(graph.linked_pins(then2), &[target2]);
        assert_eq!(graph.find_pin(seq, "then_2").unwrap().id, then3);
        assert_eq!(graph.linked_pins(then3), &[target3]);
        assert_eq!(graph.node(seq).unwrap().config.pin_count, 3);
    }

    #[test]
    fn sequence_add_output_appends_next_index() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 2);
        graph.add_exec_output(seq).unwrap();
        assert_eq!(output_names(&graph, seq), vec!["then_0", "then_1", "then_2"]);
    }

    #[test]
    fn cannot_remove_last_output() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 1);
        let only = graph.find_pin(seq, "then_0").unwrap().id;
        assert_eq!(
            graph.remove_exec_output(seq, only),
            Err(GraphError::UnsupportedPinEdit(seq))
        );
    }

    #[test]
    fn only_numbered_outputs_can_be_removed() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 2);
        let execute = graph.find_pin(seq, "execute").unwrap().id;
        assert_eq!(
            graph.remove_exec_output(seq, execute),
            Err(GraphError::UnsupportedPinEdit(seq))
        );
        assert!(graph.pin(execute).is_some());

        let other = sequence(&mut graph, 2);
        let foreign = graph.find_pin(other, "then_0").unwrap().id;
        assert_eq!(
            graph.remove_exec_output(seq, foreign),
            Err(GraphError::UnsupportedPinEdit(seq))
        );
        assert_eq!(output_names(&graph, seq), vec!["then_0", "then_1"]);
        assert_eq!(output_names(&graph, other), vec!["then_0", "then_1"]);
    }

    #[test]
    fn removing_middle_output_keeps_neighbour_wiring() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 3);
        let (_, first) = sink(&mut graph);
        let (_, middle) = sink(&mut graph);
        let (_, last) = sink(&mut graph);
        let then0 = graph.find_pin(seq, "then_0").unwrap().id;
        let then1 = graph.find_pin(seq, "then_1").unwrap().id;
        let then2 = graph.find_pin(seq, "then_2").unwrap().id;
        graph.link(then0, first).unwrap();
        graph.link(then1, middle).unwrap();
        graph.link(then2, last).unwrap();

        graph.remove_exec_output(seq, then1).unwrap();

        assert_eq!(output_names(&graph, seq), vec!["then_0", "then_1"]);
        assert!(graph.pin(then1).is_none());
        assert!(graph.linked_pins(middle).is_empty());
        assert_eq!(graph.find_pin(seq, "then_0").unwrap().id, then0);
        assert_eq!(graph.linked_pins(then0), &[first]);
        assert_eq!(graph.find_pin(seq, "then_1").unwrap().id, then2);
        assert_eq!(graph.linked_pins(last), &[then2]);
    }

    #[test]
    fn move_links_carries_default() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let a = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![PinTemplate::input("x", PinType::int()).with_default(Literal::Int(5))],
        );
        let b = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![PinTemplate::input("y", PinType::int())],
        );
        let x = graph.find_pin(a, "x").unwrap().id;
        let y = graph.find_pin(b, "y").unwrap().id;
        graph.move_links(x, y).unwrap();
        assert_eq!(graph.pin(y).unwrap().default, Some(Literal::Int(5)));
    }

    #[test]
    fn remove_node_breaks_links() {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Ubergraph);
        let seq = sequence(&mut graph, 2);
        let (target, input) = sink(&mut graph);
        let then0 = graph.find_pin(seq, "then_0").unwrap().id;
        graph.link(then0, input).unwrap();

        graph.remove_node(target).unwrap();
        assert!(graph.linked_pins(then0).is_empty());
        assert!(graph.pin(input).is_none());
    }

    #[test]
    fn blueprint_finds_event_nodes_across_graphs() {
        let metadata = MetadataRegistry::new();
        let mut bp = Blueprint::new(TypeHash::from_blueprint("Door"));
        let _ = bp.add_graph("EventGraph", GraphKind::Ubergraph);
        let second = bp.add_graph("Other", GraphKind::Ubergraph);
        let f = TypeHash::from_name("OnOpen");
        let node = bp.graph_mut(second).unwrap().add_node(
            NodeKind::Event,
            NodeConfig::for_function(f),
            Location::default(),
            &metadata,
        );

        assert_eq!(bp.find_event_node(f), Some(NodeRef { graph: second, node }));
        assert_eq!(bp.find_event_node(TypeHash::from_name("Other")), None);
    }
}
