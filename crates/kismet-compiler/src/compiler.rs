//! Function compilation driver.
//!
//! [`FunctionCompiler`] runs the handler phases over a copy of a graph and
//! stitches the per-node statement lists into one linear list.
//!
//! # Pipeline
//!
//! 1. **expand** every node present before expansion started
//! 2. **register** nets in data order, so producers name a net before its
//!    consumers see it
//! 3. **compile** every node
//! 4. **linearize**: walk the exec wires from each entry point, placing the
//!    statements of pure dependencies ahead of the node that reads them
//! 5. **resolve** jump targets to statement indices
//!
//! A node whose lowering fails is reported against its id and emits nothing
//! but an end of thread; the rest of the function still compiles.

use kismet_core::{Diagnostics, Graph, MetadataProvider, Node, NodeId, NodeKind, PinId};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::context::FunctionParts;
use crate::handler::ExpandContext;
use crate::{
    CompilerOptions, FunctionContext, HandlerRegistry, JumpTarget, LoweringError, Statement,
    StatementKind, Terminal, TerminalId,
};

/// Lowers function graphs with a fixed handler table.
pub struct FunctionCompiler<'a> {
    handlers: &'a HandlerRegistry,
    metadata: &'a dyn MetadataProvider,
    options: CompilerOptions,
}

/// The lowered form of one graph.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    /// Linear statement list; jump targets are statement indices.
    pub statements: Vec<Statement>,
    /// Statements evaluated on demand through inline terminals.
    pub inline_statements: Vec<Statement>,
    pub terminals: Vec<Terminal>,
    /// First statement of each entry node, in placement order.
    pub entry_points: Vec<(NodeId, usize)>,
    pub diagnostics: Diagnostics,
    /// The graph after expansion.
    pub graph: Graph,
    pin_terminals: FxHashMap<PinId, TerminalId>,
    results: Vec<(String, TerminalId)>,
}

impl CompiledFunction {
    pub fn terminal(&self, id: TerminalId) -> Option<&Terminal> {
        self.terminals.get(id.0 as usize)
    }

    /// Terminal the net of `pin` resolved to, if any node registered it.
    pub fn terminal_for_pin(&self, pin: PinId) -> Option<TerminalId> {
        self.pin_terminals.get(&pin).copied()
    }

    /// Output terminal of the function named `name`.
    pub fn result(&self, name: &str) -> Option<TerminalId> {
        self.results.iter().find(|(n, _)| n == name).map(|(_, id)| *id)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

impl<'a> FunctionCompiler<'a> {
    pub fn new(
        handlers: &'a HandlerRegistry,
        metadata: &'a dyn MetadataProvider,
        options: CompilerOptions,
    ) -> Self {
        Self {
            handlers,
            metadata,
            options,
        }
    }

    /// Lower `graph`. Problems are reported in the result's diagnostics.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, graph: &Graph) -> CompiledFunction {
        let mut graph = graph.clone();
        let mut failed = FxHashSet::default();
        let mut diagnostics = Diagnostics::new();
        self.expand(&mut graph, &mut failed, &mut diagnostics);

        let order = data_order(&graph);
        let mut ctx = FunctionContext::new(self.metadata, self.options, graph);
        ctx.diagnostics = diagnostics;

        for phase in [Phase::Register, Phase::Compile] {
            for id in &order {
                if failed.contains(id) {
                    continue;
                }
                let Some(node) = ctx.graph().node(*id).cloned() else {
                    continue;
                };
                let Some(handler) = self.handlers.get(node.kind) else {
                    warn!(kind = ?node.kind, node = ?node.id, "no handler for node kind");
                    ctx.diagnostics.warning(
                        Some(node.id),
                        format!("{} nodes are not compiled", node.kind.display_name()),
                    );
                    failed.insert(node.id);
                    continue;
                };
                let outcome = match phase {
                    Phase::Register => handler.register_nets(&mut ctx, &node),
                    Phase::Compile => handler.compile(&mut ctx, &node),
                };
                if let Err(error) = outcome {
                    record_failure(&mut ctx, &mut failed, &node, error);
                }
            }
        }

        let name = ctx.graph().name.clone();
        let parts = ctx.into_parts();
        let mut linear = Linearizer::new(&parts, &failed);
        let entry_points = linear.run();
        let Linearizer {
            mut statements,
            entries,
            pin_entries,
            ..
        } = linear;
        resolve_jumps(&mut statements, &parts.graph, &entries, &pin_entries);

        let mut pin_terminals = FxHashMap::default();
        for pin in parts.graph.nodes().iter().flat_map(|n| n.pins.iter()) {
            if let Some(terminal) = parts
                .nets
                .net_of(pin.id)
                .and_then(|net| parts.net_terminals.get(&net))
            {
                pin_terminals.insert(pin.id, *terminal);
            }
        }

        debug!(
            function = %name,
            statements = statements.len(),
            errors = parts.diagnostics.error_count(),
            "compiled function graph"
        );
        CompiledFunction {
            name,
            statements,
            inline_statements: parts.inline_statements,
            terminals: parts.terminals,
            entry_points,
            diagnostics: parts.diagnostics,
            graph: parts.graph,
            pin_terminals,
            results: parts.results,
        }
    }

    /// Run every handler's expansion over the nodes present on entry.
    fn expand(&self, graph: &mut Graph, failed: &mut FxHashSet<NodeId>, diagnostics: &mut Diagnostics) {
        let snapshot: Vec<(NodeId, NodeKind)> = graph.nodes().iter().map(|n| (n.id, n.kind)).collect();
        let mut ctx = ExpandContext {
            graph,
            metadata: self.metadata,
            options: self.options,
        };
        for (id, kind) in snapshot {
            let Some(handler) = self.handlers.get(kind) else {
                continue;
            };
            if let Err(error) = handler.expand(&mut ctx, id) {
                debug!(node = ?id, %error, "node expansion failed");
                diagnostics.error(Some(id), error.to_string());
                failed.insert(id);
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Phase {
    Register,
    Compile,
}

fn record_failure(
    ctx: &mut FunctionContext<'_>,
    failed: &mut FxHashSet<NodeId>,
    node: &Node,
    error: LoweringError,
) {
    debug!(node = ?node.id, kind = ?node.kind, %error, "node lowering failed");
    ctx.diagnostics.error(Some(node.id), error.to_string());
    ctx.discard_statements(node.id);
    failed.insert(node.id);
}

/// Nodes ordered so every data producer precedes its consumers. Cyclic data
/// wiring falls back to placement order.
fn data_order(graph: &Graph) -> Vec<NodeId> {
    let mut dag: DiGraph<NodeId, ()> = DiGraph::new();
    let index: FxHashMap<NodeId, NodeIndex> = graph
        .nodes()
        .iter()
        .map(|n| (n.id, dag.add_node(n.id)))
        .collect();

    for node in graph.nodes() {
        for pin in node.outputs().filter(|p| !p.is_exec()) {
            for linked in &pin.links {
                if let Some(consumer) = graph.pin_owner(*linked)
                    && let (Some(&from), Some(&to)) = (index.get(&node.id), index.get(&consumer))
                {
                    dag.add_edge(from, to, ());
                }
            }
        }
    }

    match toposort(&dag, None) {
        Ok(order) => order.into_iter().map(|i| dag[i]).collect(),
        Err(cycle) => {
            warn!(node = ?dag[cycle.node_id()], "data wiring is cyclic");
            graph.nodes().iter().map(|n| n.id).collect()
        }
    }
}

// ==========================================================================
// Linearization
// ==========================================================================

struct Linearizer<'p> {
    parts: &'p FunctionParts,
    failed: &'p FxHashSet<NodeId>,
    statements: Vec<Statement>,
    /// First statement placed for each node, pure dependencies included.
    entries: FxHashMap<NodeId, usize>,
    /// Placed statement of every exec input with its own entry point.
    pin_entries: FxHashMap<PinId, usize>,
}

impl<'p> Linearizer<'p> {
    fn new(parts: &'p FunctionParts, failed: &'p FxHashSet<NodeId>) -> Self {
        Self {
            parts,
            failed,
            statements: Vec::new(),
            entries: FxHashMap::default(),
            pin_entries: FxHashMap::default(),
        }
    }

    /// Entry, event and bound event nodes; failing those, impure nodes
    /// nothing jumps to.
    fn roots(&self) -> Vec<NodeId> {
        let nodes = self.parts.graph.nodes();
        let entries: Vec<_> = nodes
            .iter()
            .filter(|n| {
                matches!(
                    n.kind,
                    NodeKind::FunctionEntry
                        | NodeKind::Event
                        | NodeKind::ComponentBoundEvent
                        | NodeKind::ActorBoundEvent
                )
            })
            .map(|n| n.id)
            .collect();
        if !entries.is_empty() {
            return entries;
        }
        nodes
            .iter()
            .filter(|n| n.has_exec_pins() && !n.inputs().any(|p| p.is_exec() && p.is_linked()))
            .map(|n| n.id)
            .collect()
    }

    /// Place every node reachable from a root; returns the entry points.
    fn run(&mut self) -> Vec<(NodeId, usize)> {
        let mut entry_points = Vec::new();
        for root in self.roots() {
            if self.entries.contains_key(&root) {
                continue;
            }
            entry_points.push((root, self.statements.len()));
            let mut stack = vec![root];
            while let Some(id) = stack.pop() {
                if self.entries.contains_key(&id) {
                    continue;
                }
                self.place(id);
                let mut next = self.exec_successors(id);
                next.reverse();
                stack.extend(next);
            }
        }
        entry_points
    }

    fn exec_successors(&self, id: NodeId) -> Vec<NodeId> {
        let graph = &self.parts.graph;
        let Some(node) = graph.node(id) else {
            return Vec::new();
        };
        node.outputs()
            .filter(|p| p.is_exec())
            .flat_map(|p| p.links.iter())
            .filter_map(|linked| graph.pin_owner(*linked))
            .collect()
    }

    fn place(&mut self, id: NodeId) {
        let entry = self.statements.len();
        let mut visited = FxHashSet::default();
        self.place_pure_inputs(id, &mut visited);

        let own = self.statements.len();
        if !self.failed.contains(&id)
            && let Some(statements) = self.parts.statements.get(&id)
        {
            for statement in statements {
                let mut statement = statement.clone();
                if let Some(JumpTarget::Local(offset)) = statement.target {
                    statement.target = Some(JumpTarget::Statement(own + offset));
                }
                self.statements.push(statement);
            }
            if let Some(node) = self.parts.graph.node(id) {
                for pin in node.inputs().filter(|p| p.is_exec()) {
                    if let Some(offset) = self.parts.pin_entries.get(&pin.id) {
                        self.pin_entries.insert(pin.id, own + offset);
                    }
                }
            }
        }
        let terminated = self.statements.len() > own
            && self.statements.last().is_some_and(|s| s.kind.is_terminator());
        if !terminated {
            let mut end = Statement::new(StatementKind::EndOfThread);
            end.node = Some(id);
            self.statements.push(end);
        }
        self.entries.insert(id, entry);
    }

    /// Statements of the pure nodes `id` reads from, dependencies first.
    fn place_pure_inputs(&mut self, id: NodeId, visited: &mut FxHashSet<NodeId>) {
        let parts = self.parts;
        let Some(node) = parts.graph.node(id) else {
            return;
        };
        for pin in node.inputs().filter(|p| !p.is_exec()) {
            for source in &pin.links {
                let Some(owner) = parts.graph.pin_owner(*source) else {
                    continue;
                };
                let pure = parts.graph.node(owner).is_some_and(|n| !n.has_exec_pins());
                if !pure || !visited.insert(owner) {
                    continue;
                }
                self.place_pure_inputs(owner, visited);
                if !self.failed.contains(&owner)
                    && let Some(statements) = parts.statements.get(&owner)
                {
                    self.statements.extend(statements.iter().cloned());
                }
            }
        }
    }
}

/// Point every pin jump at the first statement of the node wired to it, or
/// at the entry of the wired input when it has its own. Jumps to unwired pins
/// end the thread instead.
fn resolve_jumps(
    statements: &mut [Statement],
    graph: &Graph,
    entries: &FxHashMap<NodeId, usize>,
    pin_entries: &FxHashMap<PinId, usize>,
) {
    for statement in statements.iter_mut() {
        let Some(JumpTarget::Pin(pin)) = statement.target else {
            continue;
        };
        let destination = graph.pin(pin).and_then(|p| p.links.first()).and_then(|linked| {
            pin_entries.get(linked).copied().or_else(|| {
                graph
                    .pin_owner(*linked)
                    .and_then(|node| entries.get(&node))
                    .copied()
            })
        });
        match destination {
            Some(index) => statement.target = Some(JumpTarget::Statement(index)),
            None => {
                statement.target = None;
                statement.kind = match statement.kind {
                    StatementKind::Goto => StatementKind::EndOfThread,
                    StatementKind::GotoIfNot => StatementKind::EndOfThreadIfNot,
                    _ => StatementKind::Nop,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile, link};
    use crate::{Evaluator, TraceEvent};
    use kismet_core::{
        ClassInfo, FunctionFlags, FunctionInfo, GraphId, GraphKind, Location, MetadataRegistry,
        NodeConfig, PinType, TypeHash,
    };

    struct Fixture {
        metadata: MetadataRegistry,
        begin: TypeHash,
        good: TypeHash,
        consume: TypeHash,
        compute: TypeHash,
    }

    fn fixture() -> Fixture {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let callable = FunctionFlags::BLUEPRINT_CALLABLE;
        let begin = metadata.add_function(
            FunctionInfo::new(actor, "BeginPlay").with_flags(FunctionFlags::BLUEPRINT_EVENT),
        );
        let good = metadata.add_function(FunctionInfo::new(actor, "Good").with_flags(callable));
        let consume = metadata.add_function(
            FunctionInfo::new(actor, "Consume")
                .with_flags(callable)
                .with_param("Value", PinType::int()),
        );
        let compute = metadata.add_function(
            FunctionInfo::new(actor, "Compute")
                .with_flags(callable | FunctionFlags::PURE)
                .with_return(PinType::int()),
        );
        Fixture {
            metadata,
            begin,
            good,
            consume,
            compute,
        }
    }

    fn event_graph(fixture: &Fixture) -> (Graph, NodeId) {
        let mut graph = Graph::new(GraphId(0), "EventGraph", GraphKind::Ubergraph);
        let event = graph.add_node(
            NodeKind::Event,
            NodeConfig::for_function(fixture.begin),
            Location::default(),
            &fixture.metadata,
        );
        (graph, event)
    }

    fn call(graph: &mut Graph, metadata: &MetadataRegistry, function: TypeHash) -> NodeId {
        graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(function), Location::default(), metadata)
    }

    #[test]
    fn failed_node_does_not_abort_the_function() {
        let fixture = fixture();
        let metadata = &fixture.metadata;
        let (mut graph, event) = event_graph(&fixture);
        let config = NodeConfig {
            pin_count: 2,
            ..NodeConfig::default()
        };
        let sequence = graph.add_node(NodeKind::ExecutionSequence, config, Location::default(), metadata);
        let gone = graph.add_node_with_pins(
            NodeKind::CallFunction,
            NodeConfig::for_function(TypeHash::from_name("Gone")),
            Location::default(),
            vec![kismet_core::PinTemplate::input("execute", PinType::exec())],
        );
        let good = call(&mut graph, metadata, fixture.good);
        link(&mut graph, event, "then", sequence, "execute");
        link(&mut graph, sequence, "then_0", gone, "execute");
        link(&mut graph, sequence, "then_1", good, "execute");

        let compiled = compile(metadata, &graph, CompilerOptions::release());
        let errors: Vec<_> = compiled.diagnostics.errors().filter_map(|d| d.node).collect();
        assert_eq!(errors, vec![gone]);

        let mut eval = Evaluator::new(metadata);
        eval.run(&compiled, &[]).unwrap();
        assert_eq!(eval.trace(), &[TraceEvent::Call(fixture.good)]);
    }

    #[test]
    fn pure_nodes_are_placed_before_each_consumer() {
        let fixture = fixture();
        let metadata = &fixture.metadata;
        let (mut graph, event) = event_graph(&fixture);
        let compute = call(&mut graph, metadata, fixture.compute);
        let first = call(&mut graph, metadata, fixture.consume);
        let second = call(&mut graph, metadata, fixture.consume);
        link(&mut graph, event, "then", first, "execute");
        link(&mut graph, first, "then", second, "execute");
        link(&mut graph, compute, "ReturnValue", first, "Value");
        link(&mut graph, compute, "ReturnValue", second, "Value");

        let compiled = compile(metadata, &graph, CompilerOptions::release());
        assert!(!compiled.has_errors(), "{}", compiled.diagnostics);
        let placed: Vec<_> = compiled.statements.iter().map(|s| s.node).collect();
        let compute_at: Vec<_> = placed
            .iter()
            .enumerate()
            .filter(|(_, n)| **n == Some(compute))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(compute_at.len(), 2);
        let first_at = placed.iter().position(|n| *n == Some(first)).unwrap();
        let second_at = placed.iter().position(|n| *n == Some(second)).unwrap();
        assert!(compute_at[0] < first_at && first_at < compute_at[1] && compute_at[1] < second_at);

        let mut eval = Evaluator::new(metadata);
        eval.run(&compiled, &[]).unwrap();
        let calls: Vec<_> = eval
            .trace()
            .iter()
            .filter_map(|e| match e {
                TraceEvent::Call(f) => Some(*f),
                _ => None,
            })
            .collect();
        assert_eq!(
            calls,
            vec![fixture.compute, fixture.consume, fixture.compute, fixture.consume]
        );
    }

    #[test]
    fn unhandled_kinds_are_warnings() {
        let fixture = fixture();
        let (mut graph, _) = event_graph(&fixture);
        let instance = graph.add_node(NodeKind::MacroInstance, NodeConfig::default(), Location::default(), &fixture.metadata);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        assert!(!compiled.has_errors());
        let warned: Vec<_> = compiled.diagnostics.warnings().filter_map(|d| d.node).collect();
        assert_eq!(warned, vec![instance]);
    }

    #[test]
    fn unwired_then_ends_the_thread() {
        let fixture = fixture();
        let (graph, event) = event_graph(&fixture);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        assert_eq!(compiled.entry_points, vec![(event, 0)]);
        assert_eq!(compiled.statements.len(), 1);
        assert_eq!(compiled.statements[0].kind, StatementKind::EndOfThread);
        assert_eq!(compiled.statements[0].target, None);
    }

    #[test]
    fn graphs_without_entries_start_at_free_impure_nodes() {
        let fixture = fixture();
        let metadata = &fixture.metadata;
        let mut graph = Graph::new(GraphId(0), "Macro", GraphKind::Macro);
        let head = call(&mut graph, metadata, fixture.good);
        let tail = call(&mut graph, metadata, fixture.good);
        link(&mut graph, head, "then", tail, "execute");
        let compiled = compile(metadata, &graph, CompilerOptions::release());
        assert_eq!(compiled.entry_points, vec![(head, 0)]);
        assert_eq!(
            compiled.statements[1].target,
            Some(JumpTarget::Statement(2))
        );
    }
}
