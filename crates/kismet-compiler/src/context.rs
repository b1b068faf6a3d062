//! Per-function lowering state.
//!
//! A [`FunctionContext`] lives for the compilation of one graph. It owns the
//! expanded graph, the net map, the terminal table and the statements each
//! node handler emits.
//!
//! # Terminal registration
//!
//! Every net gets at most one terminal. [`FunctionContext::register_net`] is
//! memoized on the net, so registering any pin of an already registered net
//! returns the existing terminal:
//!
//! ```
//! use kismet_compiler::{CompilerOptions, FunctionContext};
//! use kismet_core::{Graph, GraphId, GraphKind, MetadataRegistry};
//!
//! let metadata = MetadataRegistry::new();
//! let graph = Graph::new(GraphId(0), "Empty", GraphKind::Function);
//! let ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
//! assert_eq!(ctx.terminals().len(), 0);
//! ```

use kismet_core::{
    Diagnostics, Graph, Literal, MetadataProvider, Node, NodeId, Pin, PinDirection, PinId,
    PinType, pin_names,
};
use rustc_hash::FxHashMap;

use crate::net::{NetId, NetMap};
use crate::{LoweringError, LoweringResult, Statement, Terminal, TerminalId, TerminalKind};

// ==========================================================================
// Options
// ==========================================================================

/// How a function is being compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Full compiles run node expansions; type-check-only compiles do not.
    pub full_compile: bool,
    /// Debug builds keep debugger stops between sequence branches.
    pub debug_build: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self::release()
    }
}

impl CompilerOptions {
    /// Validate the graph without expanding nodes.
    pub fn type_check_only() -> Self {
        Self {
            full_compile: false,
            debug_build: false,
        }
    }

    pub fn release() -> Self {
        Self {
            full_compile: true,
            debug_build: false,
        }
    }

    pub fn debug() -> Self {
        Self {
            full_compile: true,
            debug_build: true,
        }
    }
}

// ==========================================================================
// Function context
// ==========================================================================

/// Lowering state for one function graph.
pub struct FunctionContext<'a> {
    metadata: &'a dyn MetadataProvider,
    options: CompilerOptions,
    graph: Graph,
    nets: NetMap,
    terminals: Vec<Terminal>,
    net_terminals: FxHashMap<NetId, TerminalId>,
    self_terminal: Option<TerminalId>,
    results: Vec<(String, TerminalId)>,
    statements: FxHashMap<NodeId, Vec<Statement>>,
    /// Statement offsets, within their node's list, of exec inputs that do
    /// not enter at the node's first statement.
    pin_entries: FxHashMap<PinId, usize>,
    inline_statements: Vec<Statement>,
    pub diagnostics: Diagnostics,
}

impl<'a> FunctionContext<'a> {
    pub fn new(metadata: &'a dyn MetadataProvider, options: CompilerOptions, graph: Graph) -> Self {
        let nets = NetMap::build(&graph);
        Self {
            metadata,
            options,
            graph,
            nets,
            terminals: Vec::new(),
            net_terminals: FxHashMap::default(),
            self_terminal: None,
            results: Vec::new(),
            statements: FxHashMap::default(),
            pin_entries: FxHashMap::default(),
            inline_statements: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn metadata(&self) -> &'a dyn MetadataProvider {
        self.metadata
    }

    pub fn options(&self) -> CompilerOptions {
        self.options
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn nets(&self) -> &NetMap {
        &self.nets
    }

    // ======================================================================
    // Terminals
    // ======================================================================

    pub fn terminals(&self) -> &[Terminal] {
        &self.terminals
    }

    pub fn terminal(&self, id: TerminalId) -> Option<&Terminal> {
        self.terminals.get(id.0 as usize)
    }

    /// Add a terminal that is not tied to a net.
    pub fn add_terminal(&mut self, mut terminal: Terminal) -> TerminalId {
        let id = TerminalId(self.terminals.len() as u32);
        terminal.id = id;
        self.terminals.push(terminal);
        id
    }

    /// A constant operand.
    pub fn literal(&mut self, value: Literal, pin_type: PinType) -> TerminalId {
        let name = value.to_string();
        self.add_terminal(Terminal::new(name, pin_type, TerminalKind::Literal(value)))
    }

    /// The object the function runs on.
    pub fn self_terminal(&mut self) -> TerminalId {
        if let Some(id) = self.self_terminal {
            return id;
        }
        let id = self.add_terminal(
            Terminal::new(pin_names::SELF, PinType::any_object(), TerminalKind::DefaultSelf)
                .with_const(true),
        );
        self.self_terminal = Some(id);
        id
    }

    /// Terminal already registered for the net of `pin`.
    pub fn net_terminal(&self, pin: PinId) -> Option<TerminalId> {
        self.nets
            .net_of(pin)
            .and_then(|net| self.net_terminals.get(&net).copied())
    }

    /// Terminal for the net of `pin`, created on first use.
    ///
    /// An unwired input becomes a literal of its default (or its type's zero
    /// value), an unwired self pin becomes the self terminal, and anything
    /// else becomes a local.
    pub fn register_net(&mut self, pin: &Pin) -> TerminalId {
        if let Some(existing) = self.net_terminal(pin.id) {
            return existing;
        }
        if pin.is_self() && !pin.is_linked() {
            let id = self.self_terminal();
            self.bind_net(pin.id, id);
            return id;
        }
        let kind = match unwired_value(pin) {
            Some(value) => TerminalKind::Literal(value),
            None => TerminalKind::Local,
        };
        self.register_net_as(pin, kind, None, false)
    }

    /// Terminal for the net of `pin` with an explicit kind, unless the net
    /// already has one.
    pub fn register_net_as(
        &mut self,
        pin: &Pin,
        kind: TerminalKind,
        context: Option<TerminalId>,
        is_const: bool,
    ) -> TerminalId {
        if let Some(existing) = self.net_terminal(pin.id) {
            return existing;
        }
        let id = self.add_terminal(
            Terminal::new(pin.name.clone(), pin.pin_type.clone(), kind)
                .with_context(context)
                .with_const(is_const),
        );
        self.bind_net(pin.id, id);
        id
    }

    /// Make the net of `pin` resolve to an existing terminal.
    pub fn alias_net(&mut self, pin: &Pin, terminal: TerminalId) -> TerminalId {
        if let Some(existing) = self.net_terminal(pin.id) {
            return existing;
        }
        self.bind_net(pin.id, terminal);
        terminal
    }

    fn bind_net(&mut self, pin: PinId, terminal: TerminalId) {
        if let Some(net) = self.nets.net_of(pin) {
            self.net_terminals.insert(net, terminal);
        }
    }

    /// Terminal feeding the input pin `name` of `node`.
    pub fn input_terminal(&mut self, node: &Node, name: &str) -> LoweringResult<TerminalId> {
        let pin = node
            .find_pin_dir(name, PinDirection::Input)
            .ok_or_else(|| LoweringError::MissingPin(name.to_string()))?;
        if !pin.is_linked() && !pin.is_self() && unwired_value(pin).is_none() {
            return Err(LoweringError::NoInputNet(name.to_string()));
        }
        Ok(self.register_net(pin))
    }

    /// Terminal of the output pin `name` of `node`.
    pub fn output_terminal(&mut self, node: &Node, name: &str) -> LoweringResult<TerminalId> {
        let pin = node
            .find_pin_dir(name, PinDirection::Output)
            .ok_or_else(|| LoweringError::MissingPin(name.to_string()))?;
        Ok(self.register_net(pin))
    }

    /// Output terminal of the function named `name`, created once.
    pub fn declare_result(&mut self, name: &str, pin_type: PinType) -> TerminalId {
        if let Some((_, id)) = self.results.iter().find(|(n, _)| n == name) {
            return *id;
        }
        let id = self.add_terminal(Terminal::new(
            name,
            pin_type,
            TerminalKind::Result(name.to_string()),
        ));
        self.results.push((name.to_string(), id));
        id
    }

    pub fn results(&self) -> &[(String, TerminalId)] {
        &self.results
    }

    // ======================================================================
    // Statements
    // ======================================================================

    /// Append a statement to the list of `node`.
    pub fn emit(&mut self, node: NodeId, mut statement: Statement) {
        statement.node = Some(node);
        self.statements.entry(node).or_default().push(statement);
    }

    /// Add a statement evaluated on demand; returns the terminal holding its
    /// value.
    pub fn emit_inline(&mut self, statement: Statement, name: &str, pin_type: PinType) -> TerminalId {
        let index = self.inline_statements.len();
        self.inline_statements.push(statement);
        self.add_terminal(Terminal::new(name, pin_type, TerminalKind::Inline(index)))
    }

    /// Statements emitted for `node` so far.
    pub fn statements(&self, node: NodeId) -> &[Statement] {
        self.statements.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Enter `node` through its exec input `pin` at the next statement it
    /// emits instead of at its first one.
    pub fn mark_pin_entry(&mut self, node: NodeId, pin: PinId) {
        let offset = self.statements(node).len();
        self.pin_entries.insert(pin, offset);
    }

    /// Offset recorded by [`FunctionContext::mark_pin_entry`] for `pin`.
    pub fn pin_entry(&self, pin: PinId) -> Option<usize> {
        self.pin_entries.get(&pin).copied()
    }

    /// Drop everything `node` emitted; used when its lowering fails.
    pub fn discard_statements(&mut self, node: NodeId) {
        self.statements.remove(&node);
    }

    pub(crate) fn into_parts(self) -> FunctionParts {
        FunctionParts {
            graph: self.graph,
            nets: self.nets,
            terminals: self.terminals,
            net_terminals: self.net_terminals,
            results: self.results,
            statements: self.statements,
            pin_entries: self.pin_entries,
            inline_statements: self.inline_statements,
            diagnostics: self.diagnostics,
        }
    }
}

/// Everything a finished [`FunctionContext`] hands to the driver.
pub(crate) struct FunctionParts {
    pub graph: Graph,
    pub nets: NetMap,
    pub terminals: Vec<Terminal>,
    pub net_terminals: FxHashMap<NetId, TerminalId>,
    pub results: Vec<(String, TerminalId)>,
    pub statements: FxHashMap<NodeId, Vec<Statement>>,
    pub pin_entries: FxHashMap<PinId, usize>,
    pub inline_statements: Vec<Statement>,
    pub diagnostics: Diagnostics,
}

/// Value an unwired input pin carries.
fn unwired_value(pin: &Pin) -> Option<Literal> {
    if pin.is_linked() || pin.is_output() {
        return None;
    }
    pin.default
        .clone()
        .or_else(|| Literal::default_for(&pin.pin_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kismet_core::{GraphId, GraphKind, Location, MetadataRegistry, NodeConfig, NodeKind, PinTemplate};

    fn wired_graph() -> (Graph, PinId, PinId, PinId) {
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let source = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![PinTemplate::output("out", PinType::int())],
        );
        let sink = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![
                PinTemplate::input("a", PinType::int()),
                PinTemplate::input("b", PinType::int()).with_default(Literal::Int(4)),
            ],
        );
        let out = graph.find_pin(source, "out").unwrap().id;
        let a = graph.find_pin(sink, "a").unwrap().id;
        let b = graph.find_pin(sink, "b").unwrap().id;
        graph.link(out, a).unwrap();
        (graph, out, a, b)
    }

    #[test]
    fn register_net_is_idempotent() {
        let metadata = MetadataRegistry::new();
        let (graph, out, a, _) = wired_graph();
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);

        let out_pin = ctx.graph().pin(out).unwrap().clone();
        let a_pin = ctx.graph().pin(a).unwrap().clone();
        let first = ctx.register_net(&out_pin);
        let second = ctx.register_net(&out_pin);
        let through_input = ctx.register_net(&a_pin);

        assert_eq!(first, second);
        assert_eq!(first, through_input);
        assert_eq!(ctx.terminals().len(), 1);
        assert_eq!(ctx.terminal(first).unwrap().kind, TerminalKind::Local);
    }

    #[test]
    fn unwired_input_becomes_its_default() {
        let metadata = MetadataRegistry::new();
        let (graph, _, _, b) = wired_graph();
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        let b_pin = ctx.graph().pin(b).unwrap().clone();
        let id = ctx.register_net(&b_pin);
        assert_eq!(ctx.terminal(id).unwrap().literal(), Some(&Literal::Int(4)));
    }

    #[test]
    fn unwired_struct_input_has_no_net() {
        let metadata = MetadataRegistry::new();
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let id = graph.add_node_with_pins(
            NodeKind::Tunnel,
            NodeConfig::default(),
            Location::default(),
            vec![PinTemplate::input("s", PinType::structure(kismet_core::TypeHash::from_name("S")))],
        );
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        let node = ctx.graph().node(id).unwrap().clone();
        assert_eq!(
            ctx.input_terminal(&node, "s"),
            Err(LoweringError::NoInputNet("s".into()))
        );
        assert_eq!(
            ctx.input_terminal(&node, "missing"),
            Err(LoweringError::MissingPin("missing".into()))
        );
    }

    #[test]
    fn results_are_declared_once() {
        let metadata = MetadataRegistry::new();
        let graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        let a = ctx.declare_result("Value", PinType::int());
        let b = ctx.declare_result("Value", PinType::int());
        assert_eq!(a, b);
        assert_eq!(ctx.results().len(), 1);
    }

    #[test]
    fn option_presets() {
        assert!(!CompilerOptions::type_check_only().full_compile);
        assert!(CompilerOptions::debug().debug_build);
        assert_eq!(CompilerOptions::default(), CompilerOptions::release());
    }
}
