//! The node handler contract and the kind → handler dispatch table.
//!
//! Lowering a node runs in up to three phases, each a method on
//! [`NodeHandler`]:
//!
//! 1. **expand**: rewrite the graph around the node (full compiles only use
//!    this today); runs before nets exist
//! 2. **register_nets**: create or reuse the terminal of every net the node
//!    touches
//! 3. **compile**: emit the node's statements
//!
//! A handler invoked on a node kind it does not handle is a dispatch bug and
//! panics.

use std::rc::Rc;

use kismet_core::{
    Graph, MetadataProvider, Node, NodeId, NodeKind, PinDirection, PinId, pin_names,
};
use rustc_hash::FxHashMap;

use crate::handlers;
use crate::{CompilerOptions, FunctionContext, LoweringResult, Statement};

/// Graph access for the expansion phase.
pub struct ExpandContext<'a> {
    pub graph: &'a mut Graph,
    pub metadata: &'a dyn MetadataProvider,
    pub options: CompilerOptions,
}

/// Lowers one family of node kinds.
pub trait NodeHandler {
    /// Kinds this handler lowers.
    fn kinds(&self) -> &'static [NodeKind];

    /// Rewrite the graph around `node` before nets are built.
    fn expand(&self, _ctx: &mut ExpandContext<'_>, _node: NodeId) -> LoweringResult<()> {
        Ok(())
    }

    /// Register the terminals of the nets `node` touches.
    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        register_data_pins(ctx, node);
        Ok(())
    }

    /// Emit the statements of `node`.
    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()>;
}

/// Panic unless `node` is one of `kinds`.
pub fn check_kind(kinds: &[NodeKind], node: &Node) {
    assert!(
        kinds.contains(&node.kind),
        "handler for {kinds:?} invoked on {:?} node {:?}",
        node.kind,
        node.id
    );
}

/// Give every data pin of `node` its net terminal.
pub fn register_data_pins(ctx: &mut FunctionContext<'_>, node: &Node) {
    for pin in node.data_pins() {
        ctx.register_net(pin);
    }
}

/// Exec output pin `name` of `node`.
pub fn exec_output(node: &Node, name: &str) -> Option<PinId> {
    node.find_pin_dir(name, PinDirection::Output)
        .filter(|p| p.is_exec())
        .map(|p| p.id)
}

/// Jump to whatever is wired to the `then` pin.
pub fn emit_then_goto(ctx: &mut FunctionContext<'_>, node: &Node) {
    if let Some(then) = exec_output(node, pin_names::THEN) {
        ctx.emit(node.id, Statement::goto(then));
    }
}

// ==========================================================================
// Registry
// ==========================================================================

/// Node kind → handler dispatch table.
///
/// One handler may serve several kinds (the delegate handler covers add,
/// remove, clear and call).
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: FxHashMap<NodeKind, Rc<dyn NodeHandler>>,
}

impl HandlerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in handler.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(handlers::CallFunctionHandler);
        registry.register(handlers::AddComponentHandler);
        registry.register(handlers::VariableHandler);
        registry.register(handlers::BreakStructHandler);
        registry.register(handlers::MakeStructHandler);
        registry.register(handlers::SetFieldsHandler);
        registry.register(handlers::EnumLiteralHandler);
        registry.register(handlers::EnumEntryCountHandler);
        registry.register(handlers::CastByteToEnumHandler);
        registry.register(handlers::SwitchEnumHandler);
        registry.register(handlers::DynamicCastHandler);
        registry.register(handlers::BranchHandler);
        registry.register(handlers::ExecutionSequenceHandler);
        registry.register(handlers::MultiGateHandler);
        registry.register(handlers::DelegateHandler);
        registry.register(handlers::MathExpressionHandler);
        registry.register(handlers::EntryHandler);
        registry.register(handlers::ResultHandler);
        registry.register(handlers::PassiveHandler);
        registry
    }

    /// Register `handler` for every kind it reports, replacing earlier ones.
    pub fn register(&mut self, handler: impl NodeHandler + 'static) {
        let handler: Rc<dyn NodeHandler> = Rc::new(handler);
        for kind in handler.kinds() {
            self.handlers.insert(*kind, Rc::clone(&handler));
        }
    }

    pub fn get(&self, kind: NodeKind) -> Option<&dyn NodeHandler> {
        self.handlers.get(&kind).map(|h| h.as_ref())
    }

    pub fn contains(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    /// Number of kinds with a handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<_> = self.handlers.keys().collect();
        kinds.sort();
        f.debug_struct("HandlerRegistry").field("kinds", &kinds).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kismet_core::{GraphId, GraphKind, Location, MetadataRegistry, NodeConfig};

    #[test]
    fn defaults_share_handlers_across_kinds() {
        let registry = HandlerRegistry::with_defaults();
        for kind in [
            NodeKind::AddDelegate,
            NodeKind::RemoveDelegate,
            NodeKind::ClearDelegate,
            NodeKind::CallDelegate,
            NodeKind::CallFunction,
            NodeKind::Message,
            NodeKind::ExecutionSequence,
            NodeKind::MathExpression,
            NodeKind::SwitchEnum,
            NodeKind::MultiGate,
            NodeKind::AddComponent,
        ] {
            assert!(registry.contains(kind), "{kind:?}");
        }
        assert!(!registry.contains(NodeKind::MacroInstance));
    }

    #[test]
    #[should_panic(expected = "invoked on")]
    fn wrong_kind_is_fatal() {
        let metadata = MetadataRegistry::new();
        let mut graph = Graph::new(GraphId(0), "G", GraphKind::Function);
        let id = graph.add_node(NodeKind::IfThenElse, NodeConfig::default(), Location::default(), &metadata);
        let node = graph.node(id).unwrap().clone();
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        let _ = handlers::ExecutionSequenceHandler.compile(&mut ctx, &node);
    }
}
