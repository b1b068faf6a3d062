//! Graph building shortcuts for the unit tests.

use kismet_core::{
    Graph, GraphId, GraphKind, Location, MetadataProvider, MetadataRegistry, NodeConfig, NodeId,
    NodeKind, PinDirection, TypeHash, find_directed_pin,
};

use crate::{CompiledFunction, CompilerOptions, FunctionCompiler, HandlerRegistry};

/// Compile `graph` with the default handlers.
pub fn compile(metadata: &MetadataRegistry, graph: &Graph, options: CompilerOptions) -> CompiledFunction {
    let handlers = HandlerRegistry::with_defaults();
    FunctionCompiler::new(&handlers, metadata, options).compile(graph)
}

/// A function graph for `function` with its entry and result nodes placed.
pub fn function_graph(metadata: &MetadataRegistry, function: TypeHash) -> (Graph, NodeId, NodeId) {
    let name = metadata
        .function(function)
        .map(|f| f.name.clone())
        .unwrap_or_default();
    let mut graph = Graph::new(GraphId(0), name, GraphKind::Function);
    let entry = graph.add_node(
        NodeKind::FunctionEntry,
        NodeConfig::for_function(function),
        Location::new(0, 0),
        metadata,
    );
    let result = graph.add_node(
        NodeKind::FunctionResult,
        NodeConfig::for_function(function),
        Location::new(600, 0),
        metadata,
    );
    (graph, entry, result)
}

/// Wire output `from_pin` of `from` to input `to_pin` of `to`.
pub fn link(graph: &mut Graph, from: NodeId, from_pin: &str, to: NodeId, to_pin: &str) {
    let out = find_directed_pin(graph, from, from_pin, PinDirection::Output)
        .unwrap_or_else(|| panic!("no output '{from_pin}' on {from:?}"))
        .id;
    let input = find_directed_pin(graph, to, to_pin, PinDirection::Input)
        .unwrap_or_else(|| panic!("no input '{to_pin}' on {to:?}"))
        .id;
    graph.link(out, input).unwrap();
}
