//! Enum literals, entry counts, byte to enum casts and switches.

use kismet_core::{
    EnumInfo, Literal, Node, NodeConfig, NodeId, NodeKind, PinType, library, pin_names,
};

use crate::handler::{ExpandContext, NodeHandler, check_kind, exec_output, register_data_pins};
use crate::{
    FunctionContext, JumpTarget, LoweringError, LoweringResult, Statement, StatementKind,
    Terminal, TerminalKind,
};

const BYTE: &str = "Byte";
const ENUM: &str = "Enum";
const ENTRY_COUNT: &str = "EntryCount";
const ENUMERATOR_VALUE: &str = "EnumeratorValue";

fn enum_info<'a>(ctx: &FunctionContext<'a>, node: &Node) -> LoweringResult<&'a EnumInfo> {
    let hash = node.config.enum_type.unwrap_or_default();
    ctx.metadata()
        .enum_info(hash)
        .ok_or(LoweringError::UnknownEnum(hash))
}

/// Literal enum: the output is the selected entry's byte.
pub struct EnumLiteralHandler;

impl NodeHandler for EnumLiteralHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::EnumLiteral]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let value = ctx.input_terminal(node, ENUM)?;
        if let Some(out) = node.find_pin(pin_names::RETURN_VALUE) {
            ctx.alias_net(out, value);
        }
        Ok(())
    }

    fn compile(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }
}

/// Number of named entries, as an int literal.
pub struct EnumEntryCountHandler;

impl NodeHandler for EnumEntryCountHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::GetNumEnumEntries]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let count = enum_info(ctx, node)?.entry_count() as i32;
        let out = node
            .find_pin(pin_names::RETURN_VALUE)
            .ok_or_else(|| LoweringError::MissingPin(pin_names::RETURN_VALUE.to_string()))?;
        ctx.register_net_as(out, TerminalKind::Literal(Literal::Int(count)), None, true);
        Ok(())
    }

    fn compile(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }
}

// ==========================================================================
// Byte to enum
// ==========================================================================

/// Byte to enum cast.
///
/// The unsafe form reinterprets the byte: its output aliases its input. The
/// safe form expands on full compiles into
/// `GetValidEnumIndex(EntryCount, Byte)` feeding an unsafe cast, so values
/// past the last entry clamp to it. Type-check-only compiles leave it as is.
pub struct CastByteToEnumHandler;

impl NodeHandler for CastByteToEnumHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::CastByteToEnum]
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn expand(&self, ctx: &mut ExpandContext<'_>, id: NodeId) -> LoweringResult<()> {
        let Some(node) = ctx.graph.node(id) else {
            return Ok(());
        };
        check_kind(self.kinds(), node);
        if !node.config.safe_cast || !ctx.options.full_compile {
            return Ok(());
        }
        let enum_type = node.config.enum_type.unwrap_or_default();
        let location = node.location;

        // Resolve everything before touching the graph so a failed expansion
        // leaves the node wired as it was.
        let entries = ctx
            .metadata
            .enum_info(enum_type)
            .ok_or(LoweringError::UnknownEnum(enum_type))?
            .entry_count();
        let validate = library::get_valid_enum_index();
        let helper = ctx
            .metadata
            .function(validate)
            .ok_or(LoweringError::MissingLibraryFunction(validate))?;
        for name in [ENTRY_COUNT, ENUMERATOR_VALUE, pin_names::RETURN_VALUE] {
            if !helper.params.iter().any(|p| p.name == name) {
                return Err(LoweringError::MissingPin(name.to_string()));
            }
        }
        let byte_in = ctx.graph.require_pin(id, BYTE)?;
        let value_out = ctx.graph.require_pin(id, pin_names::RETURN_VALUE)?;

        let call = ctx.graph.add_node(
            NodeKind::CallFunction,
            NodeConfig::for_function(validate),
            location,
            ctx.metadata,
        );
        let count = ctx.graph.require_pin(call, ENTRY_COUNT)?;
        let value = ctx.graph.require_pin(call, ENUMERATOR_VALUE)?;
        let validated = ctx.graph.require_pin(call, pin_names::RETURN_VALUE)?;
        let cast = ctx.graph.add_node(
            NodeKind::CastByteToEnum,
            NodeConfig::for_enum(enum_type),
            location,
            ctx.metadata,
        );
        let cast_in = ctx.graph.require_pin(cast, BYTE)?;
        let cast_out = ctx.graph.require_pin(cast, pin_names::RETURN_VALUE)?;

        ctx.graph.set_default(count, Literal::Int(entries as i32))?;
        ctx.graph.move_links(byte_in, value)?;
        ctx.graph.link(validated, cast_in)?;
        ctx.graph.move_links(value_out, cast_out)?;
        Ok(())
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let byte = ctx.input_terminal(node, BYTE)?;
        if let Some(out) = node.find_pin(pin_names::RETURN_VALUE) {
            ctx.alias_net(out, byte);
        }
        register_data_pins(ctx, node);
        Ok(())
    }

    fn compile(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }
}

// ==========================================================================
// Switch
// ==========================================================================

/// Switch on enum: one comparison and conditional jump per entry, in entry
/// order. A selection matching no entry ends the thread.
///
/// ```text
///     mismatch = NotEqual_ByteByte(Selection, 0)
///     goto Entry0 if not mismatch
///     mismatch = NotEqual_ByteByte(Selection, 1)
///     goto Entry1 if not mismatch
///     ...
///     end of thread
/// ```
pub struct SwitchEnumHandler;

impl NodeHandler for SwitchEnumHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::SwitchEnum]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let info = enum_info(ctx, node)?;
        let compare = library::not_equal_byte();
        if ctx.metadata().function(compare).is_none() {
            return Err(LoweringError::MissingLibraryFunction(compare));
        }
        let selection = ctx.input_terminal(node, pin_names::SELECTION)?;
        let mismatch = ctx.add_terminal(Terminal::new("CaseMismatch", PinType::bool(), TerminalKind::Local));

        for (index, entry) in info.entries.iter().enumerate() {
            let Some(case) = exec_output(node, entry) else {
                continue;
            };
            let value = ctx.literal(Literal::Byte(index as u8), PinType::byte());
            ctx.emit(
                node.id,
                Statement::new(StatementKind::CallFunction)
                    .with_function(compare)
                    .with_rhs(vec![selection, value])
                    .with_lhs(mismatch),
            );
            ctx.emit(
                node.id,
                Statement::new(StatementKind::GotoIfNot)
                    .with_rhs(vec![mismatch])
                    .with_target(JumpTarget::Pin(case)),
            );
        }
        ctx.emit(node.id, Statement::new(StatementKind::EndOfThread));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile, function_graph, link};
    use crate::{CompilerOptions, Evaluator, TraceEvent};
    use kismet_core::{
        ClassInfo, FunctionFlags, FunctionInfo, Location, MetadataRegistry, PinType, TypeHash,
    };

    struct Fixture {
        metadata: MetadataRegistry,
        color: TypeHash,
        convert: TypeHash,
    }

    fn fixture() -> Fixture {
        let mut metadata = MetadataRegistry::with_library();
        let color = metadata.add_enum(EnumInfo::new("EColor", &["Red", "Green", "Blue"]));
        let lib = metadata.add_class(ClassInfo::new("ColorLib"));
        let convert = metadata.add_function(
            FunctionInfo::new(lib, "ToColor")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE)
                .with_out_param("Value", PinType::enum_byte(color)),
        );
        Fixture { metadata, color, convert }
    }

    fn cast_graph(fixture: &Fixture, byte: u8, safe: bool) -> (kismet_core::Graph, NodeId) {
        let (mut graph, entry, result) = function_graph(&fixture.metadata, fixture.convert);
        link(&mut graph, entry, "then", result, "execute");
        let config = NodeConfig {
            safe_cast: safe,
            ..NodeConfig::for_enum(fixture.color)
        };
        let cast = graph.add_node(NodeKind::CastByteToEnum, config, Location::default(), &fixture.metadata);
        let input = graph.require_pin(cast, BYTE).unwrap();
        graph.set_default(input, Literal::Byte(byte)).unwrap();
        link(&mut graph, cast, pin_names::RETURN_VALUE, result, "Value");
        (graph, cast)
    }

    fn run(fixture: &Fixture, byte: u8, options: CompilerOptions) -> Literal {
        let (graph, _) = cast_graph(fixture, byte, true);
        let compiled = compile(&fixture.metadata, &graph, options);
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
        let mut eval = Evaluator::new(&fixture.metadata);
        let frame = eval.run(&compiled, &[]).unwrap();
        eval.result(&compiled, &frame, "Value").unwrap()
    }

    #[test]
    fn safe_cast_keeps_valid_values() {
        let fixture = fixture();
        for byte in 0..3 {
            assert_eq!(run(&fixture, byte, CompilerOptions::release()), Literal::Byte(byte));
        }
    }

    #[test]
    fn safe_cast_clamps_out_of_range() {
        let fixture = fixture();
        assert_eq!(run(&fixture, 5, CompilerOptions::release()), Literal::Byte(2));
        assert_eq!(run(&fixture, 255, CompilerOptions::release()), Literal::Byte(2));
    }

    #[test]
    fn expansion_detaches_the_original() {
        let fixture = fixture();
        let (graph, cast) = cast_graph(&fixture, 5, true);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());

        assert_eq!(compiled.graph.nodes().len(), graph.nodes().len() + 2);
        let original = compiled.graph.node(cast).unwrap();
        assert!(original.pins.iter().all(|p| !p.is_linked()));
        assert!(
            compiled
                .inline_statements
                .iter()
                .chain(&compiled.statements)
                .any(|s| s.function == Some(library::get_valid_enum_index()))
        );
    }

    #[test]
    fn type_check_only_does_not_expand() {
        let fixture = fixture();
        let (graph, _) = cast_graph(&fixture, 5, true);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::type_check_only());
        assert_eq!(compiled.graph.nodes().len(), graph.nodes().len());
        assert!(!compiled.diagnostics.has_errors());
    }

    #[test]
    fn unsafe_cast_reinterprets() {
        let fixture = fixture();
        let (graph, _) = cast_graph(&fixture, 1, false);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        assert_eq!(compiled.graph.nodes().len(), graph.nodes().len());
        let mut eval = Evaluator::new(&fixture.metadata);
        let frame = eval.run(&compiled, &[]).unwrap();
        assert_eq!(eval.result(&compiled, &frame, "Value").unwrap(), Literal::Byte(1));
    }

    #[test]
    fn missing_helper_library_is_reported() {
        let mut metadata = MetadataRegistry::new();
        let color = metadata.add_enum(EnumInfo::new("EColor", &["Red"]));
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "G", kismet_core::GraphKind::Function);
        let config = NodeConfig {
            safe_cast: true,
            ..NodeConfig::for_enum(color)
        };
        let cast = graph.add_node(NodeKind::CastByteToEnum, config, Location::default(), &metadata);
        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        let errors: Vec<_> = compiled.diagnostics.for_node(cast).collect();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("not registered"));
    }

    #[test]
    fn failed_expansion_leaves_graph_untouched() {
        let mut fixture = fixture();
        // A helper without its parameters shadows the registered one.
        let helper = TypeHash::from_name(library::NODE_HELPER_LIBRARY);
        fixture
            .metadata
            .add_function(FunctionInfo::new(helper, "GetValidEnumIndex").with_flags(FunctionFlags::PURE));
        let (graph, cast) = cast_graph(&fixture, 5, true);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());

        assert_eq!(compiled.diagnostics.for_node(cast).count(), 1);
        assert_eq!(compiled.graph.nodes().len(), graph.nodes().len());
        let output = compiled.graph.find_pin(cast, pin_names::RETURN_VALUE).unwrap();
        assert!(output.is_linked());
    }

    /// `BeginPlay -> Switch(EColor)` with `Red` and `Blue` wired to calls.
    fn switch_graph(fixture: &Fixture, selection: u8) -> (kismet_core::Graph, Vec<TypeHash>) {
        let metadata = &fixture.metadata;
        let actor = TypeHash::from_name("ColorLib");
        let begin = TypeHash::from_function(actor, "BeginPlay");
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "EventGraph", kismet_core::GraphKind::Ubergraph);
        let event = graph.add_node(NodeKind::Event, NodeConfig::for_function(begin), Location::default(), metadata);
        let switch = graph.add_node(NodeKind::SwitchEnum, NodeConfig::for_enum(fixture.color), Location::default(), metadata);
        link(&mut graph, event, "then", switch, "execute");
        let input = graph.require_pin(switch, pin_names::SELECTION).unwrap();
        graph.set_default(input, Literal::Byte(selection)).unwrap();

        let mut calls = Vec::new();
        for case in ["Red", "Blue"] {
            let call = TypeHash::from_function(actor, &format!("On{case}"));
            let node = graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(call), Location::default(), metadata);
            link(&mut graph, switch, case, node, "execute");
            calls.push(call);
        }
        (graph, calls)
    }

    fn switch_fixture() -> Fixture {
        let mut fixture = fixture();
        let lib = TypeHash::from_name("ColorLib");
        fixture
            .metadata
            .add_function(FunctionInfo::new(lib, "BeginPlay").with_flags(FunctionFlags::BLUEPRINT_EVENT));
        for name in ["OnRed", "OnBlue"] {
            fixture
                .metadata
                .add_function(FunctionInfo::new(lib, name).with_flags(FunctionFlags::BLUEPRINT_CALLABLE));
        }
        fixture
    }

    #[test]
    fn switch_runs_only_the_selected_case() {
        let fixture = switch_fixture();
        for (selection, expected) in [(0u8, Some(0usize)), (2, Some(1)), (1, None), (7, None)] {
            let (graph, calls) = switch_graph(&fixture, selection);
            let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
            assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
            let mut eval = Evaluator::new(&fixture.metadata);
            eval.run(&compiled, &[]).unwrap();
            let expected: Vec<_> = expected.map(|i| TraceEvent::Call(calls[i])).into_iter().collect();
            assert_eq!(eval.trace(), expected.as_slice(), "selection {selection}");
        }
    }

    #[test]
    fn switch_without_comparison_helper_fails() {
        let mut metadata = MetadataRegistry::new();
        let color = metadata.add_enum(EnumInfo::new("EColor", &["Red"]));
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "G", kismet_core::GraphKind::Ubergraph);
        let switch = graph.add_node(NodeKind::SwitchEnum, NodeConfig::for_enum(color), Location::default(), &metadata);
        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        assert_eq!(compiled.diagnostics.for_node(switch).count(), 1);
    }

    #[test]
    fn entry_count_is_a_literal() {
        let fixture = fixture();
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "G", kismet_core::GraphKind::Function);
        let id = graph.add_node(
            NodeKind::GetNumEnumEntries,
            NodeConfig::for_enum(fixture.color),
            Location::default(),
            &fixture.metadata,
        );
        let node = graph.node(id).unwrap().clone();
        let mut ctx = FunctionContext::new(&fixture.metadata, CompilerOptions::default(), graph);
        EnumEntryCountHandler.register_nets(&mut ctx, &node).unwrap();
        let out = ctx.net_terminal(node.find_pin(pin_names::RETURN_VALUE).unwrap().id).unwrap();
        assert_eq!(ctx.terminal(out).unwrap().literal(), Some(&Literal::Int(3)));
    }
}
