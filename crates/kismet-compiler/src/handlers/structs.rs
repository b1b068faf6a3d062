//! Struct decomposition and composition.

use kismet_core::{Node, NodeKind, PinType, StructInfo};

use crate::handler::{NodeHandler, check_kind, emit_then_goto, register_data_pins};
use crate::{
    FunctionContext, LoweringError, LoweringResult, Statement, StatementKind, Terminal,
    TerminalId, TerminalKind,
};

fn struct_info<'a>(ctx: &FunctionContext<'a>, node: &Node) -> LoweringResult<&'a StructInfo> {
    let hash = node.config.struct_type.unwrap_or_default();
    ctx.metadata()
        .struct_info(hash)
        .ok_or(LoweringError::UnknownStruct(hash))
}

/// A terminal naming `field` of the struct held by `context`.
fn field_terminal(
    ctx: &mut FunctionContext<'_>,
    info: &StructInfo,
    field: &str,
    context: TerminalId,
) -> LoweringResult<TerminalId> {
    let declared = info.field(field).ok_or_else(|| LoweringError::NoMatchingField {
        struct_name: info.name.clone(),
        field: field.to_string(),
    })?;
    Ok(ctx.add_terminal(
        Terminal::new(field, declared.pin_type.clone(), TerminalKind::Field(field.to_string()))
            .with_context(Some(context))
            .with_const(declared.read_only),
    ))
}

// ==========================================================================
// Break
// ==========================================================================

/// Break-struct: every output aliases one field of the input struct.
///
/// No statements are emitted; reading an output reads the field through the
/// struct terminal.
pub struct BreakStructHandler;

impl NodeHandler for BreakStructHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::BreakStruct]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let info = struct_info(ctx, node)?;
        let source = ctx.input_terminal(node, &info.name)?;

        for pin in node.outputs() {
            let field = info.field(&pin.name).ok_or_else(|| LoweringError::NoMatchingField {
                struct_name: info.name.clone(),
                field: pin.name.clone(),
            })?;
            ctx.register_net_as(
                pin,
                TerminalKind::Field(field.name.clone()),
                Some(source),
                field.read_only,
            );
        }
        Ok(())
    }

    fn compile(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }
}

// ==========================================================================
// Make
// ==========================================================================

/// Make-struct: start from the zero value, then assign each field input.
pub struct MakeStructHandler;

impl NodeHandler for MakeStructHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::MakeStruct]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let info = struct_info(ctx, node)?;
        let output = ctx.output_terminal(node, &info.name)?;
        let zero = ctx.literal(info.default_value(), PinType::structure(info.hash));
        ctx.emit(
            node.id,
            Statement::new(StatementKind::Assignment)
                .with_lhs(output)
                .with_rhs(vec![zero]),
        );

        for pin in node.inputs() {
            let field = field_terminal(ctx, info, &pin.name, output)?;
            let value = ctx.input_terminal(node, &pin.name)?;
            ctx.emit(
                node.id,
                Statement::new(StatementKind::Assignment)
                    .with_lhs(field)
                    .with_rhs(vec![value]),
            );
        }
        Ok(())
    }
}

// ==========================================================================
// Set fields
// ==========================================================================

const STRUCT_REF: &str = "StructRef";
const STRUCT_OUT: &str = "StructOut";

/// Set-fields-in-struct: assign each field input through the struct
/// reference, which is passed on unchanged as `StructOut`.
pub struct SetFieldsHandler;

impl NodeHandler for SetFieldsHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::SetFieldsInStruct]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let target = ctx.input_terminal(node, STRUCT_REF)?;
        if let Some(out) = node.find_pin(STRUCT_OUT) {
            ctx.alias_net(out, target);
        }
        register_data_pins(ctx, node);
        Ok(())
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let info = struct_info(ctx, node)?;
        let target = ctx.input_terminal(node, STRUCT_REF)?;

        for pin in node.inputs().filter(|p| !p.is_exec() && p.name != STRUCT_REF) {
            let field = field_terminal(ctx, info, &pin.name, target)?;
            let value = ctx.input_terminal(node, &pin.name)?;
            ctx.emit(
                node.id,
                Statement::new(StatementKind::Assignment)
                    .with_lhs(field)
                    .with_rhs(vec![value]),
            );
        }
        emit_then_goto(ctx, node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile, function_graph, link};
    use crate::{CompilerOptions, Evaluator};
    use kismet_core::{
        FunctionFlags, FunctionInfo, Literal, Location, MetadataRegistry, NodeConfig, NodeId,
        StructInfo, TypeHash,
    };

    fn pair(metadata: &mut MetadataRegistry) -> TypeHash {
        metadata.add_struct(
            StructInfo::new("Pair")
                .with_field("f1", PinType::int())
                .with_field("f2", PinType::bool()),
        )
    }

    fn split(metadata: &mut MetadataRegistry) -> TypeHash {
        let lib = metadata.add_class(kismet_core::ClassInfo::new("Lib"));
        metadata.add_function(
            FunctionInfo::new(lib, "Split")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE)
                .with_out_param("A", PinType::int())
                .with_out_param("B", PinType::bool()),
        )
    }

    #[test]
    fn break_struct_round_trip() {
        let mut metadata = MetadataRegistry::new();
        let pair = pair(&mut metadata);
        let split = split(&mut metadata);
        let (mut graph, entry, result) = function_graph(&metadata, split);
        link(&mut graph, entry, "then", result, "execute");

        let brk = graph.add_node(NodeKind::BreakStruct, NodeConfig::for_struct(pair), Location::default(), &metadata);
        let input = graph.find_pin(brk, "Pair").unwrap().id;
        graph
            .set_default(
                input,
                Literal::Struct {
                    struct_type: pair,
                    fields: vec![("f1".into(), Literal::Int(7)), ("f2".into(), Literal::Bool(true))],
                },
            )
            .unwrap();
        link(&mut graph, brk, "f1", result, "A");
        link(&mut graph, brk, "f2", result, "B");

        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);

        let outputs: Vec<_> = graph
            .node(brk)
            .unwrap()
            .outputs()
            .map(|p| compiled.terminal_for_pin(p.id).unwrap())
            .collect();
        assert_eq!(outputs.len(), 2);
        let source = compiled.terminal_for_pin(input).unwrap();
        for id in &outputs {
            let terminal = compiled.terminal(*id).unwrap();
            assert!(matches!(terminal.kind, TerminalKind::Field(_)));
            assert_eq!(terminal.context, Some(source));
        }

        let mut eval = Evaluator::new(&metadata);
        let frame = eval.run(&compiled, &[]).unwrap();
        assert_eq!(eval.read(&compiled, &frame, outputs[0]).unwrap(), Literal::Int(7));
        assert_eq!(eval.read(&compiled, &frame, outputs[1]).unwrap(), Literal::Bool(true));
        assert_eq!(eval.result(&compiled, &frame, "A").unwrap(), Literal::Int(7));
        assert_eq!(eval.result(&compiled, &frame, "B").unwrap(), Literal::Bool(true));
    }

    #[test]
    fn read_only_field_is_const() {
        let mut metadata = MetadataRegistry::new();
        let pair = metadata.add_struct(
            StructInfo::new("Tagged")
                .with_field("value", PinType::int())
                .with_read_only_field("tag", PinType::name()),
        );
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "G", kismet_core::GraphKind::Function);
        let brk = graph.add_node(NodeKind::BreakStruct, NodeConfig::for_struct(pair), Location::default(), &metadata);
        let node = graph.node(brk).unwrap().clone();
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        BreakStructHandler.register_nets(&mut ctx, &node).unwrap();

        let value = ctx.net_terminal(node.find_pin("value").unwrap().id).unwrap();
        let tag = ctx.net_terminal(node.find_pin("tag").unwrap().id).unwrap();
        assert!(!ctx.terminal(value).unwrap().is_const);
        assert!(ctx.terminal(tag).unwrap().is_const);
    }

    #[test]
    fn unknown_struct_fails_only_that_node() {
        let mut metadata = MetadataRegistry::new();
        let split = split(&mut metadata);
        let (mut graph, entry, result) = function_graph(&metadata, split);
        link(&mut graph, entry, "then", result, "execute");
        let ghost = TypeHash::from_name("Ghost");
        let brk = graph.add_node_with_pins(
            NodeKind::BreakStruct,
            NodeConfig::for_struct(ghost),
            Location::default(),
            vec![kismet_core::PinTemplate::output("f1", PinType::int())],
        );
        link(&mut graph, brk, "f1", result, "A");

        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        let errors: Vec<NodeId> = compiled.diagnostics.errors().filter_map(|d| d.node).collect();
        assert_eq!(errors, vec![brk]);
        assert!(compiled.statements.iter().any(|s| s.kind == StatementKind::Return));
    }

    #[test]
    fn missing_field_is_reported() {
        let mut metadata = MetadataRegistry::new();
        let pair = pair(&mut metadata);
        let mut graph = kismet_core::Graph::new(kismet_core::GraphId(0), "G", kismet_core::GraphKind::Function);
        let brk = graph.add_node_with_pins(
            NodeKind::BreakStruct,
            NodeConfig::for_struct(pair),
            Location::default(),
            vec![
                kismet_core::PinTemplate::input("Pair", PinType::structure(pair))
                    .with_default(Literal::Struct { struct_type: pair, fields: vec![] }),
                kismet_core::PinTemplate::output("f9", PinType::int()),
            ],
        );
        let node = graph.node(brk).unwrap().clone();
        let mut ctx = FunctionContext::new(&metadata, CompilerOptions::default(), graph);
        assert_eq!(
            BreakStructHandler.register_nets(&mut ctx, &node),
            Err(LoweringError::NoMatchingField {
                struct_name: "Pair".into(),
                field: "f9".into()
            })
        );
    }

    #[test]
    fn make_then_break_carries_values() {
        let mut metadata = MetadataRegistry::new();
        let pair = pair(&mut metadata);
        let split = split(&mut metadata);
        let (mut graph, entry, result) = function_graph(&metadata, split);
        link(&mut graph, entry, "then", result, "execute");

        let make = graph.add_node(NodeKind::MakeStruct, NodeConfig::for_struct(pair), Location::default(), &metadata);
        let f1 = graph.find_pin(make, "f1").unwrap().id;
        graph.set_default(f1, Literal::Int(42)).unwrap();
        let brk = graph.add_node(NodeKind::BreakStruct, NodeConfig::for_struct(pair), Location::default(), &metadata);
        link(&mut graph, make, "Pair", brk, "Pair");
        link(&mut graph, brk, "f1", result, "A");
        link(&mut graph, brk, "f2", result, "B");

        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
        let mut eval = Evaluator::new(&metadata);
        let frame = eval.run(&compiled, &[]).unwrap();
        assert_eq!(eval.result(&compiled, &frame, "A").unwrap(), Literal::Int(42));
        assert_eq!(eval.result(&compiled, &frame, "B").unwrap(), Literal::Bool(false));
    }
}
