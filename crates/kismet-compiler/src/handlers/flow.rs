//! Branch, execution sequence and multi gate.

use kismet_core::{
    Literal, Node, NodeKind, PinDirection, PinId, PinType, TypeHash, exec_output_prefix,
    library, pin_names,
};

use crate::handler::{NodeHandler, check_kind, emit_then_goto, exec_output};
use crate::{
    FunctionContext, JumpTarget, LoweringError, LoweringResult, Statement, StatementKind,
    Terminal, TerminalKind,
};

/// Branch: jump to `else` when the condition is false, otherwise `then`.
pub struct BranchHandler;

impl NodeHandler for BranchHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::IfThenElse]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let condition = ctx.input_terminal(node, pin_names::CONDITION)?;
        if let Some(otherwise) = exec_output(node, pin_names::ELSE) {
            ctx.emit(
                node.id,
                Statement::new(StatementKind::GotoIfNot)
                    .with_rhs(vec![condition])
                    .with_target(JumpTarget::Pin(otherwise)),
            );
        }
        emit_then_goto(ctx, node);
        Ok(())
    }
}

/// Execution sequence: run every wired output, left to right.
///
/// Release builds push the resume points of branches `1..n` in reverse and
/// jump to branch 0; each branch ending pops the next. Debug builds
/// interleave a debug site before every branch after the first so a
/// debugger can stop between them:
///
/// ```text
///     push L1          push p2
///     goto p0          push p1
/// L1: debug site       goto p0
///     push L2
///     goto p1
/// L2: debug site
///     goto p2
/// ```
pub struct ExecutionSequenceHandler;

impl ExecutionSequenceHandler {
    /// Wired `then_*` outputs in pin order.
    fn wired_outputs(node: &Node) -> Vec<PinId> {
        let prefix = exec_output_prefix(node.kind).unwrap_or("then_");
        node.outputs()
            .filter(|p| p.is_exec() && p.name.starts_with(prefix) && p.is_linked())
            .map(|p| p.id)
            .collect()
    }
}

impl NodeHandler for ExecutionSequenceHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::ExecutionSequence]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let outputs = Self::wired_outputs(node);
        let Some((&first, rest)) = outputs.split_first() else {
            ctx.emit(node.id, Statement::new(StatementKind::EndOfThread));
            return Ok(());
        };

        if ctx.options().debug_build && !rest.is_empty() {
            for (i, pin) in outputs.iter().enumerate() {
                if i > 0 {
                    ctx.emit(node.id, Statement::new(StatementKind::DebugSite));
                }
                if i + 1 < outputs.len() {
                    let resume = ctx.statements(node.id).len() + 2;
                    ctx.emit(
                        node.id,
                        Statement::new(StatementKind::PushState).with_target(JumpTarget::Local(resume)),
                    );
                }
                ctx.emit(node.id, Statement::goto(*pin));
            }
        } else {
            for pin in rest.iter().rev() {
                ctx.emit(
                    node.id,
                    Statement::new(StatementKind::PushState).with_target(JumpTarget::Pin(*pin)),
                );
            }
            ctx.emit(node.id, Statement::goto(first));
        }
        Ok(())
    }
}

/// Multi gate: each execution fires the next output not yet fired.
///
/// Fired outputs are bits of an int member of the running object, one per
/// gate node, so the state survives between calls. Once every output has
/// fired the gate stays closed unless `Loop` is set, in which case it clears
/// its bits and starts over. `Reset` clears the bits without firing.
///
/// ```text
///  0: open = HasUnmarkedBit(Data, N)
///  1: goto Closed if not open
///  2: index = GetUnmarkedBit(Data, StartIndex, N)
///  3: Data = MarkBit(Data, index)
///     mismatch = NotEqual_IntInt(index, i); goto out_i if not mismatch
///     end of thread
/// Closed:
///     end of thread if not Loop
///     Data = 0
///     goto 0
/// Reset:
///     Data = 0
///     end of thread
/// ```
pub struct MultiGateHandler;

impl MultiGateHandler {
    /// Member holding the fired-output bits of `node`.
    pub fn gate_data(graph: &str, node: &Node) -> TypeHash {
        TypeHash::from_name(&format!("{graph}.MultiGate_{}", node.id.0))
    }

    fn outputs(node: &Node) -> Vec<PinId> {
        let prefix = exec_output_prefix(node.kind).unwrap_or("out_");
        node.outputs()
            .filter(|p| p.is_exec() && p.name.starts_with(prefix))
            .map(|p| p.id)
            .collect()
    }
}

impl NodeHandler for MultiGateHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::MultiGate]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let helpers = [
            library::has_unmarked_bit(),
            library::get_unmarked_bit(),
            library::mark_bit(),
            library::not_equal_int(),
        ];
        if let Some(missing) = helpers.into_iter().find(|f| ctx.metadata().function(*f).is_none()) {
            return Err(LoweringError::MissingLibraryFunction(missing));
        }
        let [has_unmarked, get_unmarked, mark, not_equal] = helpers;

        let outputs = Self::outputs(node);
        let data = Self::gate_data(&ctx.graph().name, node);
        let data = ctx.add_terminal(Terminal::new("MultiGateData", PinType::int(), TerminalKind::Property(data)));
        let zero = ctx.literal(Literal::Int(0), PinType::int());

        if !outputs.is_empty() {
            let is_loop = ctx.input_terminal(node, pin_names::IS_LOOP)?;
            let start = ctx.input_terminal(node, pin_names::START_INDEX)?;
            let count = ctx.literal(Literal::Int(outputs.len() as i32), PinType::int());
            let open = ctx.add_terminal(Terminal::new("GateOpen", PinType::bool(), TerminalKind::Local));
            let index = ctx.add_terminal(Terminal::new("GateIndex", PinType::int(), TerminalKind::Local));
            let mismatch = ctx.add_terminal(Terminal::new("GateMismatch", PinType::bool(), TerminalKind::Local));
            let closed = 5 + 2 * outputs.len();

            ctx.emit(
                node.id,
                Statement::new(StatementKind::CallFunction)
                    .with_function(has_unmarked)
                    .with_rhs(vec![data, count])
                    .with_lhs(open),
            );
            ctx.emit(
                node.id,
                Statement::new(StatementKind::GotoIfNot)
                    .with_rhs(vec![open])
                    .with_target(JumpTarget::Local(closed)),
            );
            ctx.emit(
                node.id,
                Statement::new(StatementKind::CallFunction)
                    .with_function(get_unmarked)
                    .with_rhs(vec![data, start, count])
                    .with_lhs(index),
            );
            ctx.emit(
                node.id,
                Statement::new(StatementKind::CallFunction)
                    .with_function(mark)
                    .with_rhs(vec![data, index])
                    .with_lhs(data),
            );
            for (i, pin) in outputs.iter().enumerate() {
                let value = ctx.literal(Literal::Int(i as i32), PinType::int());
                ctx.emit(
                    node.id,
                    Statement::new(StatementKind::CallFunction)
                        .with_function(not_equal)
                        .with_rhs(vec![index, value])
                        .with_lhs(mismatch),
                );
                ctx.emit(
                    node.id,
                    Statement::new(StatementKind::GotoIfNot)
                        .with_rhs(vec![mismatch])
                        .with_target(JumpTarget::Pin(*pin)),
                );
            }
            ctx.emit(node.id, Statement::new(StatementKind::EndOfThread));

            debug_assert_eq!(ctx.statements(node.id).len(), closed);
            ctx.emit(node.id, Statement::new(StatementKind::EndOfThreadIfNot).with_rhs(vec![is_loop]));
            ctx.emit(
                node.id,
                Statement::new(StatementKind::Assignment)
                    .with_lhs(data)
                    .with_rhs(vec![zero]),
            );
            ctx.emit(node.id, Statement::new(StatementKind::Goto).with_target(JumpTarget::Local(0)));
        } else {
            ctx.emit(node.id, Statement::new(StatementKind::EndOfThread));
        }

        if let Some(reset) = node.find_pin_dir(pin_names::RESET, PinDirection::Input) {
            ctx.mark_pin_entry(node.id, reset.id);
            ctx.emit(
                node.id,
                Statement::new(StatementKind::Assignment)
                    .with_lhs(data)
                    .with_rhs(vec![zero]),
            );
            ctx.emit(node.id, Statement::new(StatementKind::EndOfThread));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{compile, link};
    use crate::{CompilerOptions, Evaluator, TraceEvent};
    use kismet_core::{
        ClassInfo, FunctionFlags, FunctionInfo, Graph, GraphId, GraphKind, Location,
        MetadataRegistry, NodeConfig, NodeId,
    };

    struct Fixture {
        metadata: MetadataRegistry,
        calls: Vec<TypeHash>,
        begin: TypeHash,
    }

    fn fixture() -> Fixture {
        let mut metadata = MetadataRegistry::with_library();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let calls = ["First", "Second", "Third"]
            .iter()
            .map(|name| {
                metadata.add_function(
                    FunctionInfo::new(actor, *name).with_flags(FunctionFlags::BLUEPRINT_CALLABLE),
                )
            })
            .collect();
        let begin = metadata.add_function(
            FunctionInfo::new(actor, "BeginPlay").with_flags(FunctionFlags::BLUEPRINT_EVENT),
        );
        Fixture { metadata, calls, begin }
    }

    /// `BeginPlay -> Sequence(3)` with every call wired except `skip`.
    fn sequence_graph(fixture: &Fixture, skip: Option<usize>) -> (Graph, NodeId) {
        let metadata = &fixture.metadata;
        let mut graph = Graph::new(GraphId(0), "EventGraph", GraphKind::Ubergraph);
        let event = graph.add_node(NodeKind::Event, NodeConfig::for_function(fixture.begin), Location::default(), metadata);
        let config = NodeConfig {
            pin_count: 3,
            ..NodeConfig::default()
        };
        let sequence = graph.add_node(NodeKind::ExecutionSequence, config, Location::default(), metadata);
        link(&mut graph, event, "then", sequence, "execute");
        for (i, call) in fixture.calls.iter().enumerate() {
            if skip == Some(i) {
                continue;
            }
            let node = graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(*call), Location::default(), metadata);
            link(&mut graph, sequence, &format!("then_{i}"), node, "execute");
        }
        (graph, sequence)
    }

    fn kinds(statements: &[Statement]) -> Vec<StatementKind> {
        statements.iter().map(|s| s.kind).collect()
    }

    fn call_order(fixture: &Fixture, options: CompilerOptions, skip: Option<usize>) -> Vec<TypeHash> {
        let (graph, _) = sequence_graph(fixture, skip);
        let compiled = compile(&fixture.metadata, &graph, options);
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
        let mut eval = Evaluator::new(&fixture.metadata);
        eval.run(&compiled, &[]).unwrap();
        eval.trace()
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Call(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn release_pushes_in_reverse_then_jumps() {
        let fixture = fixture();
        let (graph, sequence) = sequence_graph(&fixture, None);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        let own: Vec<_> = compiled
            .statements
            .iter()
            .filter(|s| s.node == Some(sequence))
            .cloned()
            .collect();
        assert_eq!(
            kinds(&own),
            vec![StatementKind::PushState, StatementKind::PushState, StatementKind::Goto]
        );
    }

    #[test]
    fn debug_interleaves_debug_sites() {
        let fixture = fixture();
        let (graph, sequence) = sequence_graph(&fixture, None);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::debug());
        let own: Vec<_> = compiled
            .statements
            .iter()
            .filter(|s| s.node == Some(sequence))
            .cloned()
            .collect();
        assert_eq!(
            kinds(&own),
            vec![
                StatementKind::PushState,
                StatementKind::Goto,
                StatementKind::DebugSite,
                StatementKind::PushState,
                StatementKind::Goto,
                StatementKind::DebugSite,
                StatementKind::Goto,
            ]
        );
        let start = compiled
            .statements
            .iter()
            .position(|s| s.node == Some(sequence))
            .unwrap();
        assert_eq!(own[0].target, Some(JumpTarget::Statement(start + 2)));
        assert_eq!(own[3].target, Some(JumpTarget::Statement(start + 5)));
    }

    #[test]
    fn branches_run_left_to_right() {
        let fixture = fixture();
        for options in [CompilerOptions::release(), CompilerOptions::debug()] {
            assert_eq!(call_order(&fixture, options, None), fixture.calls);
        }
    }

    #[test]
    fn unwired_outputs_are_skipped() {
        let fixture = fixture();
        let order = call_order(&fixture, CompilerOptions::release(), Some(1));
        assert_eq!(order, vec![fixture.calls[0], fixture.calls[2]]);
    }

    /// `BeginPlay -> MultiGate(3)` with every output wired to a call, and a
    /// `Restart` event wired to `Reset`.
    fn gate_graph(fixture: &Fixture, is_loop: bool, start: i32) -> (Graph, NodeId, NodeId) {
        let metadata = &fixture.metadata;
        let mut graph = Graph::new(GraphId(0), "EventGraph", GraphKind::Ubergraph);
        let event = graph.add_node(NodeKind::Event, NodeConfig::for_function(fixture.begin), Location::default(), metadata);
        let restart = TypeHash::from_function(TypeHash::from_name("Actor"), "Restart");
        let reset = graph.add_node(NodeKind::Event, NodeConfig::for_function(restart), Location::default(), metadata);
        let config = NodeConfig {
            pin_count: 3,
            ..NodeConfig::default()
        };
        let gate = graph.add_node(NodeKind::MultiGate, config, Location::default(), metadata);
        link(&mut graph, event, "then", gate, "execute");
        link(&mut graph, reset, "then", gate, pin_names::RESET);
        let pin = graph.require_pin(gate, pin_names::IS_LOOP).unwrap();
        graph.set_default(pin, Literal::Bool(is_loop)).unwrap();
        let pin = graph.require_pin(gate, pin_names::START_INDEX).unwrap();
        graph.set_default(pin, Literal::Int(start)).unwrap();
        for (i, call) in fixture.calls.iter().enumerate() {
            let node = graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(*call), Location::default(), metadata);
            link(&mut graph, gate, &format!("out_{i}"), node, "execute");
        }
        (graph, event, reset)
    }

    /// Calls made by one run starting at `start`.
    fn fired(eval: &mut Evaluator<'_>, compiled: &crate::CompiledFunction, start: usize) -> Vec<TypeHash> {
        let before = eval.trace().len();
        eval.run_from(compiled, start, &[]).unwrap();
        eval.trace()[before..]
            .iter()
            .filter_map(|event| match event {
                TraceEvent::Call(f) => Some(*f),
                _ => None,
            })
            .collect()
    }

    fn gate_fixture() -> Fixture {
        let mut fixture = fixture();
        let actor = TypeHash::from_name("Actor");
        fixture
            .metadata
            .add_function(FunctionInfo::new(actor, "Restart").with_flags(FunctionFlags::BLUEPRINT_EVENT));
        fixture
    }

    fn entry_of(compiled: &crate::CompiledFunction, node: NodeId) -> usize {
        compiled
            .entry_points
            .iter()
            .find(|(n, _)| *n == node)
            .map(|(_, index)| *index)
            .unwrap()
    }

    #[test]
    fn multigate_fires_each_output_once() {
        let fixture = gate_fixture();
        let (graph, event, reset) = gate_graph(&fixture, false, -1);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
        let begin = entry_of(&compiled, event);
        let restart = entry_of(&compiled, reset);

        let mut eval = Evaluator::new(&fixture.metadata);
        for call in &fixture.calls {
            assert_eq!(fired(&mut eval, &compiled, begin), vec![*call]);
        }
        assert!(fired(&mut eval, &compiled, begin).is_empty());

        assert!(fired(&mut eval, &compiled, restart).is_empty());
        assert_eq!(fired(&mut eval, &compiled, begin), vec![fixture.calls[0]]);
    }

    #[test]
    fn looping_multigate_starts_over() {
        let fixture = gate_fixture();
        let (graph, event, _) = gate_graph(&fixture, true, 1);
        let compiled = compile(&fixture.metadata, &graph, CompilerOptions::release());
        assert!(!compiled.diagnostics.has_errors(), "{}", compiled.diagnostics);
        let begin = entry_of(&compiled, event);

        let mut eval = Evaluator::new(&fixture.metadata);
        let order: Vec<_> = (0..4).flat_map(|_| fired(&mut eval, &compiled, begin)).collect();
        let c = &fixture.calls;
        assert_eq!(order, vec![c[1], c[2], c[0], c[1]]);
    }

    #[test]
    fn branch_takes_else_when_false() {
        let mut metadata = MetadataRegistry::new();
        let actor = metadata.add_class(ClassInfo::new("Actor"));
        let yes = metadata.add_function(FunctionInfo::new(actor, "Yes").with_flags(FunctionFlags::BLUEPRINT_CALLABLE));
        let no = metadata.add_function(FunctionInfo::new(actor, "No").with_flags(FunctionFlags::BLUEPRINT_CALLABLE));
        let run = metadata.add_function(
            FunctionInfo::new(actor, "Run")
                .with_flags(FunctionFlags::BLUEPRINT_CALLABLE)
                .with_param("Flag", PinType::bool()),
        );

        let mut graph = Graph::new(GraphId(0), "Run", GraphKind::Function);
        let entry = graph.add_node(NodeKind::FunctionEntry, NodeConfig::for_function(run), Location::default(), &metadata);
        let branch = graph.add_node(NodeKind::IfThenElse, NodeConfig::default(), Location::default(), &metadata);
        let a = graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(yes), Location::default(), &metadata);
        let b = graph.add_node(NodeKind::CallFunction, NodeConfig::for_function(no), Location::default(), &metadata);
        link(&mut graph, entry, "then", branch, "execute");
        link(&mut graph, entry, "Flag", branch, pin_names::CONDITION);
        link(&mut graph, branch, "then", a, "execute");
        link(&mut graph, branch, "else", b, "execute");

        let compiled = compile(&metadata, &graph, CompilerOptions::release());
        for (flag, expected) in [(true, yes), (false, no)] {
            let mut eval = Evaluator::new(&metadata);
            eval.run(&compiled, &[("Flag", Literal::Bool(flag))]).unwrap();
            assert_eq!(eval.trace(), &[TraceEvent::Call(expected)]);
        }
    }
}
