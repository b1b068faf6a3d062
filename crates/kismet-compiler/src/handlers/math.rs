//! Math expression lowering.
//!
//! A math expression node carries an inner graph: an entry tunnel exposing
//! the node's inputs, an exit tunnel collecting its outputs, and a tree of
//! pure library calls in between. Each output is lowered by walking the tree
//! backward from the exit. The call feeding an output becomes one statement
//! writing the output; calls feeding other calls become inline statements,
//! so operands are outer terminals, literals or inline values.

use kismet_core::{
    FunctionFlags, FunctionInfo, Graph, Literal, MetadataProvider, Node, NodeKind, Pin, PinId,
    PinType, TunnelRole,
};

use crate::handler::{NodeHandler, check_kind};
use crate::{FunctionContext, LoweringError, LoweringResult, Statement, StatementKind, TerminalId};

/// Expressions nest at most this deep.
const MAX_DEPTH: usize = 64;

pub struct MathExpressionHandler;

/// Reject functions that cannot run inside an expression.
fn check_function(metadata: &dyn MetadataProvider, function: &FunctionInfo) -> LoweringResult<()> {
    let invalid = |reason| LoweringError::InvalidMathFunction {
        name: function.name.clone(),
        reason,
    };
    let required =
        FunctionFlags::PURE | FunctionFlags::STATIC | FunctionFlags::FINAL | FunctionFlags::NATIVE;
    if !function.flags.contains(required) {
        return Err(invalid("it must be pure, static, final and native"));
    }
    if function.has_flags(FunctionFlags::AUTHORITY_ONLY | FunctionFlags::COSMETIC) {
        return Err(invalid("authority-only and cosmetic functions are not allowed"));
    }
    if metadata.class(function.owner).is_some_and(|c| c.is_interface()) {
        return Err(invalid("interface functions are not allowed"));
    }
    Ok(())
}

fn malformed(message: impl Into<String>) -> LoweringError {
    LoweringError::MalformedExpression(message.into())
}

/// Lowering state for one expression node.
struct Expression<'n> {
    outer: &'n Node,
    inner: &'n Graph,
}

impl Expression<'_> {
    fn owner(&self, pin: PinId) -> LoweringResult<(&Node, &Pin)> {
        let node = self
            .inner
            .pin_owner(pin)
            .and_then(|id| self.inner.node(id))
            .ok_or_else(|| malformed("dangling link in expression"))?;
        let pin = node.pin(pin).ok_or_else(|| malformed("dangling link in expression"))?;
        Ok((node, pin))
    }

    /// Operand for an input pin of an inner call.
    fn operand(&self, ctx: &mut FunctionContext<'_>, input: &Pin, depth: usize) -> LoweringResult<TerminalId> {
        match input.links.as_slice() {
            [] => {
                let value = input
                    .default
                    .clone()
                    .or_else(|| Literal::default_for(&input.pin_type))
                    .ok_or_else(|| malformed(format!("'{}' has no value", input.name)))?;
                Ok(ctx.literal(value, input.pin_type.clone()))
            }
            [source] => self.source(ctx, *source, depth),
            _ => Err(malformed(format!("'{}' has several sources", input.name))),
        }
    }

    /// Terminal holding the value of an inner output pin.
    fn source(&self, ctx: &mut FunctionContext<'_>, pin: PinId, depth: usize) -> LoweringResult<TerminalId> {
        if depth > MAX_DEPTH {
            return Err(malformed("expression is nested too deeply"));
        }
        let (node, pin) = self.owner(pin)?;
        match (node.kind, node.config.tunnel) {
            (NodeKind::Tunnel, Some(TunnelRole::Entry)) => ctx.input_terminal(self.outer, &pin.name),
            (NodeKind::CallFunction, _) => {
                let (statement, pin_type) = self.call(ctx, node, depth)?;
                Ok(ctx.emit_inline(statement, &pin.name, pin_type))
            }
            (kind, _) => Err(malformed(format!(
                "{} nodes cannot appear in an expression",
                kind.display_name()
            ))),
        }
    }

    /// Call statement for an inner call node, without a destination.
    fn call(&self, ctx: &mut FunctionContext<'_>, node: &Node, depth: usize) -> LoweringResult<(Statement, PinType)> {
        let function = node
            .config
            .function
            .and_then(|f| ctx.metadata().function(f))
            .ok_or(LoweringError::MissingFunction)?;
        check_function(ctx.metadata(), function)?;
        let result = function
            .return_param()
            .ok_or_else(|| malformed(format!("'{}' returns nothing", function.name)))?;

        let mut args = Vec::new();
        for param in function.input_params() {
            let input = node
                .inputs()
                .find(|p| p.name == param.name)
                .ok_or_else(|| LoweringError::MissingPin(param.name.clone()))?;
            args.push(self.operand(ctx, input, depth + 1)?);
        }
        let statement = Statement::new(StatementKind::CallFunction)
            .with_function(function.hash)
            .with_rhs(args);
        Ok((statement, result.pin_type.clone()))
    }
}

impl NodeHandler for MathExpressionHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::MathExpression]
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let inner = node
            .config
            .inner_graph
            .as_deref()
            .ok_or_else(|| malformed("node has no expression graph"))?;
        let exit = inner
            .nodes()
            .iter()
            .find(|n| n.config.tunnel == Some(TunnelRole::Exit))
            .ok_or_else(|| malformed("expression has no output"))?;
        let expression = Expression { outer: node, inner };

        for output in exit.inputs() {
            let destination = ctx.output_terminal(node, &output.name)?;
            let [source] = output.links.as_slice() else {
                return Err(malformed(format!("'{}' is not connected", output.name)));
            };
            let (source_node, _) = expression.owner(*source)?;
            let statement = if source_node.kind == NodeKind::CallFunction {
                expression.call(ctx, source_node, 0)?.0
            } else {
                let value = expression.source(ctx, *source, 0)?;
                Statement::new(StatementKind::Assignment).with_rhs(vec![value])
            };
            ctx.emit(node.id, statement.with_lhs(destination));
        }
        Ok(())
    }
}
