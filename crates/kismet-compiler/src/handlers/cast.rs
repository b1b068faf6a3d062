//! Object and class dynamic casts.

use kismet_core::{Node, NodeKind, PinDirection, PinType, pin_names};

use crate::handler::{NodeHandler, check_kind, emit_then_goto, exec_output};
use crate::{
    FunctionContext, JumpTarget, LoweringError, LoweringResult, Statement, StatementKind,
    Terminal, TerminalKind,
};

/// Dynamic cast: cast, test the result for null, and take `CastFailed` when
/// it is.
pub struct DynamicCastHandler;

impl NodeHandler for DynamicCastHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::DynamicCast, NodeKind::ClassDynamicCast]
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        let target = node
            .config
            .target_class
            .ok_or(LoweringError::MissingTargetClass)?;
        let source = node
            .data_pins()
            .find(|p| p.direction == PinDirection::Input)
            .ok_or_else(|| LoweringError::MissingPin("Object".to_string()))?;
        let result = node
            .data_pins()
            .find(|p| p.direction == PinDirection::Output)
            .ok_or_else(|| LoweringError::MissingPin("As".to_string()))?;
        let source = ctx.input_terminal(node, &source.name)?;
        let result = ctx.register_net(result);
        let success = ctx.add_terminal(Terminal::new("CastSuccess", PinType::bool(), TerminalKind::Local));

        let kind = match node.kind {
            NodeKind::ClassDynamicCast => StatementKind::MetaCast,
            _ => StatementKind::DynamicCast,
        };
        ctx.emit(
            node.id,
            Statement::new(kind)
                .with_lhs(result)
                .with_rhs(vec![source])
                .with_class(target),
        );
        ctx.emit(
            node.id,
            Statement::new(StatementKind::ObjectToBool)
                .with_lhs(success)
                .with_rhs(vec![result]),
        );
        if let Some(failed) = exec_output(node, pin_names::CAST_FAILED) {
            ctx.emit(
                node.id,
                Statement::new(StatementKind::GotoIfNot)
                    .with_rhs(vec![success])
                    .with_target(JumpTarget::Pin(failed)),
            );
        }
        emit_then_goto(ctx, node);
        Ok(())
    }
}
