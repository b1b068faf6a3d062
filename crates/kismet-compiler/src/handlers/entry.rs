//! Function entry, function result, events and nodes that lower to nothing.

use kismet_core::{Node, NodeKind};

use crate::handler::{NodeHandler, check_kind, emit_then_goto, register_data_pins};
use crate::{FunctionContext, LoweringError, LoweringResult, Statement, StatementKind, TerminalKind};

/// Function entries and events: every data output is a parameter.
pub struct EntryHandler;

impl NodeHandler for EntryHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[
            NodeKind::FunctionEntry,
            NodeKind::Event,
            NodeKind::ComponentBoundEvent,
            NodeKind::ActorBoundEvent,
        ]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        for pin in node.outputs().filter(|p| !p.is_exec()) {
            ctx.register_net_as(pin, TerminalKind::Param(pin.name.clone()), None, false);
        }
        Ok(())
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        emit_then_goto(ctx, node);
        Ok(())
    }
}

/// Function result: copy each input into its output, then return.
pub struct ResultHandler;

impl NodeHandler for ResultHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::FunctionResult]
    }

    fn register_nets(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        for pin in node.inputs().filter(|p| !p.is_exec()) {
            ctx.declare_result(&pin.name, pin.pin_type.clone());
        }
        register_data_pins(ctx, node);
        Ok(())
    }

    fn compile(&self, ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        for pin in node.inputs().filter(|p| !p.is_exec()) {
            let result = ctx.declare_result(&pin.name, pin.pin_type.clone());
            // An unwired output without a zero value keeps its default.
            let value = match ctx.input_terminal(node, &pin.name) {
                Ok(value) => value,
                Err(LoweringError::NoInputNet(_)) => continue,
                Err(e) => return Err(e),
            };
            ctx.emit(
                node.id,
                Statement::new(StatementKind::Assignment)
                    .with_lhs(result)
                    .with_rhs(vec![value]),
            );
        }
        ctx.emit(node.id, Statement::new(StatementKind::Return));
        Ok(())
    }
}

/// Tunnels, comments and documentation nodes emit nothing.
pub struct PassiveHandler;

impl NodeHandler for PassiveHandler {
    fn kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Tunnel, NodeKind::Comment, NodeKind::Documentation]
    }

    fn register_nets(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }

    fn compile(&self, _ctx: &mut FunctionContext<'_>, node: &Node) -> LoweringResult<()> {
        check_kind(self.kinds(), node);
        Ok(())
    }
}
